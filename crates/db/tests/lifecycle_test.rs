//! Soft-delete and totals behaviour.

#![allow(clippy::unwrap_used)]

mod common;

use common::{card_ref, cents, issue, new_company, orchestrator};
use giftledger_core::ledger::{AccountRef, AccountType, IssueRequest, LedgerError};
use giftledger_db::{AccountRepository, LedgerRepository};

#[tokio::test]
async fn test_new_company_totals_are_zero_filled() {
    let Some((_db, orchestrator)) = orchestrator().await else {
        return;
    };
    let setup = new_company(&orchestrator, "Zero").await;

    let totals = orchestrator
        .company_account_totals(setup.company.id)
        .await
        .unwrap();
    for account_type in AccountType::ALL {
        assert_eq!(*totals.get(account_type), cents(0), "{account_type}");
    }
}

#[tokio::test]
async fn test_accounts_by_type_lists_every_type() {
    let Some((db, orchestrator)) = orchestrator().await else {
        return;
    };
    let setup = new_company(&orchestrator, "By type").await;
    issue(&orchestrator, setup.company.id, 2, 100).await;

    let grouped = AccountRepository::new(db)
        .accounts_by_type(setup.company.id)
        .await
        .unwrap();
    assert_eq!(grouped.company.len(), 1);
    assert_eq!(grouped.generic_in.len(), 1);
    assert_eq!(grouped.generic_out.len(), 1);
    assert_eq!(grouped.gift_card.len(), 2);
}

#[tokio::test]
async fn test_deleted_gift_card_is_excluded_but_history_kept() {
    let Some((db, orchestrator)) = orchestrator().await else {
        return;
    };
    let setup = new_company(&orchestrator, "Delete card").await;
    let company_id = setup.company.id;
    let receipt = issue(&orchestrator, company_id, 2, 2000).await;
    let deleted = &receipt.cards[0];
    let history_before = orchestrator
        .company_history(company_id, Some(AccountType::Company))
        .await
        .unwrap();

    orchestrator
        .soft_delete_gift_card(&deleted.gift_card.code.to_lowercase())
        .await
        .unwrap();

    let err = orchestrator
        .gift_card_balance(&deleted.gift_card.code)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::GiftCardNotFound(_)));

    let err = orchestrator
        .spend(card_ref(&receipt, 0), cents(100))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::GiftCardNotFound(_)));

    let err = orchestrator
        .add_funds(AccountRef::Account(deleted.account_id), cents(100))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::AccountNotFound(_)));

    let err = orchestrator
        .soft_delete_gift_card(&deleted.gift_card.code)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::GiftCardNotFound(_)));

    let listed = orchestrator.list_gift_cards(company_id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].code, receipt.cards[1].gift_card.code);

    let totals = orchestrator
        .company_account_totals(company_id)
        .await
        .unwrap();
    assert_eq!(totals.gift_card, cents(2000));
    assert_eq!(totals.company, cents(-4000));

    // Running history still covers the deleted card's issuing ledger.
    let history_after = orchestrator
        .company_history(company_id, Some(AccountType::Company))
        .await
        .unwrap();
    let issued_before = history_before
        .iter()
        .find(|h| h.ledger_id == deleted.ledger.id)
        .unwrap();
    let issued_after = history_after
        .iter()
        .find(|h| h.ledger_id == deleted.ledger.id)
        .unwrap();
    assert_eq!(issued_after.balance_after, issued_before.balance_after);
    assert_eq!(issued_after.balance_after, cents(-4000));
    assert_eq!(history_after.len(), history_before.len());

    // The issuing ledger survives the delete.
    let (_, entries) = LedgerRepository::new(db)
        .find_ledger(deleted.ledger.id)
        .await
        .unwrap();
    assert_eq!(entries.len(), 2);
}

#[tokio::test]
async fn test_deleted_company_rejects_operations() {
    let Some((_db, orchestrator)) = orchestrator().await else {
        return;
    };
    let setup = new_company(&orchestrator, "Delete company").await;
    let company_id = setup.company.id;
    let receipt = issue(&orchestrator, company_id, 1, 500).await;

    orchestrator.soft_delete_company(company_id).await.unwrap();

    let err = orchestrator.company_balance(company_id).await.unwrap_err();
    assert!(matches!(err, LedgerError::CompanyNotFound(_)));

    let err = orchestrator
        .issue_gift_cards(IssueRequest {
            company_id,
            quantity: 1,
            unit_amount: cents(100),
            name: None,
            description: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::CompanyNotFound(_)));

    let err = orchestrator
        .spend(card_ref(&receipt, 0), cents(100))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::GiftCardNotFound(_)));

    let err = orchestrator.list_gift_cards(company_id).await.unwrap_err();
    assert!(matches!(err, LedgerError::CompanyNotFound(_)));

    let err = orchestrator
        .soft_delete_company(company_id)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::CompanyNotFound(_)));
}
