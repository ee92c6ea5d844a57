//! Schema-level integrity tests.
//!
//! Exercises the database triggers directly: zero-sum check at commit,
//! append-only ledger tables, entry-account guard, and rollback of
//! abandoned transactions.

#![allow(clippy::unwrap_used)]

mod common;

use common::{cents, issue, new_company, orchestrator};
use giftledger_core::ledger::{AccountType, EntryDraft, LedgerDraft};
use giftledger_db::entities::{ledger, ledger_entries};
use giftledger_db::{AccountRepository, BalanceRepository, LedgerRepository};
use giftledger_shared::types::{Amount, CompanyId};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, NotSet, Set, Statement, TransactionTrait,
};

async fn ledger_count(db: &DatabaseConnection, company_id: CompanyId) -> u64 {
    LedgerRepository::new(db.clone())
        .count_company_ledgers(company_id)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_unbalanced_ledger_rejected_at_commit() {
    let Some((db, orchestrator)) = orchestrator().await else {
        return;
    };
    let setup = new_company(&orchestrator, "Unbalanced").await;
    let company_id = setup.company.id;
    let receipt = issue(&orchestrator, company_id, 1, 1000).await;
    let card_account = receipt.cards[0].account_id;
    let before = ledger_count(&db, company_id).await;

    let txn = db.begin().await.unwrap();
    let header = ledger::ActiveModel {
        id: NotSet,
        time: NotSet,
        company_id: Set(company_id.into_inner()),
        description: Set(Some("one-sided".to_string())),
    }
    .insert(&txn)
    .await
    .unwrap();
    ledger_entries::ActiveModel {
        id: NotSet,
        ledger_id: Set(header.id),
        ledger_time: Set(header.time),
        account_id: Set(card_account.into_inner()),
        amount: Set(cents(500).into()),
    }
    .insert(&txn)
    .await
    .unwrap();

    assert!(txn.commit().await.is_err());
    assert_eq!(ledger_count(&db, company_id).await, before);
    assert_eq!(
        BalanceRepository::new(db.clone())
            .current_balance(card_account)
            .await
            .unwrap(),
        cents(1000)
    );
}

#[tokio::test]
async fn test_ledger_without_entries_rejected_at_commit() {
    let Some((db, orchestrator)) = orchestrator().await else {
        return;
    };
    let setup = new_company(&orchestrator, "Empty ledger").await;
    let company_id = setup.company.id;

    let txn = db.begin().await.unwrap();
    ledger::ActiveModel {
        id: NotSet,
        time: NotSet,
        company_id: Set(company_id.into_inner()),
        description: Set(None),
    }
    .insert(&txn)
    .await
    .unwrap();

    assert!(txn.commit().await.is_err());
    assert_eq!(ledger_count(&db, company_id).await, 0);
}

#[tokio::test]
async fn test_single_account_ledger_rejected_at_commit() {
    let Some((db, orchestrator)) = orchestrator().await else {
        return;
    };
    let setup = new_company(&orchestrator, "Single account").await;
    let company_id = setup.company.id;
    let receipt = issue(&orchestrator, company_id, 1, 1000).await;
    let card_account = receipt.cards[0].account_id;
    let before = ledger_count(&db, company_id).await;

    let txn = db.begin().await.unwrap();
    let header = ledger::ActiveModel {
        id: NotSet,
        time: NotSet,
        company_id: Set(company_id.into_inner()),
        description: Set(Some("self-balancing".to_string())),
    }
    .insert(&txn)
    .await
    .unwrap();
    for amount in [-500, 500] {
        ledger_entries::ActiveModel {
            id: NotSet,
            ledger_id: Set(header.id),
            ledger_time: Set(header.time),
            account_id: Set(card_account.into_inner()),
            amount: Set(cents(amount).into()),
        }
        .insert(&txn)
        .await
        .unwrap();
    }

    assert!(txn.commit().await.is_err());
    assert_eq!(ledger_count(&db, company_id).await, before);
}

#[tokio::test]
async fn test_abandoned_transaction_leaves_nothing() {
    let Some((db, orchestrator)) = orchestrator().await else {
        return;
    };
    let setup = new_company(&orchestrator, "Abandoned").await;
    let company_id = setup.company.id;
    let receipt = issue(&orchestrator, company_id, 1, 1000).await;
    let card_account = receipt.cards[0].account_id;
    let generic_out = setup
        .accounts
        .iter()
        .find(|a| a.account_type == AccountType::GenericOut)
        .unwrap()
        .id;
    let before = ledger_count(&db, company_id).await;

    {
        let txn = db.begin().await.unwrap();
        let draft = LedgerDraft::transfer(
            company_id,
            "abandoned spend".to_string(),
            card_account,
            generic_out,
            cents(400),
        );
        LedgerRepository::insert_draft(&txn, &draft).await.unwrap();
        // Dropped without commit.
    }

    assert_eq!(ledger_count(&db, company_id).await, before);
    let balance = orchestrator.balance(&common::card_ref(&receipt, 0)).await;
    assert_eq!(balance.unwrap(), cents(1000));
}

#[tokio::test]
async fn test_failure_mid_write_rolls_back_earlier_ledgers() {
    let Some((db, orchestrator)) = orchestrator().await else {
        return;
    };
    let setup = new_company(&orchestrator, "Mid write").await;
    let company_id = setup.company.id;
    let receipt = issue(&orchestrator, company_id, 2, 1000).await;
    let live = receipt.cards[0].account_id;
    let doomed = receipt.cards[1].account_id;
    let generic_out = setup
        .accounts
        .iter()
        .find(|a| a.account_type == AccountType::GenericOut)
        .unwrap()
        .id;
    orchestrator
        .soft_delete_gift_card(&receipt.cards[1].gift_card.code)
        .await
        .unwrap();
    let before = ledger_count(&db, company_id).await;

    let txn = db.begin().await.unwrap();
    let first = LedgerDraft::transfer(company_id, "first", live, generic_out, cents(100));
    LedgerRepository::insert_draft(&txn, &first).await.unwrap();
    let second = LedgerDraft {
        company_id,
        description: "second".to_string(),
        entries: vec![
            EntryDraft {
                account_id: doomed,
                amount: cents(-100),
            },
            EntryDraft {
                account_id: generic_out,
                amount: cents(100),
            },
        ],
    };
    assert!(LedgerRepository::insert_draft(&txn, &second).await.is_err());
    drop(txn);

    assert_eq!(ledger_count(&db, company_id).await, before);
    let balances = BalanceRepository::new(db.clone());
    assert_eq!(balances.current_balance(live).await.unwrap(), cents(1000));
}

#[tokio::test]
async fn test_ledger_tables_are_append_only() {
    let Some((db, orchestrator)) = orchestrator().await else {
        return;
    };
    let setup = new_company(&orchestrator, "Append only").await;
    let receipt = issue(&orchestrator, setup.company.id, 1, 1000).await;
    let ledger_id = receipt.cards[0].ledger.id.into_inner();

    for sql in [
        format!("UPDATE ledger_entries SET amount = amount * 2 WHERE ledger_id = {ledger_id}"),
        format!("DELETE FROM ledger_entries WHERE ledger_id = {ledger_id}"),
        format!("UPDATE ledger SET description = 'edited' WHERE id = {ledger_id}"),
        format!("DELETE FROM ledger WHERE id = {ledger_id}"),
        "TRUNCATE ledger_entries".to_string(),
    ] {
        let result = db
            .execute(Statement::from_string(db.get_database_backend(), sql.clone()))
            .await;
        assert!(result.is_err(), "statement should be rejected: {sql}");
    }

    assert_eq!(
        orchestrator
            .balance(&common::card_ref(&receipt, 0))
            .await
            .unwrap(),
        cents(1000)
    );
}

#[tokio::test]
async fn test_entry_for_foreign_company_account_rejected() {
    let Some((db, orchestrator)) = orchestrator().await else {
        return;
    };
    let ours = new_company(&orchestrator, "Ours").await;
    let theirs = new_company(&orchestrator, "Theirs").await;
    let accounts = AccountRepository::new(db.clone());
    let our_out = accounts
        .find_account_by_type_and_company(ours.company.id, AccountType::GenericOut)
        .await
        .unwrap();
    let their_in = accounts
        .find_account_by_type_and_company(theirs.company.id, AccountType::GenericIn)
        .await
        .unwrap();

    let txn = db.begin().await.unwrap();
    let draft = LedgerDraft::transfer(
        ours.company.id,
        "cross company".to_string(),
        their_in.id,
        our_out.id,
        cents(100),
    );
    assert!(LedgerRepository::insert_draft(&txn, &draft).await.is_err());
}

#[tokio::test]
async fn test_ledger_round_trip() {
    let Some((db, orchestrator)) = orchestrator().await else {
        return;
    };
    let setup = new_company(&orchestrator, "Lookup").await;
    let receipt = issue(&orchestrator, setup.company.id, 1, 1234).await;
    let key = receipt.cards[0].ledger;

    let ledgers = LedgerRepository::new(db);
    let (header, entries) = ledgers.find_ledger(key.id).await.unwrap();
    assert_eq!(header.key, key);
    assert_eq!(header.company_id, setup.company.id);
    assert_eq!(entries.len(), 2);
    let total: Amount = entries.iter().map(|e| e.amount).sum();
    assert_eq!(total, cents(0));
    let card_account = receipt.cards[0].account_id;
    assert!(
        entries
            .iter()
            .any(|e| e.account_id == card_account && e.amount == cents(1234))
    );
}
