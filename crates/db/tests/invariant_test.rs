//! Randomized operation sequences checked against an in-memory model.
//!
//! After every operation each card's derived balance must match the model,
//! and no balance may drop below the card's allowed credit. At the end the
//! company's accounts must sum to zero and every card's history must
//! reproduce its balance.

#![allow(clippy::unwrap_used)]

mod common;

use common::{cents, issue, new_company, orchestrator};
use giftledger_core::ledger::{AccountRef, LedgerError};
use giftledger_shared::types::Amount;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CARDS: usize = 4;
const STEPS: usize = 60;

#[tokio::test]
async fn test_random_operations_preserve_balances() {
    let Some((_db, orchestrator)) = orchestrator().await else {
        return;
    };
    let setup = new_company(&orchestrator, "Random").await;
    let receipt = issue(&orchestrator, setup.company.id, CARDS as u32, 2000).await;

    let mut rng = StdRng::seed_from_u64(0x6766_7463);
    let mut model = vec![cents(2000); CARDS];
    let mut credit = vec![cents(0); CARDS];

    credit[0] = cents(1500);
    orchestrator
        .set_allowed_credit(receipt.cards[0].account_id, credit[0])
        .await
        .unwrap();

    for _ in 0..STEPS {
        let index = rng.random_range(0..CARDS);
        let amount = cents(rng.random_range(1..=1500));
        let target = if rng.random_bool(0.5) {
            AccountRef::GiftCardCode(receipt.cards[index].gift_card.code.clone())
        } else {
            AccountRef::Account(receipt.cards[index].account_id)
        };

        if rng.random_bool(0.7) {
            match orchestrator.spend(target.clone(), amount).await {
                Ok(posted) => {
                    assert!(model[index] + credit[index] >= amount);
                    assert_eq!(posted.previous_balance, model[index]);
                    model[index] = model[index] - amount;
                }
                Err(LedgerError::InsufficientBalance { current, requested }) => {
                    assert_eq!(current, model[index]);
                    assert_eq!(requested, amount);
                    assert!(model[index] + credit[index] < amount);
                }
                Err(other) => panic!("unexpected error: {other}"),
            }
        } else {
            let posted = orchestrator
                .add_funds(target.clone(), amount)
                .await
                .unwrap();
            model[index] = model[index] + amount;
            assert_eq!(posted.new_balance, model[index]);
        }

        let balance = orchestrator.balance(&target).await.unwrap();
        assert_eq!(balance, model[index]);
        assert!(balance + credit[index] >= cents(0));
    }

    let totals = orchestrator
        .company_account_totals(setup.company.id)
        .await
        .unwrap();
    let sum = totals
        .iter()
        .fold(cents(0), |acc, (_, amount)| acc + *amount);
    assert_eq!(sum, cents(0));
    assert_eq!(totals.gift_card, model.iter().copied().sum::<Amount>());

    for (card, expected) in receipt.cards.iter().zip(&model) {
        let history = orchestrator
            .gift_card_history(&card.gift_card.code)
            .await
            .unwrap();
        let derived: Amount = history.iter().map(|h| h.amount).sum();
        assert_eq!(derived, *expected);
        assert_eq!(history[0].balance_after, *expected);
    }
}
