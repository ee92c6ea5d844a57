//! Concurrent access tests.
//!
//! Many spends released at once against one gift card must never admit
//! more than the balance, and the derived balance must equal the sum of
//! committed postings regardless of interleaving.

#![allow(clippy::unwrap_used)]

mod common;

use std::sync::Arc;

use common::{card_ref, cents, issue, new_company, orchestrator};
use futures::future::join_all;
use giftledger_core::ledger::LedgerError;
use tokio::sync::Barrier;

#[tokio::test]
async fn test_concurrent_spends_never_overdraw() {
    let Some((_db, orchestrator)) = orchestrator().await else {
        return;
    };
    let setup = new_company(&orchestrator, "Concurrent").await;
    let receipt = issue(&orchestrator, setup.company.id, 1, 10_000).await;
    let target = card_ref(&receipt, 0);

    const TASKS: usize = 20;
    let barrier = Arc::new(Barrier::new(TASKS));
    let handles = (0..TASKS).map(|_| {
        let orchestrator = orchestrator.clone();
        let barrier = Arc::clone(&barrier);
        let target = target.clone();
        tokio::spawn(async move {
            barrier.wait().await;
            orchestrator.spend(target, cents(1000)).await
        })
    });

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let committed = results.iter().filter(|r| r.is_ok()).count();
    let rejected = results
        .iter()
        .filter(|r| matches!(r, Err(LedgerError::InsufficientBalance { .. })))
        .count();
    assert_eq!(committed, 10, "results: {results:?}");
    assert_eq!(rejected, 10, "results: {results:?}");

    assert_eq!(orchestrator.balance(&target).await.unwrap(), cents(0));

    // Each admitted spend saw a distinct, strictly decreasing balance.
    let mut previous: Vec<_> = results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .map(|receipt| receipt.previous_balance)
        .collect();
    previous.sort();
    let expected: Vec<_> = (1..=10).map(|n| cents(n * 1000)).collect();
    assert_eq!(previous, expected);
}

#[tokio::test]
async fn test_concurrent_mixed_postings_keep_balance_identity() {
    let Some((_db, orchestrator)) = orchestrator().await else {
        return;
    };
    let setup = new_company(&orchestrator, "Mixed").await;
    let receipt = issue(&orchestrator, setup.company.id, 2, 5000).await;
    let first = card_ref(&receipt, 0);
    let second = card_ref(&receipt, 1);

    const TASKS: usize = 40;
    let barrier = Arc::new(Barrier::new(TASKS));
    let handles = (0..TASKS).map(|i| {
        let orchestrator = orchestrator.clone();
        let barrier = Arc::clone(&barrier);
        let target = if i % 2 == 0 { first.clone() } else { second.clone() };
        tokio::spawn(async move {
            barrier.wait().await;
            if i % 4 < 2 {
                orchestrator.spend(target, cents(300)).await
            } else {
                orchestrator.add_funds(target, cents(100)).await
            }
        })
    });

    let results: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();
    assert!(results.iter().all(Result::is_ok), "results: {results:?}");

    // Each card: 10 spends of 3.00 and 10 additions of 1.00.
    for target in [&first, &second] {
        assert_eq!(orchestrator.balance(target).await.unwrap(), cents(3000));
    }

    let totals = orchestrator
        .company_account_totals(setup.company.id)
        .await
        .unwrap();
    let sum = totals
        .iter()
        .fold(cents(0), |acc, (_, amount)| acc + *amount);
    assert_eq!(sum, cents(0));
    assert_eq!(totals.generic_out, cents(6000));
    assert_eq!(totals.generic_in, cents(-2000));
}

#[tokio::test]
async fn test_concurrent_issues_share_company_account() {
    let Some((_db, orchestrator)) = orchestrator().await else {
        return;
    };
    let setup = new_company(&orchestrator, "Issuers").await;
    let company_id = setup.company.id;

    const TASKS: usize = 8;
    let barrier = Arc::new(Barrier::new(TASKS));
    let handles = (0..TASKS).map(|_| {
        let orchestrator = orchestrator.clone();
        let barrier = Arc::clone(&barrier);
        tokio::spawn(async move {
            barrier.wait().await;
            common::issue(&orchestrator, company_id, 5, 100).await
        })
    });

    let receipts: Vec<_> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let mut company_balances: Vec<_> = receipts.iter().map(|r| r.company_balance).collect();
    company_balances.sort();
    company_balances.dedup();
    assert_eq!(company_balances.len(), TASKS);

    assert_eq!(
        orchestrator.company_balance(company_id).await.unwrap(),
        cents(-4000)
    );
    let listed = orchestrator.list_gift_cards(company_id).await.unwrap();
    assert_eq!(listed.len(), 40);
}
