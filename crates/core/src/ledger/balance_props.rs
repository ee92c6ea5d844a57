//! Property-based tests for balance derivation and admission.

use chrono::{DateTime, TimeZone, Utc};
use giftledger_shared::types::{AccountId, Amount, LedgerEntryId, LedgerId};
use proptest::prelude::*;

use super::balance::{
    HistoryEntry, admit_debit, is_spendable, running_history, running_history_by_account,
};
use super::types::AccountType;

/// Strategy for a signed amount between -10,000.00 and 10,000.00, never zero.
fn nonzero_amount() -> impl Strategy<Value = Amount> {
    prop_oneof![(1i64..1_000_000i64), (-1_000_000i64..-1i64)].prop_map(Amount::from_cents)
}

/// Strategy for a non-negative amount up to 10,000.00.
fn non_negative_amount() -> impl Strategy<Value = Amount> {
    (0i64..1_000_000i64).prop_map(Amount::from_cents)
}

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_767_225_600 + secs, 0).unwrap()
}

/// Entries with unique ids, arbitrary (possibly colliding) times, spread
/// over up to four accounts.
fn entries() -> impl Strategy<Value = Vec<HistoryEntry>> {
    prop::collection::vec((0i64..50, 1i64..5, nonzero_amount()), 0..40).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (secs, account, amount))| {
                let id = i64::try_from(i).unwrap() + 1;
                HistoryEntry {
                    entry_id: LedgerEntryId::new(id),
                    ledger_id: LedgerId::new(id),
                    time: at(secs),
                    description: None,
                    account_id: AccountId::new(account),
                    account_type: AccountType::GiftCard,
                    amount,
                }
            })
            .collect()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Admission accepts exactly when balance + credit covers the request.
    #[test]
    fn prop_admission_matches_threshold(
        balance in nonzero_amount(),
        credit in non_negative_amount(),
        requested in nonzero_amount(),
    ) {
        let admitted = admit_debit(balance, credit, requested).is_ok();
        prop_assert_eq!(admitted, balance + credit >= requested);
        prop_assert_eq!(admitted, is_spendable(balance, credit, requested));
    }

    /// An admitted debit never drives the balance below -allowed_credit.
    #[test]
    fn prop_admitted_debit_respects_credit(
        balance in nonzero_amount(),
        credit in non_negative_amount(),
        requested in nonzero_amount(),
    ) {
        if admit_debit(balance, credit, requested).is_ok() {
            prop_assert!(balance - requested >= -credit);
        }
    }

    /// The newest record's balance equals the sum of all entries, and each
    /// record's balance equals the next older one plus its amount.
    #[test]
    fn prop_running_balance_is_prefix_sum(mut rows in entries()) {
        for row in &mut rows {
            row.account_id = AccountId::new(1);
        }
        let total: Amount = rows.iter().map(|e| e.amount).sum();
        let records = running_history(rows);

        if let Some(newest) = records.first() {
            prop_assert_eq!(newest.balance_after, total);
        }
        for pair in records.windows(2) {
            let (newer, older) = (&pair[0], &pair[1]);
            prop_assert_eq!(newer.balance_after, older.balance_after + newer.amount);
            prop_assert!((newer.timestamp, newer.entry_id) > (older.timestamp, older.entry_id));
        }
        if let Some(oldest) = records.last() {
            prop_assert_eq!(oldest.balance_after, oldest.amount);
        }
    }

    /// Per-account running balances end at each account's own sum.
    #[test]
    fn prop_partitioned_history_per_account(rows in entries()) {
        let mut expected = std::collections::HashMap::<AccountId, Amount>::new();
        for row in &rows {
            *expected.entry(row.account_id).or_default() += row.amount;
        }
        let len = rows.len();
        let records = running_history_by_account(rows);
        prop_assert_eq!(records.len(), len);

        let mut seen = std::collections::HashSet::new();
        for record in &records {
            // Newest-first: the first record seen for an account is its latest.
            if seen.insert(record.account_id) {
                prop_assert_eq!(record.balance_after, expected[&record.account_id]);
            }
        }
    }
}
