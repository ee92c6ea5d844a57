//! Balance derivation and admission.
//!
//! Balances are never stored. An account's balance is the sum of the
//! amounts of all its ledger entries; running balances in histories are
//! prefix sums over entries ordered by `(time, entry id)`.

use chrono::{DateTime, Utc};
use giftledger_shared::types::{AccountId, Amount, LedgerEntryId, LedgerId};
use serde::Serialize;

use super::error::LedgerError;
use super::types::AccountType;

/// Sums entry amounts into a balance.
#[must_use]
pub fn sum_amounts<'a>(amounts: impl IntoIterator<Item = &'a Amount>) -> Amount {
    amounts.into_iter().sum()
}

/// Returns true if `requested` may be debited from an account holding
/// `balance` with `allowed_credit` of overdraft.
#[must_use]
pub fn is_spendable(balance: Amount, allowed_credit: Amount, requested: Amount) -> bool {
    balance + allowed_credit >= requested
}

/// Admission check for a debit.
///
/// Must be evaluated against the balance observed under the same lock
/// that protects the subsequent write.
///
/// # Errors
///
/// Returns `InsufficientBalance` when [`is_spendable`] is false.
pub fn admit_debit(
    balance: Amount,
    allowed_credit: Amount,
    requested: Amount,
) -> Result<(), LedgerError> {
    if is_spendable(balance, allowed_credit, requested) {
        Ok(())
    } else {
        Err(LedgerError::InsufficientBalance {
            current: balance,
            requested,
        })
    }
}

/// A committed entry joined with its ledger header, input to history
/// computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Entry ID; breaks ties between entries at the same time.
    pub entry_id: LedgerEntryId,
    /// Ledger the entry belongs to.
    pub ledger_id: LedgerId,
    /// Ledger event time.
    pub time: DateTime<Utc>,
    /// Ledger description.
    pub description: Option<String>,
    /// Account posted to.
    pub account_id: AccountId,
    /// Type of that account.
    pub account_type: AccountType,
    /// Signed amount.
    pub amount: Amount,
}

/// One row of an account history with its running balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryRecord {
    /// Entry ID.
    pub entry_id: LedgerEntryId,
    /// Ledger ID.
    pub ledger_id: LedgerId,
    /// Ledger event time.
    pub timestamp: DateTime<Utc>,
    /// Ledger description.
    pub description: Option<String>,
    /// Account posted to.
    pub account_id: AccountId,
    /// Type of that account.
    pub account_type: AccountType,
    /// Signed amount.
    pub amount: Amount,
    /// Balance of `account_id` after this entry.
    pub balance_after: Amount,
}

fn chronological(a: &HistoryEntry, b: &HistoryEntry) -> std::cmp::Ordering {
    (a.time, a.entry_id).cmp(&(b.time, b.entry_id))
}

fn newest_first(records: &mut [HistoryRecord]) {
    records.sort_by(|a, b| (b.timestamp, b.entry_id).cmp(&(a.timestamp, a.entry_id)));
}

fn record(entry: HistoryEntry, balance_after: Amount) -> HistoryRecord {
    HistoryRecord {
        entry_id: entry.entry_id,
        ledger_id: entry.ledger_id,
        timestamp: entry.time,
        description: entry.description,
        account_id: entry.account_id,
        account_type: entry.account_type,
        amount: entry.amount,
        balance_after,
    }
}

/// Computes the history of a single account, newest first.
///
/// The running balance accumulates every entry passed in, regardless of
/// account, so callers pass entries of one account only.
#[must_use]
pub fn running_history(mut entries: Vec<HistoryEntry>) -> Vec<HistoryRecord> {
    entries.sort_by(chronological);
    let mut balance = Amount::ZERO;
    let mut records: Vec<HistoryRecord> = entries
        .into_iter()
        .map(|entry| {
            balance += entry.amount;
            record(entry, balance)
        })
        .collect();
    records.reverse();
    records
}

/// Computes a history across several accounts, newest first.
///
/// Each record's running balance covers only entries of its own account.
#[must_use]
pub fn running_history_by_account(mut entries: Vec<HistoryEntry>) -> Vec<HistoryRecord> {
    entries.sort_by(|a, b| {
        a.account_id
            .cmp(&b.account_id)
            .then_with(|| chronological(a, b))
    });

    let mut records = Vec::with_capacity(entries.len());
    let mut current: Option<AccountId> = None;
    let mut balance = Amount::ZERO;
    for entry in entries {
        if current != Some(entry.account_id) {
            current = Some(entry.account_id);
            balance = Amount::ZERO;
        }
        balance += entry.amount;
        records.push(record(entry, balance));
    }

    newest_first(&mut records);
    records
}
