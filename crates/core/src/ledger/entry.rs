//! Ledger drafts: what a posting writes before it has been persisted.

use giftledger_shared::types::{AccountId, Amount, CompanyId};

use super::error::LedgerError;
use super::validation::validate_entries;

/// A single signed posting to an account, not yet persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryDraft {
    /// Account the amount is posted to.
    pub account_id: AccountId,
    /// Signed amount (negative = debit from the account).
    pub amount: Amount,
}

/// A ledger header plus its entries, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerDraft {
    /// Company the event belongs to.
    pub company_id: CompanyId,
    /// Human-readable description.
    pub description: String,
    /// Entries; must sum to zero.
    pub entries: Vec<EntryDraft>,
}

impl LedgerDraft {
    /// Builds a two-entry draft moving `amount` from `from` to `to`.
    ///
    /// `from` receives `-amount`, `to` receives `+amount`.
    #[must_use]
    pub fn transfer(
        company_id: CompanyId,
        description: impl Into<String>,
        from: AccountId,
        to: AccountId,
        amount: Amount,
    ) -> Self {
        Self {
            company_id,
            description: description.into(),
            entries: vec![
                EntryDraft {
                    account_id: from,
                    amount: -amount,
                },
                EntryDraft {
                    account_id: to,
                    amount,
                },
            ],
        }
    }

    /// Sum of all entry amounts. Zero for a balanced draft.
    #[must_use]
    pub fn total(&self) -> Amount {
        self.entries.iter().map(|e| e.amount).sum()
    }

    /// Net amount this draft posts to `account_id`.
    #[must_use]
    pub fn net_for(&self, account_id: AccountId) -> Amount {
        self.entries
            .iter()
            .filter(|e| e.account_id == account_id)
            .map(|e| e.amount)
            .sum()
    }

    /// Checks the double-entry rules before the draft is written.
    ///
    /// # Errors
    ///
    /// See [`validate_entries`].
    pub fn validate(&self) -> Result<(), LedgerError> {
        validate_entries(&self.entries)
    }
}
