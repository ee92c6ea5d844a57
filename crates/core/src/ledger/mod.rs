//! Double-entry bookkeeping logic.
//!
//! This module implements the core ledger functionality:
//! - Account, gift card and ledger domain types
//! - Ledger drafts and their validation
//! - Balance derivation, admission and running histories
//! - Per-type company totals
//! - Ledger service building drafts for issue, spend and add funds
//! - Error types for ledger operations

pub mod balance;
pub mod entry;
pub mod error;
pub mod service;
pub mod totals;
pub mod types;
pub mod validation;

#[cfg(test)]
mod balance_props;
#[cfg(test)]
mod service_props;

pub use balance::{HistoryEntry, HistoryRecord, admit_debit, is_spendable};
pub use entry::{EntryDraft, LedgerDraft};
pub use error::{ErrorKind, LedgerError};
pub use service::{LedgerService, TransferKind, TransferPlan};
pub use types::{
    Account, AccountRef, AccountType, ByAccountType, Company, GiftCard, GiftCardBalance,
    IssueReceipt, IssueRequest, IssuedCard, Ledger, LedgerEntry, LedgerRef, PostingReceipt,
    PostingStage,
};
