//! Business rule validation for ledger operations.

use std::collections::BTreeSet;

use giftledger_shared::types::Amount;

use super::entry::EntryDraft;
use super::error::LedgerError;

/// Maximum length of a company name.
pub const MAX_COMPANY_NAME_LEN: usize = 100;

/// Maximum length of a gift card name.
pub const MAX_CARD_NAME_LEN: usize = 255;

/// Validates that a set of draft entries forms a valid ledger.
///
/// # Errors
///
/// Returns `InsufficientEntries` for fewer than two entries,
/// `ZeroEntryAmount` for a zero posting, `SingleAccountLedger` when every
/// entry posts to the same account, and `UnbalancedLedger` when the
/// amounts do not sum to zero.
pub fn validate_entries(entries: &[EntryDraft]) -> Result<(), LedgerError> {
    if entries.len() < 2 {
        return Err(LedgerError::InsufficientEntries);
    }

    if let Some(zero) = entries.iter().find(|e| e.amount.is_zero()) {
        return Err(LedgerError::ZeroEntryAmount(zero.account_id));
    }

    let accounts: BTreeSet<_> = entries.iter().map(|e| e.account_id).collect();
    if accounts.len() < 2 {
        return Err(LedgerError::SingleAccountLedger(accounts.len()));
    }

    let sum: Amount = entries.iter().map(|e| e.amount).sum();
    if !sum.is_zero() {
        return Err(LedgerError::UnbalancedLedger { sum });
    }

    Ok(())
}

/// Requires `amount > 0`.
///
/// # Errors
///
/// Returns `NonPositiveAmount` otherwise.
pub fn require_positive(amount: Amount) -> Result<(), LedgerError> {
    if amount.is_positive() {
        Ok(())
    } else {
        Err(LedgerError::NonPositiveAmount(amount))
    }
}

/// Requires `1 <= quantity <= max`.
///
/// # Errors
///
/// Returns `InvalidQuantity` otherwise.
pub fn validate_quantity(quantity: u32, max: u32) -> Result<(), LedgerError> {
    if (1..=max).contains(&quantity) {
        Ok(())
    } else {
        Err(LedgerError::InvalidQuantity { quantity, max })
    }
}

/// Requires a non-blank text value of at most `max` characters and
/// returns it trimmed.
///
/// # Errors
///
/// Returns `EmptyField` if the value is blank, `TooLong` if it exceeds `max`.
pub fn require_text<'a>(
    field: &'static str,
    value: &'a str,
    max: usize,
) -> Result<&'a str, LedgerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::EmptyField(field));
    }
    if trimmed.chars().count() > max {
        return Err(LedgerError::TooLong { field, max });
    }
    Ok(trimmed)
}
