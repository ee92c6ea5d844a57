//! Ledger error types.
//!
//! Every failure surfaced by the ledger belongs to one of five kinds
//! (see [`ErrorKind`]). Callers branch on the kind; the variant carries
//! the detail.

use giftledger_shared::AppError;
use giftledger_shared::types::{AccountId, Amount, AmountError, CompanyId, LedgerId};
use thiserror::Error;

use super::types::AccountType;

/// Coarse classification of ledger errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced company, account, card or ledger does not exist or is deleted.
    NotFound,
    /// The request itself is malformed.
    InvalidArgument,
    /// The admission check rejected a debit.
    InsufficientBalance,
    /// A uniqueness constraint was violated.
    Conflict,
    /// The store failed; the operation persisted nothing.
    StorageFailure,
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Not Found ==========
    /// Company not found or soft-deleted.
    #[error("Company not found: {0}")]
    CompanyNotFound(CompanyId),

    /// Account not found or soft-deleted.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// A company has no live account of a required fixed type.
    #[error("Company {company_id} has no {account_type} account")]
    CompanyAccountNotFound {
        /// The company.
        company_id: CompanyId,
        /// The missing account type.
        account_type: AccountType,
    },

    /// Gift card not found or soft-deleted.
    #[error("Gift card not found: {0}")]
    GiftCardNotFound(String),

    /// Ledger not found.
    #[error("Ledger not found: {0}")]
    LedgerNotFound(LedgerId),

    // ========== Invalid Argument ==========
    /// Amount must be strictly positive.
    #[error("Amount must be greater than 0, got {0}")]
    NonPositiveAmount(Amount),

    /// Amount could not be represented.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Issuance quantity outside `1..=max`.
    #[error("Quantity must be between 1 and {max}, got {quantity}")]
    InvalidQuantity {
        /// Requested quantity.
        quantity: u32,
        /// Configured upper bound.
        max: u32,
    },

    /// Allowed credit must not be negative.
    #[error("Allowed credit cannot be negative, got {0}")]
    NegativeAllowedCredit(Amount),

    /// A required text field was empty.
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    /// A text field exceeds its maximum length.
    #[error("{field} cannot be longer than {max} characters")]
    TooLong {
        /// Field name.
        field: &'static str,
        /// Maximum length in characters.
        max: usize,
    },

    /// A ledger must have at least 2 entries.
    #[error("Ledger must have at least 2 entries")]
    InsufficientEntries,

    /// A ledger must touch at least 2 distinct accounts.
    #[error("Ledger must touch at least 2 distinct accounts, touches {0}")]
    SingleAccountLedger(usize),

    /// A ledger entry amount cannot be zero.
    #[error("Entry amount for account {0} cannot be zero")]
    ZeroEntryAmount(AccountId),

    /// Entries of a ledger do not sum to zero.
    #[error("Ledger is not balanced, entries sum to {sum}")]
    UnbalancedLedger {
        /// Sum of all entry amounts.
        sum: Amount,
    },

    /// Account violates the gift card reference or allowed credit rules.
    #[error("Account {0} has an invalid shape")]
    InvalidAccountShape(AccountId),

    /// Source and destination of a transfer are the same account.
    #[error("Account {0} cannot transfer to itself")]
    SelfTransfer(AccountId),

    // ========== Insufficient Balance ==========
    /// Debit would exceed balance plus allowed credit.
    #[error("Insufficient balance: current {current}, requested {requested}")]
    InsufficientBalance {
        /// Balance at admission time.
        current: Amount,
        /// Amount requested.
        requested: Amount,
    },

    // ========== Conflict ==========
    /// Gift card code already taken.
    #[error("Gift card code already exists: {0}")]
    DuplicateCode(String),

    /// Other uniqueness violation.
    #[error("Conflict: {0}")]
    Conflict(String),

    // ========== Storage ==========
    /// Underlying store failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::CompanyNotFound(_)
            | Self::AccountNotFound(_)
            | Self::CompanyAccountNotFound { .. }
            | Self::GiftCardNotFound(_)
            | Self::LedgerNotFound(_) => ErrorKind::NotFound,

            Self::NonPositiveAmount(_)
            | Self::InvalidAmount(_)
            | Self::InvalidQuantity { .. }
            | Self::NegativeAllowedCredit(_)
            | Self::EmptyField(_)
            | Self::TooLong { .. }
            | Self::InsufficientEntries
            | Self::SingleAccountLedger(_)
            | Self::ZeroEntryAmount(_)
            | Self::UnbalancedLedger { .. }
            | Self::InvalidAccountShape(_)
            | Self::SelfTransfer(_) => ErrorKind::InvalidArgument,

            Self::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,

            Self::DuplicateCode(_) | Self::Conflict(_) => ErrorKind::Conflict,

            Self::Storage(_) => ErrorKind::StorageFailure,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::CompanyNotFound(_) => "COMPANY_NOT_FOUND",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::CompanyAccountNotFound { .. } => "COMPANY_ACCOUNT_NOT_FOUND",
            Self::GiftCardNotFound(_) => "GIFT_CARD_NOT_FOUND",
            Self::LedgerNotFound(_) => "LEDGER_NOT_FOUND",
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidQuantity { .. } => "INVALID_QUANTITY",
            Self::NegativeAllowedCredit(_) => "NEGATIVE_ALLOWED_CREDIT",
            Self::EmptyField(_) => "EMPTY_FIELD",
            Self::TooLong { .. } => "TOO_LONG",
            Self::InsufficientEntries => "INSUFFICIENT_ENTRIES",
            Self::SingleAccountLedger(_) => "SINGLE_ACCOUNT_LEDGER",
            Self::ZeroEntryAmount(_) => "ZERO_ENTRY_AMOUNT",
            Self::UnbalancedLedger { .. } => "UNBALANCED_LEDGER",
            Self::InvalidAccountShape(_) => "INVALID_ACCOUNT_SHAPE",
            Self::SelfTransfer(_) => "SELF_TRANSFER",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::DuplicateCode(_) => "DUPLICATE_CODE",
            Self::Conflict(_) => "CONFLICT",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::InvalidArgument => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::InsufficientBalance => 422,
            ErrorKind::StorageFailure => 500,
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// Only storage failures are; every other kind is deterministic for the
    /// same input and state.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::StorageFailure)
    }
}

impl From<AmountError> for LedgerError {
    fn from(err: AmountError) -> Self {
        Self::InvalidAmount(err.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::InvalidArgument => Self::InvalidArgument(message),
            ErrorKind::InsufficientBalance => Self::InsufficientFunds(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::StorageFailure => Self::Storage(message),
        }
    }
}
