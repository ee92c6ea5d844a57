//! Application-wide error type.
//!
//! Library crates keep their own precise errors (`LedgerError`,
//! `AmountError`) and convert into [`AppError`] at the edge, where only the
//! category, a stable code and the message matter.

use thiserror::Error;

use crate::types::AmountError;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// A company, account, gift card or ledger is missing or deleted.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request was malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A debit was refused by the balance admission check.
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),

    /// A uniqueness rule was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The store failed and nothing was persisted.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::InvalidArgument(_) => 400,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::InsufficientFunds(_) => 422,
            Self::Storage(_) | Self::Config(_) => 500,
        }
    }

    /// Returns a stable machine-readable code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::InsufficientFunds(_) => "INSUFFICIENT_FUNDS",
            Self::Conflict(_) => "CONFLICT",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Whether retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

impl From<AmountError> for AppError {
    fn from(err: AmountError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
