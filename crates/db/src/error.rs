//! Mapping of database errors into ledger errors.

use giftledger_core::ledger::LedgerError;
use sea_orm::{DbErr, SqlErr};

/// Maps a database error to a ledger error.
///
/// Unique violations become `Conflict`; everything else is a retryable
/// storage failure.
#[must_use]
pub fn map_db_err(err: DbErr) -> LedgerError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => LedgerError::Conflict(detail),
        _ => LedgerError::Storage(err.to_string()),
    }
}

/// Converts `Result<T, DbErr>` into `Result<T, LedgerError>`.
pub trait DbResultExt<T> {
    /// Applies [`map_db_err`] to the error.
    ///
    /// # Errors
    ///
    /// Returns the mapped error if `self` is `Err`.
    fn or_storage(self) -> Result<T, LedgerError>;
}

impl<T> DbResultExt<T> for Result<T, DbErr> {
    fn or_storage(self) -> Result<T, LedgerError> {
        self.map_err(map_db_err)
    }
}
