//! Database layer for the gift card ledger.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Repositories over companies, gift cards, accounts and the ledger
//! - The schema migration with its integrity triggers
//! - [`TransactionOrchestrator`], which runs each ledger operation in one
//!   database transaction

mod convert;
pub mod entities;
pub mod error;
pub mod migration;
pub mod orchestrator;
pub mod repositories;

pub use orchestrator::{CompanySetup, TransactionOrchestrator};
pub use repositories::{
    AccountRepository, BalanceRepository, CompanyRepository, GiftCardRepository, LedgerRepository,
    RowLock,
};

use std::time::Duration;

use giftledger_shared::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .sqlx_logging(false);
    Database::connect(options).await
}
