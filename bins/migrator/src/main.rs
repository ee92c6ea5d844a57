//! Database migration runner for the gift card ledger.
//!
//! Usage:
//!   migrator up      - Apply the ledger schema and its triggers
//!   migrator down    - Drop the ledger schema
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations
//!
//! Reads `DATABASE_URL` (a `.env` file is honoured).

use giftledger_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // The migrator CLI installs its own tracing subscriber.
    cli::run_cli(Migrator).await;
}
