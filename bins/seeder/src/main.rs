//! Database seeder for local development.
//!
//! Applies pending migrations, creates a demo company, issues a batch of
//! gift cards and runs a spend and an add-funds against the first card.
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;
use giftledger_core::ledger::{AccountRef, IssueRequest};
use giftledger_db::TransactionOrchestrator;
use giftledger_db::migration::{Migrator, MigratorTrait};
use giftledger_shared::AppConfig;
use giftledger_shared::types::{Amount, UserId};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEMO_CARDS: u32 = 5;
const SEEDER_USER: i32 = 1;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "giftledger_db=debug,seeder=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = giftledger_db::connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    Migrator::up(&db, None)
        .await
        .context("Failed to run migrations")?;
    info!("Migrations applied");

    let orchestrator = TransactionOrchestrator::new(db, config.ledger.clone())
        .with_actor(UserId::new(SEEDER_USER));
    info!(
        max_issue_quantity = orchestrator.config().max_issue_quantity,
        "Ledger configured"
    );

    let setup = orchestrator
        .create_company("Demo Company", Some(serde_json::json!({ "seeded": true })))
        .await?;
    info!(company_id = %setup.company.id, accounts = setup.accounts.len(), "Seeded company");

    let receipt = orchestrator
        .issue_gift_cards(IssueRequest {
            company_id: setup.company.id,
            quantity: DEMO_CARDS,
            unit_amount: Amount::parse("50.00")?,
            name: None,
            description: Some("Seeded demo card".to_string()),
        })
        .await?;
    for card in &receipt.cards {
        info!(code = %card.gift_card.code, name = %card.gift_card.name, "Issued gift card");
    }

    let first = receipt.cards.first().context("No cards issued")?;
    let target = AccountRef::GiftCardCode(first.gift_card.code.clone());

    let spent = orchestrator
        .spend(target.clone(), Amount::parse("12.50")?)
        .await?;
    info!(code = %first.gift_card.code, balance = %spent.new_balance, "Spent from card");

    let added = orchestrator
        .add_funds(target, Amount::parse("5.00")?)
        .await?;
    info!(code = %first.gift_card.code, balance = %added.new_balance, "Added funds to card");

    let totals = orchestrator.company_account_totals(setup.company.id).await?;
    for (account_type, total) in totals.iter() {
        info!(account_type = %account_type, total = %total, "Account type total");
    }

    info!("Seeding complete");
    Ok(())
}
