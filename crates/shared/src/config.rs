//! Application configuration management.
//!
//! Configuration is passed explicitly into the components that need it;
//! nothing here is read from process-wide state after startup.

use config::{ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Ledger behaviour configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout_secs() -> u64 {
    8
}

/// Ledger configuration consumed by the transaction orchestrator.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Upper bound on cards created by a single issuance.
    #[serde(default = "default_max_issue_quantity")]
    pub max_issue_quantity: u32,
    /// Prefix of the generated name when a card is issued without one.
    #[serde(default = "default_card_name_prefix")]
    pub card_name_prefix: String,
}

fn default_max_issue_quantity() -> u32 {
    1000
}

fn default_card_name_prefix() -> String {
    "Gift Card".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_issue_quantity: default_max_issue_quantity(),
            card_name_prefix: default_card_name_prefix(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, lowest precedence first: `config/default`,
    /// `config/{RUN_MODE}`, then `GIFTLEDGER__SECTION__KEY` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let builder = config::Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(Environment::with_prefix("GIFTLEDGER").separator("__"));

        Self::from_builder(builder)
    }

    /// Builds configuration from an already assembled set of sources.
    ///
    /// # Errors
    ///
    /// Returns an error if a required key is missing or has the wrong type.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }
}
