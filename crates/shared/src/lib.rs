//! Shared types, errors, and configuration for Giftledger.
//!
//! This crate provides common types used across all other crates:
//! - `Amount`, a fixed-scale decimal for money
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, DatabaseConfig, LedgerConfig};
pub use error::{AppError, AppResult};
