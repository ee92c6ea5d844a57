//! Core business logic for Giftledger.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and balance calculations live here.
//!
//! # Modules
//!
//! - `ledger` - Double-entry bookkeeping: accounts, drafts, balances, errors
//! - `giftcard` - Gift card code generation and normalization

pub mod giftcard;
pub mod ledger;
