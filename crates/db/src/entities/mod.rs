//! `SeaORM` entities for the ledger schema.

pub mod prelude;

pub mod accounts;
pub mod companies;
pub mod gift_cards;
pub mod ledger;
pub mod ledger_entries;
pub mod sea_orm_active_enums;
