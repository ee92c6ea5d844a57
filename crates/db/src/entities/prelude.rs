//! Entity re-exports.

pub use super::accounts::Entity as Accounts;
pub use super::companies::Entity as Companies;
pub use super::gift_cards::Entity as GiftCards;
pub use super::ledger::Entity as Ledger;
pub use super::ledger_entries::Entity as LedgerEntries;
