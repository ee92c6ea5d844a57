//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod account;
pub mod balance;
pub mod company;
pub mod gift_card;
pub mod ledger;

pub use account::{AccountRepository, RowLock};
pub use balance::BalanceRepository;
pub use company::CompanyRepository;
pub use gift_card::{GiftCardRepository, NewGiftCard};
pub use ledger::LedgerRepository;
