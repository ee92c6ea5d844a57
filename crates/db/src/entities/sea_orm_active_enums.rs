//! Postgres enum types.

use giftledger_core::ledger::AccountType as DomainAccountType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `account_type` enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
pub enum AccountType {
    #[sea_orm(string_value = "company")]
    Company,
    #[sea_orm(string_value = "gift_card")]
    GiftCard,
    #[sea_orm(string_value = "generic_in")]
    GenericIn,
    #[sea_orm(string_value = "generic_out")]
    GenericOut,
}

impl From<AccountType> for DomainAccountType {
    fn from(value: AccountType) -> Self {
        match value {
            AccountType::Company => Self::Company,
            AccountType::GiftCard => Self::GiftCard,
            AccountType::GenericIn => Self::GenericIn,
            AccountType::GenericOut => Self::GenericOut,
        }
    }
}

impl From<DomainAccountType> for AccountType {
    fn from(value: DomainAccountType) -> Self {
        match value {
            DomainAccountType::Company => Self::Company,
            DomainAccountType::GiftCard => Self::GiftCard,
            DomainAccountType::GenericIn => Self::GenericIn,
            DomainAccountType::GenericOut => Self::GenericOut,
        }
    }
}
