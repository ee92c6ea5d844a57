//! Conversions from entity models to domain projections.

use chrono::Utc;
use giftledger_core::ledger::{Account, Company, GiftCard, LedgerRef};
use giftledger_shared::types::{AccountId, Amount, AmountError, CompanyId, GiftCardId, LedgerId};
use sea_orm::prelude::DateTimeWithTimeZone;

use crate::entities::{accounts, companies, gift_cards, ledger};

pub(crate) fn utc(value: DateTimeWithTimeZone) -> chrono::DateTime<Utc> {
    value.with_timezone(&Utc)
}

impl TryFrom<accounts::Model> for Account {
    type Error = AmountError;

    fn try_from(model: accounts::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: AccountId::new(model.id),
            account_type: model.account_type.into(),
            company_id: CompanyId::new(model.company_id),
            gift_card_id: model.gift_card_id.map(GiftCardId::new),
            allowed_credit: Amount::from_decimal(model.allowed_credit)?,
            created_at: utc(model.created_at),
            deleted_at: model.deleted_at.map(utc),
        })
    }
}

impl From<companies::Model> for Company {
    fn from(model: companies::Model) -> Self {
        Self {
            id: CompanyId::new(model.id),
            name: model.name,
            created_at: utc(model.created_at),
        }
    }
}

impl From<gift_cards::Model> for GiftCard {
    fn from(model: gift_cards::Model) -> Self {
        Self {
            id: GiftCardId::new(model.id),
            code: model.code,
            company_id: CompanyId::new(model.company_id),
            name: model.name,
            description: model.description,
            created_at: utc(model.created_at),
            deleted_at: model.deleted_at.map(utc),
        }
    }
}

impl From<&ledger::Model> for LedgerRef {
    fn from(model: &ledger::Model) -> Self {
        Self {
            id: LedgerId::new(model.id),
            time: utc(model.time),
        }
    }
}
