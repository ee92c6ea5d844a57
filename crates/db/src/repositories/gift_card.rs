//! Gift card repository.

use chrono::Utc;
use giftledger_core::ledger::{GiftCard, LedgerError};
use giftledger_shared::types::{CompanyId, GiftCardId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, NotSet,
    QueryFilter, QueryOrder, Set,
};

use crate::entities::gift_cards;
use crate::error::DbResultExt;

/// Input for inserting a gift card row.
#[derive(Debug, Clone)]
pub struct NewGiftCard<'a> {
    /// Issuing company.
    pub company_id: CompanyId,
    /// Normalized code.
    pub code: &'a str,
    /// Display name.
    pub name: &'a str,
    /// Optional description.
    pub description: Option<&'a str>,
}

/// Gift card repository.
#[derive(Debug, Clone)]
pub struct GiftCardRepository {
    db: DatabaseConnection,
}

impl GiftCardRepository {
    /// Creates a new gift card repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts a gift card row.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCode` if the code is taken.
    pub async fn insert_in<C: ConnectionTrait>(
        conn: &C,
        card: NewGiftCard<'_>,
    ) -> Result<GiftCard, LedgerError> {
        let model = gift_cards::ActiveModel {
            id: NotSet,
            code: Set(card.code.to_string()),
            company_id: Set(card.company_id.into_inner()),
            name: Set(card.name.to_string()),
            description: Set(card.description.map(str::to_string)),
            created_at: Set(Utc::now().into()),
            deleted_at: Set(None),
        }
        .insert(conn)
        .await
        .or_storage()
        .map_err(|err| match err {
            LedgerError::Conflict(_) => LedgerError::DuplicateCode(card.code.to_string()),
            other => other,
        })?;
        Ok(GiftCard::from(model))
    }

    /// Lists live gift cards of a company, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn list_gift_cards(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<GiftCard>, LedgerError> {
        let models = gift_cards::Entity::find()
            .filter(gift_cards::Column::CompanyId.eq(company_id.into_inner()))
            .filter(gift_cards::Column::DeletedAt.is_null())
            .order_by_desc(gift_cards::Column::CreatedAt)
            .order_by_desc(gift_cards::Column::Id)
            .all(&self.db)
            .await
            .or_storage()?;
        Ok(models.into_iter().map(GiftCard::from).collect())
    }

    /// Soft-deletes one gift card.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the update fails.
    pub async fn soft_delete_in<C: ConnectionTrait>(
        conn: &C,
        id: GiftCardId,
    ) -> Result<(), LedgerError> {
        gift_cards::Entity::update_many()
            .col_expr(
                gift_cards::Column::DeletedAt,
                Expr::current_timestamp().into(),
            )
            .filter(gift_cards::Column::Id.eq(id.into_inner()))
            .filter(gift_cards::Column::DeletedAt.is_null())
            .exec(conn)
            .await
            .or_storage()?;
        Ok(())
    }

    /// Soft-deletes every live gift card of a company.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the update fails.
    pub async fn soft_delete_company_cards_in<C: ConnectionTrait>(
        conn: &C,
        company_id: CompanyId,
    ) -> Result<u64, LedgerError> {
        let result = gift_cards::Entity::update_many()
            .col_expr(
                gift_cards::Column::DeletedAt,
                Expr::current_timestamp().into(),
            )
            .filter(gift_cards::Column::CompanyId.eq(company_id.into_inner()))
            .filter(gift_cards::Column::DeletedAt.is_null())
            .exec(conn)
            .await
            .or_storage()?;
        Ok(result.rows_affected)
    }
}
