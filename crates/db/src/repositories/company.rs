//! Company repository.

use chrono::Utc;
use giftledger_core::ledger::{Company, LedgerError};
use giftledger_shared::types::CompanyId;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, NotSet,
    QueryFilter, Set,
};

use super::account::RowLock;
use crate::entities::companies;
use crate::error::DbResultExt;

/// Company repository.
#[derive(Debug, Clone)]
pub struct CompanyRepository {
    db: DatabaseConnection,
}

impl CompanyRepository {
    /// Creates a new company repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a live company.
    ///
    /// # Errors
    ///
    /// Returns `CompanyNotFound` if absent or deleted.
    pub async fn find_company(&self, id: CompanyId) -> Result<Company, LedgerError> {
        Self::find_company_in(&self.db, id, RowLock::None).await
    }

    /// Finds a live company on `conn`.
    ///
    /// # Errors
    ///
    /// Returns `CompanyNotFound` if absent or deleted.
    pub async fn find_company_in<C: ConnectionTrait>(
        conn: &C,
        id: CompanyId,
        lock: RowLock,
    ) -> Result<Company, LedgerError> {
        let select = companies::Entity::find_by_id(id.into_inner())
            .filter(companies::Column::DeletedAt.is_null());
        lock.apply(select)
            .one(conn)
            .await
            .or_storage()?
            .map(Company::from)
            .ok_or(LedgerError::CompanyNotFound(id))
    }

    /// Inserts a company row.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the insert fails.
    pub async fn insert_in<C: ConnectionTrait>(
        conn: &C,
        name: &str,
        metadata: Option<serde_json::Value>,
    ) -> Result<Company, LedgerError> {
        let model = companies::ActiveModel {
            id: NotSet,
            name: Set(name.to_string()),
            metadata: Set(metadata),
            created_at: Set(Utc::now().into()),
            deleted_at: Set(None),
        }
        .insert(conn)
        .await
        .or_storage()?;
        Ok(Company::from(model))
    }

    /// Soft-deletes a company row.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the update fails.
    pub async fn soft_delete_in<C: ConnectionTrait>(
        conn: &C,
        id: CompanyId,
    ) -> Result<(), LedgerError> {
        companies::Entity::update_many()
            .col_expr(
                companies::Column::DeletedAt,
                Expr::current_timestamp().into(),
            )
            .filter(companies::Column::Id.eq(id.into_inner()))
            .filter(companies::Column::DeletedAt.is_null())
            .exec(conn)
            .await
            .or_storage()?;
        Ok(())
    }
}
