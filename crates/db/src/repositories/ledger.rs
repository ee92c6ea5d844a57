//! Ledger store: append-only ledger headers and entries.
//!
//! Rows are only ever inserted. The schema rejects UPDATE and DELETE and
//! re-checks at commit that every ledger balances.

use giftledger_core::ledger::{Ledger, LedgerDraft, LedgerEntry, LedgerError, LedgerRef};
use giftledger_shared::types::{AccountId, Amount, CompanyId, LedgerEntryId, LedgerId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, NotSet,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};

use crate::entities::{ledger, ledger_entries};
use crate::error::DbResultExt;

fn entry_from_model(
    model: ledger_entries::Model,
    key: LedgerRef,
) -> Result<LedgerEntry, LedgerError> {
    Ok(LedgerEntry {
        id: LedgerEntryId::new(model.id),
        ledger: key,
        account_id: AccountId::new(model.account_id),
        amount: Amount::from_decimal(model.amount)?,
    })
}

/// Ledger repository.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    db: DatabaseConnection,
}

impl LedgerRepository {
    /// Creates a new ledger repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Writes a draft: one header, then its entries.
    ///
    /// The header's `time` is assigned by the database; entries reference
    /// the returned `(id, time)`. Call within a transaction so the deferred
    /// balance check sees the complete ledger.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the draft is unbalanced, or a storage
    /// error if an insert fails.
    pub async fn insert_draft<C: ConnectionTrait>(
        conn: &C,
        draft: &LedgerDraft,
    ) -> Result<(LedgerRef, Vec<LedgerEntry>), LedgerError> {
        draft.validate()?;

        let header = ledger::ActiveModel {
            id: NotSet,
            time: NotSet,
            company_id: Set(draft.company_id.into_inner()),
            description: Set(Some(draft.description.clone())),
        }
        .insert(conn)
        .await
        .or_storage()?;
        let key = LedgerRef::from(&header);

        let mut entries = Vec::with_capacity(draft.entries.len());
        for entry in &draft.entries {
            let model = ledger_entries::ActiveModel {
                id: NotSet,
                ledger_id: Set(header.id),
                ledger_time: Set(header.time),
                account_id: Set(entry.account_id.into_inner()),
                amount: Set(entry.amount.into()),
            }
            .insert(conn)
            .await
            .or_storage()?;
            entries.push(entry_from_model(model, key)?);
        }

        Ok((key, entries))
    }

    /// Loads a ledger header with its entries.
    ///
    /// # Errors
    ///
    /// Returns `LedgerNotFound` if there is no such ledger.
    pub async fn find_ledger(
        &self,
        id: LedgerId,
    ) -> Result<(Ledger, Vec<LedgerEntry>), LedgerError> {
        let header = ledger::Entity::find()
            .filter(ledger::Column::Id.eq(id.into_inner()))
            .one(&self.db)
            .await
            .or_storage()?
            .ok_or(LedgerError::LedgerNotFound(id))?;
        let key = LedgerRef::from(&header);

        let models = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::LedgerId.eq(header.id))
            .filter(ledger_entries::Column::LedgerTime.eq(header.time))
            .order_by_asc(ledger_entries::Column::Id)
            .all(&self.db)
            .await
            .or_storage()?;
        let entries = models
            .into_iter()
            .map(|m| entry_from_model(m, key))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((
            Ledger {
                key,
                company_id: CompanyId::new(header.company_id),
                description: header.description,
            },
            entries,
        ))
    }

    /// Counts ledgers written for a company.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn count_company_ledgers(&self, company_id: CompanyId) -> Result<u64, LedgerError> {
        ledger::Entity::find()
            .filter(ledger::Column::CompanyId.eq(company_id.into_inner()))
            .count(&self.db)
            .await
            .or_storage()
    }
}
