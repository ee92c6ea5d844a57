//! Balance reads.
//!
//! Balances are derived from `ledger_entries` on every read. Histories read
//! the ordered rows once and hand them to the core running-balance scan.

use std::collections::HashMap;

use giftledger_core::ledger::balance::{running_history, running_history_by_account};
use giftledger_core::ledger::{Account, HistoryEntry, HistoryRecord, LedgerError};
use giftledger_shared::types::{AccountId, Amount, LedgerEntryId, LedgerId};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};

use crate::convert::utc;
use crate::entities::{ledger, ledger_entries};
use crate::error::DbResultExt;

/// Entry joined with its ledger description.
#[derive(Debug, FromQueryResult)]
struct HistoryRow {
    id: i64,
    ledger_id: i64,
    ledger_time: chrono::DateTime<chrono::FixedOffset>,
    account_id: i64,
    amount: Decimal,
    ledger_description: Option<String>,
}

/// Balance repository.
#[derive(Debug, Clone)]
pub struct BalanceRepository {
    db: DatabaseConnection,
}

impl BalanceRepository {
    /// Creates a new balance repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Current balance of an account: the sum of its entries, zero if none.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn current_balance(&self, account_id: AccountId) -> Result<Amount, LedgerError> {
        Self::current_balance_in(&self.db, account_id).await
    }

    /// Current balance of an account on `conn`.
    ///
    /// Inside a transaction that holds the account's row lock this observes
    /// every previously committed entry.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn current_balance_in<C: ConnectionTrait>(
        conn: &C,
        account_id: AccountId,
    ) -> Result<Amount, LedgerError> {
        let total: Option<Option<Decimal>> = ledger_entries::Entity::find()
            .select_only()
            .column_as(Expr::col(ledger_entries::Column::Amount).sum(), "total")
            .filter(ledger_entries::Column::AccountId.eq(account_id.into_inner()))
            .into_tuple()
            .one(conn)
            .await
            .or_storage()?;
        Ok(Amount::from_decimal(total.flatten().unwrap_or_default())?)
    }

    /// Current balances of several accounts. Accounts without entries are
    /// absent from the map.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn balances_in<C: ConnectionTrait>(
        conn: &C,
        account_ids: &[AccountId],
    ) -> Result<HashMap<AccountId, Amount>, LedgerError> {
        if account_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i64, Option<Decimal>)> = ledger_entries::Entity::find()
            .select_only()
            .column(ledger_entries::Column::AccountId)
            .column_as(Expr::col(ledger_entries::Column::Amount).sum(), "total")
            .filter(
                ledger_entries::Column::AccountId
                    .is_in(account_ids.iter().map(|id| id.into_inner())),
            )
            .group_by(ledger_entries::Column::AccountId)
            .into_tuple()
            .all(conn)
            .await
            .or_storage()?;

        rows.into_iter()
            .map(|(id, total)| {
                Amount::from_decimal(total.unwrap_or_default())
                    .map(|amount| (AccountId::new(id), amount))
                    .map_err(LedgerError::from)
            })
            .collect()
    }

    /// Current balances of several accounts, read outside any transaction.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn balances(
        &self,
        account_ids: &[AccountId],
    ) -> Result<HashMap<AccountId, Amount>, LedgerError> {
        Self::balances_in(&self.db, account_ids).await
    }

    /// History of one account, newest first, with running balances.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn account_history(
        &self,
        account: &Account,
    ) -> Result<Vec<HistoryRecord>, LedgerError> {
        let entries = self.history_entries(std::slice::from_ref(account)).await?;
        Ok(running_history(entries))
    }

    /// History across several accounts, newest first, with running balances
    /// partitioned per account.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn accounts_history(
        &self,
        accounts: &[Account],
    ) -> Result<Vec<HistoryRecord>, LedgerError> {
        let entries = self.history_entries(accounts).await?;
        Ok(running_history_by_account(entries))
    }

    async fn history_entries(
        &self,
        accounts: &[Account],
    ) -> Result<Vec<HistoryEntry>, LedgerError> {
        if accounts.is_empty() {
            return Ok(Vec::new());
        }
        let types: HashMap<AccountId, _> =
            accounts.iter().map(|a| (a.id, a.account_type)).collect();

        let rows: Vec<HistoryRow> = ledger_entries::Entity::find()
            .filter(
                ledger_entries::Column::AccountId
                    .is_in(accounts.iter().map(|a| a.id.into_inner())),
            )
            .join(JoinType::InnerJoin, ledger_entries::Relation::Ledger.def())
            .column_as(ledger::Column::Description, "ledger_description")
            .order_by_asc(ledger_entries::Column::LedgerTime)
            .order_by_asc(ledger_entries::Column::Id)
            .into_model::<HistoryRow>()
            .all(&self.db)
            .await
            .or_storage()?;

        rows.into_iter()
            .filter_map(|row| {
                let account_id = AccountId::new(row.account_id);
                let account_type = *types.get(&account_id)?;
                Some(Amount::from_decimal(row.amount).map(|amount| HistoryEntry {
                    entry_id: LedgerEntryId::new(row.id),
                    ledger_id: LedgerId::new(row.ledger_id),
                    time: utc(row.ledger_time),
                    description: row.ledger_description,
                    account_id,
                    account_type,
                    amount,
                }))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(LedgerError::from)
    }
}
