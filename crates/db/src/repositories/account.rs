//! Account store: account lookups with soft-delete filtering.
//!
//! Every lookup ignores soft-deleted rows. Lookups used by write operations
//! have an `_in` variant that runs on a caller-supplied connection or
//! transaction and can take a row lock.

use std::collections::HashSet;

use chrono::Utc;
use giftledger_core::giftcard::{is_well_formed, normalize_code};
use giftledger_core::ledger::{
    Account, AccountType, ByAccountType, GiftCard, LedgerError, LedgerService,
};
use giftledger_shared::types::{AccountId, Amount, CompanyId, GiftCardId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, NotSet,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};

use crate::entities::{accounts, gift_cards, sea_orm_active_enums};
use crate::error::DbResultExt;

/// Row lock taken by an in-transaction lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowLock {
    /// Plain read.
    None,
    /// `SELECT … FOR UPDATE`.
    ForUpdate,
}

impl RowLock {
    pub(crate) fn apply<E: EntityTrait>(self, select: Select<E>) -> Select<E> {
        match self {
            Self::None => select,
            Self::ForUpdate => select.lock_exclusive(),
        }
    }
}

/// Account repository.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a live account by id.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account is absent or deleted.
    pub async fn find_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        Self::find_account_in(&self.db, id, RowLock::None).await
    }

    /// Finds a live account by id on `conn`.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` if the account is absent or deleted.
    pub async fn find_account_in<C: ConnectionTrait>(
        conn: &C,
        id: AccountId,
        lock: RowLock,
    ) -> Result<Account, LedgerError> {
        let select = accounts::Entity::find_by_id(id.into_inner())
            .filter(accounts::Column::DeletedAt.is_null());
        let model = lock
            .apply(select)
            .one(conn)
            .await
            .or_storage()?
            .ok_or(LedgerError::AccountNotFound(id))?;
        Ok(Account::try_from(model)?)
    }

    /// Finds the live account of a fixed type for a company.
    ///
    /// # Errors
    ///
    /// Returns `CompanyAccountNotFound` if there is none.
    pub async fn find_account_by_type_and_company(
        &self,
        company_id: CompanyId,
        account_type: AccountType,
    ) -> Result<Account, LedgerError> {
        Self::find_account_by_type_and_company_in(&self.db, company_id, account_type, RowLock::None)
            .await
    }

    /// Finds the live account of a fixed type for a company on `conn`.
    ///
    /// Gift card accounts are not unique per company; for
    /// [`AccountType::GiftCard`] the oldest live one is returned.
    ///
    /// # Errors
    ///
    /// Returns `CompanyAccountNotFound` if there is none.
    pub async fn find_account_by_type_and_company_in<C: ConnectionTrait>(
        conn: &C,
        company_id: CompanyId,
        account_type: AccountType,
        lock: RowLock,
    ) -> Result<Account, LedgerError> {
        let select = accounts::Entity::find()
            .filter(accounts::Column::CompanyId.eq(company_id.into_inner()))
            .filter(
                accounts::Column::AccountType
                    .eq(sea_orm_active_enums::AccountType::from(account_type)),
            )
            .filter(accounts::Column::DeletedAt.is_null())
            .order_by_asc(accounts::Column::Id);
        let model = lock
            .apply(select)
            .one(conn)
            .await
            .or_storage()?
            .ok_or(LedgerError::CompanyAccountNotFound {
                company_id,
                account_type,
            })?;
        Ok(Account::try_from(model)?)
    }

    /// Finds a live gift card and its live account by code.
    ///
    /// The code is matched after trimming and uppercasing.
    ///
    /// # Errors
    ///
    /// Returns `GiftCardNotFound` if the card or its account is absent or deleted.
    pub async fn find_gift_card_account(
        &self,
        code: &str,
    ) -> Result<(GiftCard, Account), LedgerError> {
        Self::find_gift_card_account_in(&self.db, code, RowLock::None).await
    }

    /// Finds a live gift card and its live account by code on `conn`.
    ///
    /// The lock, if any, is taken on the account row only.
    ///
    /// # Errors
    ///
    /// Returns `GiftCardNotFound` if the card or its account is absent or deleted.
    pub async fn find_gift_card_account_in<C: ConnectionTrait>(
        conn: &C,
        code: &str,
        lock: RowLock,
    ) -> Result<(GiftCard, Account), LedgerError> {
        let code = normalize_code(code);
        if !is_well_formed(&code) {
            return Err(LedgerError::GiftCardNotFound(code));
        }

        let card = gift_cards::Entity::find()
            .filter(gift_cards::Column::Code.eq(code.as_str()))
            .filter(gift_cards::Column::DeletedAt.is_null())
            .one(conn)
            .await
            .or_storage()?
            .ok_or_else(|| LedgerError::GiftCardNotFound(code.clone()))?;

        let select = accounts::Entity::find()
            .filter(accounts::Column::GiftCardId.eq(card.id))
            .filter(accounts::Column::DeletedAt.is_null());
        let account = lock
            .apply(select)
            .one(conn)
            .await
            .or_storage()?
            .ok_or(LedgerError::GiftCardNotFound(code))?;

        Ok((GiftCard::from(card), Account::try_from(account)?))
    }

    /// Lists live accounts of a company, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn list_company_accounts(
        &self,
        company_id: CompanyId,
        include_gift_cards: bool,
    ) -> Result<Vec<Account>, LedgerError> {
        Self::list_company_accounts_in(&self.db, company_id, include_gift_cards).await
    }

    /// Lists live accounts of a company on `conn`, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn list_company_accounts_in<C: ConnectionTrait>(
        conn: &C,
        company_id: CompanyId,
        include_gift_cards: bool,
    ) -> Result<Vec<Account>, LedgerError> {
        let mut select = accounts::Entity::find()
            .filter(accounts::Column::CompanyId.eq(company_id.into_inner()))
            .filter(accounts::Column::DeletedAt.is_null());
        if !include_gift_cards {
            select = select.filter(
                accounts::Column::AccountType.ne(sea_orm_active_enums::AccountType::GiftCard),
            );
        }

        let models = select
            .order_by_asc(accounts::Column::Id)
            .all(conn)
            .await
            .or_storage()?;
        models
            .into_iter()
            .map(|m| Account::try_from(m).map_err(LedgerError::from))
            .collect()
    }

    /// Groups the live accounts of a company by type; every type is present.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the query fails.
    pub async fn accounts_by_type(
        &self,
        company_id: CompanyId,
    ) -> Result<ByAccountType<Vec<Account>>, LedgerError> {
        let accounts = self.list_company_accounts(company_id, true).await?;
        Ok(giftledger_core::ledger::totals::group_by_type(accounts))
    }

    /// Locks live accounts with `SELECT … FOR UPDATE` in ascending id order.
    ///
    /// Duplicate ids are collapsed. The result is ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for the first id that is absent or deleted.
    pub async fn lock_accounts<C: ConnectionTrait>(
        conn: &C,
        ids: &[AccountId],
    ) -> Result<Vec<Account>, LedgerError> {
        let mut ids = ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        let models = accounts::Entity::find()
            .filter(accounts::Column::Id.is_in(ids.iter().map(|id| id.into_inner())))
            .filter(accounts::Column::DeletedAt.is_null())
            .order_by_asc(accounts::Column::Id)
            .lock_exclusive()
            .all(conn)
            .await
            .or_storage()?;

        let found: HashSet<i64> = models.iter().map(|m| m.id).collect();
        if let Some(missing) = ids.iter().find(|id| !found.contains(&id.into_inner())) {
            return Err(LedgerError::AccountNotFound(*missing));
        }

        models
            .into_iter()
            .map(|m| Account::try_from(m).map_err(LedgerError::from))
            .collect()
    }

    /// Inserts a new account with zero allowed credit.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccountShape` if the type and gift card reference
    /// disagree, `Conflict` if a live fixed account of that type exists.
    pub async fn insert_account<C: ConnectionTrait>(
        conn: &C,
        company_id: CompanyId,
        account_type: AccountType,
        gift_card_id: Option<GiftCardId>,
    ) -> Result<Account, LedgerError> {
        let now = Utc::now();
        let draft = Account {
            id: AccountId::new(0),
            account_type,
            company_id,
            gift_card_id,
            allowed_credit: Amount::ZERO,
            created_at: now,
            deleted_at: None,
        };
        draft.validate_shape()?;

        let model = accounts::ActiveModel {
            id: NotSet,
            account_type: Set(account_type.into()),
            company_id: Set(company_id.into_inner()),
            gift_card_id: Set(gift_card_id.map(GiftCardId::into_inner)),
            allowed_credit: Set(Amount::ZERO.into()),
            created_at: Set(now.into()),
            deleted_at: Set(None),
        }
        .insert(conn)
        .await
        .or_storage()?;

        Ok(Account::try_from(model)?)
    }

    /// Sets the allowed credit of a live account.
    ///
    /// # Errors
    ///
    /// Returns `NegativeAllowedCredit` if `amount < 0`, `AccountNotFound`
    /// if the account is absent or deleted.
    pub async fn set_allowed_credit(
        &self,
        id: AccountId,
        amount: Amount,
    ) -> Result<Account, LedgerError> {
        LedgerService::validate_allowed_credit(amount)?;

        let txn = self.db.begin().await.or_storage()?;
        Self::find_account_in(&txn, id, RowLock::ForUpdate).await?;

        let model = accounts::ActiveModel {
            id: Set(id.into_inner()),
            allowed_credit: Set(amount.into()),
            ..Default::default()
        }
        .update(&txn)
        .await
        .or_storage()?;

        txn.commit().await.or_storage()?;
        Ok(Account::try_from(model)?)
    }

    /// Soft-deletes one account.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the update fails.
    pub async fn soft_delete_in<C: ConnectionTrait>(
        conn: &C,
        id: AccountId,
    ) -> Result<(), LedgerError> {
        accounts::Entity::update_many()
            .col_expr(
                accounts::Column::DeletedAt,
                Expr::current_timestamp().into(),
            )
            .filter(accounts::Column::Id.eq(id.into_inner()))
            .filter(accounts::Column::DeletedAt.is_null())
            .exec(conn)
            .await
            .or_storage()?;
        Ok(())
    }

    /// Soft-deletes every live account of a company.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the update fails.
    pub async fn soft_delete_company_accounts_in<C: ConnectionTrait>(
        conn: &C,
        company_id: CompanyId,
    ) -> Result<u64, LedgerError> {
        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::DeletedAt,
                Expr::current_timestamp().into(),
            )
            .filter(accounts::Column::CompanyId.eq(company_id.into_inner()))
            .filter(accounts::Column::DeletedAt.is_null())
            .exec(conn)
            .await
            .or_storage()?;
        Ok(result.rows_affected)
    }
}
