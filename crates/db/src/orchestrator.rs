//! Transaction orchestrator.
//!
//! Runs every ledger operation inside one database transaction:
//! resolve and lock the participating accounts (ascending id order), read
//! balances under the lock, ask [`LedgerService`] for a validated draft,
//! write it, commit. Any error drops the transaction, which rolls back.

use giftledger_core::giftcard::generate_code;
use giftledger_core::ledger::totals::account_totals;
use giftledger_core::ledger::validation::{MAX_COMPANY_NAME_LEN, require_positive, require_text};
use giftledger_core::ledger::{
    Account, AccountRef, AccountType, ByAccountType, Company, GiftCard, GiftCardBalance,
    HistoryRecord, IssueReceipt, IssueRequest, IssuedCard, LedgerError, LedgerService,
    PostingReceipt, PostingStage, TransferKind,
};
use giftledger_shared::LedgerConfig;
use giftledger_shared::types::{AccountId, Amount, CompanyId, UserId};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use tracing::{debug, info, instrument, warn};

use crate::error::DbResultExt;
use crate::repositories::{
    AccountRepository, BalanceRepository, CompanyRepository, GiftCardRepository, LedgerRepository,
    NewGiftCard, RowLock,
};

/// A newly created company with its fixed accounts.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CompanySetup {
    /// The company.
    pub company: Company,
    /// Its company, generic_in and generic_out accounts.
    pub accounts: Vec<Account>,
}

/// Tracks the stage of one write operation and logs transitions.
struct StageLog {
    operation: &'static str,
    stage: PostingStage,
}

impl StageLog {
    fn start(operation: &'static str) -> Self {
        debug!(operation, stage = %PostingStage::Validating, "Posting started");
        Self {
            operation,
            stage: PostingStage::Validating,
        }
    }

    fn advance(&mut self, next: PostingStage) {
        debug!(operation = self.operation, from = %self.stage, to = %next, "Posting stage");
        self.stage = next;
    }

    fn finish<T>(mut self, result: Result<T, LedgerError>) -> Result<T, LedgerError> {
        match &result {
            Ok(_) => self.advance(PostingStage::Committed),
            Err(err) => {
                warn!(
                    operation = self.operation,
                    stage = %self.stage,
                    code = err.error_code(),
                    error = %err,
                    "Posting {}", PostingStage::Aborted
                );
            }
        }
        result
    }
}

/// Orchestrates ledger operations over a database connection.
#[derive(Debug, Clone)]
pub struct TransactionOrchestrator {
    db: DatabaseConnection,
    config: LedgerConfig,
    actor: Option<UserId>,
    accounts: AccountRepository,
    balances: BalanceRepository,
    companies: CompanyRepository,
    gift_cards: GiftCardRepository,
}

impl TransactionOrchestrator {
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: LedgerConfig) -> Self {
        Self {
            accounts: AccountRepository::new(db.clone()),
            balances: BalanceRepository::new(db.clone()),
            companies: CompanyRepository::new(db.clone()),
            gift_cards: GiftCardRepository::new(db.clone()),
            db,
            config,
            actor: None,
        }
    }

    /// Records `actor` in the tracing span of every operation.
    #[must_use]
    pub const fn with_actor(mut self, actor: UserId) -> Self {
        self.actor = Some(actor);
        self
    }

    /// Returns the ledger configuration.
    #[must_use]
    pub const fn config(&self) -> &LedgerConfig {
        &self.config
    }

    async fn begin(&self) -> Result<DatabaseTransaction, LedgerError> {
        self.db.begin().await.or_storage()
    }

    // ========== Companies ==========

    /// Creates a company with its company, generic_in and generic_out accounts.
    ///
    /// # Errors
    ///
    /// Returns `EmptyField`/`TooLong` for a bad name, or a storage error.
    #[instrument(skip(self, metadata), fields(actor = ?self.actor))]
    pub async fn create_company(
        &self,
        name: &str,
        metadata: Option<serde_json::Value>,
    ) -> Result<CompanySetup, LedgerError> {
        let name = require_text("Company name", name, MAX_COMPANY_NAME_LEN)?;

        let txn = self.begin().await?;
        let company = CompanyRepository::insert_in(&txn, name, metadata).await?;
        let mut accounts = Vec::with_capacity(AccountType::FIXED.len());
        for account_type in AccountType::FIXED {
            accounts.push(
                AccountRepository::insert_account(&txn, company.id, account_type, None).await?,
            );
        }
        txn.commit().await.or_storage()?;

        info!(company_id = %company.id, "Company created");
        Ok(CompanySetup { company, accounts })
    }

    /// Soft-deletes a company, its gift cards and all its accounts.
    ///
    /// Account rows are locked first, so in-flight postings finish before
    /// the accounts disappear.
    ///
    /// # Errors
    ///
    /// Returns `CompanyNotFound` if absent or already deleted.
    #[instrument(skip(self), fields(actor = ?self.actor))]
    pub async fn soft_delete_company(&self, company_id: CompanyId) -> Result<(), LedgerError> {
        let txn = self.begin().await?;
        CompanyRepository::find_company_in(&txn, company_id, RowLock::ForUpdate).await?;

        let live = AccountRepository::list_company_accounts_in(&txn, company_id, true).await?;
        let ids: Vec<AccountId> = live.iter().map(|a| a.id).collect();
        AccountRepository::lock_accounts(&txn, &ids).await?;

        let cards = GiftCardRepository::soft_delete_company_cards_in(&txn, company_id).await?;
        let accounts = AccountRepository::soft_delete_company_accounts_in(&txn, company_id).await?;
        CompanyRepository::soft_delete_in(&txn, company_id).await?;
        txn.commit().await.or_storage()?;

        info!(company_id = %company_id, cards, accounts, "Company deleted");
        Ok(())
    }

    // ========== Postings ==========

    /// Issues `quantity` gift cards of `unit_amount` each.
    ///
    /// Each card gets its own gift card account and its own ledger moving
    /// `unit_amount` from the company account. All cards are created in one
    /// transaction; any failure creates none.
    ///
    /// # Errors
    ///
    /// - `InvalidQuantity`, `NonPositiveAmount` for bad arguments
    /// - `CompanyNotFound`, `CompanyAccountNotFound` if the company or its
    ///   company account is missing
    /// - `DuplicateCode` on a code collision
    #[instrument(
        skip(self, request),
        fields(actor = ?self.actor, company_id = %request.company_id, quantity = request.quantity)
    )]
    pub async fn issue_gift_cards(
        &self,
        request: IssueRequest,
    ) -> Result<IssueReceipt, LedgerError> {
        let mut stage = StageLog::start("issue");
        let result = self.issue_inner(&request, &mut stage).await;
        stage.finish(result)
    }

    async fn issue_inner(
        &self,
        request: &IssueRequest,
        stage: &mut StageLog,
    ) -> Result<IssueReceipt, LedgerError> {
        LedgerService::validate_issue(request, &self.config)?;
        let total_value = LedgerService::issue_total(request)?;

        stage.advance(PostingStage::Admitting);
        let txn = self.begin().await?;
        CompanyRepository::find_company_in(&txn, request.company_id, RowLock::None).await?;
        let company_account = AccountRepository::find_account_by_type_and_company_in(
            &txn,
            request.company_id,
            AccountType::Company,
            RowLock::ForUpdate,
        )
        .await?;

        stage.advance(PostingStage::Writing);
        let mut cards = Vec::with_capacity(request.quantity as usize);
        for _ in 0..request.quantity {
            cards.push(self.issue_one(&txn, request, company_account.id).await?);
        }

        let company_balance =
            BalanceRepository::current_balance_in(&txn, company_account.id).await?;
        txn.commit().await.or_storage()?;

        info!(
            company_id = %request.company_id,
            quantity = request.quantity,
            total_value = %total_value,
            "Gift cards issued"
        );
        Ok(IssueReceipt {
            company_id: request.company_id,
            quantity: request.quantity,
            unit_amount: request.unit_amount,
            total_value,
            cards,
            company_balance,
        })
    }

    async fn issue_one(
        &self,
        txn: &DatabaseTransaction,
        request: &IssueRequest,
        company_account: AccountId,
    ) -> Result<IssuedCard, LedgerError> {
        let code = generate_code();
        let name = LedgerService::card_name(request, &self.config, &code);
        let gift_card = GiftCardRepository::insert_in(
            txn,
            NewGiftCard {
                company_id: request.company_id,
                code: &code,
                name: &name,
                description: request.description.as_deref(),
            },
        )
        .await?;

        let account = AccountRepository::insert_account(
            txn,
            request.company_id,
            AccountType::GiftCard,
            Some(gift_card.id),
        )
        .await?;

        let draft = LedgerService::issue_draft(
            request.company_id,
            company_account,
            account.id,
            &code,
            request.unit_amount,
        );
        let (ledger, _) = LedgerRepository::insert_draft(txn, &draft).await?;
        debug!(code = %code, ledger_id = %ledger.id, "Gift card written");

        Ok(IssuedCard {
            gift_card,
            account_id: account.id,
            ledger,
        })
    }

    /// Spends `amount` from `target` into the company's generic_out account.
    ///
    /// Admission (`balance + allowed_credit >= amount`) is checked against
    /// the balance read under the target's row lock.
    ///
    /// # Errors
    ///
    /// - `NonPositiveAmount` if `amount <= 0`
    /// - `GiftCardNotFound`, `AccountNotFound`, `CompanyAccountNotFound`
    /// - `InsufficientBalance` if admission fails
    #[instrument(skip(self), fields(actor = ?self.actor, target = %target, amount = %amount))]
    pub async fn spend(
        &self,
        target: AccountRef,
        amount: Amount,
    ) -> Result<PostingReceipt, LedgerError> {
        let mut stage = StageLog::start("spend");
        let result = self
            .transfer(TransferKind::Spend, &target, amount, &mut stage)
            .await;
        stage.finish(result)
    }

    /// Adds `amount` to `target` from the company's generic_in account.
    ///
    /// # Errors
    ///
    /// - `NonPositiveAmount` if `amount <= 0`
    /// - `GiftCardNotFound`, `AccountNotFound`, `CompanyAccountNotFound`
    #[instrument(skip(self), fields(actor = ?self.actor, target = %target, amount = %amount))]
    pub async fn add_funds(
        &self,
        target: AccountRef,
        amount: Amount,
    ) -> Result<PostingReceipt, LedgerError> {
        let mut stage = StageLog::start("add_funds");
        let result = self
            .transfer(TransferKind::AddFunds, &target, amount, &mut stage)
            .await;
        stage.finish(result)
    }

    async fn transfer(
        &self,
        kind: TransferKind,
        target: &AccountRef,
        amount: Amount,
        stage: &mut StageLog,
    ) -> Result<PostingReceipt, LedgerError> {
        require_positive(amount)?;

        let txn = self.begin().await?;
        let (label, code, resolved) = match target {
            AccountRef::GiftCardCode(code) => {
                let (card, account) =
                    AccountRepository::find_gift_card_account_in(&txn, code, RowLock::None).await?;
                (
                    AccountRef::GiftCardCode(card.code.clone()),
                    Some(card.code),
                    account,
                )
            }
            AccountRef::Account(id) => {
                let account = AccountRepository::find_account_in(&txn, *id, RowLock::None).await?;
                (target.clone(), None, account)
            }
        };
        let counterpart = AccountRepository::find_account_by_type_and_company_in(
            &txn,
            resolved.company_id,
            kind.counterpart(),
            RowLock::None,
        )
        .await?;

        stage.advance(PostingStage::Admitting);
        let locked = AccountRepository::lock_accounts(&txn, &[resolved.id, counterpart.id])
            .await
            .map_err(|err| match (err, &code) {
                (LedgerError::AccountNotFound(id), Some(code)) if id == resolved.id => {
                    LedgerError::GiftCardNotFound(code.clone())
                }
                (err, _) => err,
            })?;
        let find = |id: AccountId| {
            locked
                .iter()
                .find(|a| a.id == id)
                .ok_or(LedgerError::AccountNotFound(id))
        };
        let target_account = find(resolved.id)?;
        let counterpart_account = find(counterpart.id)?;

        let balance = BalanceRepository::current_balance_in(&txn, target_account.id).await?;
        let plan = LedgerService::plan_transfer(
            kind,
            target_account,
            &label,
            counterpart_account,
            amount,
            balance,
        )?;

        stage.advance(PostingStage::Writing);
        let (ledger, _) = LedgerRepository::insert_draft(&txn, &plan.draft).await?;
        txn.commit().await.or_storage()?;

        info!(
            account_id = %target_account.id,
            ledger_id = %ledger.id,
            previous_balance = %plan.previous_balance,
            new_balance = %plan.new_balance,
            "Posting committed"
        );
        Ok(PostingReceipt {
            account_id: target_account.id,
            code,
            amount,
            previous_balance: plan.previous_balance,
            new_balance: plan.new_balance,
            ledger,
        })
    }

    /// Sets the allowed credit (overdraft) of an account.
    ///
    /// # Errors
    ///
    /// Returns `NegativeAllowedCredit` or `AccountNotFound`.
    #[instrument(skip(self), fields(actor = ?self.actor))]
    pub async fn set_allowed_credit(
        &self,
        account_id: AccountId,
        amount: Amount,
    ) -> Result<Account, LedgerError> {
        let account = self.accounts.set_allowed_credit(account_id, amount).await?;
        info!(account_id = %account_id, allowed_credit = %amount, "Allowed credit updated");
        Ok(account)
    }

    /// Soft-deletes a gift card and its account. History is retained.
    ///
    /// # Errors
    ///
    /// Returns `GiftCardNotFound` if absent or already deleted.
    #[instrument(skip(self), fields(actor = ?self.actor))]
    pub async fn soft_delete_gift_card(&self, code: &str) -> Result<(), LedgerError> {
        let txn = self.begin().await?;
        let (card, account) =
            AccountRepository::find_gift_card_account_in(&txn, code, RowLock::ForUpdate).await?;
        AccountRepository::soft_delete_in(&txn, account.id).await?;
        GiftCardRepository::soft_delete_in(&txn, card.id).await?;
        txn.commit().await.or_storage()?;

        info!(code = %card.code, "Gift card deleted");
        Ok(())
    }

    // ========== Reads ==========

    /// Current balance of a gift card or account.
    ///
    /// # Errors
    ///
    /// Returns `GiftCardNotFound` or `AccountNotFound`.
    pub async fn balance(&self, target: &AccountRef) -> Result<Amount, LedgerError> {
        let account = self.resolve(target).await?;
        self.balances.current_balance(account.id).await
    }

    /// Balance view of a gift card.
    ///
    /// # Errors
    ///
    /// Returns `GiftCardNotFound` if absent or deleted.
    pub async fn gift_card_balance(&self, code: &str) -> Result<GiftCardBalance, LedgerError> {
        let (card, account) = self.accounts.find_gift_card_account(code).await?;
        let balance = self.balances.current_balance(account.id).await?;
        Ok(GiftCardBalance {
            code: card.code,
            name: card.name,
            company_id: card.company_id,
            balance,
            created_at: card.created_at,
        })
    }

    /// Balance of a company's company account.
    ///
    /// # Errors
    ///
    /// Returns `CompanyNotFound` or `CompanyAccountNotFound`.
    pub async fn company_balance(&self, company_id: CompanyId) -> Result<Amount, LedgerError> {
        self.companies.find_company(company_id).await?;
        let account = self
            .accounts
            .find_account_by_type_and_company(company_id, AccountType::Company)
            .await?;
        self.balances.current_balance(account.id).await
    }

    /// Sum of balances per account type over live accounts; every type present.
    ///
    /// # Errors
    ///
    /// Returns `CompanyNotFound` if absent or deleted.
    pub async fn company_account_totals(
        &self,
        company_id: CompanyId,
    ) -> Result<ByAccountType<Amount>, LedgerError> {
        self.companies.find_company(company_id).await?;
        let accounts = self.accounts.list_company_accounts(company_id, true).await?;
        let ids: Vec<AccountId> = accounts.iter().map(|a| a.id).collect();
        let balances = self.balances.balances(&ids).await?;
        Ok(account_totals(&accounts, &balances))
    }

    /// History of a gift card, newest first.
    ///
    /// # Errors
    ///
    /// Returns `GiftCardNotFound` if absent or deleted.
    pub async fn gift_card_history(&self, code: &str) -> Result<Vec<HistoryRecord>, LedgerError> {
        let (_, account) = self.accounts.find_gift_card_account(code).await?;
        self.balances.account_history(&account).await
    }

    /// History of a company's non-gift-card accounts, newest first, with
    /// running balances computed per account.
    ///
    /// Filtering by [`AccountType::GiftCard`] yields an empty history.
    ///
    /// # Errors
    ///
    /// Returns `CompanyNotFound` if absent or deleted.
    pub async fn company_history(
        &self,
        company_id: CompanyId,
        account_type: Option<AccountType>,
    ) -> Result<Vec<HistoryRecord>, LedgerError> {
        self.companies.find_company(company_id).await?;
        let accounts: Vec<Account> = self
            .accounts
            .list_company_accounts(company_id, false)
            .await?
            .into_iter()
            .filter(|a| account_type.is_none_or(|t| a.account_type == t))
            .collect();
        self.balances.accounts_history(&accounts).await
    }

    /// Live gift cards of a company, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CompanyNotFound` if absent or deleted.
    pub async fn list_gift_cards(
        &self,
        company_id: CompanyId,
    ) -> Result<Vec<GiftCard>, LedgerError> {
        self.companies.find_company(company_id).await?;
        self.gift_cards.list_gift_cards(company_id).await
    }

    async fn resolve(&self, target: &AccountRef) -> Result<Account, LedgerError> {
        match target {
            AccountRef::GiftCardCode(code) => {
                Ok(self.accounts.find_gift_card_account(code).await?.1)
            }
            AccountRef::Account(id) => self.accounts.find_account(*id).await,
        }
    }
}
