//! Ledger service: turns requests into validated drafts.
//!
//! This module provides the business rules of every posting operation
//! (issue, spend, add funds) with no database dependencies. The
//! orchestrator in the db crate resolves and locks accounts, reads
//! balances, and then asks this service for the draft to write.

use giftledger_shared::LedgerConfig;
use giftledger_shared::types::{AccountId, Amount, CompanyId};

use super::balance::admit_debit;
use super::entry::LedgerDraft;
use super::error::LedgerError;
use super::types::{Account, AccountRef, AccountType, IssueRequest};
use super::validation::{MAX_CARD_NAME_LEN, require_positive, require_text, validate_quantity};
use crate::giftcard::default_card_name;

/// Direction of a single-target transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferKind {
    /// Move value from the target to the company's `generic_out` sink.
    Spend,
    /// Move value from the company's `generic_in` source to the target.
    AddFunds,
}

impl TransferKind {
    /// The company account on the other side of the transfer.
    #[must_use]
    pub const fn counterpart(self) -> AccountType {
        match self {
            Self::Spend => AccountType::GenericOut,
            Self::AddFunds => AccountType::GenericIn,
        }
    }

    /// Returns true if the target is debited and must pass admission.
    #[must_use]
    pub const fn debits_target(self) -> bool {
        matches!(self, Self::Spend)
    }

    const fn verb(self) -> &'static str {
        match self {
            Self::Spend => "spend",
            Self::AddFunds => "add funds",
        }
    }
}

/// A validated transfer, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    /// The draft to persist.
    pub draft: LedgerDraft,
    /// Target balance before the transfer.
    pub previous_balance: Amount,
    /// Target balance after the transfer.
    pub new_balance: Amount,
}

/// Ledger service for posting validation.
///
/// This service contains pure business logic with no database dependencies.
pub struct LedgerService;

impl LedgerService {
    /// Validates an issuance request against configured limits.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity`, `NonPositiveAmount`, or `TooLong` for an
    /// oversized card name.
    pub fn validate_issue(
        request: &IssueRequest,
        config: &LedgerConfig,
    ) -> Result<(), LedgerError> {
        validate_quantity(request.quantity, config.max_issue_quantity)?;
        require_positive(request.unit_amount)?;
        if let Some(name) = request.name.as_deref().filter(|n| !n.trim().is_empty()) {
            require_text("Gift card name", name, MAX_CARD_NAME_LEN)?;
        }
        Ok(())
    }

    /// Total value of an issuance.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if the product is not representable.
    pub fn issue_total(request: &IssueRequest) -> Result<Amount, LedgerError> {
        Ok(request.unit_amount.checked_times(request.quantity)?)
    }

    /// Name of a newly issued card.
    #[must_use]
    pub fn card_name(request: &IssueRequest, config: &LedgerConfig, code: &str) -> String {
        match request.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default_card_name(&config.card_name_prefix, code),
        }
    }

    /// Description of the ledger funding a newly issued card.
    #[must_use]
    pub fn issue_description(code: &str, amount: Amount) -> String {
        format!("Gift card {code} created with amount {amount}")
    }

    /// Draft funding one issued card from the company account.
    #[must_use]
    pub fn issue_draft(
        company_id: CompanyId,
        company_account: AccountId,
        card_account: AccountId,
        code: &str,
        amount: Amount,
    ) -> LedgerDraft {
        LedgerDraft::transfer(
            company_id,
            Self::issue_description(code, amount),
            company_account,
            card_account,
            amount,
        )
    }

    /// Description of a spend or add-funds ledger.
    #[must_use]
    pub fn transfer_description(kind: TransferKind, target: &AccountRef, amount: Amount) -> String {
        format!("{target} {} {amount}", kind.verb())
    }

    /// Plans a spend or add-funds against `target`.
    ///
    /// `current_balance` must have been read while `target` is locked.
    ///
    /// # Errors
    ///
    /// - `NonPositiveAmount` if `amount <= 0`
    /// - `InvalidAccountShape` if `counterpart` is not the expected company account
    /// - `SelfTransfer` if target and counterpart coincide
    /// - `InsufficientBalance` if a spend fails admission
    pub fn plan_transfer(
        kind: TransferKind,
        target: &Account,
        label: &AccountRef,
        counterpart: &Account,
        amount: Amount,
        current_balance: Amount,
    ) -> Result<TransferPlan, LedgerError> {
        require_positive(amount)?;
        target.validate_shape()?;
        if counterpart.account_type != kind.counterpart()
            || counterpart.company_id != target.company_id
        {
            return Err(LedgerError::InvalidAccountShape(counterpart.id));
        }
        if counterpart.id == target.id {
            return Err(LedgerError::SelfTransfer(target.id));
        }

        let description = Self::transfer_description(kind, label, amount);
        let (from, to, new_balance) = if kind.debits_target() {
            admit_debit(current_balance, target.allowed_credit, amount)?;
            (target.id, counterpart.id, current_balance - amount)
        } else {
            (counterpart.id, target.id, current_balance + amount)
        };
        let draft = LedgerDraft::transfer(target.company_id, description, from, to, amount);
        draft.validate()?;

        Ok(TransferPlan {
            draft,
            previous_balance: current_balance,
            new_balance,
        })
    }

    /// Validates a new allowed credit value.
    ///
    /// # Errors
    ///
    /// Returns `NegativeAllowedCredit` if `amount < 0`.
    pub fn validate_allowed_credit(amount: Amount) -> Result<(), LedgerError> {
        if amount.is_negative() {
            return Err(LedgerError::NegativeAllowedCredit(amount));
        }
        Ok(())
    }
}
