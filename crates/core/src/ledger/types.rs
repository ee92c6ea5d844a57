//! Ledger domain types.
//!
//! These are the projections the rest of the system exchanges with the
//! ledger core: accounts, gift cards, ledger headers and entries, and the
//! receipts returned by posting operations.

use chrono::{DateTime, Utc};
use giftledger_shared::types::{
    AccountId, Amount, CompanyId, GiftCardId, LedgerEntryId, LedgerId,
};
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// Kind of ledger account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// The company's own funds; debited when cards are issued.
    Company,
    /// Customer-facing balance of a single gift card.
    GiftCard,
    /// Source of external funding (credited out when funds are added).
    GenericIn,
    /// Sink for spending (credited when a card is spent).
    GenericOut,
}

impl AccountType {
    /// Every account type, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Company,
        Self::GiftCard,
        Self::GenericIn,
        Self::GenericOut,
    ];

    /// Account types created once per company at company creation.
    pub const FIXED: [Self; 3] = [Self::Company, Self::GenericIn, Self::GenericOut];

    /// Returns the database/wire name of this type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::GiftCard => "gift_card",
            Self::GenericIn => "generic_in",
            Self::GenericOut => "generic_out",
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown account type: {s}"))
    }
}

/// A total mapping from [`AccountType`] to `T`.
///
/// Every account type always has a slot, so consumers never have to treat
/// a missing key differently from an empty or zero value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByAccountType<T> {
    /// Slot for [`AccountType::Company`].
    pub company: T,
    /// Slot for [`AccountType::GiftCard`].
    pub gift_card: T,
    /// Slot for [`AccountType::GenericIn`].
    pub generic_in: T,
    /// Slot for [`AccountType::GenericOut`].
    pub generic_out: T,
}

impl<T> ByAccountType<T> {
    /// Builds a mapping by calling `f` once per account type.
    pub fn from_fn(mut f: impl FnMut(AccountType) -> T) -> Self {
        Self {
            company: f(AccountType::Company),
            gift_card: f(AccountType::GiftCard),
            generic_in: f(AccountType::GenericIn),
            generic_out: f(AccountType::GenericOut),
        }
    }

    /// Returns the slot for `account_type`.
    #[must_use]
    pub fn get(&self, account_type: AccountType) -> &T {
        match account_type {
            AccountType::Company => &self.company,
            AccountType::GiftCard => &self.gift_card,
            AccountType::GenericIn => &self.generic_in,
            AccountType::GenericOut => &self.generic_out,
        }
    }

    /// Returns the mutable slot for `account_type`.
    pub fn get_mut(&mut self, account_type: AccountType) -> &mut T {
        match account_type {
            AccountType::Company => &mut self.company,
            AccountType::GiftCard => &mut self.gift_card,
            AccountType::GenericIn => &mut self.generic_in,
            AccountType::GenericOut => &mut self.generic_out,
        }
    }

    /// Iterates over all slots in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (AccountType, &T)> {
        AccountType::ALL.into_iter().map(move |t| (t, self.get(t)))
    }
}

/// A ledger account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Account type.
    #[serde(rename = "type")]
    pub account_type: AccountType,
    /// Owning company.
    pub company_id: CompanyId,
    /// Gift card this account carries the balance of (gift card accounts only).
    pub gift_card_id: Option<GiftCardId>,
    /// Overdraft allowance added to the spendable threshold.
    pub allowed_credit: Amount,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Soft-delete timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Returns true if the account has been soft-deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Checks the gift card reference and allowed credit invariants.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAccountShape` if a gift card account has no gift card
    /// reference, another type has one, or the allowed credit is negative.
    pub fn validate_shape(&self) -> Result<(), LedgerError> {
        let is_gift_card = self.account_type == AccountType::GiftCard;
        if is_gift_card != self.gift_card_id.is_some() || self.allowed_credit.is_negative() {
            return Err(LedgerError::InvalidAccountShape(self.id));
        }
        Ok(())
    }
}

/// A company as seen by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Company ID.
    pub id: CompanyId,
    /// Display name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A gift card. Its balance lives entirely on its gift card account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftCard {
    /// Gift card ID.
    pub id: GiftCardId,
    /// Unique redemption code.
    pub code: String,
    /// Issuing company.
    pub company_id: CompanyId,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Soft-delete timestamp.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Identity of a committed ledger header: `(id, time)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LedgerRef {
    /// Ledger ID.
    pub id: LedgerId,
    /// Economic event time.
    pub time: DateTime<Utc>,
}

/// A committed ledger header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    /// `(id, time)` key.
    #[serde(flatten)]
    pub key: LedgerRef,
    /// Company the event belongs to.
    pub company_id: CompanyId,
    /// Human-readable description.
    pub description: Option<String>,
}

/// A committed ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry ID.
    pub id: LedgerEntryId,
    /// Ledger this entry belongs to.
    pub ledger: LedgerRef,
    /// Account the amount is posted to.
    pub account_id: AccountId,
    /// Signed amount (negative = debit from the account).
    pub amount: Amount,
}

/// Target of a spend or add-funds operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRef {
    /// A gift card, addressed by its code.
    GiftCardCode(String),
    /// Any account, addressed by id.
    Account(AccountId),
}

impl std::fmt::Display for AccountRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GiftCardCode(code) => write!(f, "Gift card {code}"),
            Self::Account(id) => write!(f, "Account {id}"),
        }
    }
}

/// Input for issuing a batch of gift cards.
#[derive(Debug, Clone)]
pub struct IssueRequest {
    /// Issuing company.
    pub company_id: CompanyId,
    /// Number of cards (at least 1).
    pub quantity: u32,
    /// Initial balance of each card (must be positive).
    pub unit_amount: Amount,
    /// Name shared by every card; generated from the code when absent.
    pub name: Option<String>,
    /// Description shared by every card.
    pub description: Option<String>,
}

/// One card created by an issuance.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedCard {
    /// The gift card row.
    pub gift_card: GiftCard,
    /// Its gift card account.
    pub account_id: AccountId,
    /// The ledger that funded it.
    pub ledger: LedgerRef,
}

/// Result of an issuance.
#[derive(Debug, Clone, Serialize)]
pub struct IssueReceipt {
    /// Issuing company.
    pub company_id: CompanyId,
    /// Number of cards created.
    pub quantity: u32,
    /// Balance of each card.
    pub unit_amount: Amount,
    /// `quantity * unit_amount`.
    pub total_value: Amount,
    /// The created cards.
    pub cards: Vec<IssuedCard>,
    /// Company account balance after the issuance.
    pub company_balance: Amount,
}

/// Result of a spend or add-funds operation.
#[derive(Debug, Clone, Serialize)]
pub struct PostingReceipt {
    /// Account the amount moved out of or into.
    pub account_id: AccountId,
    /// Gift card code, when the target was addressed by code.
    pub code: Option<String>,
    /// Amount moved.
    pub amount: Amount,
    /// Balance before the posting.
    pub previous_balance: Amount,
    /// Balance after the posting.
    pub new_balance: Amount,
    /// The written ledger.
    pub ledger: LedgerRef,
}

/// Balance view of a gift card.
#[derive(Debug, Clone, Serialize)]
pub struct GiftCardBalance {
    /// Gift card code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Issuing company.
    pub company_id: CompanyId,
    /// Current balance.
    pub balance: Amount,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Stage of a posting operation.
///
/// Operations move forward through `Validating`, `Admitting`, `Writing`
/// and `Committed`; any stage may exit to `Aborted`, which persists nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostingStage {
    /// Resolving accounts and checking arguments.
    Validating,
    /// Checking the balance under lock.
    Admitting,
    /// Inserting the header and entries.
    Writing,
    /// Transaction committed.
    Committed,
    /// Transaction rolled back.
    Aborted,
}

impl std::fmt::Display for PostingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Validating => "validating",
            Self::Admitting => "admitting",
            Self::Writing => "writing",
            Self::Committed => "committed",
            Self::Aborted => "aborted",
        })
    }
}
