//! Property-based tests for `LedgerService`.
//!
//! Every plan the service produces must be balanced, and replaying a
//! random sequence of spends and top-ups through the service must never
//! leave an account below its allowed credit.

use chrono::Utc;
use giftledger_shared::types::{AccountId, Amount, CompanyId, GiftCardId};
use proptest::prelude::*;

use super::error::LedgerError;
use super::service::{LedgerService, TransferKind};
use super::types::{Account, AccountRef, AccountType};

fn positive_amount() -> impl Strategy<Value = Amount> {
    (1i64..1_000_000i64).prop_map(Amount::from_cents)
}

fn kind() -> impl Strategy<Value = TransferKind> {
    prop_oneof![Just(TransferKind::Spend), Just(TransferKind::AddFunds)]
}

fn account(id: i64, account_type: AccountType, allowed_credit: Amount) -> Account {
    Account {
        id: AccountId::new(id),
        account_type,
        company_id: CompanyId::new(1),
        gift_card_id: (account_type == AccountType::GiftCard).then(|| GiftCardId::new(id)),
        allowed_credit,
        created_at: Utc::now(),
        deleted_at: None,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Issue drafts always balance and move exactly `amount`.
    #[test]
    fn prop_issue_draft_balanced(amount in positive_amount()) {
        let draft = LedgerService::issue_draft(
            CompanyId::new(1),
            AccountId::new(1),
            AccountId::new(2),
            "CODE",
            amount,
        );
        prop_assert!(draft.validate().is_ok());
        prop_assert_eq!(draft.total(), Amount::ZERO);
        prop_assert_eq!(draft.net_for(AccountId::new(2)), amount);
    }

    /// Replaying random operations keeps the target at or above -allowed_credit,
    /// and the target balance always equals the sum of what was posted to it.
    #[test]
    fn prop_replay_never_overdraws(
        credit in (0i64..50_000i64).prop_map(Amount::from_cents),
        ops in prop::collection::vec((kind(), positive_amount()), 1..60),
    ) {
        let card = account(10, AccountType::GiftCard, credit);
        let sink = account(3, AccountType::GenericOut, Amount::ZERO);
        let source = account(2, AccountType::GenericIn, Amount::ZERO);
        let label = AccountRef::Account(card.id);

        let mut balance = Amount::ZERO;
        let mut posted = Amount::ZERO;
        for (kind, amount) in ops {
            let counterpart = match kind {
                TransferKind::Spend => &sink,
                TransferKind::AddFunds => &source,
            };
            match LedgerService::plan_transfer(kind, &card, &label, counterpart, amount, balance) {
                Ok(plan) => {
                    prop_assert!(plan.draft.validate().is_ok());
                    prop_assert_eq!(plan.previous_balance, balance);
                    posted += plan.draft.net_for(card.id);
                    balance = plan.new_balance;
                }
                Err(LedgerError::InsufficientBalance { current, requested }) => {
                    prop_assert_eq!(kind, TransferKind::Spend);
                    prop_assert_eq!(current, balance);
                    prop_assert!(current + credit < requested);
                }
                Err(other) => prop_assert!(false, "unexpected error: {other}"),
            }
            prop_assert!(balance >= -credit);
            prop_assert_eq!(balance, posted);
        }
    }
}
