//! Company-level aggregation by account type.

use std::collections::HashMap;

use giftledger_shared::types::{AccountId, Amount};

use super::types::{Account, ByAccountType};

/// Groups live accounts by type. Deleted accounts are dropped.
#[must_use]
pub fn group_by_type(accounts: impl IntoIterator<Item = Account>) -> ByAccountType<Vec<Account>> {
    let mut groups: ByAccountType<Vec<Account>> = ByAccountType::default();
    for account in accounts.into_iter().filter(|a| !a.is_deleted()) {
        groups.get_mut(account.account_type).push(account);
    }
    groups
}

/// Sums balances of live accounts per type.
///
/// Every type is present in the result; types without accounts, and
/// accounts without entries, contribute zero.
#[must_use]
pub fn account_totals(
    accounts: &[Account],
    balances: &HashMap<AccountId, Amount>,
) -> ByAccountType<Amount> {
    let mut totals = ByAccountType::from_fn(|_| Amount::ZERO);
    for account in accounts.iter().filter(|a| !a.is_deleted()) {
        let balance = balances.get(&account.id).copied().unwrap_or_default();
        *totals.get_mut(account.account_type) += balance;
    }
    totals
}
