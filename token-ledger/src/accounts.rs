//! Account balances
//!
//! [`AccountLedger`] is the only owner of balance entries. It enforces the
//! per-account rules (no null recipient, no negative balance) but not
//! conservation: callers pair every debit with a credit.

use crate::types::{Address, Amount};
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Balance map keyed by address
///
/// Entries are created on first credit and never removed; a zero entry is
/// indistinguishable from a missing one.
#[derive(Debug, Clone, Default)]
pub struct AccountLedger {
    balances: BTreeMap<Address, Amount>,
}

impl AccountLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `account`, zero when unknown
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or_default()
    }

    /// Increase `account` by `amount`
    pub fn credit(&mut self, account: &Address, amount: Amount) -> Result<()> {
        if account.is_null() {
            return Err(Error::InvalidRecipient { account: *account });
        }
        if amount.is_zero() {
            return Ok(());
        }

        let balance = self.balances.entry(*account).or_default();
        *balance = balance.checked_add(amount).ok_or(Error::Overflow)?;
        Ok(())
    }

    /// Decrease `account` by `amount`
    pub fn debit(&mut self, account: &Address, amount: Amount) -> Result<()> {
        if amount.is_zero() {
            return Ok(());
        }

        let available = self.balance_of(account);
        if available < amount {
            return Err(Error::InsufficientBalance {
                account: *account,
                available,
                requested: amount,
            });
        }

        self.balances.insert(*account, available - amount);
        Ok(())
    }

    /// Sum of all balances, `None` on overflow
    pub fn total(&self) -> Option<Amount> {
        self.balances
            .values()
            .try_fold(Amount::zero(), |acc, b| acc.checked_add(*b))
    }

    /// Entries in address order, zero balances included
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.balances.iter()
    }

    /// Number of accounts ever credited
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    /// Whether no account has been credited yet
    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}
