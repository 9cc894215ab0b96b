//! Delegated-spending limits
//!
//! One entry per (owner, spender) pair. Approvals replace the previous
//! value; they never accumulate.

use crate::types::{Address, Amount, UNLIMITED_ALLOWANCE};
use crate::{Error, Result};
use std::collections::BTreeMap;

/// Record of a successful [`AllowanceRegistry::consume_allowance`]
///
/// Hand it back to [`AllowanceRegistry::restore`] to undo the consumption
/// when a later step of the same operation fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub struct AllowanceReceipt {
    owner: Address,
    spender: Address,
    previous: Amount,
}

/// Allowance map keyed by (owner, spender)
#[derive(Debug, Clone, Default)]
pub struct AllowanceRegistry {
    allowances: BTreeMap<(Address, Address), Amount>,
}

impl AllowanceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining amount `spender` may move from `owner`, zero when unset
    pub fn allowance_of(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    /// Replace the allowance for (owner, spender)
    pub fn set_allowance(&mut self, owner: &Address, spender: &Address, amount: Amount) -> Result<()> {
        if spender.is_null() {
            return Err(Error::InvalidSpender { account: *spender });
        }

        self.allowances.insert((*owner, *spender), amount);
        Ok(())
    }

    /// Spend `amount` of the allowance `owner` granted to `spender`
    ///
    /// An unlimited allowance is left untouched.
    pub fn consume_allowance(
        &mut self,
        owner: &Address,
        spender: &Address,
        amount: Amount,
    ) -> Result<AllowanceReceipt> {
        let available = self.allowance_of(owner, spender);
        let receipt = AllowanceReceipt {
            owner: *owner,
            spender: *spender,
            previous: available,
        };

        if available == UNLIMITED_ALLOWANCE {
            return Ok(receipt);
        }
        if available < amount {
            return Err(Error::InsufficientAllowance {
                spender: *spender,
                available,
                requested: amount,
            });
        }

        if !amount.is_zero() {
            self.allowances.insert((*owner, *spender), available - amount);
        }
        Ok(receipt)
    }

    /// Put back the value recorded in `receipt`
    pub fn restore(&mut self, receipt: AllowanceReceipt) {
        let key = (receipt.owner, receipt.spender);
        if receipt.previous.is_zero() && !self.allowances.contains_key(&key) {
            return;
        }
        self.allowances.insert(key, receipt.previous);
    }

    /// Entries in (owner, spender) order, zero allowances included
    pub fn iter(&self) -> impl Iterator<Item = (&(Address, Address), &Amount)> {
        self.allowances.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u64) -> Address {
        Address::from_low_u64(n)
    }

    #[test]
    fn test_default_allowance_is_zero() {
        let registry = AllowanceRegistry::new();
        assert_eq!(registry.allowance_of(&addr(1), &addr(2)), Amount::zero());
    }

    #[test]
    fn test_set_replaces_not_adds() {
        let mut registry = AllowanceRegistry::new();
        registry.set_allowance(&addr(1), &addr(2), Amount::from(100u64)).unwrap();
        registry.set_allowance(&addr(1), &addr(2), Amount::from(30u64)).unwrap();
        assert_eq!(registry.allowance_of(&addr(1), &addr(2)), Amount::from(30u64));
    }

    #[test]
    fn test_pairs_are_independent() {
        let mut registry = AllowanceRegistry::new();
        registry.set_allowance(&addr(1), &addr(2), Amount::from(100u64)).unwrap();
        registry.set_allowance(&addr(1), &addr(3), Amount::from(200u64)).unwrap();
        assert_eq!(registry.allowance_of(&addr(1), &addr(2)), Amount::from(100u64));
        assert_eq!(registry.allowance_of(&addr(1), &addr(3)), Amount::from(200u64));
        assert_eq!(registry.allowance_of(&addr(2), &addr(1)), Amount::zero());
    }

    #[test]
    fn test_null_spender_rejected() {
        let mut registry = AllowanceRegistry::new();
        let err = registry
            .set_allowance(&addr(1), &Address::NULL, Amount::from(1u64))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSpender { .. }));
        assert_eq!(registry.iter().count(), 0);
    }

    #[test]
    fn test_consume_decrements() {
        let mut registry = AllowanceRegistry::new();
        registry.set_allowance(&addr(1), &addr(2), Amount::from(100u64)).unwrap();
        let _ = registry
            .consume_allowance(&addr(1), &addr(2), Amount::from(40u64))
            .unwrap();
        assert_eq!(registry.allowance_of(&addr(1), &addr(2)), Amount::from(60u64));
    }

    #[test]
    fn test_consume_shortfall() {
        let mut registry = AllowanceRegistry::new();
        registry.set_allowance(&addr(1), &addr(2), Amount::from(1000u64)).unwrap();

        match registry.consume_allowance(&addr(1), &addr(2), Amount::from(1500u64)) {
            Err(Error::InsufficientAllowance {
                spender,
                available,
                requested,
            }) => {
                assert_eq!(spender, addr(2));
                assert_eq!(available, Amount::from(1000u64));
                assert_eq!(requested, Amount::from(1500u64));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(registry.allowance_of(&addr(1), &addr(2)), Amount::from(1000u64));
    }

    #[test]
    fn test_unlimited_never_decremented() {
        let mut registry = AllowanceRegistry::new();
        registry.set_allowance(&addr(1), &addr(2), UNLIMITED_ALLOWANCE).unwrap();
        for _ in 0..3 {
            let _ = registry
                .consume_allowance(&addr(1), &addr(2), Amount::from(u64::MAX))
                .unwrap();
        }
        assert_eq!(registry.allowance_of(&addr(1), &addr(2)), UNLIMITED_ALLOWANCE);
    }

    #[test]
    fn test_restore_undoes_consumption() {
        let mut registry = AllowanceRegistry::new();
        registry.set_allowance(&addr(1), &addr(2), Amount::from(100u64)).unwrap();
        let receipt = registry
            .consume_allowance(&addr(1), &addr(2), Amount::from(100u64))
            .unwrap();
        assert_eq!(registry.allowance_of(&addr(1), &addr(2)), Amount::zero());

        registry.restore(receipt);
        assert_eq!(registry.allowance_of(&addr(1), &addr(2)), Amount::from(100u64));
    }

    #[test]
    fn test_restore_of_missing_entry_creates_nothing() {
        let mut registry = AllowanceRegistry::new();
        let receipt = registry
            .consume_allowance(&addr(1), &addr(2), Amount::zero())
            .unwrap();
        registry.restore(receipt);
        assert_eq!(registry.iter().count(), 0);
    }
}
