//! One-time mint of the total supply
//!
//! [`IssuanceController::issue`] takes `self` by value, so a controller can
//! mint at most once. The engine builds one during construction and drops it.

use crate::accounts::AccountLedger;
use crate::types::{Address, Amount};
use crate::{Error, Result};

/// Outcome of a successful issuance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Issuance {
    /// Account that received the supply
    pub recipient: Address,
    /// Fixed total supply
    pub total_supply: Amount,
}

/// Mints the target supply into a single account
#[derive(Debug)]
pub struct IssuanceController {
    amount: Amount,
}

impl IssuanceController {
    /// Controller for a supply of `amount`
    pub fn new(amount: Amount) -> Self {
        Self { amount }
    }

    /// Credit the whole supply to `recipient`
    ///
    /// Validates before touching `accounts`, so a null recipient leaves the
    /// ledger empty.
    pub fn issue(self, accounts: &mut AccountLedger, recipient: &Address) -> Result<Issuance> {
        if recipient.is_null() {
            return Err(Error::InvalidRecipient {
                account: *recipient,
            });
        }

        accounts.credit(recipient, self.amount)?;
        Ok(Issuance {
            recipient: *recipient,
            total_supply: self.amount,
        })
    }
}
