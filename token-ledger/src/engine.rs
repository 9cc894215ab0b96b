//! Transfer engine
//!
//! [`Token`] is the public face of the ledger. It validates every request,
//! mutates [`AccountLedger`] and [`AllowanceRegistry`], and appends the
//! resulting event to the journal. Each operation either applies fully or
//! returns an error with the state untouched.
//!
//! # Example
//!
//! ```
//! use token_ledger::{Address, Amount, Token};
//!
//! # fn main() -> token_ledger::Result<()> {
//! let owner = Address::from_low_u64(1);
//! let alice = Address::from_low_u64(2);
//!
//! let mut token = Token::deploy(owner)?;
//! token.transfer(&owner, &alice, Amount::from(100u64))?;
//! assert_eq!(token.balance_of(&alice), Amount::from(100u64));
//! # Ok(())
//! # }
//! ```

use crate::accounts::AccountLedger;
use crate::allowances::AllowanceRegistry;
use crate::events::{EventJournal, EventRecord, TokenEvent};
use crate::issuance::IssuanceController;
use crate::state::LedgerSnapshot;
use crate::types::{total_supply, Address, Amount, TokenMetadata};
use crate::{Error, Result};
use tokio::sync::broadcast;

/// Default buffer for event subscribers
pub const DEFAULT_EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Largest accepted mailbox or event channel capacity
pub const MAX_CHANNEL_CAPACITY: usize = 1 << 20;

/// Fixed-supply token ledger
#[derive(Debug)]
pub struct Token {
    metadata: TokenMetadata,
    total_supply: Amount,
    accounts: AccountLedger,
    allowances: AllowanceRegistry,
    journal: EventJournal,
}

impl Token {
    /// Create the ledger and mint the whole supply to `recipient`
    ///
    /// Fails with [`Error::InvalidRecipient`] for the null identity, in which
    /// case no ledger exists.
    pub fn deploy(recipient: Address) -> Result<Self> {
        Self::deploy_with_capacity(recipient, DEFAULT_EVENT_CHANNEL_CAPACITY)
    }

    /// Same as [`Token::deploy`] with an explicit subscriber buffer size
    pub fn deploy_with_capacity(recipient: Address, event_channel_capacity: usize) -> Result<Self> {
        let mut accounts = AccountLedger::new();
        let issuance = IssuanceController::new(total_supply()).issue(&mut accounts, &recipient)?;

        let mut journal = EventJournal::new(event_channel_capacity);
        journal.append(TokenEvent::Transfer {
            from: Address::NULL,
            to: issuance.recipient,
            amount: issuance.total_supply,
        });

        Ok(Self {
            metadata: TokenMetadata::default(),
            total_supply: issuance.total_supply,
            accounts,
            allowances: AllowanceRegistry::new(),
            journal,
        })
    }

    /// Token name
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Token symbol
    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    /// Display decimals
    pub fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    /// Name, symbol and decimals together
    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    /// Fixed supply set at construction
    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Balance of `account`
    pub fn balance_of(&self, account: &Address) -> Amount {
        self.accounts.balance_of(account)
    }

    /// Remaining amount `spender` may move from `owner`
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances.allowance_of(owner, spender)
    }

    /// Move `amount` from `caller` to `to`
    pub fn transfer(&mut self, caller: &Address, to: &Address, amount: Amount) -> Result<&EventRecord> {
        if caller.is_null() {
            return Err(Error::InvalidSender { account: *caller });
        }
        if to.is_null() {
            return Err(Error::InvalidRecipient { account: *to });
        }

        self.move_balance(caller, to, amount)?;

        Ok(self.journal.append(TokenEvent::Transfer {
            from: *caller,
            to: *to,
            amount,
        }))
    }

    /// Set the allowance `caller` grants to `spender`, replacing any previous value
    pub fn approve(&mut self, caller: &Address, spender: &Address, amount: Amount) -> Result<&EventRecord> {
        if caller.is_null() {
            return Err(Error::InvalidApprover { account: *caller });
        }
        if spender.is_null() {
            return Err(Error::InvalidSpender { account: *spender });
        }

        self.allowances.set_allowance(caller, spender, amount)?;

        Ok(self.journal.append(TokenEvent::Approval {
            owner: *caller,
            spender: *spender,
            amount,
        }))
    }

    /// Move `amount` from `from` to `to`, spending the allowance `from` granted `caller`
    ///
    /// The allowance is checked before the balance, so when both fall short
    /// the caller sees [`Error::InsufficientAllowance`].
    pub fn transfer_from(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<&EventRecord> {
        if to.is_null() {
            return Err(Error::InvalidRecipient { account: *to });
        }
        if caller.is_null() {
            return Err(Error::InvalidSpender { account: *caller });
        }

        let receipt = self.allowances.consume_allowance(from, caller, amount)?;

        let moved = if from.is_null() {
            Err(Error::InvalidSender { account: *from })
        } else {
            self.move_balance(from, to, amount)
        };
        if let Err(err) = moved {
            self.allowances.restore(receipt);
            return Err(err);
        }

        Ok(self.journal.append(TokenEvent::Transfer {
            from: *from,
            to: *to,
            amount,
        }))
    }

    /// Paired debit and credit; leaves balances untouched on failure
    fn move_balance(&mut self, from: &Address, to: &Address, amount: Amount) -> Result<()> {
        self.accounts.debit(from, amount)?;
        if let Err(err) = self.accounts.credit(to, amount) {
            // Undo the debit; it cannot fail since the amount just left `from`.
            self.accounts.credit(from, amount)?;
            return Err(err);
        }
        Ok(())
    }

    /// Verify that balances still sum to the total supply
    pub fn check_conservation(&self) -> Result<()> {
        let sum = self.accounts.total().ok_or(Error::Overflow)?;
        if sum != self.total_supply {
            return Err(Error::InvariantViolation(format!(
                "balances sum to {}, total supply is {}",
                sum, self.total_supply
            )));
        }
        Ok(())
    }

    /// Events recorded so far, issuance first
    pub fn events(&self) -> &[EventRecord] {
        self.journal.records()
    }

    /// Events with `sequence >= from`
    pub fn events_since(&self, from: u64) -> &[EventRecord] {
        self.journal.since(from)
    }

    /// Receive events appended from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.journal.subscribe()
    }

    /// Point-in-time copy with state commitments
    pub fn snapshot(&self) -> Result<LedgerSnapshot> {
        LedgerSnapshot::capture(
            &self.metadata,
            self.total_supply,
            &self.accounts,
            &self.allowances,
            self.journal.records(),
        )
    }
}
