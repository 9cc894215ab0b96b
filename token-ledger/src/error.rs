//! Error types for the token ledger

use crate::types::{Address, Amount};
use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
///
/// Every rejection leaves the ledger exactly as it was before the call.
#[derive(Error, Debug)]
pub enum Error {
    /// Credited party is the null identity
    #[error("Invalid recipient: {account}")]
    InvalidRecipient {
        /// Rejected recipient
        account: Address,
    },

    /// Debited party is the null identity
    #[error("Invalid sender: {account}")]
    InvalidSender {
        /// Rejected sender
        account: Address,
    },

    /// Approving owner is the null identity
    #[error("Invalid approver: {account}")]
    InvalidApprover {
        /// Rejected owner
        account: Address,
    },

    /// Spender is the null identity
    #[error("Invalid spender: {account}")]
    InvalidSpender {
        /// Rejected spender
        account: Address,
    },

    /// Debit exceeds the current balance
    #[error("Insufficient balance for {account}: available {available}, requested {requested}")]
    InsufficientBalance {
        /// Debited account
        account: Address,
        /// Balance before the call
        available: Amount,
        /// Amount asked for
        requested: Amount,
    },

    /// Delegated transfer exceeds the remaining allowance
    #[error("Insufficient allowance for {spender}: available {available}, requested {requested}")]
    InsufficientAllowance {
        /// Spender acting on the owner's behalf
        spender: Address,
        /// Allowance before the call
        available: Amount,
        /// Amount asked for
        requested: Amount,
    },

    /// Checked arithmetic overflowed
    #[error("Arithmetic overflow")]
    Overflow,

    /// Invariant violation (supply conservation)
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Concurrency error (actor mailbox closed, etc.)
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidRecipient { .. } => "invalid_recipient",
            Error::InvalidSender { .. } => "invalid_sender",
            Error::InvalidApprover { .. } => "invalid_approver",
            Error::InvalidSpender { .. } => "invalid_spender",
            Error::InsufficientBalance { .. } => "insufficient_balance",
            Error::InsufficientAllowance { .. } => "insufficient_allowance",
            Error::Overflow => "overflow",
            Error::InvariantViolation(_) => "invariant_violation",
            Error::Config(_) => "config",
            Error::Serialization(_) => "serialization",
            Error::Concurrency(_) => "concurrency",
            Error::Io(_) => "io",
        }
    }

    /// Whether the error is a caller-input rejection from the ledger itself
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Error::InvalidRecipient { .. }
                | Error::InvalidSender { .. }
                | Error::InvalidApprover { .. }
                | Error::InvalidSpender { .. }
                | Error::InsufficientBalance { .. }
                | Error::InsufficientAllowance { .. }
        )
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
