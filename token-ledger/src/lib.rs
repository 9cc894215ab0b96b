//! BJIT Token Ledger
//!
//! Fixed-supply fungible token: per-account balances, per-pair allowances
//! and delegated transfers, with typed errors and emitted events.
//!
//! # Architecture
//!
//! - **Pure core**: [`Token`] is a synchronous state machine over two maps
//! - **Single Writer**: [`actor`] serializes concurrent callers onto one task
//! - **Events**: every successful operation appends one journal record
//! - **Commitments**: snapshots carry Merkle roots of state and journal
//!
//! # Invariants
//!
//! - Conservation: Σ(balances) == total supply at every observation point
//! - No negative balance: a debit never exceeds the current balance
//! - Atomicity: a rejected operation changes nothing and emits nothing
//! - Fixed supply: minted once at construction, never again

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    clippy::all
)]

pub mod types;
pub mod error;
pub mod accounts;
pub mod allowances;
pub mod issuance;
pub mod events;
pub mod state;
pub mod engine;
pub mod actor;
pub mod config;
pub mod metrics;

// Re-exports
pub use error::{Error, Result};
pub use types::{
    format_units, parse_units, total_supply, Address, Amount, TokenMetadata,
    UNLIMITED_ALLOWANCE,
};
pub use events::{EventRecord, TokenEvent};
pub use engine::Token;
pub use actor::{spawn_token_actor, TokenHandle};
pub use state::LedgerSnapshot;
pub use config::Config;
pub use metrics::Metrics;
