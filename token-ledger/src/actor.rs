//! Actor-based access to the ledger
//!
//! One tokio task owns the [`Token`] and applies requests strictly in
//! mailbox order, so concurrent callers observe the same sequential history
//! a single caller would:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │          Callers (wallets, scripts, services)         │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               TokenHandle (Clone)                     │
//! │         Sends messages to actor mailbox               │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               TokenActor (Single Task)                │
//! │     Token::transfer / approve / transfer_from         │
//! │     tracing + Metrics around each request             │
//! └──────────────────────────────────────────────────────┘
//! ```

use crate::config::ActorConfig;
use crate::engine::{Token, MAX_CHANNEL_CAPACITY};
use crate::events::EventRecord;
use crate::metrics::Metrics;
use crate::state::LedgerSnapshot;
use crate::types::{Address, Amount, TokenMetadata};
use crate::{Error, Result};
use std::time::Instant;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Message sent to the token actor
pub enum TokenMessage {
    /// Direct transfer
    Transfer {
        /// Account invoking the operation
        caller: Address,
        /// Credited account
        to: Address,
        /// Token amount in base units
        amount: Amount,
        /// Reply channel
        response: oneshot::Sender<Result<EventRecord>>,
    },

    /// Set an allowance
    Approve {
        /// Account invoking the operation
        caller: Address,
        /// Spender account
        spender: Address,
        /// Token amount in base units
        amount: Amount,
        /// Reply channel
        response: oneshot::Sender<Result<EventRecord>>,
    },

    /// Delegated transfer
    TransferFrom {
        /// Account invoking the operation
        caller: Address,
        /// Debited account
        from: Address,
        /// Credited account
        to: Address,
        /// Token amount in base units
        amount: Amount,
        /// Reply channel
        response: oneshot::Sender<Result<EventRecord>>,
    },

    /// Read a balance
    BalanceOf {
        /// Account to read
        account: Address,
        /// Reply channel
        response: oneshot::Sender<Amount>,
    },

    /// Read an allowance
    Allowance {
        /// Granting account
        owner: Address,
        /// Spender account
        spender: Address,
        /// Reply channel
        response: oneshot::Sender<Amount>,
    },

    /// Read the total supply
    TotalSupply {
        /// Reply channel
        response: oneshot::Sender<Amount>,
    },

    /// Read name, symbol and decimals
    Metadata {
        /// Reply channel
        response: oneshot::Sender<TokenMetadata>,
    },

    /// Journal records from a sequence number on
    EventsSince {
        /// First sequence number to return
        from: u64,
        /// Reply channel
        response: oneshot::Sender<Vec<EventRecord>>,
    },

    /// Subscribe to new records
    Subscribe {
        /// Reply channel
        response: oneshot::Sender<broadcast::Receiver<EventRecord>>,
    },

    /// Capture a snapshot
    Snapshot {
        /// Reply channel
        response: oneshot::Sender<Result<LedgerSnapshot>>,
    },

    /// Stop the actor and hand the ledger back
    Shutdown {
        /// Receives the ledger once the actor stops
        response: oneshot::Sender<Token>,
    },
}

/// Actor that owns the ledger
pub struct TokenActor {
    /// The ledger
    token: Token,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<TokenMessage>,

    /// Metrics, when enabled
    metrics: Option<Metrics>,
}

impl TokenActor {
    /// Create new actor
    pub fn new(token: Token, mailbox: mpsc::Receiver<TokenMessage>, metrics: Option<Metrics>) -> Self {
        Self {
            token,
            mailbox,
            metrics,
        }
    }

    /// Run the actor event loop until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                TokenMessage::Shutdown { response } => {
                    tracing::info!(events = self.token.events().len(), "Token actor shutting down");
                    let _ = response.send(self.token);
                    return;
                }
                other => self.handle_message(other),
            }
        }

        tracing::info!("All token handles dropped, actor stopping");
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: TokenMessage) {
        match msg {
            TokenMessage::Transfer {
                caller,
                to,
                amount,
                response,
            } => {
                let started = Instant::now();
                let result = self.token.transfer(&caller, &to, amount).cloned();
                self.observe("transfer", &result, started);
                let _ = response.send(result);
            }

            TokenMessage::Approve {
                caller,
                spender,
                amount,
                response,
            } => {
                let started = Instant::now();
                let result = self.token.approve(&caller, &spender, amount).cloned();
                self.observe("approve", &result, started);
                let _ = response.send(result);
            }

            TokenMessage::TransferFrom {
                caller,
                from,
                to,
                amount,
                response,
            } => {
                let started = Instant::now();
                let result = self.token.transfer_from(&caller, &from, &to, amount).cloned();
                self.observe("transfer_from", &result, started);
                let _ = response.send(result);
            }

            TokenMessage::BalanceOf { account, response } => {
                let _ = response.send(self.token.balance_of(&account));
            }

            TokenMessage::Allowance {
                owner,
                spender,
                response,
            } => {
                let _ = response.send(self.token.allowance(&owner, &spender));
            }

            TokenMessage::TotalSupply { response } => {
                let _ = response.send(self.token.total_supply());
            }

            TokenMessage::Metadata { response } => {
                let _ = response.send(self.token.metadata().clone());
            }

            TokenMessage::EventsSince { from, response } => {
                let _ = response.send(self.token.events_since(from).to_vec());
            }

            TokenMessage::Subscribe { response } => {
                let _ = response.send(self.token.subscribe());
            }

            TokenMessage::Snapshot { response } => {
                let _ = response.send(self.token.snapshot());
            }

            TokenMessage::Shutdown { .. } => {
                // Handled in run loop
            }
        }
    }

    /// Log and record the outcome of a state-changing request
    fn observe(&self, operation: &'static str, result: &Result<EventRecord>, started: Instant) {
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok(record) => {
                tracing::debug!(
                    operation,
                    sequence = record.sequence,
                    event = record.event.name(),
                    "Operation applied"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_success(operation, elapsed);
                }
            }
            Err(err) => {
                if err.is_rejection() {
                    tracing::debug!(operation, kind = err.kind(), "Operation rejected: {}", err);
                } else {
                    tracing::warn!(operation, kind = err.kind(), "Operation failed: {}", err);
                }
                if let Some(metrics) = &self.metrics {
                    metrics.record_rejection(operation, err.kind(), elapsed);
                }
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone)]
pub struct TokenHandle {
    sender: mpsc::Sender<TokenMessage>,
}

impl TokenHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<TokenMessage>) -> Self {
        Self { sender }
    }

    /// Send a message and wait for its reply
    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> TokenMessage) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Move `amount` from `caller` to `to`
    pub async fn transfer(&self, caller: Address, to: Address, amount: Amount) -> Result<EventRecord> {
        self.request(|response| TokenMessage::Transfer {
            caller,
            to,
            amount,
            response,
        })
        .await?
    }

    /// Set the allowance `caller` grants to `spender`
    pub async fn approve(&self, caller: Address, spender: Address, amount: Amount) -> Result<EventRecord> {
        self.request(|response| TokenMessage::Approve {
            caller,
            spender,
            amount,
            response,
        })
        .await?
    }

    /// Move `amount` from `from` to `to` on `caller`'s allowance
    pub async fn transfer_from(
        &self,
        caller: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<EventRecord> {
        self.request(|response| TokenMessage::TransferFrom {
            caller,
            from,
            to,
            amount,
            response,
        })
        .await?
    }

    /// Balance of `account`
    pub async fn balance_of(&self, account: Address) -> Result<Amount> {
        self.request(|response| TokenMessage::BalanceOf { account, response })
            .await
    }

    /// Allowance `owner` granted `spender`
    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<Amount> {
        self.request(|response| TokenMessage::Allowance {
            owner,
            spender,
            response,
        })
        .await
    }

    /// Fixed total supply
    pub async fn total_supply(&self) -> Result<Amount> {
        self.request(|response| TokenMessage::TotalSupply { response })
            .await
    }

    /// Name, symbol and decimals
    pub async fn metadata(&self) -> Result<TokenMetadata> {
        self.request(|response| TokenMessage::Metadata { response })
            .await
    }

    /// Journal records with `sequence >= from`
    pub async fn events_since(&self, from: u64) -> Result<Vec<EventRecord>> {
        self.request(|response| TokenMessage::EventsSince { from, response })
            .await
    }

    /// Receive records appended after this call is processed
    pub async fn subscribe(&self) -> Result<broadcast::Receiver<EventRecord>> {
        self.request(|response| TokenMessage::Subscribe { response })
            .await
    }

    /// Point-in-time snapshot
    pub async fn snapshot(&self) -> Result<LedgerSnapshot> {
        self.request(|response| TokenMessage::Snapshot { response })
            .await?
    }

    /// Stop the actor, returning the ledger it owned
    pub async fn shutdown(&self) -> Result<Token> {
        self.request(|response| TokenMessage::Shutdown { response })
            .await
    }
}

/// Spawn the token actor
///
/// Must be called from within a tokio runtime.
pub fn spawn_token_actor(token: Token, config: &ActorConfig, metrics: Option<Metrics>) -> TokenHandle {
    let (tx, rx) = mpsc::channel(config.mailbox_capacity.clamp(1, MAX_CHANNEL_CAPACITY)); // Bounded channel for backpressure
    if let Some(metrics) = &metrics {
        metrics.events_total.inc_by(token.events().len() as u64);
    }
    let actor = TokenActor::new(token, rx, metrics);

    tokio::spawn(async move {
        actor.run().await;
    });

    TokenHandle::new(tx)
}
