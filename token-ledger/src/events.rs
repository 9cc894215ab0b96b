//! Domain events and the event journal
//!
//! Every successful state transition appends exactly one [`EventRecord`].
//! Records are numbered from 0 without gaps, so a subscriber that falls
//! behind can catch up with [`EventJournal::since`].

use crate::engine::MAX_CHANNEL_CAPACITY;
use crate::types::{Address, Amount};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Notification emitted by the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenEvent {
    /// Balance movement; `from` is null for the issuance
    Transfer {
        /// Debited account
        from: Address,
        /// Credited account
        to: Address,
        /// Amount moved
        amount: Amount,
    },

    /// Allowance set by `owner` for `spender`
    Approval {
        /// Granting account
        owner: Address,
        /// Account allowed to spend
        spender: Address,
        /// New allowance
        amount: Amount,
    },
}

impl TokenEvent {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            TokenEvent::Transfer { .. } => "Transfer",
            TokenEvent::Approval { .. } => "Approval",
        }
    }
}

/// Journal entry wrapping an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the journal (0-based, gap-free)
    pub sequence: u64,

    /// Unique record ID (UUIDv7 for time-ordering)
    pub record_id: Uuid,

    /// When the operation was applied
    pub recorded_at: DateTime<Utc>,

    /// The event itself
    pub event: TokenEvent,
}

impl EventRecord {
    /// Deterministic bytes for hashing
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// SHA-256 of the canonical bytes
    pub fn hash(&self) -> Result<[u8; 32]> {
        let bytes = self.canonical_bytes()?;
        Ok(Sha256::digest(&bytes).into())
    }
}

/// Append-only list of records with live fan-out
#[derive(Debug)]
pub struct EventJournal {
    records: Vec<EventRecord>,
    publisher: broadcast::Sender<EventRecord>,
}

impl EventJournal {
    /// Create a journal whose subscribers buffer up to `channel_capacity` records
    pub fn new(channel_capacity: usize) -> Self {
        let (publisher, _) = broadcast::channel(channel_capacity.clamp(1, MAX_CHANNEL_CAPACITY));
        Self {
            records: Vec::new(),
            publisher,
        }
    }

    /// Append `event` and publish it
    pub fn append(&mut self, event: TokenEvent) -> &EventRecord {
        let record = EventRecord {
            sequence: self.records.len() as u64,
            record_id: Uuid::now_v7(),
            recorded_at: Utc::now(),
            event,
        };

        // No receivers is not an error.
        let _ = self.publisher.send(record.clone());

        self.records.push(record);
        &self.records[self.records.len() - 1]
    }

    /// Receive every record appended from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.publisher.subscribe()
    }

    /// Records with `sequence >= from`
    pub fn since(&self, from: u64) -> &[EventRecord] {
        let start = usize::try_from(from)
            .unwrap_or(usize::MAX)
            .min(self.records.len());
        &self.records[start..]
    }

    /// All records
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(amount: u64) -> TokenEvent {
        TokenEvent::Transfer {
            from: Address::from_low_u64(1),
            to: Address::from_low_u64(2),
            amount: Amount::from(amount),
        }
    }

    #[test]
    fn test_sequence_is_gap_free() {
        let mut journal = EventJournal::new(16);
        for i in 0..5 {
            let record = journal.append(transfer(i));
            assert_eq!(record.sequence, i);
        }
        assert_eq!(journal.len(), 5);
        assert_eq!(journal.since(3).len(), 2);
        assert_eq!(journal.since(3)[0].sequence, 3);
        assert!(journal.since(99).is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_receive_appended_records() {
        let mut journal = EventJournal::new(16);
        let mut rx = journal.subscribe();

        journal.append(transfer(10));
        let record = rx.recv().await.unwrap();
        assert_eq!(record.sequence, 0);
        assert_eq!(record.event, transfer(10));
    }

    #[test]
    fn test_hash_depends_on_event() {
        let mut journal = EventJournal::new(4);
        let a = journal.append(transfer(1)).clone();
        let mut b = a.clone();
        b.event = transfer(2);

        assert_eq!(a.hash().unwrap(), a.hash().unwrap());
        assert_ne!(a.hash().unwrap(), b.hash().unwrap());
    }

    #[test]
    fn test_event_json_shape() {
        let json = serde_json::to_value(TokenEvent::Approval {
            owner: Address::from_low_u64(1),
            spender: Address::from_low_u64(2),
            amount: Amount::from(255u64),
        })
        .unwrap();
        assert_eq!(json["type"], "approval");
        assert_eq!(json["spender"], "0x0000000000000000000000000000000000000002");
    }
}
