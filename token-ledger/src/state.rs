//! Snapshots and state commitments
//!
//! The state root is a SHA-256 Merkle root over the non-zero balance and
//! allowance entries, so two ledgers holding the same balances and
//! allowances share a root no matter how they got there.

use crate::accounts::AccountLedger;
use crate::allowances::AllowanceRegistry;
use crate::events::EventRecord;
use crate::types::{Address, Amount, TokenMetadata};
use crate::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const BALANCE_LEAF_TAG: &[u8] = b"token-ledger/balance";
const ALLOWANCE_LEAF_TAG: &[u8] = b"token-ledger/allowance";

/// Balance entry in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    /// Account
    pub account: Address,
    /// Balance
    pub balance: Amount,
}

/// Allowance entry in a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceEntry {
    /// Granting account
    pub owner: Address,
    /// Allowed spender
    pub spender: Address,
    /// Remaining allowance
    pub amount: Amount,
}

/// Point-in-time copy of the whole ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Token description
    pub metadata: TokenMetadata,

    /// Fixed supply
    pub total_supply: Amount,

    /// Non-zero balances in address order
    pub balances: Vec<BalanceEntry>,

    /// Non-zero allowances in (owner, spender) order
    pub allowances: Vec<AllowanceEntry>,

    /// Number of journal records at snapshot time
    pub event_count: u64,

    /// Merkle root of balances and allowances
    #[serde(with = "hex_root")]
    pub state_root: [u8; 32],

    /// Merkle root of the journal records
    #[serde(with = "hex_root")]
    pub events_root: [u8; 32],
}

impl LedgerSnapshot {
    /// Capture the current state
    pub(crate) fn capture(
        metadata: &TokenMetadata,
        total_supply: Amount,
        accounts: &AccountLedger,
        allowances: &AllowanceRegistry,
        records: &[EventRecord],
    ) -> Result<Self> {
        let balances: Vec<BalanceEntry> = accounts
            .iter()
            .filter(|(_, balance)| !balance.is_zero())
            .map(|(account, balance)| BalanceEntry {
                account: *account,
                balance: *balance,
            })
            .collect();

        let allowances: Vec<AllowanceEntry> = allowances
            .iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|((owner, spender), amount)| AllowanceEntry {
                owner: *owner,
                spender: *spender,
                amount: *amount,
            })
            .collect();

        let event_hashes = records
            .iter()
            .map(EventRecord::hash)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            metadata: metadata.clone(),
            total_supply,
            state_root: state_root(&balances, &allowances),
            events_root: merkle_root(&event_hashes),
            balances,
            allowances,
            event_count: records.len() as u64,
        })
    }

    /// Hex rendering of the state root
    pub fn state_root_hex(&self) -> String {
        hex::encode(self.state_root)
    }
}

/// Merkle root over balance and allowance leaves
pub fn state_root(balances: &[BalanceEntry], allowances: &[AllowanceEntry]) -> [u8; 32] {
    let mut leaves: Vec<[u8; 32]> = Vec::with_capacity(balances.len() + allowances.len());

    for entry in balances {
        let mut hasher = Sha256::new();
        hasher.update(BALANCE_LEAF_TAG);
        hasher.update(entry.account.as_bytes());
        hasher.update(amount_bytes(entry.balance));
        leaves.push(hasher.finalize().into());
    }

    for entry in allowances {
        let mut hasher = Sha256::new();
        hasher.update(ALLOWANCE_LEAF_TAG);
        hasher.update(entry.owner.as_bytes());
        hasher.update(entry.spender.as_bytes());
        hasher.update(amount_bytes(entry.amount));
        leaves.push(hasher.finalize().into());
    }

    merkle_root(&leaves)
}

/// Create a Merkle root from leaf hashes
///
/// If a level has odd length, the last hash is duplicated.
pub fn merkle_root(hashes: &[[u8; 32]]) -> [u8; 32] {
    if hashes.is_empty() {
        return [0u8; 32];
    }

    let mut current_level: Vec<[u8; 32]> = hashes.to_vec();

    while current_level.len() > 1 {
        let mut next_level: Vec<[u8; 32]> = Vec::with_capacity((current_level.len() + 1) / 2);

        for pair in current_level.chunks(2) {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);

            let mut hasher = Sha256::new();
            hasher.update(left);
            hasher.update(right);
            next_level.push(hasher.finalize().into());
        }

        current_level = next_level;
    }

    current_level[0]
}

fn amount_bytes(amount: Amount) -> [u8; 32] {
    let mut bytes = [0u8; 32];
    amount.to_big_endian(&mut bytes);
    bytes
}

mod hex_root {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(root: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(root))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(deserializer)?;
        let mut root = [0u8; 32];
        hex::decode_to_slice(&s, &mut root).map_err(serde::de::Error::custom)?;
        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn balance(n: u64, amount: u64) -> BalanceEntry {
        BalanceEntry {
            account: Address::from_low_u64(n),
            balance: Amount::from(amount),
        }
    }

    #[test]
    fn test_empty_root() {
        assert_eq!(merkle_root(&[]), [0u8; 32]);
        assert_eq!(state_root(&[], &[]), [0u8; 32]);
    }

    #[test]
    fn test_single_leaf_is_root() {
        let leaf = [7u8; 32];
        assert_eq!(merkle_root(&[leaf]), leaf);
    }

    #[test]
    fn test_odd_leaf_duplicated() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        let c = [3u8; 32];
        assert_eq!(merkle_root(&[a, b, c]), merkle_root(&[a, b, c, c]));
    }

    #[test]
    fn test_state_root_sensitive_to_balances() {
        let one = state_root(&[balance(1, 10), balance(2, 5)], &[]);
        let two = state_root(&[balance(1, 10), balance(2, 6)], &[]);
        assert_ne!(one, two);
        assert_eq!(one, state_root(&[balance(1, 10), balance(2, 5)], &[]));
    }

    #[test]
    fn test_balance_and_allowance_leaves_are_distinct() {
        let allowance = AllowanceEntry {
            owner: Address::from_low_u64(1),
            spender: Address::from_low_u64(2),
            amount: Amount::from(10u64),
        };
        assert_ne!(
            state_root(&[balance(1, 10)], &[]),
            state_root(&[], &[allowance])
        );
    }
}
