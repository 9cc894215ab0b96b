//! Core types for the token ledger
//!
//! All types are designed for:
//! - Deterministic serialization (bincode / serde_json)
//! - Cheap copies (addresses and amounts are `Copy`)
//! - Exact arithmetic (256-bit unsigned integers, base units only)

use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Token amount in base units (256-bit unsigned)
pub type Amount = U256;

/// Allowance value that is never decremented by a delegated transfer
pub const UNLIMITED_ALLOWANCE: Amount = U256::MAX;

/// Token name
pub const TOKEN_NAME: &str = "BJITCoin";

/// Token ticker symbol
pub const TOKEN_SYMBOL: &str = "BJIT";

/// Number of decimal places between whole tokens and base units
pub const TOKEN_DECIMALS: u8 = 18;

/// Whole tokens minted at construction
pub const TOTAL_SUPPLY_WHOLE_TOKENS: u64 = 50_000_000_000;

/// Total supply in base units (50 billion tokens with 18 decimals)
pub fn total_supply() -> Amount {
    U256::from(TOTAL_SUPPLY_WHOLE_TOKENS) * U256::exp10(TOKEN_DECIMALS as usize)
}

/// Account identifier (20-byte address)
///
/// The all-zero address is reserved as the null identity and is never a
/// valid transfer participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; 20]);

impl Address {
    /// The null identity
    pub const NULL: Address = Address([0u8; 20]);

    /// Deterministic test/demo address whose last byte is `n`
    pub fn from_low_u64(n: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&n.to_be_bytes());
        Self(bytes)
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Whether this is the null identity
    pub fn is_null(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Address parse failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid address '{input}': expected 40 hex digits")]
pub struct ParseAddressError {
    input: String,
}

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let err = || ParseAddressError {
            input: s.to_string(),
        };
        if digits.len() != 40 {
            return Err(err());
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes).map_err(|_| err())?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Static token description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    /// Human-readable name
    pub name: String,
    /// Ticker symbol
    pub symbol: String,
    /// Display decimals
    pub decimals: u8,
}

impl Default for TokenMetadata {
    fn default() -> Self {
        Self {
            name: TOKEN_NAME.to_string(),
            symbol: TOKEN_SYMBOL.to_string(),
            decimals: TOKEN_DECIMALS,
        }
    }
}

/// Units conversion failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitsError {
    /// Not a decimal number
    #[error("invalid decimal amount '{0}'")]
    Malformed(String),

    /// More fractional digits than the token supports
    #[error("amount '{0}' has more than {1} fractional digits")]
    TooPrecise(String, u8),

    /// Does not fit in 256 bits
    #[error("amount '{0}' overflows 256 bits")]
    Overflow(String),
}

/// Convert a display amount ("100", "0.5") into base units
pub fn parse_units(value: &str, decimals: u8) -> Result<Amount, UnitsError> {
    let value = value.trim();
    let (whole, frac) = match value.split_once('.') {
        Some((w, f)) => (w, f),
        None => (value, ""),
    };

    let is_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && frac.is_empty()) || !is_digits(whole) || !is_digits(frac) {
        return Err(UnitsError::Malformed(value.to_string()));
    }
    if frac.len() > decimals as usize {
        return Err(UnitsError::TooPrecise(value.to_string(), decimals));
    }

    let padded = format!("{}{:0<width$}", whole, frac, width = decimals as usize);
    let digits = padded.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(Amount::zero());
    }
    U256::from_dec_str(digits).map_err(|_| UnitsError::Overflow(value.to_string()))
}

/// Render base units as a display amount, trimming trailing fractional zeros
pub fn format_units(amount: Amount, decimals: u8) -> String {
    let scale = U256::exp10(decimals as usize);
    let (whole, frac) = amount.div_mod(scale);
    if frac.is_zero() {
        return whole.to_string();
    }

    let frac = format!("{:0>width$}", frac.to_string(), width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}
