//! Configuration for the token ledger service layer

use crate::engine::{DEFAULT_EVENT_CHANNEL_CAPACITY, MAX_CHANNEL_CAPACITY};
use crate::types::Address;
use serde::{Deserialize, Serialize};

/// Ledger configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name
    pub service_name: String,

    /// Account that receives the supply at deployment
    pub initial_holder: Option<Address>,

    /// Actor configuration
    pub actor: ActorConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_name: "token-ledger".to_string(),
            initial_holder: None,
            actor: ActorConfig::default(),
            logging: LoggingConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

/// Actor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ActorConfig {
    /// Bounded mailbox size (backpressure)
    pub mailbox_capacity: usize,

    /// Per-subscriber event buffer
    pub event_channel_capacity: usize,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: 1000,
            event_channel_capacity: DEFAULT_EVENT_CHANNEL_CAPACITY,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (overridden by `RUST_LOG`)
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Record operation metrics
    pub enabled: bool,

    /// Metric name prefix
    pub namespace: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            namespace: "token".to_string(),
        }
    }
}

impl Config {
    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> crate::Result<Self> {
        let mut config = Config::default();

        if let Ok(holder) = std::env::var("TOKEN_LEDGER_INITIAL_HOLDER") {
            let holder = holder.parse().map_err(|e| {
                crate::Error::Config(format!("TOKEN_LEDGER_INITIAL_HOLDER: {}", e))
            })?;
            config.initial_holder = Some(holder);
        }

        if let Ok(capacity) = std::env::var("TOKEN_LEDGER_MAILBOX_CAPACITY") {
            config.actor.mailbox_capacity = capacity.parse().map_err(|e| {
                crate::Error::Config(format!("TOKEN_LEDGER_MAILBOX_CAPACITY: {}", e))
            })?;
        }

        if let Ok(level) = std::env::var("TOKEN_LEDGER_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(json) = std::env::var("TOKEN_LEDGER_LOG_JSON") {
            config.logging.json = json.parse().map_err(|e| {
                crate::Error::Config(format!("TOKEN_LEDGER_LOG_JSON: {}", e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if !(1..=MAX_CHANNEL_CAPACITY).contains(&self.actor.mailbox_capacity) {
            return Err(crate::Error::Config(format!(
                "actor.mailbox_capacity must be between 1 and {}",
                MAX_CHANNEL_CAPACITY
            )));
        }
        if !(1..=MAX_CHANNEL_CAPACITY).contains(&self.actor.event_channel_capacity) {
            return Err(crate::Error::Config(format!(
                "actor.event_channel_capacity must be between 1 and {}",
                MAX_CHANNEL_CAPACITY
            )));
        }
        if matches!(self.initial_holder, Some(holder) if holder.is_null()) {
            return Err(crate::Error::Config(
                "initial_holder must not be the null address".to_string(),
            ));
        }
        Ok(())
    }
}
