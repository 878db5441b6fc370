//! Engine configuration options.
//!
//! Operational knobs only. The solvency parameters (threshold, bonus, minimum
//! health factor) are protocol constants in [`crate::health`].

use crate::oracle::STALENESS_TIMEOUT_SECS;
use serde::{Deserialize, Serialize};

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of events to retain in memory.
    pub max_events: usize,
    /// Maximum age of an oracle answer before valuations refuse it.
    pub staleness_timeout_secs: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_events: 100_000,
            staleness_timeout_secs: STALENESS_TIMEOUT_SECS,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_events == 0 {
            return Err(ConfigError::InvalidEventCapacity);
        }
        if self.staleness_timeout_secs == 0 {
            return Err(ConfigError::InvalidStalenessTimeout);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("max_events must be positive")]
    InvalidEventCapacity,

    #[error("staleness_timeout_secs must be positive")]
    InvalidStalenessTimeout,
}
