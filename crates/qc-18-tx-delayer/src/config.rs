//! Configuration for the transaction delayer

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Delayer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DelayerConfig {
    /// L1 slot duration in seconds, offsets timestamp waits
    pub ethereum_slot_duration_secs: u64,
    /// Condition waiter budget
    pub wait: WaitConfig,
}

impl Default for DelayerConfig {
    fn default() -> Self {
        Self {
            ethereum_slot_duration_secs: 12,
            wait: WaitConfig::default(),
        }
    }
}

/// Polling budget for waiting on the L1 head
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Give up after this long (milliseconds)
    pub timeout_ms: u64,
    /// Sleep between polls (milliseconds)
    pub poll_interval_ms: u64,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 120_000,
            poll_interval_ms: 100,
        }
    }
}

impl WaitConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("slot duration cannot be 0")]
    ZeroSlotDuration,
    #[error("invalid wait budget: {0}")]
    InvalidWaitBudget(String),
}

impl DelayerConfig {
    /// Create a config with the given slot duration and default wait budget
    pub fn with_slot_duration(ethereum_slot_duration_secs: u64) -> Self {
        Self {
            ethereum_slot_duration_secs,
            ..Default::default()
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_L1_SLOT_DURATION_SECS`: L1 slot duration (default: 12)
    /// - `QC_DELAYER_WAIT_TIMEOUT_MS`: Wait timeout (default: 120000)
    /// - `QC_DELAYER_POLL_INTERVAL_MS`: Poll interval (default: 100)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            ethereum_slot_duration_secs: env_u64("QC_L1_SLOT_DURATION_SECS")
                .unwrap_or(defaults.ethereum_slot_duration_secs),
            wait: WaitConfig {
                timeout_ms: env_u64("QC_DELAYER_WAIT_TIMEOUT_MS")
                    .unwrap_or(defaults.wait.timeout_ms),
                poll_interval_ms: env_u64("QC_DELAYER_POLL_INTERVAL_MS")
                    .unwrap_or(defaults.wait.poll_interval_ms),
            },
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ethereum_slot_duration_secs == 0 {
            return Err(ConfigError::ZeroSlotDuration);
        }

        if self.wait.timeout_ms == 0 {
            return Err(ConfigError::InvalidWaitBudget(
                "timeout_ms cannot be 0".into(),
            ));
        }

        if self.wait.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidWaitBudget(
                "poll_interval_ms cannot be 0".into(),
            ));
        }

        if self.wait.poll_interval_ms > self.wait.timeout_ms {
            return Err(ConfigError::InvalidWaitBudget(format!(
                "poll_interval_ms {} exceeds timeout_ms {}",
                self.wait.poll_interval_ms, self.wait.timeout_ms
            )));
        }

        Ok(())
    }
}

fn env_u64(key: &str) -> Option<u64> {
    env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
