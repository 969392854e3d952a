use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::bluetooth::{
    DEFAULT_DISCOVERY_ATTEMPTS, DEFAULT_DISCOVERY_BACKOFF_MS, DEFAULT_SCAN_WINDOW_MS,
    MAX_CURRENT_AMPS, MIN_CURRENT_AMPS,
};
use crate::error::{BridgeError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// How long one scan may run before the charger is reported missing.
    /// The radio is exclusive, so this also bounds how long other requests wait.
    pub scan_window_ms: u64,

    /// Attribute discovery attempts per acquisition.
    pub discovery_attempts: u32,

    /// Pause between discovery attempts.
    pub discovery_backoff_ms: u64,

    /// Settable charging current range, inclusive.
    pub min_current_amps: u8,
    pub max_current_amps: u8,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            scan_window_ms: DEFAULT_SCAN_WINDOW_MS,
            discovery_attempts: DEFAULT_DISCOVERY_ATTEMPTS,
            discovery_backoff_ms: DEFAULT_DISCOVERY_BACKOFF_MS,
            min_current_amps: MIN_CURRENT_AMPS,
            max_current_amps: MAX_CURRENT_AMPS,
        }
    }
}

impl BridgeConfig {
    pub fn scan_window(&self) -> Duration {
        Duration::from_millis(self.scan_window_ms)
    }

    pub fn discovery_backoff(&self) -> Duration {
        Duration::from_millis(self.discovery_backoff_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scan_window_ms == 0 {
            return Err(BridgeError::Config("scan_window_ms must be positive".to_string()));
        }
        if self.discovery_attempts == 0 {
            return Err(BridgeError::Config("discovery_attempts must be at least 1".to_string()));
        }
        if self.min_current_amps > self.max_current_amps {
            return Err(BridgeError::Config(format!(
                "min_current_amps ({}) exceeds max_current_amps ({})",
                self.min_current_amps, self.max_current_amps
            )));
        }
        Ok(())
    }
}
