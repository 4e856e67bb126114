//! Wallet configuration.
//!
//! Loaded from a JSON file; missing fields fall back to defaults.
//!
//! ```json
//! {
//!   "auto_lock_secs": 900,
//!   "kdf_iterations": 100000,
//!   "default_entropy_bits": 128,
//!   "channel_capacity": 32
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use qnet_crypto::kdf::{DEFAULT_KDF_ITERATIONS, MIN_KDF_ITERATIONS};
use qnet_types::mnemonic::DEFAULT_ENTROPY_BITS;
use qnet_types::WordCount;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;

/// Default inactivity timeout (15 minutes).
pub const DEFAULT_AUTO_LOCK_SECS: u64 = 900;

/// Longest accepted inactivity timeout (one day).
pub const MAX_AUTO_LOCK_SECS: u64 = 24 * 60 * 60;

/// Default request queue depth for the wallet service.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletConfig {
    /// Seconds of inactivity before the wallet locks itself.
    pub auto_lock_secs: u64,
    /// PBKDF2 iterations for newly sealed vaults.
    pub kdf_iterations: u32,
    /// Entropy for generated mnemonics (128 → 12 words).
    pub default_entropy_bits: usize,
    pub channel_capacity: usize,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            auto_lock_secs: DEFAULT_AUTO_LOCK_SECS,
            kdf_iterations: DEFAULT_KDF_ITERATIONS,
            default_entropy_bits: DEFAULT_ENTROPY_BITS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl WalletConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, WalletError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            WalletError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, WalletError> {
        let config: Self = serde_json::from_str(text)
            .map_err(|e| WalletError::Config(format!("invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), WalletError> {
        if self.auto_lock_secs == 0 || self.auto_lock_secs > MAX_AUTO_LOCK_SECS {
            return Err(WalletError::Config(format!(
                "auto_lock_secs must be between 1 and {}, got {}",
                MAX_AUTO_LOCK_SECS, self.auto_lock_secs
            )));
        }
        if self.kdf_iterations < MIN_KDF_ITERATIONS {
            return Err(WalletError::Config(format!(
                "kdf_iterations must be at least {}, got {}",
                MIN_KDF_ITERATIONS, self.kdf_iterations
            )));
        }
        if WordCount::from_entropy_bits(self.default_entropy_bits).is_none() {
            return Err(WalletError::Config(format!(
                "default_entropy_bits must be 128, 160, 192, 224 or 256, got {}",
                self.default_entropy_bits
            )));
        }
        if self.channel_capacity == 0 {
            return Err(WalletError::Config("channel_capacity must be positive".into()));
        }
        Ok(())
    }

    pub fn auto_lock_timeout(&self) -> Duration {
        Duration::from_secs(self.auto_lock_secs)
    }
}
