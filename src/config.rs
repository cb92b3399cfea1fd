//! Runtime settings of the onchain adapters.
//!
//! Both configs deserialize from JSON, fall back to defaults for missing
//! fields and are checked with `validate` before use. Hash map selection and
//! the adapters themselves are cargo features (`rustc-hash`, `ahash`,
//! `std-hash`, `onchain`).

use crate::error::ConfigError;
use alloy_primitives::{Address, address};
use serde::{Deserialize, Serialize};

/// Multicall3, deployed at the same address on every major EVM chain.
pub const MULTICALL3_ADDRESS: Address = address!("0xca11bde05977b3631167028862be2a173976ca11");

pub const DEFAULT_BAND_WINDOW: u64 = 50;
pub const MAX_BAND_WINDOW: u64 = 512;
pub const DEFAULT_BATCH_SIZE: u64 = 32;
pub const MAX_BATCH_SIZE: u64 = 256;

fn default_multicall() -> Address {
    MULTICALL3_ADDRESS
}

fn default_band_window() -> u64 {
    DEFAULT_BAND_WINDOW
}

fn default_batch_size() -> u64 {
    DEFAULT_BATCH_SIZE
}

/// How much of a pool the tracker reads on every refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
    #[serde(default = "default_multicall")]
    pub multicall_address: Address,
    /// Bands read on each side of the active band.
    #[serde(default = "default_band_window")]
    pub band_window: u64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            multicall_address: MULTICALL3_ADDRESS,
            band_window: DEFAULT_BAND_WINDOW,
        }
    }
}

impl TrackerConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.band_window == 0 || self.band_window > MAX_BAND_WINDOW {
            return Err(ConfigError::InvalidBandWindow {
                got: self.band_window,
                max: MAX_BAND_WINDOW,
            });
        }
        Ok(())
    }
}

/// Where and how fast the discovery walks a factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryConfig {
    pub factory_address: Address,
    #[serde(default = "default_multicall")]
    pub multicall_address: Address,
    /// Index of the first market to read.
    #[serde(default)]
    pub start_index: u64,
    /// Markets read per multicall.
    #[serde(default = "default_batch_size")]
    pub batch_size: u64,
    /// Whether the factory deploys AMMs that charge the oracle-driven fee.
    #[serde(default)]
    pub use_dynamic_fee: bool,
}

impl DiscoveryConfig {
    pub fn new(factory_address: Address) -> Self {
        Self {
            factory_address,
            multicall_address: MULTICALL3_ADDRESS,
            start_index: 0,
            batch_size: DEFAULT_BATCH_SIZE,
            use_dynamic_fee: false,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(ConfigError::InvalidBatchSize {
                got: self.batch_size,
                max: MAX_BATCH_SIZE,
            });
        }
        Ok(())
    }
}
