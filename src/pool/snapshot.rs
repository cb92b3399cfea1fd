//! JSON snapshot of one pool.
//!
//! 256-bit integers travel as decimal strings. Hex strings with a `0x` prefix
//! and plain JSON numbers are accepted on input too.

use crate::error::{Error, SnapshotError, StateError};
use crate::pool::bands::{Band, BandMap};
use crate::pool::llamma_pool::{LlammaDynamic, LlammaPool, LlammaStatic, TokenInfo};
use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSnapshot {
    #[serde(default)]
    pub address: Address,
    pub tokens: [TokenSnapshot; 2],
    #[serde(rename = "static")]
    pub static_params: StaticSnapshot,
    pub dynamic: DynamicSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSnapshot {
    pub address: Address,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticSnapshot {
    #[serde(rename = "A", with = "u256_string")]
    pub a: U256,
    pub use_dynamic_fee: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicSnapshot {
    #[serde(with = "u256_string")]
    pub base_price: U256,
    #[serde(with = "u256_string")]
    pub price_oracle: U256,
    #[serde(with = "u256_string")]
    pub fee: U256,
    #[serde(with = "u256_string")]
    pub admin_fee: U256,
    #[serde(with = "u256_string", default)]
    pub admin_fees_x: U256,
    #[serde(with = "u256_string", default)]
    pub admin_fees_y: U256,
    pub active_band: i64,
    pub min_band: i64,
    pub max_band: i64,
    #[serde(default)]
    pub bands: Vec<BandSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandSnapshot {
    pub i: i64,
    #[serde(with = "u256_string", default)]
    pub x: U256,
    #[serde(with = "u256_string", default)]
    pub y: U256,
}

impl PoolSnapshot {
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl LlammaPool {
    /// Builds a pool from a snapshot, deriving the static constants from `A`.
    pub fn from_snapshot(snapshot: &PoolSnapshot) -> Result<Self, Error> {
        let tokens = [
            TokenInfo::new(snapshot.tokens[0].address, snapshot.tokens[0].decimals)?,
            TokenInfo::new(snapshot.tokens[1].address, snapshot.tokens[1].decimals)?,
        ];
        let static_params =
            LlammaStatic::new(snapshot.static_params.a, snapshot.static_params.use_dynamic_fee)?;

        let dynamic = &snapshot.dynamic;
        let mut indices: Vec<i64> = dynamic.bands.iter().map(|band| band.i).collect();
        indices.sort_unstable();
        if let Some(pair) = indices.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(StateError::DuplicateBand(pair[0]).into());
        }
        let bands: BandMap = dynamic
            .bands
            .iter()
            .map(|band| (band.i, Band::new(band.x, band.y)))
            .collect();
        let state = LlammaDynamic {
            base_price: dynamic.base_price,
            price_oracle: dynamic.price_oracle,
            fee: dynamic.fee,
            admin_fee: dynamic.admin_fee,
            admin_fees_x: dynamic.admin_fees_x,
            admin_fees_y: dynamic.admin_fees_y,
            active_band: dynamic.active_band,
            min_band: dynamic.min_band,
            max_band: dynamic.max_band,
            bands,
        };

        Self::new(snapshot.address, tokens, static_params, state)
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        let snapshot = PoolSnapshot::from_json(json)?;
        Self::from_snapshot(&snapshot)
    }

    /// Current state as a snapshot, bands in ascending order.
    pub fn snapshot(&self) -> PoolSnapshot {
        let state = &self.state;
        PoolSnapshot {
            address: self.address,
            tokens: self.tokens.map(|t| TokenSnapshot {
                address: t.address,
                decimals: t.decimals,
            }),
            static_params: StaticSnapshot {
                a: self.static_params.a,
                use_dynamic_fee: self.static_params.use_dynamic_fee,
            },
            dynamic: DynamicSnapshot {
                base_price: state.base_price,
                price_oracle: state.price_oracle,
                fee: state.fee,
                admin_fee: state.admin_fee,
                admin_fees_x: state.admin_fees_x,
                admin_fees_y: state.admin_fees_y,
                active_band: state.active_band,
                min_band: state.min_band,
                max_band: state.max_band,
                bands: state
                    .bands
                    .sorted()
                    .into_iter()
                    .map(|(i, band)| BandSnapshot {
                        i,
                        x: band.x,
                        y: band.y,
                    })
                    .collect(),
            },
        }
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(self.snapshot().to_json()?)
    }
}

pub(crate) mod u256_string {
    use alloy_primitives::U256;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(U256::from(n)),
            Raw::Text(s) => parse(&s).map_err(D::Error::custom),
        }
    }

    pub fn parse(s: &str) -> Result<U256, String> {
        let s = s.trim();
        if s.is_empty() {
            return Err("empty 256-bit integer".to_string());
        }
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => U256::from_str_radix(hex, 16),
            None => U256::from_str_radix(s, 10),
        };
        parsed.map_err(|e| format!("invalid 256-bit integer {s:?}: {e}"))
    }
}
