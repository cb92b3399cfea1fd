//! LLAMMA band math and swap simulation in pure Rust.
//!
//! This crate reproduces the quoting path of Curve's lending/liquidation AMM
//! ("LLAMMA") off chain, bit for bit:
//! - Fixed‑point primitives (`math::*`): `wad_exp`, `ln_int`, band prices,
//!   dynamic fees and the per‑band invariant.
//! - An in‑memory [`LlammaPool`] built from a JSON snapshot that quotes exact
//!   input / exact output trades by walking bands, and commits a quoted trade
//!   back into its band reserves.
//! - Optional `onchain` adapters that read pool state and discover pools
//!   through an alloy provider.
//!
//! # Examples
//!
//! ## Pure math
//! ```no_run
//! use llamma_swap_math::{math::exp_math::wad_exp, I256, U256_WAD};
//!
//! let one = wad_exp(I256::ZERO).unwrap();
//! assert_eq!(one, U256_WAD);
//! ```
//!
//! ## Quoting a pool snapshot
//! ```no_run
//! use llamma_swap_math::{LlammaPool, U256};
//!
//! # let json = "{}";
//! let mut pool = LlammaPool::from_json(json).unwrap();
//! let [borrowed, collateral] = pool.token_addresses();
//!
//! // 1000 units of the borrowed token in, collateral out
//! let quote = pool
//!     .quote_exact_input(borrowed, U256::from(1000u64), collateral)
//!     .unwrap();
//! println!("amount out: {}, gas: {}", quote.amount, quote.gas);
//!
//! // Only once the route is executed:
//! pool.commit(&quote.trade).unwrap();
//! ```

pub use alloy_primitives::{Address, I256, U256};

pub mod config;
pub mod error;
mod hash;
pub mod math;
#[cfg(feature = "onchain")]
pub mod onchain;
pub mod pool;

pub use hash::FastMap;

pub use pool::llamma_pool::LlammaPool;
pub use pool::quote::{QuoteResult, TradeDetails};
pub use pool::snapshot::PoolSnapshot;
pub use pool::swap::{DetailedTrade, Direction, WalkEnd};

/// 1e18, the fixed-point unit of every price, fee and internal amount.
pub const U256_WAD: U256 = U256::from_limbs([1000000000000000000, 0, 0, 0]);
/// 2e18
pub const U256_TWO_WAD: U256 = U256::from_limbs([2000000000000000000, 0, 0, 0]);
/// 1e36
pub const U256_WAD_SQUARED: U256 = U256::from_limbs([12919594847110692864, 54210108624275221, 0, 0]);

/// Bands that may be consumed by a single trade.
pub const MAX_TICKS: usize = 50;
/// Empty bands that may be skipped on top of `MAX_TICKS`.
pub const MAX_SKIP_TICKS: usize = 1024;
