use crate::error::{Error, MathError, StateError};
use crate::math::band_math::spot_price;
use crate::math::math_helpers::SafeMath;
use crate::math::price_math::{
    log_a_ratio, max_oracle_dn_pow, p_current_band, p_oracle_down, p_oracle_up,
};
use crate::pool::bands::{Band, BandMap};
use alloy_primitives::{Address, I256, U256};

const U256_TEN: U256 = U256::from_limbs([10, 0, 0, 0]);

/// One side of the pool.
///
/// Index 0 is the borrowed token, which a pump pays in and which lives on the
/// `x` side of every band. Index 1 is the collateral on the `y` side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenInfo {
    pub address: Address,
    pub decimals: u8,
    /// `10^(18 - decimals)`, converts native units into wad.
    pub precision: U256,
}

impl TokenInfo {
    pub fn new(address: Address, decimals: u8) -> Result<Self, StateError> {
        if decimals > 18 {
            return Err(StateError::InvalidTokenDecimals(decimals));
        }
        let precision = U256_TEN.pow(U256::from(18 - decimals));

        Ok(Self {
            address,
            decimals,
            precision,
        })
    }
}

/// Parameters fixed at pool deployment, with the constants derived from `A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlammaStatic {
    pub a: U256,
    pub a_minus_1: U256,
    pub log_a_ratio: I256,
    pub max_oracle_dn_pow: U256,
    pub use_dynamic_fee: bool,
}

impl LlammaStatic {
    pub fn new(a: U256, use_dynamic_fee: bool) -> Result<Self, Error> {
        if a <= U256::ONE {
            return Err(StateError::InvalidAmplification(a.to_string()).into());
        }
        let a_minus_1 = a - U256::ONE;

        Ok(Self {
            a,
            a_minus_1,
            log_a_ratio: log_a_ratio(a, a_minus_1)?,
            max_oracle_dn_pow: max_oracle_dn_pow(a, a_minus_1)?,
            use_dynamic_fee,
        })
    }
}

/// State that changes with every trade and every refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LlammaDynamic {
    pub base_price: U256,
    pub price_oracle: U256,
    pub fee: U256,
    pub admin_fee: U256,
    /// Accrued admin fees in native units of token 0.
    pub admin_fees_x: U256,
    /// Accrued admin fees in native units of token 1.
    pub admin_fees_y: U256,
    pub active_band: i64,
    pub min_band: i64,
    pub max_band: i64,
    pub bands: BandMap,
}

impl LlammaDynamic {
    fn validate(&self) -> Result<(), StateError> {
        if !(self.min_band <= self.active_band && self.active_band <= self.max_band) {
            return Err(StateError::InvalidBandRange {
                min: self.min_band,
                active: self.active_band,
                max: self.max_band,
            });
        }
        if self.price_oracle.is_zero() {
            return Err(StateError::ZeroOraclePrice);
        }
        if self.base_price.is_zero() {
            return Err(StateError::ZeroBasePrice);
        }
        Ok(())
    }
}

/// In-memory LLAMMA pool.
///
/// Quoting borrows the pool immutably; [`LlammaPool::commit`] is the only
/// method that changes band reserves. Clone the pool to explore a trade
/// without touching the original.
#[derive(Debug, Clone)]
pub struct LlammaPool {
    pub(crate) address: Address,
    pub(crate) tokens: [TokenInfo; 2],
    pub(crate) static_params: LlammaStatic,
    pub(crate) state: LlammaDynamic,
}

impl LlammaPool {
    /// Builds a pool after checking `min_band <= active_band <= max_band`
    /// and non-zero prices.
    pub fn new(
        address: Address,
        tokens: [TokenInfo; 2],
        static_params: LlammaStatic,
        state: LlammaDynamic,
    ) -> Result<Self, Error> {
        if tokens[0].address == tokens[1].address {
            return Err(StateError::DuplicateToken.into());
        }
        state.validate()?;

        Ok(Self {
            address,
            tokens,
            static_params,
            state,
        })
    }

    #[inline]
    pub fn address(&self) -> Address {
        self.address
    }

    #[inline]
    pub fn tokens(&self) -> &[TokenInfo; 2] {
        &self.tokens
    }

    #[inline]
    pub fn token_addresses(&self) -> [Address; 2] {
        [self.tokens[0].address, self.tokens[1].address]
    }

    /// Position of `token` in the pool, if it belongs to it.
    pub fn token_index(&self, token: Address) -> Option<usize> {
        self.tokens.iter().position(|t| t.address == token)
    }

    #[inline]
    pub fn static_params(&self) -> &LlammaStatic {
        &self.static_params
    }

    #[inline]
    pub fn state(&self) -> &LlammaDynamic {
        &self.state
    }

    #[inline]
    pub fn active_band(&self) -> i64 {
        self.state.active_band
    }

    #[inline]
    pub fn band(&self, n: i64) -> Band {
        self.state.bands.get(n)
    }

    /// Accrued admin fees `(token 0, token 1)` in native units.
    pub fn admin_fees(&self) -> (U256, U256) {
        (self.state.admin_fees_x, self.state.admin_fees_y)
    }

    pub fn p_oracle_up(&self, n: i64) -> Result<U256, MathError> {
        p_oracle_up(self.state.base_price, self.static_params.log_a_ratio, n)
    }

    pub fn p_oracle_down(&self, n: i64) -> Result<U256, MathError> {
        p_oracle_down(self.state.base_price, self.static_params.log_a_ratio, n)
    }

    /// Highest AMM price band `n` can show at the current oracle price.
    pub fn p_current_up(&self, n: i64) -> Result<U256, MathError> {
        p_current_band(self.state.price_oracle, self.p_oracle_down(n)?)
    }

    /// Lowest AMM price band `n` can show at the current oracle price.
    pub fn p_current_down(&self, n: i64) -> Result<U256, MathError> {
        p_current_band(self.state.price_oracle, self.p_oracle_up(n)?)
    }

    /// Current AMM price, read from the active band.
    pub fn get_p(&self) -> Result<U256, MathError> {
        let n = self.state.active_band;
        let band = self.band(n);
        spot_price(
            band.x,
            band.y,
            self.state.price_oracle,
            self.p_oracle_up(n)?,
            self.static_params.a,
            self.static_params.a_minus_1,
        )
    }

    /// Total reserves `(Σx, Σy)` in wad.
    pub fn get_sum_xy(&self) -> Result<(U256, U256), MathError> {
        self.state.bands.sum_xy()
    }

    /// Total reserves converted to native token units.
    pub fn reserves(&self) -> Result<[U256; 2], MathError> {
        let (sum_x, sum_y) = self.get_sum_xy()?;
        Ok([
            sum_x.safe_div(self.tokens[0].precision)?,
            sum_y.safe_div(self.tokens[1].precision)?,
        ])
    }

    /// Replaces the oracle price, e.g. between two snapshots.
    pub fn set_price_oracle(&mut self, price_oracle: U256) -> Result<(), StateError> {
        if price_oracle.is_zero() {
            return Err(StateError::ZeroOraclePrice);
        }
        self.state.price_oracle = price_oracle;
        Ok(())
    }
}
