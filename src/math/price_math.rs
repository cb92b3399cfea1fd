use crate::U256_WAD;
use crate::error::MathError;
use crate::math::exp_math::{ln_int, wad_exp};
use crate::math::math_helpers::SafeMath;
use alloy_primitives::{I256, U256};

const U256_25: U256 = U256::from_limbs([25, 0, 0, 0]);

/// `ln(A / (A - 1))` in wad, the log-distance between two adjacent bands.
pub fn log_a_ratio(a: U256, a_minus_1: U256) -> Result<I256, MathError> {
    let ratio = U256_WAD.safe_mul(a)?.safe_div(a_minus_1)?;
    Ok(ln_int(ratio))
}

/// `(A / (A - 1))^50` in wad.
///
/// Bounds how far from the oracle price a trade may walk: the on-chain
/// contract evaluates it as `((A^25 * 1e18 / (A - 1)^25)^2) / 1e18`, and the
/// truncation of the inner division is part of the value.
pub fn max_oracle_dn_pow(a: U256, a_minus_1: U256) -> Result<U256, MathError> {
    let a_pow = a.checked_pow(U256_25).ok_or(MathError::Overflow)?;
    let a_minus_1_pow = a_minus_1.checked_pow(U256_25).ok_or(MathError::Overflow)?;
    let ratio = a_pow.safe_mul(U256_WAD)?.safe_div(a_minus_1_pow)?;
    ratio.safe_mul(ratio)?.safe_div(U256_WAD)
}

/// Upper oracle price of band `n`: `base_price * ((A - 1) / A)^n`,
/// evaluated as `base_price * exp(-n * ln(A / (A - 1))) / 1e18`.
pub fn p_oracle_up(base_price: U256, log_a_ratio: I256, n: i64) -> Result<U256, MathError> {
    let neg_n = n.checked_neg().ok_or(MathError::Overflow)?;
    let neg_n = I256::try_from(neg_n).map_err(|_| MathError::Overflow)?;
    let power = neg_n.checked_mul(log_a_ratio).ok_or(MathError::Overflow)?;
    let exp_result = wad_exp(power)?;
    base_price.safe_mul(exp_result)?.safe_div(U256_WAD)
}

/// Lower oracle price of band `n`, which is the upper price of band `n + 1`.
pub fn p_oracle_down(base_price: U256, log_a_ratio: I256, n: i64) -> Result<U256, MathError> {
    let next = n.checked_add(1).ok_or(MathError::Overflow)?;
    p_oracle_up(base_price, log_a_ratio, next)
}

/// Moves a band's upper oracle price one band up (`n + 1`).
///
/// The swap walk updates prices incrementally like this instead of calling
/// [`p_oracle_up`] again, and the result differs from a fresh evaluation in the
/// last digits.
#[inline]
pub fn step_band_up(p_o_up: U256, a: U256, a_minus_1: U256) -> Result<U256, MathError> {
    p_o_up.safe_mul(a_minus_1)?.safe_div(a)
}

/// Moves a band's upper oracle price one band down (`n - 1`).
#[inline]
pub fn step_band_down(p_o_up: U256, a: U256, a_minus_1: U256) -> Result<U256, MathError> {
    p_o_up.safe_mul(a)?.safe_div(a_minus_1)
}

/// AMM price at a band boundary for oracle price `p_o`: `p_o^3 / p_band^2`.
///
/// With `p_band = p_oracle_up(n)` this is the current-price lower bound of
/// band `n`; with `p_band = p_oracle_down(n)` it is the upper bound.
pub fn p_current_band(p_o: U256, p_band: U256) -> Result<U256, MathError> {
    p_o.safe_mul(p_o)?
        .safe_div(p_band)?
        .safe_mul(p_o)?
        .safe_div(p_band)
}
