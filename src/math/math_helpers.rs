use crate::error::MathError;
use alloy_primitives::U256;

/// Checked 256‑bit arithmetic returning [`MathError`] instead of
/// panicking or wrapping.
///
/// Band math chains long expressions such as `A * y0 * p_o / p_o_up * p_o / 1e18`.
/// Every step truncates in place, so the chain must be evaluated left to right
/// exactly as written; these methods keep that order readable while still
/// surfacing overflow as a typed error.
pub trait SafeMath: Sized {
    fn safe_add(self, rhs: Self) -> Result<Self, MathError>;
    fn safe_sub(self, rhs: Self) -> Result<Self, MathError>;
    fn safe_mul(self, rhs: Self) -> Result<Self, MathError>;
    fn safe_div(self, rhs: Self) -> Result<Self, MathError>;
}

impl SafeMath for U256 {
    #[inline(always)]
    fn safe_add(self, rhs: Self) -> Result<Self, MathError> {
        self.checked_add(rhs).ok_or(MathError::Overflow)
    }

    #[inline(always)]
    fn safe_sub(self, rhs: Self) -> Result<Self, MathError> {
        self.checked_sub(rhs).ok_or(MathError::Underflow)
    }

    #[inline(always)]
    fn safe_mul(self, rhs: Self) -> Result<Self, MathError> {
        self.checked_mul(rhs).ok_or(MathError::Overflow)
    }

    #[inline(always)]
    fn safe_div(self, rhs: Self) -> Result<Self, MathError> {
        if rhs.is_zero() {
            return Err(MathError::DivisionByZero);
        }
        Ok(self.wrapping_div(rhs))
    }
}

/// Floor of the integer square root, matching Vyper's `isqrt`.
pub fn sqrt_int(x: U256) -> U256 {
    if x.is_zero() {
        return U256::ZERO;
    }

    // 2^ceil(bits / 2) is always >= sqrt(x), so Newton descends monotonically.
    let mut z = U256::ONE << x.bit_len().div_ceil(2);
    loop {
        let y = (z + x / z) >> 1;
        if y >= z {
            return z;
        }
        z = y;
    }
}

/// Rounds `amount` up to the next multiple of `precision`.
#[inline]
pub fn round_up_to(amount: U256, precision: U256) -> Result<U256, MathError> {
    amount
        .safe_add(precision.safe_sub(U256::ONE)?)?
        .safe_div(precision)?
        .safe_mul(precision)
}

/// Rounds `amount` down to a multiple of `precision`.
#[inline]
pub fn round_down_to(amount: U256, precision: U256) -> Result<U256, MathError> {
    amount.safe_div(precision)?.safe_mul(precision)
}
