use crate::U256_WAD;
use crate::error::MathError;
use crate::math::math_helpers::{SafeMath, sqrt_int};
use alloy_primitives::U256;

const U256_FOUR: U256 = U256::from_limbs([4, 0, 0, 0]);

/// Invariant parameter `y0` of a band holding `x` of token 0 and `y` of token 1.
///
/// `y0` is the amount of token 1 the band would hold with the AMM price at the
/// band's upper edge. One-sided bands have a closed form; two-sided bands take
/// the positive root of `A * p_o * y0^2 - b * y0 - x * y = 0`.
pub fn get_y0(
    x: U256,
    y: U256,
    p_o: U256,
    p_o_up: U256,
    a: U256,
    a_minus_1: U256,
) -> Result<U256, MathError> {
    let mut b = U256::ZERO;
    if !x.is_zero() {
        b = p_o_up.safe_mul(a_minus_1)?.safe_mul(x)?.safe_div(p_o)?;
    }
    if !y.is_zero() {
        let y_term = a
            .safe_mul(p_o.safe_mul(p_o)?)?
            .safe_div(p_o_up)?
            .safe_mul(y)?
            .safe_div(U256_WAD)?;
        b = b.safe_add(y_term)?;
    }

    if !x.is_zero() && !y.is_zero() {
        let four_a_p_o_y = U256_FOUR
            .safe_mul(a)?
            .safe_mul(p_o)?
            .safe_mul(y)?
            .safe_div(U256_WAD)?;
        let discriminant = b.safe_mul(b)?.safe_add(four_a_p_o_y.safe_mul(x)?)?;
        let denominator = U256::from(2u8).safe_mul(a)?.safe_mul(p_o)?;
        b.safe_add(sqrt_int(discriminant))?
            .safe_mul(U256_WAD)?
            .safe_div(denominator)
    } else {
        b.safe_mul(U256_WAD)?.safe_div(a.safe_mul(p_o)?)
    }
}

/// The constant-product form `(f + x) * (g + y) = inv` of one band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandInvariant {
    pub y0: U256,
    pub f: U256,
    pub g: U256,
    pub inv: U256,
}

impl BandInvariant {
    pub fn compute(
        x: U256,
        y: U256,
        p_o: U256,
        p_o_up: U256,
        a: U256,
        a_minus_1: U256,
    ) -> Result<Self, MathError> {
        let y0 = get_y0(x, y, p_o, p_o_up, a, a_minus_1)?;
        let f = a
            .safe_mul(y0)?
            .safe_mul(p_o)?
            .safe_div(p_o_up)?
            .safe_mul(p_o)?
            .safe_div(U256_WAD)?;
        let g = a_minus_1.safe_mul(y0)?.safe_mul(p_o_up)?.safe_div(p_o)?;
        let inv = f.safe_add(x)?.safe_mul(g.safe_add(y)?)?;

        Ok(Self { y0, f, g, inv })
    }
}

/// AMM price of a band holding `(x, y)`, in units of token 0 per token 1.
///
/// An empty band reports the middle of its range, a band holding only token 1
/// its lower bound and a band holding only token 0 its upper bound.
pub fn spot_price(
    x: U256,
    y: U256,
    p_o: U256,
    p_o_up: U256,
    a: U256,
    a_minus_1: U256,
) -> Result<U256, MathError> {
    let edge_price = |p_band: U256| -> Result<U256, MathError> {
        p_o.safe_mul(p_o)?
            .safe_div(p_band)?
            .safe_mul(p_o)?
            .safe_div(p_band)
    };

    if x.is_zero() {
        let p_current_down = edge_price(p_o_up)?;
        if y.is_zero() {
            return p_current_down.safe_mul(a)?.safe_div(a_minus_1);
        }
        return Ok(p_current_down);
    }
    if y.is_zero() {
        return edge_price(p_o_up.safe_mul(a_minus_1)?.safe_div(a)?);
    }

    // f and g here stay unscaled by 1e18, unlike the invariant's terms
    let y0 = get_y0(x, y, p_o, p_o_up, a, a_minus_1)?;
    let f = a
        .safe_mul(y0)?
        .safe_mul(p_o)?
        .safe_div(p_o_up)?
        .safe_mul(p_o)?;
    let g = a_minus_1.safe_mul(y0)?.safe_mul(p_o_up)?.safe_div(p_o)?;

    f.safe_add(x.safe_mul(U256_WAD)?)?.safe_div(g.safe_add(y)?)
}
