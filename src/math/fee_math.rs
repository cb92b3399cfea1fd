use crate::error::MathError;
use crate::math::math_helpers::SafeMath;
use crate::{U256_WAD, U256_WAD_SQUARED};
use alloy_primitives::U256;

// 1e18 / 4, the slope of the dynamic fee
const QUARTER_WAD: U256 = U256::from_limbs([250000000000000000, 0, 0, 0]);

/// Fee that grows with the distance between the oracle price and the band.
///
/// The band's current-price bounds for oracle price `p_o` are
/// `pcd = p_o^3 / p_o_up^2` and `pcu = pcd * (A / (A - 1))^2`. Below `pcd` the
/// fee is `(pcd - p_o) / 4 / pcd`, above `pcu` it is `(p_o - pcu) / 4 / p_o`,
/// and inside the bounds it is zero.
pub fn get_dynamic_fee(
    p_o: U256,
    p_o_up: U256,
    a: U256,
    a_minus_1: U256,
) -> Result<U256, MathError> {
    let pcd = p_o
        .safe_mul(p_o)?
        .safe_div(p_o_up)?
        .safe_mul(p_o)?
        .safe_div(p_o_up)?;
    let pcu = pcd
        .safe_mul(a)?
        .safe_div(a_minus_1)?
        .safe_mul(a)?
        .safe_div(a_minus_1)?;

    if p_o < pcd {
        (pcd - p_o).safe_mul(QUARTER_WAD)?.safe_div(pcd)
    } else if p_o > pcu {
        (p_o - pcu).safe_mul(QUARTER_WAD)?.safe_div(p_o)
    } else {
        Ok(U256::ZERO)
    }
}

/// Gross-up multiplier `1e36 / (1e18 - fee)`, with the fee capped just below 100%.
#[inline]
pub fn antifee(fee: U256) -> Result<U256, MathError> {
    let fee = fee.min(U256_WAD - U256::ONE);
    U256_WAD_SQUARED.safe_div(U256_WAD - fee)
}

/// Share of a fee increment owed to the admin: `(gross - net) * admin_fee / 1e18`.
#[inline]
pub fn admin_share(gross: U256, net: U256, admin_fee: U256) -> Result<U256, MathError> {
    gross.safe_sub(net)?.safe_mul(admin_fee)?.safe_div(U256_WAD)
}
