use crate::error::MathError;
use crate::{U256_WAD, U256_TWO_WAD};
use alloy_primitives::{I256, U256};

/// `floor(ln(0.5e-18) * 1e18)`: at or below this `wad_exp` rounds to zero.
pub const EXP_LOWER_BOUND: I256 = I256::from_raw(U256::from_limbs([
    13200553366675887297,
    18446744073709551613,
    u64::MAX,
    u64::MAX,
]));
/// `floor(ln((2^255 - 1) / 1e18) * 1e18)`: at or above this the result is not representable.
pub const EXP_UPPER_BOUND: I256 = I256::from_raw(U256::from_limbs([6178790852926370277, 7, 0, 0]));

/// `log2(e)` in wad.
pub const LOG2_E: U256 = U256::from_limbs([1442695040888963328, 0, 0, 0]);

const FIVE_POW_18: I256 = I256::from_raw(U256::from_limbs([3814697265625, 0, 0, 0]));
// ln(2) in 2^96 base
const LN2_X96: I256 = I256::from_raw(U256::from_limbs([15118436252839555992, 2977044471, 0, 0]));
const HALF_X96: I256 = I256::from_raw(U256::from_limbs([0, 2147483648, 0, 0]));

const P1: I256 = I256::from_raw(U256::from_limbs([4021714997422814800, 72987764733, 0, 0]));
const P2: I256 = I256::from_raw(U256::from_limbs([15103936341470079466, 3098401593211, 0, 0]));
const P3: I256 = I256::from_raw(U256::from_limbs([10850458028954966636, 5106676214411, 0, 0]));
const P4: I256 = I256::from_raw(U256::from_limbs([11323734702077600848, 1556861282905762, 0, 0]));
// already shifted left by 96
const P5: I256 = I256::from_raw(U256::from_limbs([
    0,
    4263963662256963584,
    16986032210076971448,
    55349,
]));

const Q1: I256 = I256::from_raw(U256::from_limbs([12887555761442761468, 154823495327, 0, 0]));
const Q2: I256 = I256::from_raw(U256::from_limbs([14438380032906984665, 2711622357455, 0, 0]));
const Q3: I256 = I256::from_raw(U256::from_limbs([7660730384882190788, 28939797259087, 0, 0]));
const Q4: I256 = I256::from_raw(U256::from_limbs([14958195001563919525, 195419703473219, 0, 0]));
const Q5: I256 = I256::from_raw(U256::from_limbs([5884290600356364053, 781905387190095, 0, 0]));
const Q6: I256 = I256::from_raw(U256::from_limbs([5163562563322150231, 1433813381519787, 0, 0]));

// scale factor s * 1e18 / 2^96 in 2^213 base
const EXP_SCALE: U256 = U256::from_limbs([
    17181495799676635891,
    7188640403681034642,
    11234296709,
    0,
]);

/// Natural exponential of a signed wad, returned as an unsigned wad.
///
/// Binary range reduction `exp(x) = exp(x') * 2^k` followed by a (6, 7)-term
/// rational approximation and one final rescale. The intermediate steps are
/// unchecked on chain (the bounds make them safe), so they wrap here as well;
/// right shifts are arithmetic and divisions truncate toward zero.
///
/// Returns zero for `x <= EXP_LOWER_BOUND` and `MathError::ExpOverflow` for
/// `x >= EXP_UPPER_BOUND`.
pub fn wad_exp(x: I256) -> Result<U256, MathError> {
    if x <= EXP_LOWER_BOUND {
        return Ok(U256::ZERO);
    }
    if x >= EXP_UPPER_BOUND {
        return Err(MathError::ExpOverflow);
    }

    // wad -> 2^96 base: multiply by 1e18 / 2^96 = 5^18 / 2^78
    let mut value = (x << 78usize).wrapping_div(FIVE_POW_18);

    // k = round(x / ln 2), x' = x - k * ln 2, with k in [-61, 195]
    let k = (value << 96usize)
        .wrapping_div(LN2_X96)
        .wrapping_add(HALF_X96)
        .asr(96);
    value = value.wrapping_sub(k.wrapping_mul(LN2_X96));

    // p is monic; it stays in 2^192 base so the division lands in 2^96
    let y = value
        .wrapping_add(P1)
        .wrapping_mul(value)
        .asr(96)
        .wrapping_add(P2);
    let p = y
        .wrapping_add(value)
        .wrapping_sub(P3)
        .wrapping_mul(y)
        .asr(96)
        .wrapping_add(P4)
        .wrapping_mul(value)
        .wrapping_add(P5);

    let mut q = value
        .wrapping_sub(Q1)
        .wrapping_mul(value)
        .asr(96)
        .wrapping_add(Q2);
    q = q.wrapping_mul(value).asr(96).wrapping_sub(Q3);
    q = q.wrapping_mul(value).asr(96).wrapping_add(Q4);
    q = q.wrapping_mul(value).asr(96).wrapping_sub(Q5);
    q = q.wrapping_mul(value).asr(96).wrapping_add(Q6);

    // q has no real roots, and r lands in (0.09, 0.25) * 2^96
    let r = p.wrapping_div(q);

    let shift = (195 - k.low_i64()) as usize;
    Ok(r.into_raw().wrapping_mul(EXP_SCALE) >> shift)
}

/// Natural logarithm of an unsigned wad `x >= 1e18`.
///
/// Extracts `log2(x)` bit by bit: eight steps strip `2^(2^k)` factors for the
/// integer part, then 59 square-and-compare steps refine the fraction (enough
/// for 18 decimals). The result is `log2(x) / log2(e)`.
///
/// `x` is taken by value and consumed as the working register.
pub fn ln_int(mut x: U256) -> I256 {
    let mut res = U256::ZERO;

    for i in 0..8 {
        let t = 1usize << (7 - i);
        let p = U256::ONE << t;
        if x >= p * U256_WAD {
            x /= p;
            res += U256::from(t) * U256_WAD;
        }
    }

    let mut d = U256_WAD;
    for _ in 0..59 {
        if x >= U256_TWO_WAD {
            res += d;
            x /= U256::from(2u8);
        }
        x = x * x / U256_WAD;
        d /= U256::from(2u8);
    }

    I256::from_raw(res * U256_WAD / LOG2_E)
}
