use crate::FastMap;
use crate::error::MathError;
use crate::math::math_helpers::SafeMath;
use alloy_primitives::U256;

/// Reserves of one band: `x` of token 0 and `y` of token 1, both in wad.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Band {
    pub x: U256,
    pub y: U256,
}

impl Band {
    #[inline]
    pub const fn new(x: U256, y: U256) -> Self {
        Self { x, y }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_zero() && self.y.is_zero()
    }
}

/// Sparse band storage keyed by signed band index.
///
/// A band that is not stored reads as `(0, 0)`, and writing `(0, 0)` removes
/// the entry, so the map only ever holds bands with liquidity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BandMap {
    bands: FastMap<i64, Band>,
}

impl BandMap {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, n: i64) -> Band {
        self.bands.get(&n).copied().unwrap_or_default()
    }

    #[inline]
    pub fn x(&self, n: i64) -> U256 {
        self.get(n).x
    }

    #[inline]
    pub fn y(&self, n: i64) -> U256 {
        self.get(n).y
    }

    /// Stores `band` at `n` and returns what was there before.
    pub fn set(&mut self, n: i64, band: Band) -> Band {
        let previous = if band.is_empty() {
            self.bands.remove(&n)
        } else {
            self.bands.insert(n, band)
        };
        previous.unwrap_or_default()
    }

    /// Number of bands holding liquidity.
    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Bands with liquidity in ascending index order.
    pub fn sorted(&self) -> Vec<(i64, Band)> {
        let mut bands: Vec<(i64, Band)> = self.bands.iter().map(|(n, b)| (*n, *b)).collect();
        bands.sort_unstable_by_key(|(n, _)| *n);
        bands
    }

    /// Total `(Σx, Σy)` over all bands.
    pub fn sum_xy(&self) -> Result<(U256, U256), MathError> {
        self.bands
            .values()
            .try_fold((U256::ZERO, U256::ZERO), |(sum_x, sum_y), band| {
                Ok((sum_x.safe_add(band.x)?, sum_y.safe_add(band.y)?))
            })
    }
}

impl FromIterator<(i64, Band)> for BandMap {
    fn from_iter<T: IntoIterator<Item = (i64, Band)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (n, band) in iter {
            map.set(n, band);
        }
        map
    }
}
