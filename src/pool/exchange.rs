use crate::error::{Error, StateError};
use crate::math::math_helpers::SafeMath;
use crate::pool::bands::Band;
use crate::pool::llamma_pool::LlammaPool;
use crate::pool::swap::{DetailedTrade, Direction};
use alloy_primitives::U256;
use tracing::debug;

impl LlammaPool {
    /// Writes the reserves recorded in `trade` back into the bands it walked.
    ///
    /// Bands `min(n1, n2)..=max(n1, n2)` get their input-side reserve from
    /// `ticks_in`; band `n2` keeps `last_tick_j` on the output side and every
    /// other band is left empty on that side. The admin fee is accrued in
    /// native units of the input token and `n2` becomes the active band.
    pub(crate) fn apply_trade(&mut self, trade: &DetailedTrade) -> Result<(), Error> {
        let mismatch = StateError::TickMismatch {
            n1: trade.n1,
            n2: trade.n2,
        };
        let n_diff = usize::try_from(trade.n2.abs_diff(trade.n1)).map_err(|_| mismatch.clone())?;
        if trade.ticks_in.len() != n_diff + 1 {
            return Err(mismatch.into());
        }
        let in_band_range = |n: i64| self.state.min_band <= n && n <= self.state.max_band;
        if !in_band_range(trade.n1) || !in_band_range(trade.n2) {
            return Err(mismatch.into());
        }

        let in_index = trade.direction.in_index();
        let admin_fee = trade
            .admin_fee
            .safe_div(self.tokens[in_index].precision)?;
        match trade.direction {
            Direction::Pump => {
                self.state.admin_fees_x = self.state.admin_fees_x.safe_add(admin_fee)?;
            }
            Direction::Dump => {
                self.state.admin_fees_y = self.state.admin_fees_y.safe_add(admin_fee)?;
            }
        }

        let start = trade.n1.min(trade.n2);
        for (k, n) in (start..).take(n_diff + 1).enumerate() {
            let last = if n == trade.n2 {
                trade.last_tick_j
            } else {
                U256::ZERO
            };
            let band = match trade.direction {
                Direction::Pump => Band::new(trade.ticks_in[k], last),
                Direction::Dump => Band::new(last, trade.ticks_in[n_diff - k]),
            };
            self.state.bands.set(n, band);
        }
        self.state.active_band = trade.n2;

        debug!(
            pool = %self.address,
            n1 = trade.n1,
            n2 = trade.n2,
            admin_fee = %admin_fee,
            "applied trade"
        );

        Ok(())
    }
}
