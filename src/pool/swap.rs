use crate::error::Error;
use crate::math::band_math::BandInvariant;
use crate::math::fee_math::{admin_share, antifee, get_dynamic_fee};
use crate::math::math_helpers::{SafeMath, round_down_to, round_up_to};
use crate::math::price_math::{step_band_down, step_band_up};
use crate::pool::llamma_pool::LlammaPool;
use crate::{MAX_SKIP_TICKS, MAX_TICKS, U256_WAD, U256_WAD_SQUARED};
use alloy_primitives::U256;
use tracing::trace;

/// Which way a trade moves the price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Token 0 in, token 1 out. Walks towards higher band indices.
    Pump,
    /// Token 1 in, token 0 out. Walks towards lower band indices.
    Dump,
}

impl Direction {
    /// Direction of a trade paying in token `in_index`.
    #[inline]
    pub fn from_in_index(in_index: usize) -> Self {
        if in_index == 0 { Self::Pump } else { Self::Dump }
    }

    #[inline]
    pub fn in_index(self) -> usize {
        match self {
            Self::Pump => 0,
            Self::Dump => 1,
        }
    }

    #[inline]
    pub fn out_index(self) -> usize {
        1 - self.in_index()
    }
}

/// Why the band walk stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkEnd {
    /// The requested amount was fully served inside a band.
    Filled,
    /// The next band would lie past `max_band` (pump) or `min_band` (dump).
    BandLimit,
    /// `MAX_TICKS` bands were consumed.
    TickBudget,
    /// The band's price drifted too far from the oracle.
    OracleDistance,
    /// `MAX_TICKS + MAX_SKIP_TICKS` iterations ran out.
    IterationLimit,
}

/// Result of one band walk, in wad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailedTrade {
    pub direction: Direction,
    pub in_amount: U256,
    pub out_amount: U256,
    /// First band with liquidity the walk reached.
    pub n1: i64,
    /// Band the walk ended in, the active band after a commit.
    pub n2: i64,
    /// Post-trade input-side reserve of every band from `n1` to `n2`, in walk order.
    pub ticks_in: Vec<U256>,
    /// Output-side reserve left in band `n2`.
    pub last_tick_j: U256,
    /// Admin share of the fees, in wad of the input token.
    pub admin_fee: U256,
    pub walk_end: WalkEnd,
}

impl DetailedTrade {
    fn new(direction: Direction, active_band: i64) -> Self {
        Self {
            direction,
            in_amount: U256::ZERO,
            out_amount: U256::ZERO,
            n1: 0,
            n2: active_band,
            ticks_in: Vec::new(),
            last_tick_j: U256::ZERO,
            admin_fee: U256::ZERO,
            walk_end: WalkEnd::IterationLimit,
        }
    }

    /// Number of bands the trade writes on commit.
    #[inline]
    pub fn bands_touched(&self) -> usize {
        self.ticks_in.len()
    }
}

/// Outcome of trading against a single band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BandStep {
    /// Nothing to take on the output side.
    Skipped,
    /// The band was emptied on the output side and the walk goes on.
    Crossed { tick: U256 },
    /// The trade completed inside the band.
    Filled { tick: U256 },
}

// the band the walk currently sits in
struct WalkState {
    // upper oracle price of band n2, updated incrementally
    p_o_up: U256,
    // reserves of band n2; the side already drained by this walk reads as zero
    x: U256,
    y: U256,
    // what is still to be paid in (exact input) or taken out (exact output)
    amount_left: U256,
}

// per-band values the solver works with
struct BandTerms {
    f: U256,
    g: U256,
    inv: U256,
    antifee: U256,
}

impl LlammaPool {
    /// Output for an exact input of `in_amount` wad.
    ///
    /// `in_precision` / `out_precision` are the tokens' multipliers to wad;
    /// the returned input is rounded up and the output down to them.
    pub fn calc_swap_out(
        &self,
        direction: Direction,
        in_amount: U256,
        in_precision: U256,
        out_precision: U256,
    ) -> Result<DetailedTrade, Error> {
        self.walk_bands(direction, in_amount, true, in_precision, out_precision)
    }

    /// Input needed for an exact output of `out_amount` wad.
    ///
    /// The returned output is smaller than requested when the walk stopped
    /// before filling it.
    pub fn calc_swap_in(
        &self,
        direction: Direction,
        out_amount: U256,
        in_precision: U256,
        out_precision: U256,
    ) -> Result<DetailedTrade, Error> {
        self.walk_bands(direction, out_amount, false, in_precision, out_precision)
    }

    fn walk_bands(
        &self,
        direction: Direction,
        amount: U256,
        exact_in: bool,
        in_precision: U256,
        out_precision: U256,
    ) -> Result<DetailedTrade, Error> {
        let mut trade = DetailedTrade::new(direction, self.state.active_band);
        let band = self.band(trade.n2);
        let mut walk = WalkState {
            p_o_up: self.p_oracle_up(trade.n2)?,
            x: band.x,
            y: band.y,
            amount_left: amount,
        };
        let mut started = false;

        let iterations = MAX_TICKS + MAX_SKIP_TICKS;
        for i in 0..iterations {
            let mut terms = BandTerms {
                f: U256::ZERO,
                g: U256::ZERO,
                inv: U256::ZERO,
                antifee: U256::ZERO,
            };
            let mut fee = self.state.fee;
            if !walk.x.is_zero() || !walk.y.is_zero() {
                if !started {
                    trade.n1 = trade.n2;
                    started = true;
                }
                let band = BandInvariant::compute(
                    walk.x,
                    walk.y,
                    self.state.price_oracle,
                    walk.p_o_up,
                    self.static_params.a,
                    self.static_params.a_minus_1,
                )?;
                terms.f = band.f;
                terms.g = band.g;
                terms.inv = band.inv;
                if self.static_params.use_dynamic_fee {
                    let dynamic_fee = get_dynamic_fee(
                        self.state.price_oracle,
                        walk.p_o_up,
                        self.static_params.a,
                        self.static_params.a_minus_1,
                    )?;
                    fee = fee.max(dynamic_fee);
                }
            }
            terms.antifee = antifee(fee)?;

            let step = match direction {
                Direction::Pump => self.pump_step(&mut walk, &terms, &mut trade, amount, exact_in)?,
                Direction::Dump => self.dump_step(&mut walk, &terms, &mut trade, amount, exact_in)?,
            };
            trace!(band = trade.n2, ?step, left = %walk.amount_left, "band step");

            if started {
                let tick = match step {
                    BandStep::Skipped => match direction {
                        Direction::Pump => walk.x,
                        Direction::Dump => walk.y,
                    },
                    BandStep::Crossed { tick } | BandStep::Filled { tick } => tick,
                };
                trade.ticks_in.push(tick);
            }

            if let BandStep::Filled { .. } = step {
                trade.walk_end = WalkEnd::Filled;
                break;
            }
            if i == iterations - 1 {
                break;
            }
            if let Some(end) = self.walk_limit(direction, trade.n2, trade.ticks_in.len(), walk.p_o_up)? {
                trade.walk_end = end;
                break;
            }

            match direction {
                Direction::Pump => {
                    trade.n2 += 1;
                    walk.p_o_up = step_band_up(walk.p_o_up, self.static_params.a, self.static_params.a_minus_1)?;
                    walk.x = U256::ZERO;
                    walk.y = self.state.bands.y(trade.n2);
                }
                Direction::Dump => {
                    trade.n2 -= 1;
                    walk.p_o_up = step_band_down(walk.p_o_up, self.static_params.a, self.static_params.a_minus_1)?;
                    walk.x = self.state.bands.x(trade.n2);
                    walk.y = U256::ZERO;
                }
            }
        }

        trade.in_amount = round_up_to(trade.in_amount, in_precision)?;
        trade.out_amount = round_down_to(trade.out_amount, out_precision)?;

        Ok(trade)
    }

    /// Reason to stop before moving to the next band, if any.
    fn walk_limit(
        &self,
        direction: Direction,
        n2: i64,
        ticks: usize,
        p_o_up: U256,
    ) -> Result<Option<WalkEnd>, Error> {
        let edge = match direction {
            Direction::Pump => self.state.max_band,
            Direction::Dump => self.state.min_band,
        };
        if n2 == edge {
            return Ok(Some(WalkEnd::BandLimit));
        }
        if ticks == MAX_TICKS {
            return Ok(Some(WalkEnd::TickBudget));
        }

        let p_ratio = p_o_up.safe_mul(U256_WAD)?.safe_div(self.state.price_oracle)?;
        let max_dn = self.static_params.max_oracle_dn_pow;
        let too_far = match direction {
            Direction::Pump => p_ratio < U256_WAD_SQUARED.safe_div(max_dn)?,
            Direction::Dump => p_ratio > max_dn,
        };
        if too_far {
            return Ok(Some(WalkEnd::OracleDistance));
        }

        Ok(None)
    }

    // token 0 in, y out of the band
    fn pump_step(
        &self,
        walk: &mut WalkState,
        terms: &BandTerms,
        trade: &mut DetailedTrade,
        amount: U256,
        exact_in: bool,
    ) -> Result<BandStep, Error> {
        if walk.y.is_zero() || terms.g.is_zero() {
            return Ok(BandStep::Skipped);
        }
        let admin_fee = self.state.admin_fee;
        let (x, y) = (walk.x, walk.y);
        let f_x = terms.f.safe_add(x)?;

        if exact_in {
            // input that takes every y out of the band
            let x_dest = terms.inv.safe_div(terms.g)?.safe_sub(f_x)?;
            let dx = x_dest.safe_mul(terms.antifee)?.safe_div(U256_WAD)?;

            if dx >= walk.amount_left {
                let left = walk.amount_left;
                let x_net = left.safe_mul(U256_WAD)?.safe_div(terms.antifee)?;
                let y_left = terms
                    .inv
                    .safe_div(f_x.safe_add(x_net)?)?
                    .safe_sub(terms.g)?
                    .safe_add(U256::ONE)?
                    .min(y);
                let admin = admin_share(left, x_net, admin_fee)?;

                trade.last_tick_j = y_left;
                trade.out_amount = trade.out_amount.safe_add(y.safe_sub(y_left)?)?;
                trade.in_amount = amount;
                trade.admin_fee = trade.admin_fee.safe_add(admin)?;
                walk.amount_left = U256::ZERO;

                return Ok(BandStep::Filled {
                    tick: x.safe_add(left)?.safe_sub(admin)?,
                });
            }

            let dx = dx.max(U256::ONE);
            let admin = admin_share(dx, x_dest, admin_fee)?;
            walk.amount_left = walk.amount_left.safe_sub(dx)?;
            trade.in_amount = trade.in_amount.safe_add(dx)?;
            trade.out_amount = trade.out_amount.safe_add(y)?;
            trade.admin_fee = trade.admin_fee.safe_add(admin)?;

            return Ok(BandStep::Crossed {
                tick: x.safe_add(dx)?.safe_sub(admin)?,
            });
        }

        if y >= walk.amount_left {
            let y_left = y - walk.amount_left;
            let x_dest = terms
                .inv
                .safe_div(terms.g.safe_add(y_left)?)?
                .safe_sub(f_x)?;
            let dx = x_dest.safe_mul(terms.antifee)?.safe_div(U256_WAD)?;
            let admin = admin_share(dx, x_dest, admin_fee)?;

            trade.last_tick_j = y_left;
            trade.out_amount = amount;
            trade.in_amount = trade.in_amount.safe_add(dx)?;
            trade.admin_fee = trade.admin_fee.safe_add(admin)?;
            walk.amount_left = U256::ZERO;

            return Ok(BandStep::Filled {
                tick: x.safe_add(dx)?.safe_sub(admin)?,
            });
        }

        let x_dest = terms.inv.safe_div(terms.g)?.safe_sub(f_x)?;
        let dx = x_dest
            .safe_mul(terms.antifee)?
            .safe_div(U256_WAD)?
            .max(U256::ONE);
        let admin = admin_share(dx, x_dest, admin_fee)?;
        walk.amount_left -= y;
        trade.in_amount = trade.in_amount.safe_add(dx)?;
        trade.out_amount = trade.out_amount.safe_add(y)?;
        trade.admin_fee = trade.admin_fee.safe_add(admin)?;

        Ok(BandStep::Crossed {
            tick: x.safe_add(dx)?.safe_sub(admin)?,
        })
    }

    // token 1 in, x out of the band
    fn dump_step(
        &self,
        walk: &mut WalkState,
        terms: &BandTerms,
        trade: &mut DetailedTrade,
        amount: U256,
        exact_in: bool,
    ) -> Result<BandStep, Error> {
        if walk.x.is_zero() || terms.f.is_zero() {
            return Ok(BandStep::Skipped);
        }
        let admin_fee = self.state.admin_fee;
        let (x, y) = (walk.x, walk.y);
        let g_y = terms.g.safe_add(y)?;

        if exact_in {
            // input that takes every x out of the band
            let y_dest = terms.inv.safe_div(terms.f)?.safe_sub(g_y)?;
            let dy = y_dest.safe_mul(terms.antifee)?.safe_div(U256_WAD)?;

            if dy >= walk.amount_left {
                let left = walk.amount_left;
                let y_net = left.safe_mul(U256_WAD)?.safe_div(terms.antifee)?;
                let x_left = terms
                    .inv
                    .safe_div(g_y.safe_add(y_net)?)?
                    .safe_sub(terms.f)?
                    .safe_add(U256::ONE)?
                    .min(x);
                let admin = admin_share(left, y_net, admin_fee)?;

                trade.last_tick_j = x_left;
                trade.out_amount = trade.out_amount.safe_add(x.safe_sub(x_left)?)?;
                trade.in_amount = amount;
                trade.admin_fee = trade.admin_fee.safe_add(admin)?;
                walk.amount_left = U256::ZERO;

                return Ok(BandStep::Filled {
                    tick: y.safe_add(left)?.safe_sub(admin)?,
                });
            }

            let dy = dy.max(U256::ONE);
            let admin = admin_share(dy, y_dest, admin_fee)?;
            walk.amount_left = walk.amount_left.safe_sub(dy)?;
            trade.in_amount = trade.in_amount.safe_add(dy)?;
            trade.out_amount = trade.out_amount.safe_add(x)?;
            trade.admin_fee = trade.admin_fee.safe_add(admin)?;

            return Ok(BandStep::Crossed {
                tick: y.safe_add(dy)?.safe_sub(admin)?,
            });
        }

        if x >= walk.amount_left {
            let x_left = x - walk.amount_left;
            let y_dest = terms
                .inv
                .safe_div(terms.f.safe_add(x_left)?)?
                .safe_sub(g_y)?;
            let dy = y_dest.safe_mul(terms.antifee)?.safe_div(U256_WAD)?;
            let admin = admin_share(dy, y_dest, admin_fee)?;

            trade.last_tick_j = x_left;
            trade.out_amount = amount;
            trade.in_amount = trade.in_amount.safe_add(dy)?;
            trade.admin_fee = trade.admin_fee.safe_add(admin)?;
            walk.amount_left = U256::ZERO;

            return Ok(BandStep::Filled {
                tick: y.safe_add(dy)?.safe_sub(admin)?,
            });
        }

        let y_dest = terms.inv.safe_div(terms.f)?.safe_sub(g_y)?;
        let dy = y_dest
            .safe_mul(terms.antifee)?
            .safe_div(U256_WAD)?
            .max(U256::ONE);
        let admin = admin_share(dy, y_dest, admin_fee)?;
        walk.amount_left -= x;
        trade.in_amount = trade.in_amount.safe_add(dy)?;
        trade.out_amount = trade.out_amount.safe_add(x)?;
        trade.admin_fee = trade.admin_fee.safe_add(admin)?;

        Ok(BandStep::Crossed {
            tick: y.safe_add(dy)?.safe_sub(admin)?,
        })
    }
}
