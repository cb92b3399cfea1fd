use crate::error::{Error, StateError, SwapError};
use crate::math::math_helpers::SafeMath;
use crate::pool::llamma_pool::LlammaPool;
use crate::pool::swap::{DetailedTrade, Direction};
use alloy_primitives::{Address, U256};
use tracing::debug;

/// Gas of a swap that touches a single band.
pub const BASE_SWAP_GAS: u64 = 150_000;
/// Extra gas for every further band written by a swap.
pub const GAS_PER_BAND: u64 = 25_000;

/// A quoted trade, bound to the pool it was quoted on.
///
/// Pass it back to [`LlammaPool::commit`] once the trade is executed. It is
/// only valid against the exact state it was quoted on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeDetails {
    pub pool: Address,
    pub trade: DetailedTrade,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteResult {
    /// Output for an exact-input quote, required input for an exact-output one.
    pub amount: U256,
    /// Admin fee in native units of the input token.
    pub fee: U256,
    /// Part of an exact input the pool could not absorb.
    pub remaining: U256,
    pub trade: TradeDetails,
    pub gas: u64,
}

/// Gas estimate for a trade writing `bands` bands.
pub fn estimate_gas(bands: usize) -> u64 {
    let extra = (bands.max(1) - 1) as u64;
    BASE_SWAP_GAS.saturating_add(GAS_PER_BAND.saturating_mul(extra))
}

impl LlammaPool {
    /// Quotes selling exactly `amount_in` of `token_in` for `token_out`.
    pub fn quote_exact_input(
        &self,
        token_in: Address,
        amount_in: U256,
        token_out: Address,
    ) -> Result<QuoteResult, Error> {
        let (i, j) = self.token_pair(token_in, token_out)?;
        self.get_dy(i, j, amount_in)
    }

    /// Quotes buying exactly `amount_out` of `token_out` with `token_in`.
    pub fn quote_exact_output(
        &self,
        token_in: Address,
        amount_out: U256,
        token_out: Address,
    ) -> Result<QuoteResult, Error> {
        let (i, j) = self.token_pair(token_in, token_out)?;
        self.get_dx(i, j, amount_out)
    }

    /// Exact-input quote by token index, `amount_in` in native units of token `i`.
    pub fn get_dy(&self, i: usize, j: usize, amount_in: U256) -> Result<QuoteResult, Error> {
        check_indices(i, j)?;
        if amount_in.is_zero() {
            return Err(SwapError::ZeroSwapAmount.into());
        }
        let in_precision = self.tokens[i].precision;
        let out_precision = self.tokens[j].precision;

        let trade = self.calc_swap_out(
            Direction::from_in_index(i),
            amount_in.safe_mul(in_precision)?,
            in_precision,
            out_precision,
        )?;

        let used = trade.in_amount.safe_div(in_precision)?;
        let amount_out = trade.out_amount.safe_div(out_precision)?;
        if used.is_zero() || amount_out.is_zero() {
            return Err(SwapError::ZeroSwapAmount.into());
        }

        let result = self.quote_result(amount_out, amount_in.safe_sub(used)?, in_precision, trade)?;
        debug!(
            pool = %self.address,
            i,
            amount_in = %amount_in,
            amount_out = %result.amount,
            remaining = %result.remaining,
            end = ?result.trade.trade.walk_end,
            "exact input quote"
        );

        Ok(result)
    }

    /// Exact-output quote by token index, `amount_out` in native units of token `j`.
    pub fn get_dx(&self, i: usize, j: usize, amount_out: U256) -> Result<QuoteResult, Error> {
        check_indices(i, j)?;
        if amount_out.is_zero() {
            return Err(SwapError::ZeroSwapAmount.into());
        }
        let in_precision = self.tokens[i].precision;
        let out_precision = self.tokens[j].precision;

        let trade = self.calc_swap_in(
            Direction::from_in_index(i),
            amount_out.safe_mul(out_precision)?,
            in_precision,
            out_precision,
        )?;

        let delivered = trade.out_amount.safe_div(out_precision)?;
        if delivered < amount_out {
            debug!(
                pool = %self.address,
                requested = %amount_out,
                available = %delivered,
                end = ?trade.walk_end,
                "exact output quote short of liquidity"
            );
            return Err(SwapError::InsufficientLiquidity {
                requested: amount_out,
                available: delivered,
            }
            .into());
        }
        let amount_in = trade.in_amount.safe_div(in_precision)?;
        if amount_in.is_zero() {
            return Err(SwapError::ZeroSwapAmount.into());
        }

        let result = self.quote_result(amount_in, U256::ZERO, in_precision, trade)?;
        debug!(
            pool = %self.address,
            i,
            amount_out = %amount_out,
            amount_in = %result.amount,
            "exact output quote"
        );

        Ok(result)
    }

    /// Applies a quoted trade. Must follow the quote with no other commit
    /// in between.
    pub fn commit(&mut self, details: &TradeDetails) -> Result<(), Error> {
        if details.pool != self.address {
            return Err(StateError::ForeignTrade(details.pool).into());
        }
        self.apply_trade(&details.trade)
    }

    fn token_pair(&self, token_in: Address, token_out: Address) -> Result<(usize, usize), SwapError> {
        let i = self.token_index(token_in).ok_or(SwapError::UnknownToken)?;
        let j = self.token_index(token_out).ok_or(SwapError::UnknownToken)?;
        Ok((i, j))
    }

    fn quote_result(
        &self,
        amount: U256,
        remaining: U256,
        in_precision: U256,
        trade: DetailedTrade,
    ) -> Result<QuoteResult, Error> {
        Ok(QuoteResult {
            amount,
            fee: trade.admin_fee.safe_div(in_precision)?,
            remaining,
            gas: estimate_gas(trade.bands_touched()),
            trade: TradeDetails {
                pool: self.address,
                trade,
            },
        })
    }
}

#[inline]
fn check_indices(i: usize, j: usize) -> Result<(), SwapError> {
    if i > 1 || j > 1 || i ^ j != 1 {
        return Err(SwapError::WrongIndex);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::llamma_pool::tests::{
        POOL, TOKEN_0, TOKEN_1, dynamic_fee_pool, six_decimal_pool, u,
    };
    use alloy_primitives::address;

    // ---------------- Validation ----------------

    #[test]
    fn rejects_bad_indices() {
        let pool = dynamic_fee_pool();
        for (i, j) in [(0, 0), (1, 1), (0, 2), (2, 1)] {
            let res = pool.get_dy(i, j, U256::from(1_000u64));
            assert!(
                matches!(res, Err(Error::SwapError(SwapError::WrongIndex))),
                "({i}, {j}) must be rejected"
            );
        }
    }

    #[test]
    fn rejects_same_token_on_both_sides() {
        let pool = dynamic_fee_pool();
        let res = pool.quote_exact_input(TOKEN_0, U256::from(1_000u64), TOKEN_0);
        assert!(matches!(res, Err(Error::SwapError(SwapError::WrongIndex))));
    }

    #[test]
    fn rejects_unknown_token() {
        let pool = dynamic_fee_pool();
        let stranger = address!("0x00000000000000000000000000000000000000ff");
        let res = pool.quote_exact_input(stranger, U256::from(1_000u64), TOKEN_1);
        assert!(matches!(res, Err(Error::SwapError(SwapError::UnknownToken))));
        let res = pool.quote_exact_output(TOKEN_0, U256::from(1_000u64), stranger);
        assert!(matches!(res, Err(Error::SwapError(SwapError::UnknownToken))));
    }

    #[test]
    fn dust_fails_with_zero_swap_amount() {
        let pool = dynamic_fee_pool();
        for amount in [0u64, 1, 2] {
            let res = pool.quote_exact_input(TOKEN_0, U256::from(amount), TOKEN_1);
            assert!(matches!(
                res,
                Err(Error::SwapError(SwapError::ZeroSwapAmount))
            ));
        }
        let res = pool.quote_exact_input(TOKEN_1, U256::ONE, TOKEN_0);
        assert!(matches!(
            res,
            Err(Error::SwapError(SwapError::ZeroSwapAmount))
        ));
    }

    // ---------------- Exact input ----------------

    #[test]
    fn exact_input_both_directions() {
        let pool = dynamic_fee_pool();

        let quote = pool
            .quote_exact_input(TOKEN_0, u("1000000000000000000000"), TOKEN_1)
            .unwrap();
        assert_eq!(quote.amount, u("394276770402496939"));
        assert_eq!(quote.remaining, U256::ZERO);
        assert_eq!(quote.trade.pool, POOL);
        assert_eq!(quote.gas, BASE_SWAP_GAS);

        let quote = pool.quote_exact_input(TOKEN_1, U256::from(2u8), TOKEN_0).unwrap();
        assert_eq!(quote.amount, U256::from(2520u64));

        let quote = pool
            .quote_exact_input(TOKEN_1, u("10000000000000"), TOKEN_0)
            .unwrap();
        assert_eq!(quote.amount, u("25049516446445805"));
    }

    #[test]
    fn exact_input_reports_admin_fee_and_gas() {
        let pool = dynamic_fee_pool();
        let quote = pool
            .quote_exact_input(TOKEN_0, u("50000000000000000000000"), TOKEN_1)
            .unwrap();

        assert_eq!(quote.amount, u("19329670451777264135"));
        assert_eq!(quote.fee, u("166397492253242122618"));
        assert_eq!(quote.gas, BASE_SWAP_GAS + 2 * GAS_PER_BAND);
    }

    #[test]
    fn exact_input_reports_unabsorbed_input() {
        let pool = dynamic_fee_pool();
        let amount_in = u("1000000000000000000000000000000");
        let quote = pool.quote_exact_input(TOKEN_0, amount_in, TOKEN_1).unwrap();

        assert_eq!(quote.amount, u("111500000000000000000"));
        assert_eq!(
            quote.remaining,
            amount_in - u("322154597820490547146036")
        );
    }

    #[test]
    fn six_decimal_token_is_scaled() {
        let pool = six_decimal_pool();
        let cases = [
            (1u64, 283730662u64),
            (100, 28373066281),
            (100_000_000, 28367753546675243),
        ];
        for (amount_in, expected) in cases {
            let quote = pool
                .quote_exact_input(TOKEN_0, U256::from(amount_in), TOKEN_1)
                .unwrap();
            assert_eq!(quote.amount, U256::from(expected), "output for {amount_in}");
        }
    }

    #[test]
    fn draining_returns_the_whole_reserve() {
        let pool = six_decimal_pool();
        let (_, sum_y) = pool.get_sum_xy().unwrap();

        for amount_in in [u("1000000000000"), u("10000000000000000000000000")] {
            let quote = pool.quote_exact_input(TOKEN_0, amount_in, TOKEN_1).unwrap();
            assert_eq!(quote.amount, sum_y);
            assert_eq!(quote.remaining, amount_in - U256::from(133680504659u64));
        }
    }

    #[test]
    fn one_sided_pool_cannot_dump() {
        let pool = six_decimal_pool();
        let res = pool.quote_exact_input(TOKEN_1, u("1000000000000000000"), TOKEN_0);
        assert!(matches!(
            res,
            Err(Error::SwapError(SwapError::ZeroSwapAmount))
        ));
    }

    // ---------------- Exact output ----------------

    #[test]
    fn exact_output_both_directions() {
        let pool = dynamic_fee_pool();

        let quote = pool
            .quote_exact_output(TOKEN_0, u("30000000000000000000"), TOKEN_1)
            .unwrap();
        assert_eq!(quote.amount, u("78571737910624250477901"));
        assert_eq!(quote.trade.trade.n2, 3);
        assert_eq!(quote.remaining, U256::ZERO);

        let quote = pool
            .quote_exact_output(TOKEN_1, u("10000000000000000000000"), TOKEN_0)
            .unwrap();
        assert_eq!(quote.amount, u("4008086890500457553"));
    }

    #[test]
    fn exact_output_beyond_liquidity() {
        let pool = dynamic_fee_pool();

        let res = pool.quote_exact_output(TOKEN_0, u("1000000000000000000000"), TOKEN_1);
        match res {
            Err(Error::SwapError(SwapError::InsufficientLiquidity {
                requested,
                available,
            })) => {
                assert_eq!(requested, u("1000000000000000000000"));
                assert_eq!(available, u("111500000000000000000"));
            }
            other => panic!("expected InsufficientLiquidity, got: {:?}", other),
        }

        let res = pool.quote_exact_output(TOKEN_1, u("200000000000000000000000"), TOKEN_0);
        assert!(matches!(
            res,
            Err(Error::SwapError(SwapError::InsufficientLiquidity { .. }))
        ));
    }

    #[test]
    fn exact_output_never_costs_more_than_exact_input() {
        let pool = dynamic_fee_pool();
        let cases = [
            (TOKEN_0, TOKEN_1, "10000000000000", "9999999999686"),
            (TOKEN_0, TOKEN_1, "1000000000000000000000", "999999999999999999279"),
            (TOKEN_0, TOKEN_1, "50000000000000000000000", "49999999999999999997610"),
            (TOKEN_1, TOKEN_0, "10000000000000", "9999999999998"),
            (TOKEN_1, TOKEN_0, "10000000000000000000", "9999999999999999998"),
            (TOKEN_1, TOKEN_0, "50000000000000000000", "49999999999999999998"),
        ];
        for (token_in, token_out, amount_in, expected) in cases {
            let amount_in = u(amount_in);
            let forward = pool.quote_exact_input(token_in, amount_in, token_out).unwrap();
            let back = pool
                .quote_exact_output(token_in, forward.amount, token_out)
                .unwrap();
            assert_eq!(back.amount, u(expected));
            assert!(back.amount <= amount_in);
        }
    }

    // ---------------- Commit ----------------

    #[test]
    fn commit_moves_the_price() {
        let mut pool = dynamic_fee_pool();
        let amount_in = u("50000000000000000000000");
        let quote = pool.quote_exact_input(TOKEN_0, amount_in, TOKEN_1).unwrap();
        pool.commit(&quote.trade).unwrap();

        assert_eq!(pool.active_band(), 2);
        let again = pool.quote_exact_input(TOKEN_0, amount_in, TOKEN_1).unwrap();
        assert_eq!(again.amount, u("18498789500963746195"));
    }

    #[test]
    fn commit_after_dump() {
        let mut pool = dynamic_fee_pool();
        let amount_in = u("10000000000000000000");
        let quote = pool.quote_exact_input(TOKEN_1, amount_in, TOKEN_0).unwrap();
        pool.commit(&quote.trade).unwrap();

        assert_eq!(pool.active_band(), -1);
        assert_eq!(pool.admin_fees(), (U256::ZERO, u("29999999999999996")));
        let again = pool.quote_exact_input(TOKEN_1, amount_in, TOKEN_0).unwrap();
        assert!(again.amount < quote.amount);
    }

    #[test]
    fn commit_rejects_trade_from_other_pool() {
        let pool = dynamic_fee_pool();
        let quote = pool
            .quote_exact_input(TOKEN_0, u("10000000000000"), TOKEN_1)
            .unwrap();

        let mut other = pool.clone();
        other.address = address!("0x2000000000000000000000000000000000000000");
        let res = other.commit(&quote.trade);
        assert!(matches!(
            res,
            Err(Error::StateError(StateError::ForeignTrade(p))) if p == POOL
        ));
    }

    #[test]
    fn clones_are_independent() {
        let pool = dynamic_fee_pool();
        let quote = pool
            .quote_exact_input(TOKEN_0, u("50000000000000000000000"), TOKEN_1)
            .unwrap();

        let mut branch = pool.clone();
        branch.commit(&quote.trade).unwrap();

        assert_eq!(pool.active_band(), 0);
        assert_eq!(branch.active_band(), 2);
        let fresh = pool
            .quote_exact_input(TOKEN_0, u("50000000000000000000000"), TOKEN_1)
            .unwrap();
        assert_eq!(fresh, quote);
    }

    #[test]
    fn gas_grows_per_band() {
        assert_eq!(estimate_gas(0), BASE_SWAP_GAS);
        assert_eq!(estimate_gas(1), BASE_SWAP_GAS);
        assert_eq!(estimate_gas(11), BASE_SWAP_GAS + 10 * GAS_PER_BAND);
    }
}
