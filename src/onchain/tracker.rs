use crate::config::TrackerConfig;
use crate::error::{Error, OnchainError};
use crate::onchain::discovery::DiscoveredPool;
use crate::onchain::{Call, ILlamma, IMulticall, OnchainProvider};
use crate::pool::snapshot::{BandSnapshot, DynamicSnapshot, PoolSnapshot, StaticSnapshot};
use alloy_primitives::{Address, BlockNumber, Bytes, I256, U256};
use alloy_provider::Provider;
use std::ops::RangeInclusive;
use tracing::{debug, info, warn};

const SCALAR_CALLS: usize = 9;

/// Bands to read around `active`, clipped to the pool's band range.
pub fn band_range(active: i64, min_band: i64, max_band: i64, window: u64) -> RangeInclusive<i64> {
    let window = i64::try_from(window).unwrap_or(i64::MAX);
    let low = active.saturating_sub(window).max(min_band);
    let high = active.saturating_add(window).min(max_band);
    low..=high
}

fn to_band_index(value: I256, what: &'static str) -> Result<i64, OnchainError> {
    i64::try_from(value).map_err(|_| OnchainError::UnexpectedValue(what))
}

/// Reads the dynamic state of LLAMMA pools through one multicall contract.
#[derive(Clone, Debug)]
pub struct LlammaTracker<P> {
    provider: OnchainProvider<P>,
    multicall: IMulticall::IMulticallInstance<OnchainProvider<P>>,
    config: TrackerConfig,
}

impl<P> LlammaTracker<P>
where
    P: Provider + Send + Sync + 'static,
{
    pub fn new(provider: OnchainProvider<P>, config: TrackerConfig) -> Result<Self, Error> {
        config.validate()?;
        let multicall = IMulticall::IMulticallInstance::new(config.multicall_address, provider.clone());

        Ok(Self {
            provider,
            multicall,
            config,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    async fn aggregate(
        &self,
        calls: Vec<Call>,
        block_number: Option<BlockNumber>,
    ) -> Result<Vec<Bytes>, OnchainError> {
        let expected = calls.len();
        let mut agg = self.multicall.aggregate(calls);
        if let Some(bn) = block_number {
            agg = agg.block(bn.into());
        }
        let result = agg
            .call()
            .await
            .map_err(|e| OnchainError::FailedToCallMulticall(e.to_string()))?;

        if result.returnData.len() != expected {
            return Err(OnchainError::UnexpectedValue("multicall result length"));
        }
        Ok(result.returnData)
    }

    /// Reads prices, fees, band indices and the bands within
    /// `band_window` of the active band, and packs them into a snapshot.
    ///
    /// The snapshot's `min_band`/`max_band` are narrowed to the bands that
    /// were read, so a quote stops at the edge of the window instead of
    /// walking through bands it never saw.
    pub async fn fetch_snapshot(
        &self,
        pool: &DiscoveredPool,
        block_number: Option<BlockNumber>,
    ) -> Result<PoolSnapshot, Error> {
        let amm = ILlamma::ILlammaInstance::new(pool.address, self.provider.clone());
        let call = |data: Bytes| Call {
            target: pool.address,
            callData: data,
        };

        let scalar_calls = vec![
            call(amm.get_base_price().calldata().to_owned()),
            call(amm.price_oracle().calldata().to_owned()),
            call(amm.fee().calldata().to_owned()),
            call(amm.admin_fee().calldata().to_owned()),
            call(amm.admin_fees_x().calldata().to_owned()),
            call(amm.admin_fees_y().calldata().to_owned()),
            call(amm.active_band().calldata().to_owned()),
            call(amm.min_band().calldata().to_owned()),
            call(amm.max_band().calldata().to_owned()),
        ];
        let raw = self.aggregate(scalar_calls, block_number).await?;
        let [
            base_price,
            price_oracle,
            fee,
            admin_fee,
            admin_fees_x,
            admin_fees_y,
            active_band,
            min_band,
            max_band,
        ]: [Bytes; SCALAR_CALLS] = raw
            .try_into()
            .map_err(|_| OnchainError::UnexpectedValue("multicall result length"))?;

        let decode_err = |e: alloy_contract::Error| OnchainError::FailedToGetPoolParams(e.to_string());
        let base_price: U256 = amm.get_base_price().decode_output(base_price).map_err(decode_err)?;
        let price_oracle: U256 = amm.price_oracle().decode_output(price_oracle).map_err(decode_err)?;
        let fee: U256 = amm.fee().decode_output(fee).map_err(decode_err)?;
        let admin_fee: U256 = amm.admin_fee().decode_output(admin_fee).map_err(decode_err)?;
        let admin_fees_x: U256 = amm.admin_fees_x().decode_output(admin_fees_x).map_err(decode_err)?;
        let admin_fees_y: U256 = amm.admin_fees_y().decode_output(admin_fees_y).map_err(decode_err)?;
        let active_band = to_band_index(
            amm.active_band().decode_output(active_band).map_err(decode_err)?,
            "active_band",
        )?;
        let min_band = to_band_index(
            amm.min_band().decode_output(min_band).map_err(decode_err)?,
            "min_band",
        )?;
        let max_band = to_band_index(
            amm.max_band().decode_output(max_band).map_err(decode_err)?,
            "max_band",
        )?;

        let range = band_range(active_band, min_band, max_band, self.config.band_window);
        let (window_min, window_max) = (
            (*range.start()).min(active_band),
            (*range.end()).max(active_band),
        );
        let indices: Vec<i64> = range.collect();
        let mut band_calls = Vec::with_capacity(indices.len() * 2);
        for &n in &indices {
            let n = I256::try_from(n).map_err(|_| OnchainError::UnexpectedValue("band index"))?;
            band_calls.push(call(amm.bands_x(n).calldata().to_owned()));
            band_calls.push(call(amm.bands_y(n).calldata().to_owned()));
        }

        let mut bands = Vec::new();
        if !band_calls.is_empty() {
            let raw = self.aggregate(band_calls, block_number).await?;
            let mut raw = raw.into_iter();
            for &n in &indices {
                let (Some(raw_x), Some(raw_y)) = (raw.next(), raw.next()) else {
                    break;
                };
                let band_err = |e: alloy_contract::Error| OnchainError::FailedToDecodeBand(e.to_string());
                let index = I256::try_from(n).map_err(|_| OnchainError::UnexpectedValue("band index"))?;
                let x: U256 = amm.bands_x(index).decode_output(raw_x).map_err(band_err)?;
                let y: U256 = amm.bands_y(index).decode_output(raw_y).map_err(band_err)?;
                if !x.is_zero() || !y.is_zero() {
                    bands.push(BandSnapshot { i: n, x, y });
                }
            }
        }

        debug!(
            pool = %pool.address,
            active_band,
            min_band,
            max_band,
            window_min,
            window_max,
            bands = bands.len(),
            "fetched pool state"
        );

        Ok(PoolSnapshot {
            address: pool.address,
            tokens: pool.tokens,
            static_params: StaticSnapshot {
                a: pool.a,
                use_dynamic_fee: pool.use_dynamic_fee,
            },
            dynamic: DynamicSnapshot {
                base_price,
                price_oracle,
                fee,
                admin_fee,
                admin_fees_x,
                admin_fees_y,
                active_band,
                min_band: window_min,
                max_band: window_max,
                bands,
            },
        })
    }

    /// Snapshots several pools one after another. A pool that fails to load
    /// is logged and left out.
    pub async fn fetch_snapshots(
        &self,
        pools: &[DiscoveredPool],
        block_number: Option<BlockNumber>,
    ) -> Vec<PoolSnapshot> {
        let mut snapshots = Vec::with_capacity(pools.len());
        for pool in pools {
            match self.fetch_snapshot(pool, block_number).await {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(e) => warn!(pool = %pool.address, error = %e, "skipping pool"),
            }
        }
        info!(requested = pools.len(), fetched = snapshots.len(), "refreshed pools");
        snapshots
    }

    pub fn multicall_address(&self) -> Address {
        self.config.multicall_address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use alloy_provider::ProviderBuilder;
    use alloy_provider::transport::mock::Asserter;
    use crate::pool::snapshot::TokenSnapshot;
    use alloy_sol_types::SolValue;
    use std::sync::Arc;

    const AMM: Address = address!("0x00000000000000000000000000000000000000a1");
    const CRVUSD: Address = address!("0x00000000000000000000000000000000000000c1");
    const WETH: Address = address!("0x00000000000000000000000000000000000000c2");

    fn aggregate_response(data: Vec<Vec<u8>>) -> Bytes {
        let data: Vec<Bytes> = data.into_iter().map(Bytes::from).collect();
        Bytes::from((U256::from(1u64), data).abi_encode_params())
    }

    fn int(n: i64) -> Vec<u8> {
        I256::try_from(n).unwrap().abi_encode()
    }

    fn uint(n: u128) -> Vec<u8> {
        U256::from(n).abi_encode()
    }

    fn weth_pool() -> DiscoveredPool {
        DiscoveredPool {
            address: AMM,
            a: U256::from(100u64),
            tokens: [
                TokenSnapshot {
                    address: CRVUSD,
                    decimals: 18,
                },
                TokenSnapshot {
                    address: WETH,
                    decimals: 18,
                },
            ],
            use_dynamic_fee: true,
        }
    }

    #[test]
    fn band_range_is_centered_on_active_band() {
        assert_eq!(band_range(0, -100, 100, 50), -50..=50);
        assert_eq!(band_range(-3, -100, 100, 2), -5..=-1);
    }

    #[test]
    fn band_range_is_clipped_to_pool_range() {
        assert_eq!(band_range(0, -5, 10, 50), -5..=10);
        assert_eq!(band_range(3, 3, 12, 1), 3..=4);
        assert_eq!(band_range(i64::MAX - 1, 0, i64::MAX, 10), i64::MAX - 11..=i64::MAX);
    }

    #[test]
    fn band_index_conversion() {
        assert_eq!(to_band_index(I256::try_from(-7i64).unwrap(), "x").unwrap(), -7);
        assert!(matches!(
            to_band_index(I256::MAX, "active_band"),
            Err(OnchainError::UnexpectedValue("active_band"))
        ));
    }

    #[test]
    fn tracker_uses_configured_multicall() {
        let asserter = Asserter::new();
        let provider = Arc::new(ProviderBuilder::new().connect_mocked_client(asserter));

        let config = TrackerConfig {
            multicall_address: address!("0x0000000000000000000000000000000000000042"),
            band_window: 8,
        };
        let tracker = LlammaTracker::new(provider, config).unwrap();
        assert_eq!(*tracker.multicall.address(), config.multicall_address);
        assert_eq!(tracker.config().band_window, 8);
    }

    #[tokio::test]
    async fn fetches_snapshot_within_window() {
        let asserter = Asserter::new();
        let provider = Arc::new(ProviderBuilder::new().connect_mocked_client(asserter.clone()));
        let config = TrackerConfig {
            band_window: 2,
            ..TrackerConfig::default()
        };
        let tracker = LlammaTracker::new(provider, config).unwrap();

        // base_price, price_oracle, fee, admin_fee, admin_fees_x, admin_fees_y,
        // active_band, min_band, max_band
        asserter.push_success(&aggregate_response(vec![
            uint(2_500_000_000_000_000_000_000),
            uint(2_450_000_000_000_000_000_000),
            uint(6_000_000_000_000_000),
            uint(500_000_000_000_000_000),
            uint(11),
            uint(22),
            int(0),
            int(-10),
            int(50),
        ]));
        // bands_x, bands_y for -2..=2
        asserter.push_success(&aggregate_response(vec![
            uint(5_000_000_000_000_000_000),
            uint(0),
            uint(0),
            uint(0),
            uint(1_000_000_000_000_000_000),
            uint(2_000_000_000_000_000_000),
            uint(0),
            uint(3_000_000_000_000_000_000),
            uint(0),
            uint(4_000_000_000_000_000_000),
        ]));

        let snapshot = tracker.fetch_snapshot(&weth_pool(), None).await.unwrap();
        assert_eq!(snapshot.address, AMM);
        assert_eq!(snapshot.tokens, weth_pool().tokens);
        assert_eq!(snapshot.static_params.a, U256::from(100u64));
        assert!(snapshot.static_params.use_dynamic_fee);

        let dynamic = &snapshot.dynamic;
        assert_eq!(dynamic.base_price, U256::from(2_500_000_000_000_000_000_000u128));
        assert_eq!(dynamic.price_oracle, U256::from(2_450_000_000_000_000_000_000u128));
        assert_eq!(dynamic.fee, U256::from(6_000_000_000_000_000u64));
        assert_eq!(dynamic.admin_fee, U256::from(500_000_000_000_000_000u64));
        assert_eq!((dynamic.admin_fees_x, dynamic.admin_fees_y), (U256::from(11u8), U256::from(22u8)));
        assert_eq!(dynamic.active_band, 0);
        // narrowed from -10..=50 to the window that was read
        assert_eq!((dynamic.min_band, dynamic.max_band), (-2, 2));
        // band -1 is empty and left out
        assert_eq!(
            dynamic.bands,
            vec![
                BandSnapshot {
                    i: -2,
                    x: U256::from(5_000_000_000_000_000_000u64),
                    y: U256::ZERO
                },
                BandSnapshot {
                    i: 0,
                    x: U256::from(1_000_000_000_000_000_000u64),
                    y: U256::from(2_000_000_000_000_000_000u64)
                },
                BandSnapshot {
                    i: 1,
                    x: U256::ZERO,
                    y: U256::from(3_000_000_000_000_000_000u64)
                },
                BandSnapshot {
                    i: 2,
                    x: U256::ZERO,
                    y: U256::from(4_000_000_000_000_000_000u64)
                },
            ]
        );

        let pool = crate::LlammaPool::from_snapshot(&snapshot).unwrap();
        assert_eq!(pool.state().min_band, -2);
        assert_eq!(pool.state().max_band, 2);
    }

    #[tokio::test]
    async fn rejects_short_scalar_result() {
        let asserter = Asserter::new();
        let provider = Arc::new(ProviderBuilder::new().connect_mocked_client(asserter.clone()));
        let tracker = LlammaTracker::new(provider, TrackerConfig::default()).unwrap();

        asserter.push_success(&aggregate_response(vec![uint(1), uint(2)]));
        assert!(matches!(
            tracker.fetch_snapshot(&weth_pool(), None).await,
            Err(Error::OnchainError(OnchainError::UnexpectedValue("multicall result length")))
        ));
    }

    #[test]
    fn tracker_rejects_invalid_config() {
        let asserter = Asserter::new();
        let provider = Arc::new(ProviderBuilder::new().connect_mocked_client(asserter));

        let config = TrackerConfig {
            band_window: 0,
            ..TrackerConfig::default()
        };
        assert!(matches!(
            LlammaTracker::new(provider, config),
            Err(Error::ConfigError(_))
        ));
    }
}
