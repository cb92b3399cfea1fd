use crate::config::DiscoveryConfig;
use crate::error::{Error, OnchainError};
use crate::hash::FastMap;
use crate::onchain::{Call, IControllerFactory, IERC20Metadata, ILlamma, IMulticall, OnchainProvider};
use crate::pool::snapshot::TokenSnapshot;
use alloy_primitives::{Address, BlockNumber, Bytes, U256};
use alloy_provider::Provider;
use std::ops::Range;
use tracing::{debug, info};

/// Static description of one AMM found through the factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveredPool {
    pub address: Address,
    pub a: U256,
    /// `[borrowed, collateral]`, as reported by `coins(0)` and `coins(1)`.
    pub tokens: [TokenSnapshot; 2],
    pub use_dynamic_fee: bool,
}

/// Pools found by one pass over the factory, plus the index to resume from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryPage {
    pub pools: Vec<DiscoveredPool>,
    pub next_index: u64,
}

/// Splits `start..total` into consecutive ranges of at most `size` markets.
pub fn batch_ranges(start: u64, total: u64, size: u64) -> Vec<Range<u64>> {
    let size = size.max(1);
    let mut ranges = Vec::new();
    let mut low = start;
    while low < total {
        let high = low.saturating_add(size).min(total);
        ranges.push(low..high);
        low = high;
    }
    ranges
}

fn to_u64(value: U256, what: &'static str) -> Result<u64, OnchainError> {
    u64::try_from(value).map_err(|_| OnchainError::UnexpectedValue(what))
}

/// Enumerates the AMMs of a controller factory.
#[derive(Clone, Debug)]
pub struct PoolDiscovery<P> {
    provider: OnchainProvider<P>,
    factory: IControllerFactory::IControllerFactoryInstance<OnchainProvider<P>>,
    multicall: IMulticall::IMulticallInstance<OnchainProvider<P>>,
    config: DiscoveryConfig,
}

impl<P> PoolDiscovery<P>
where
    P: Provider + Send + Sync + 'static,
{
    pub fn new(provider: OnchainProvider<P>, config: DiscoveryConfig) -> Result<Self, Error> {
        config.validate()?;
        let factory =
            IControllerFactory::IControllerFactoryInstance::new(config.factory_address, provider.clone());
        let multicall = IMulticall::IMulticallInstance::new(config.multicall_address, provider.clone());

        Ok(Self {
            provider,
            factory,
            multicall,
            config,
        })
    }

    pub fn config(&self) -> &DiscoveryConfig {
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

    /// Number of markets the factory has deployed.
    pub async fn market_count(&self, block_number: Option<BlockNumber>) -> Result<u64, OnchainError> {
        let mut call = self.factory.n_collaterals();
        if let Some(bn) = block_number {
            call = call.block(bn.into());
        }
        let count = call
            .call()
            .await
            .map_err(|e| OnchainError::FailedToGetFactory(e.to_string()))?;

        to_u64(count, "n_collaterals")
    }

    /// AMM addresses of the markets in `range`.
    pub async fn fetch_amms(
        &self,
        range: Range<u64>,
        block_number: Option<BlockNumber>,
    ) -> Result<Vec<Address>, OnchainError> {
        let calls = range
            .clone()
            .map(|i| Call {
                target: self.config.factory_address,
                callData: self.factory.amms(U256::from(i)).calldata().to_owned(),
            })
            .collect::<Vec<_>>();
        if calls.is_empty() {
            return Ok(Vec::new());
        }

        let raw = self.aggregate(calls, block_number).await?;
        range
            .zip(raw)
            .map(|(i, data)| {
                self.factory
                    .amms(U256::from(i))
                    .decode_output(data)
                    .map_err(|e| OnchainError::FailedToGetFactory(e.to_string()))
            })
            .collect()
    }

    /// Reads `A`, `coins(0)` and `coins(1)` of every AMM in one multicall.
    pub async fn fetch_pool_params(
        &self,
        amms: &[Address],
        block_number: Option<BlockNumber>,
    ) -> Result<Vec<(U256, [Address; 2])>, OnchainError> {
        if amms.is_empty() {
            return Ok(Vec::new());
        }

        let mut calls = Vec::with_capacity(amms.len() * 3);
        for &amm in amms {
            let contract = ILlamma::ILlammaInstance::new(amm, self.provider.clone());
            for data in [
                contract.A().calldata().to_owned(),
                contract.coins(U256::ZERO).calldata().to_owned(),
                contract.coins(U256::ONE).calldata().to_owned(),
            ] {
                calls.push(Call {
                    target: amm,
                    callData: data,
                });
            }
        }

        let raw = self.aggregate(calls, block_number).await?;
        let decode_err = |e: alloy_contract::Error| OnchainError::FailedToGetPoolParams(e.to_string());

        let mut params = Vec::with_capacity(amms.len());
        for (&amm, chunk) in amms.iter().zip(raw.chunks_exact(3)) {
            let contract = ILlamma::ILlammaInstance::new(amm, self.provider.clone());
            let a: U256 = contract.A().decode_output(chunk[0].clone()).map_err(decode_err)?;
            let coin0: Address = contract
                .coins(U256::ZERO)
                .decode_output(chunk[1].clone())
                .map_err(decode_err)?;
            let coin1: Address = contract
                .coins(U256::ONE)
                .decode_output(chunk[2].clone())
                .map_err(decode_err)?;
            params.push((a, [coin0, coin1]));
        }

        Ok(params)
    }

    /// Reads `decimals()` of each distinct token.
    pub async fn fetch_decimals(
        &self,
        tokens: &[Address],
        block_number: Option<BlockNumber>,
    ) -> Result<FastMap<Address, u8>, OnchainError> {
        let mut unique: Vec<Address> = Vec::with_capacity(tokens.len());
        for token in tokens {
            if !unique.contains(token) {
                unique.push(*token);
            }
        }
        if unique.is_empty() {
            return Ok(FastMap::default());
        }

        let calls = unique
            .iter()
            .map(|&token| Call {
                target: token,
                callData: IERC20Metadata::IERC20MetadataInstance::new(token, self.provider.clone())
                    .decimals()
                    .calldata()
                    .to_owned(),
            })
            .collect::<Vec<_>>();
        let raw = self.aggregate(calls, block_number).await?;

        let mut decimals = FastMap::default();
        for (token, data) in unique.into_iter().zip(raw) {
            let value: u8 = IERC20Metadata::IERC20MetadataInstance::new(token, self.provider.clone())
                .decimals()
                .decode_output(data)
                .map_err(|e| OnchainError::FailedToGetToken(e.to_string()))?;
            decimals.insert(token, value);
        }

        Ok(decimals)
    }

    /// Walks the factory from `start_index` to its current market count.
    pub async fn discover(&self, block_number: Option<BlockNumber>) -> Result<DiscoveryPage, Error> {
        let total = self.market_count(block_number).await?;
        let mut pools = Vec::new();

        for range in batch_ranges(self.config.start_index, total, self.config.batch_size) {
            debug!(from = range.start, to = range.end, "reading factory markets");
            let amms = self.fetch_amms(range, block_number).await?;
            let params = self.fetch_pool_params(&amms, block_number).await?;

            let tokens: Vec<Address> = params.iter().flat_map(|(_, coins)| *coins).collect();
            let decimals = self.fetch_decimals(&tokens, block_number).await?;

            for (address, (a, coins)) in amms.into_iter().zip(params) {
                let token = |coin: Address| -> Result<TokenSnapshot, OnchainError> {
                    let decimals = decimals
                        .get(&coin)
                        .copied()
                        .ok_or(OnchainError::UnexpectedValue("token decimals"))?;
                    Ok(TokenSnapshot {
                        address: coin,
                        decimals,
                    })
                };
                pools.push(DiscoveredPool {
                    address,
                    a,
                    tokens: [token(coins[0])?, token(coins[1])?],
                    use_dynamic_fee: self.config.use_dynamic_fee,
                });
            }
        }

        let next_index = total.max(self.config.start_index);
        info!(
            factory = %self.config.factory_address,
            found = pools.len(),
            next_index,
            "discovered pools"
        );

        Ok(DiscoveryPage { pools, next_index })
    }
}
