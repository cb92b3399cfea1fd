use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("Math error - overflow")]
    Overflow,
    #[error("Math error - underflow")]
    Underflow,
    #[error("Math error - division by zero")]
    DivisionByZero,
    #[error("Math error - wad_exp overflow")]
    ExpOverflow,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("State error - amplification coefficient must be greater than 1, got {0}")]
    InvalidAmplification(String),

    #[error("State error - band range violates min <= active <= max ({min}, {active}, {max})")]
    InvalidBandRange { min: i64, active: i64, max: i64 },

    #[error("State error - token decimals above 18 are not supported, got {0}")]
    InvalidTokenDecimals(u8),

    #[error("State error - oracle price is 0")]
    ZeroOraclePrice,

    #[error("State error - base price is 0")]
    ZeroBasePrice,

    #[error("State error - pool tokens must be distinct")]
    DuplicateToken,

    #[error("State error - band {0} appears twice in the snapshot")]
    DuplicateBand(i64),

    #[error("State error - trade ticks do not cover bands {n1}..={n2}")]
    TickMismatch { n1: i64, n2: i64 },

    #[error("State error - trade was quoted on pool {0}")]
    ForeignTrade(alloy_primitives::Address),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SwapError {
    #[error("Swap error - wrong index")]
    WrongIndex,

    #[error("Swap error - token is not part of the pool")]
    UnknownToken,

    #[error("Swap error - zero swap amount")]
    ZeroSwapAmount,

    #[error("Swap error - insufficient liquidity, can only provide {available} out of {requested}")]
    InsufficientLiquidity {
        requested: alloy_primitives::U256,
        available: alloy_primitives::U256,
    },
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot error - failed to decode json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config error - failed to decode json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error - band window must be between 1 and {max}, got {got}")]
    InvalidBandWindow { got: u64, max: u64 },

    #[error("Config error - batch size must be between 1 and {max}, got {got}")]
    InvalidBatchSize { got: u64, max: u64 },
}

#[cfg(feature = "onchain")]
#[derive(Debug, Error)]
pub enum OnchainError {
    #[error("Onchain error - failed to read pool parameters: {0}")]
    FailedToGetPoolParams(String),
    #[error("Onchain error - failed to call multicall: {0}")]
    FailedToCallMulticall(String),
    #[error("Onchain error - failed to decode band: {0}")]
    FailedToDecodeBand(String),
    #[error("Onchain error - failed to read factory: {0}")]
    FailedToGetFactory(String),
    #[error("Onchain error - failed to read token metadata: {0}")]
    FailedToGetToken(String),
    #[error("Onchain error - unexpected value for {0}")]
    UnexpectedValue(&'static str),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    MathError(#[from] crate::error::MathError),

    #[error(transparent)]
    StateError(#[from] crate::error::StateError),

    #[error(transparent)]
    SwapError(#[from] crate::error::SwapError),

    #[error(transparent)]
    SnapshotError(#[from] crate::error::SnapshotError),

    #[error(transparent)]
    ConfigError(#[from] crate::error::ConfigError),

    #[cfg(feature = "onchain")]
    #[error(transparent)]
    OnchainError(#[from] crate::error::OnchainError),
}
