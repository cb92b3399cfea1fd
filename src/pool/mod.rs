pub mod bands;
pub mod exchange;
pub mod llamma_pool;
pub mod quote;
pub mod snapshot;
pub mod swap;
