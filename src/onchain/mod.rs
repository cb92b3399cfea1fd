//! Readers that turn live LLAMMA contracts into [`PoolSnapshot`]s.
//!
//! [`PoolSnapshot`]: crate::PoolSnapshot

use alloy_sol_macro::sol;
use std::sync::Arc;

pub mod discovery;
pub mod tracker;

pub use discovery::{DiscoveredPool, DiscoveryPage, PoolDiscovery};
pub use tracker::LlammaTracker;

pub type OnchainProvider<P> = Arc<P>;

sol! {
    #[sol(rpc)]
    interface ILlamma {
        function A() external view returns (uint256);
        function coins(uint256 i) external view returns (address);
        function get_base_price() external view returns (uint256);
        function price_oracle() external view returns (uint256);
        function fee() external view returns (uint256);
        function admin_fee() external view returns (uint256);
        function admin_fees_x() external view returns (uint256);
        function admin_fees_y() external view returns (uint256);
        function active_band() external view returns (int256);
        function min_band() external view returns (int256);
        function max_band() external view returns (int256);
        function bands_x(int256 n) external view returns (uint256);
        function bands_y(int256 n) external view returns (uint256);
    }
}

sol! {
    #[sol(rpc)]
    interface IControllerFactory {
        function n_collaterals() external view returns (uint256);
        function amms(uint256 i) external view returns (address);
    }
}

sol! {
    #[sol(rpc)]
    interface IERC20Metadata {
        function decimals() external view returns (uint8);
    }
}

sol! {
    struct Call {
        address target;
        bytes callData;
    }

    #[sol(rpc)]
    interface IMulticall {
        function aggregate(Call[] calls)
            external
            view
            returns (uint256 blockNumber, bytes[] returnData);
    }
}
