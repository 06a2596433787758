//! ABI bindings for the nad.fun contracts and ERC20 tokens

use alloy::sol;

sol! {
    /// Pricing view contract
    #[derive(Debug, PartialEq, Eq)]
    interface ILens {
        function getAmountOut(address token, uint256 amountIn, bool isBuy) external view returns (address router, uint256 amountOut);
    }

    /// Bonding-curve router
    #[derive(Debug, PartialEq, Eq)]
    interface IBondingCurveRouter {
        struct BuyParams {
            uint256 amountOutMin;
            address token;
            address to;
            uint256 deadline;
        }

        struct SellParams {
            uint256 amountIn;
            uint256 amountOutMin;
            address token;
            address to;
            uint256 deadline;
        }

        function buy(BuyParams params) external payable;
        function sell(SellParams params) external;
    }

    #[derive(Debug, PartialEq, Eq)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function allowance(address owner, address spender) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}
