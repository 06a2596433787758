//! Pricing quotes from the nad.fun lens contract

use super::types::{Quote, TradeDirection};
use crate::chain::contracts::ILens;
use crate::chain::{read_call, ChainClient};
use crate::Result;
use alloy::primitives::{Address, U256};
use std::sync::Arc;

/// Asks the lens for the expected output and the router to trade through
///
/// Side-effect free. Quotes are never cached: the router may differ between
/// calls (e.g. once a token graduates from its bonding curve).
#[derive(Clone)]
pub struct Quoter {
    chain: Arc<dyn ChainClient>,
    lens: Address,
}

impl Quoter {
    pub fn new(chain: Arc<dyn ChainClient>, lens: Address) -> Self {
        Self { chain, lens }
    }

    pub async fn quote(
        &self,
        token: Address,
        amount_in: U256,
        direction: TradeDirection,
    ) -> Result<Quote> {
        let call = ILens::getAmountOutCall {
            token,
            amountIn: amount_in,
            isBuy: direction.is_buy(),
        };
        let ret = read_call(self.chain.as_ref(), self.lens, &call).await?;

        tracing::debug!(
            token = %token,
            direction = %direction,
            amount_in = %amount_in,
            amount_out = %ret.amountOut,
            router = %ret.router,
            "Fetched quote"
        );

        Ok(Quote {
            router: ret.router,
            amount_out: ret.amountOut,
        })
    }
}
