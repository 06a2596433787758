//! Trade data model

use crate::chain::contracts::IBondingCurveRouter;
use crate::config::TradeSettings;
use crate::{Error, Result};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::SolCall;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const BPS_DENOMINATOR: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    /// Native currency in, tokens out
    Buy,
    /// Tokens in, native currency out
    Sell,
}

impl TradeDirection {
    pub fn is_buy(&self) -> bool {
        matches!(self, TradeDirection::Buy)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TradeDirection::Buy => "buy",
            TradeDirection::Sell => "sell",
        }
    }
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single trade as requested by the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeRequest {
    direction: TradeDirection,
    token: Address,
    /// Native units for Buy, token units for Sell (18 decimals)
    amount_in: U256,
}

impl TradeRequest {
    pub fn new(direction: TradeDirection, token: Address, amount_in: U256) -> Result<Self> {
        if amount_in.is_zero() {
            return Err(Error::InvalidArgument(format!(
                "{} amount must be greater than zero",
                direction
            )));
        }
        Ok(Self {
            direction,
            token,
            amount_in,
        })
    }

    pub fn direction(&self) -> TradeDirection {
        self.direction
    }

    pub fn token(&self) -> Address {
        self.token
    }

    pub fn amount_in(&self) -> U256 {
        self.amount_in
    }
}

/// Pricing answer; valid only for the call that fetched it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub router: Address,
    pub amount_out: U256,
}

/// Minimum acceptable output after applying the slippage tolerance
///
/// Truncates, so the bound never rounds in the trader's favour.
pub fn min_amount_out(amount_out: U256, slippage_bps: u16) -> Result<U256> {
    let keep = BPS_DENOMINATOR
        .checked_sub(u64::from(slippage_bps))
        .ok_or_else(|| Error::Config(format!("slippage_bps {} exceeds 10000", slippage_bps)))?;

    amount_out
        .checked_mul(U256::from(keep))
        .map(|scaled| scaled / U256::from(BPS_DENOMINATOR))
        .ok_or_else(|| Error::InvalidArgument(format!("amount {} overflows", amount_out)))
}

/// Router call arguments derived from a request and its quote
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeParams {
    pub direction: TradeDirection,
    pub router: Address,
    pub token: Address,
    pub recipient: Address,
    pub amount_in: U256,
    pub amount_out_min: U256,
    /// Unix seconds; the router rejects execution after this
    pub deadline: U256,
}

impl TradeParams {
    pub fn derive(
        request: &TradeRequest,
        quote: &Quote,
        recipient: Address,
        settings: &TradeSettings,
        submitted_at: DateTime<Utc>,
    ) -> Result<Self> {
        let now = u64::try_from(submitted_at.timestamp())
            .map_err(|_| Error::InvalidArgument("submission time before epoch".to_string()))?;
        let deadline = now.checked_add(settings.deadline_secs).ok_or_else(|| {
            Error::Config(format!("deadline_secs {} overflows", settings.deadline_secs))
        })?;

        Ok(Self {
            direction: request.direction(),
            router: quote.router,
            token: request.token(),
            recipient,
            amount_in: request.amount_in(),
            amount_out_min: min_amount_out(quote.amount_out, settings.slippage_bps)?,
            deadline: U256::from(deadline),
        })
    }

    /// ABI-encoded router call
    pub fn calldata(&self) -> Bytes {
        let encoded = match self.direction {
            TradeDirection::Buy => IBondingCurveRouter::buyCall {
                params: IBondingCurveRouter::BuyParams {
                    amountOutMin: self.amount_out_min,
                    token: self.token,
                    to: self.recipient,
                    deadline: self.deadline,
                },
            }
            .abi_encode(),
            TradeDirection::Sell => IBondingCurveRouter::sellCall {
                params: IBondingCurveRouter::SellParams {
                    amountIn: self.amount_in,
                    amountOutMin: self.amount_out_min,
                    token: self.token,
                    to: self.recipient,
                    deadline: self.deadline,
                },
            }
            .abi_encode(),
        };
        Bytes::from(encoded)
    }

    /// Native value attached to the call: the input amount for buys only
    pub fn value(&self) -> U256 {
        match self.direction {
            TradeDirection::Buy => self.amount_in,
            TradeDirection::Sell => U256::ZERO,
        }
    }
}

/// Snapshot of an owner's approval for a spender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllowanceState {
    pub owner: Address,
    pub spender: Address,
    pub token: Address,
    pub current: U256,
}

impl AllowanceState {
    pub fn covers(&self, amount: U256) -> bool {
        self.current >= amount
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Success,
    Reverted,
    /// Broadcast but never observed settling; needs reconciliation
    Unknown,
}

impl TradeStatus {
    pub fn is_settled(&self) -> bool {
        !matches!(self, TradeStatus::Unknown)
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeStatus::Success => f.write_str("success"),
            TradeStatus::Reverted => f.write_str("reverted"),
            TradeStatus::Unknown => f.write_str("unknown"),
        }
    }
}

/// Record of one submitted trade transaction. Never mutated after creation.
///
/// Persisted through `ledger::LedgerEntry`, which owns the on-disk shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeOutcome {
    pub id: Uuid,
    pub direction: TradeDirection,
    pub token: Address,
    pub amount_in: U256,
    /// Quoted output at submission time
    pub amount_out: U256,
    pub amount_out_min: U256,
    pub tx_hash: B256,
    pub status: TradeStatus,
    pub block_number: Option<u64>,
    pub timestamp: DateTime<Utc>,
    pub wallet: Address,
}
