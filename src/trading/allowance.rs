//! Pre-sell allowance handshake

use super::types::AllowanceState;
use crate::chain::contracts::IERC20;
use crate::chain::{
    ensure_not_cancelled, read_call, unless_cancelled, wait_for_settlement, ChainClient,
    Settlement,
};
use crate::{Error, Result};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::SolCall;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// What `ensure_allowance` had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllowanceCheck {
    /// Existing approval already covers the amount
    Sufficient(AllowanceState),
    /// An approval for exactly the amount was submitted and confirmed
    Approved { tx_hash: B256, block_number: u64 },
}

/// Ensures the router may move the tokens a sell needs
///
/// Allowances are read fresh on every call. Approvals are for the exact amount,
/// never unlimited.
#[derive(Clone)]
pub struct AllowanceManager {
    chain: Arc<dyn ChainClient>,
    confirmation_timeout: Duration,
    cancel: CancellationToken,
}

impl AllowanceManager {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        confirmation_timeout: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            chain,
            confirmation_timeout,
            cancel,
        }
    }

    pub async fn read_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<AllowanceState> {
        let current = unless_cancelled(
            &self.cancel,
            read_call(
                self.chain.as_ref(),
                token,
                &IERC20::allowanceCall { owner, spender },
            ),
        )
        .await?;

        Ok(AllowanceState {
            owner,
            spender,
            token,
            current,
        })
    }

    /// Approve `spender` for `amount` if the current allowance falls short
    pub async fn ensure_allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<AllowanceCheck> {
        let state = self.read_allowance(token, owner, spender).await?;
        if state.covers(amount) {
            tracing::debug!(
                token = %token,
                spender = %spender,
                current = %state.current,
                required = %amount,
                "Allowance sufficient"
            );
            return Ok(AllowanceCheck::Sufficient(state));
        }

        tracing::info!(
            token = %token,
            spender = %spender,
            current = %state.current,
            required = %amount,
            "Allowance short"
        );
        self.approve(token, spender, amount).await
    }

    /// Approve `spender` for exactly `amount` and wait for the receipt
    ///
    /// Returns only after the approval has confirmed successfully; a reverted or
    /// unsettled approval is an error and the caller must not proceed.
    pub async fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> Result<AllowanceCheck> {
        ensure_not_cancelled(&self.cancel)?;
        tracing::info!(token = %token, spender = %spender, amount = %amount, "Submitting approval");

        let calldata = IERC20::approveCall { spender, amount }.abi_encode();
        let tx_hash = self
            .chain
            .submit(token, Bytes::from(calldata), U256::ZERO)
            .await?;

        match wait_for_settlement(
            self.chain.as_ref(),
            tx_hash,
            self.confirmation_timeout,
            &self.cancel,
        )
        .await
        {
            Settlement::Confirmed { block_number } => {
                tracing::info!(tx_hash = %tx_hash, block_number, "Approval confirmed");
                Ok(AllowanceCheck::Approved {
                    tx_hash,
                    block_number,
                })
            }
            Settlement::Reverted { .. } => Err(Error::ApprovalFailed { tx_hash }),
            Settlement::Unknown(_) => Err(Error::ConfirmationUnknown { tx_hash }),
        }
    }
}
