//! Gateway to the remote ledger
//!
//! `ChainClient` is the only seam through which the trader touches the chain:
//! view calls, signed submissions and receipt lookups. Everything above it
//! (quoting, allowances, execution) is written against the trait so it can be
//! driven by a scripted client in tests.

pub mod contracts;
mod rpc;

#[cfg(test)]
pub(crate) mod mock;

pub use rpc::RpcChainClient;

use crate::{Error, Result};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Final status of a mined transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    pub succeeded: bool,
    pub block_number: u64,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Account that signs and sends submitted transactions
    fn sender(&self) -> Address;

    /// Execute a view call. Reverts surface as `Error::Revert`.
    async fn read(&self, contract: Address, calldata: Bytes) -> Result<Bytes>;

    /// Sign and broadcast a transaction, returning its hash
    async fn submit(&self, to: Address, calldata: Bytes, value: U256) -> Result<B256>;

    /// Look up a receipt once; `None` while the transaction is still pending
    async fn receipt(&self, tx_hash: B256) -> Result<Option<Confirmation>>;

    /// Block until the transaction is mined. Never times out on its own.
    async fn await_confirmation(&self, tx_hash: B256) -> Result<Confirmation>;
}

/// Encode a typed call, read it, and decode the return value
pub async fn read_call<C>(chain: &dyn ChainClient, contract: Address, call: &C) -> Result<C::Return>
where
    C: SolCall + Sync,
{
    let data = chain.read(contract, Bytes::from(call.abi_encode())).await?;
    C::abi_decode_returns(&data).map_err(|e| Error::Decode(format!("{}: {}", C::SIGNATURE, e)))
}

/// Run a pre-submission step unless `cancel` fires first
///
/// Only for steps that broadcast nothing; dropping a half-finished read is
/// harmless.
pub async fn unless_cancelled<T, F>(cancel: &CancellationToken, step: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        out = step => out,
    }
}

/// Last gate before signing: a cancelled run must not broadcast
pub fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        tracing::warn!("Cancelled before submission");
        return Err(Error::Cancelled);
    }
    Ok(())
}

/// Why a settlement could not be determined
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingReason {
    TimedOut(Duration),
    Cancelled,
    Unreachable(String),
}

impl fmt::Display for PendingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PendingReason::TimedOut(d) => write!(f, "no receipt after {}s", d.as_secs()),
            PendingReason::Cancelled => write!(f, "wait cancelled"),
            PendingReason::Unreachable(e) => write!(f, "node unreachable: {}", e),
        }
    }
}

/// Outcome of waiting on a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Confirmed { block_number: u64 },
    Reverted { block_number: u64 },
    /// Neither confirmed nor reverted as far as this process knows
    Unknown(PendingReason),
}

impl From<Confirmation> for Settlement {
    fn from(c: Confirmation) -> Self {
        if c.succeeded {
            Settlement::Confirmed {
                block_number: c.block_number,
            }
        } else {
            Settlement::Reverted {
                block_number: c.block_number,
            }
        }
    }
}

/// Wait for a receipt, bounded by `timeout` and `cancel`
///
/// Transport failures while waiting resolve to `Unknown` rather than an error:
/// the transaction has already been broadcast and may still land.
pub async fn wait_for_settlement(
    chain: &dyn ChainClient,
    tx_hash: B256,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Settlement {
    tokio::select! {
        _ = cancel.cancelled() => {
            tracing::warn!(tx_hash = %tx_hash, "Settlement wait cancelled");
            Settlement::Unknown(PendingReason::Cancelled)
        }
        waited = tokio::time::timeout(timeout, chain.await_confirmation(tx_hash)) => match waited {
            Ok(Ok(confirmation)) => confirmation.into(),
            Ok(Err(e)) => {
                tracing::warn!(tx_hash = %tx_hash, error = %e, "Lost track of transaction");
                Settlement::Unknown(PendingReason::Unreachable(e.to_string()))
            }
            Err(_) => {
                tracing::warn!(
                    tx_hash = %tx_hash,
                    timeout_secs = timeout.as_secs(),
                    "Timed out waiting for receipt"
                );
                Settlement::Unknown(PendingReason::TimedOut(timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockChain;
    use super::*;

    #[tokio::test]
    async fn test_confirmed_receipt_settles() {
        let chain = MockChain::new();
        let settlement = wait_for_settlement(
            &chain,
            B256::repeat_byte(1),
            Duration::from_secs(5),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(settlement, Settlement::Confirmed { .. }));
    }

    #[tokio::test]
    async fn test_reverted_receipt_settles_as_reverted() {
        let chain = MockChain::new();
        chain.revert_next_trade();
        let settlement = wait_for_settlement(
            &chain,
            B256::repeat_byte(1),
            Duration::from_secs(5),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(settlement, Settlement::Reverted { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stuck_transaction_times_out_as_unknown() {
        let chain = MockChain::new();
        chain.hang_confirmations();

        let settlement = wait_for_settlement(
            &chain,
            B256::repeat_byte(2),
            Duration::from_secs(30),
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(
            settlement,
            Settlement::Unknown(PendingReason::TimedOut(Duration::from_secs(30)))
        );
    }

    #[tokio::test]
    async fn test_cancellation_resolves_unknown() {
        let chain = MockChain::new();
        chain.hang_confirmations();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let settlement =
            wait_for_settlement(&chain, B256::repeat_byte(3), Duration::from_secs(30), &cancel)
                .await;

        assert_eq!(settlement, Settlement::Unknown(PendingReason::Cancelled));
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits_pending_step() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let out: Result<()> = unless_cancelled(&cancel, std::future::pending()).await;

        assert!(matches!(out, Err(Error::Cancelled)));
        assert!(matches!(ensure_not_cancelled(&cancel), Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_live_token_runs_step() {
        let cancel = CancellationToken::new();

        let out = unless_cancelled(&cancel, async { Ok(7u8) }).await.unwrap();

        assert_eq!(out, 7);
        assert!(ensure_not_cancelled(&cancel).is_ok());
    }

    #[tokio::test]
    async fn test_read_call_decodes_balance() {
        let chain = MockChain::new();
        chain.set_balance(U256::from(50u64));

        let balance = read_call(
            &chain,
            Address::repeat_byte(0xaa),
            &contracts::IERC20::balanceOfCall {
                account: chain.sender(),
            },
        )
        .await
        .unwrap();

        assert_eq!(balance, U256::from(50u64));
    }
}
