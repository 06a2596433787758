//! alloy-backed chain client
//!
//! SECURITY NOTE:
//! - Signing happens inside the provider's wallet filler
//! - This module never sees raw key material

use super::{ChainClient, Confirmation};
use crate::config::RpcConfig;
use crate::wallet::SecureWallet;
use crate::{Error, Result};
use alloy::hex;
use alloy::network::ReceiptResponse;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::{RpcError, TransportError};
use async_trait::async_trait;
use std::time::Duration;

/// Chain client talking JSON-RPC over HTTP
pub struct RpcChainClient {
    provider: DynProvider,
    sender: Address,
    poll_interval: Duration,
}

impl RpcChainClient {
    /// Build a signing provider for the configured endpoint
    pub fn new(rpc: &RpcConfig, wallet: &SecureWallet, poll_interval: Duration) -> Self {
        let provider = ProviderBuilder::new()
            .wallet(wallet.wallet().clone())
            .connect_http(rpc.url().clone())
            .erased();

        tracing::debug!(
            rpc_url = %rpc.url(),
            chain_id = rpc.chain_id(),
            sender = %wallet.address(),
            "Chain client ready"
        );

        Self {
            provider,
            sender: wallet.address(),
            poll_interval,
        }
    }

    /// Map an RPC failure onto the trader's error taxonomy
    fn classify(error: TransportError, during_submit: bool) -> Error {
        match error {
            RpcError::ErrorResp(payload) => {
                let message = payload.to_string();
                if message.contains("revert") {
                    Error::revert(parse_revert_reason(&message))
                } else {
                    Error::Network(message)
                }
            }
            RpcError::LocalUsageError(e) if during_submit => Error::Signing(e.to_string()),
            other => Error::Network(other.to_string()),
        }
    }
}

#[async_trait]
impl ChainClient for RpcChainClient {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn read(&self, contract: Address, calldata: Bytes) -> Result<Bytes> {
        let tx = TransactionRequest::default()
            .from(self.sender)
            .to(contract)
            .input(calldata.into());

        self.provider
            .call(tx)
            .await
            .map_err(|e| Self::classify(e, false))
    }

    async fn submit(&self, to: Address, calldata: Bytes, value: U256) -> Result<B256> {
        let tx = TransactionRequest::default()
            .from(self.sender)
            .to(to)
            .input(calldata.into())
            .value(value);

        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| Self::classify(e, true))?;

        Ok(*pending.tx_hash())
    }

    async fn receipt(&self, tx_hash: B256) -> Result<Option<Confirmation>> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| Self::classify(e, false))?;

        Ok(receipt.and_then(|r| {
            r.block_number().map(|block_number| Confirmation {
                succeeded: r.status(),
                block_number,
            })
        }))
    }

    async fn await_confirmation(&self, tx_hash: B256) -> Result<Confirmation> {
        let mut ticker = tokio::time::interval(self.poll_interval);
        loop {
            ticker.tick().await;
            if let Some(confirmation) = self.receipt(tx_hash).await? {
                return Ok(confirmation);
            }
            tracing::trace!(tx_hash = %tx_hash, "Receipt not available yet");
        }
    }
}

/// Parse revert reason from RPC error message
fn parse_revert_reason(error: &str) -> String {
    if let Some(start) = error.find("revert: ") {
        let reason = &error[start + 8..];
        if let Some(end) = reason.find('"') {
            return reason[..end].to_string();
        }
        return reason.to_string();
    }

    // Error(string) payloads: selector 0x08c379a0, offset word, length word, data
    if let Some(start) = error.find("0x08c379a0") {
        let hex_data = &error[start..];
        let end = hex_data[2..]
            .find(|c: char| !c.is_ascii_hexdigit())
            .map_or(hex_data.len(), |i| i + 2);
        let hex_str = &hex_data[..end];
        if hex_str.len() > 138 {
            if let Ok(decoded) = hex::decode(&hex_str[138..]) {
                let filtered: Vec<u8> = decoded.into_iter().filter(|&b| b != 0).collect();
                if let Ok(s) = String::from_utf8(filtered) {
                    return s;
                }
            }
        }
        return format!("Reverted with data: {}", hex_str);
    }

    if error.contains("execution reverted") {
        return "execution reverted".to_string();
    }

    error.to_string()
}
