//! Configuration for the bonding-curve trader

pub mod rpc;

use crate::{Error, Result};
use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// Re-export RPC config
pub use rpc::RpcConfig;

/// Environment variable holding the hex-encoded signing key
pub const PRIVATE_KEY_ENV: &str = "MONAD_PRIVATE_KEY";

/// Monad mainnet chain ID
pub const MONAD_CHAIN_ID: u64 = 143;

/// nad.fun lens contract (pricing view calls)
pub const NADFUN_LENS: Address = address!("7e78a8de94f21804f7a17f4e8bf9ec2c872187ea");

/// Longest accepted deadline window (one day)
pub const MAX_DEADLINE_SECS: u64 = 86_400;

/// Chain connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub chain_id: u64,
    /// Default RPC endpoint, overridable via `MONAD_RPC_URL`
    pub rpc_url: String,
    /// Prefix for transaction links in operator output
    pub explorer_tx_url: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: MONAD_CHAIN_ID,
            rpc_url: "https://monad-mainnet.drpc.org".to_string(),
            explorer_tx_url: "https://monadexplorer.com/tx/".to_string(),
        }
    }
}

/// Externally defined exchange contracts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractAddresses {
    /// Pricing contract exposing `getAmountOut`
    pub lens: Address,
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self { lens: NADFUN_LENS }
    }
}

/// Per-trade protection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradeSettings {
    /// Slippage tolerance in basis points (200 = 2%)
    pub slippage_bps: u16,
    /// Seconds added to the submission time to form the on-chain deadline
    pub deadline_secs: u64,
    /// Upper bound on waiting for a receipt before the trade resolves as unknown
    pub confirmation_timeout_secs: u64,
    /// Receipt polling interval
    pub receipt_poll_interval_ms: u64,
}

impl Default for TradeSettings {
    fn default() -> Self {
        Self {
            slippage_bps: 200,
            deadline_secs: 300,
            confirmation_timeout_secs: 180,
            receipt_poll_interval_ms: 1_000,
        }
    }
}

impl TradeSettings {
    pub fn validate(&self) -> Result<()> {
        if self.slippage_bps > 10_000 {
            return Err(Error::Config(format!(
                "slippage_bps must be at most 10000, got {}",
                self.slippage_bps
            )));
        }
        if self.deadline_secs == 0 || self.deadline_secs > MAX_DEADLINE_SECS {
            return Err(Error::Config(format!(
                "deadline_secs must be between 1 and {}, got {}",
                MAX_DEADLINE_SECS, self.deadline_secs
            )));
        }
        if self.confirmation_timeout_secs == 0 {
            return Err(Error::Config(
                "confirmation_timeout_secs must be positive".to_string(),
            ));
        }
        if self.receipt_poll_interval_ms == 0 {
            return Err(Error::Config(
                "receipt_poll_interval_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs)
    }

    pub fn receipt_poll_interval(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_interval_ms)
    }
}

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub contracts: ContractAddresses,
    #[serde(default)]
    pub trade: TradeSettings,
    /// Path to the transaction ledger shared with the dashboard
    #[serde(default = "default_ledger_path")]
    pub ledger_path: String,
}

fn default_ledger_path() -> String {
    "tx_log.json".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            contracts: ContractAddresses::default(),
            trade: TradeSettings::default(),
            ledger_path: default_ledger_path(),
        }
    }
}

impl Config {
    /// Load a JSON config file and validate it
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.trade.validate()
    }
}
