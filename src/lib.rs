//! nad.fun Trade Executor
//!
//! Quotes, buys and sells tokens on the nad.fun bonding-curve exchange:
//! - Slippage-bounded minimum outputs and on-chain deadlines
//! - Exact-amount router approval before every sell that needs one
//! - Bounded, cancellable settlement waits
//! - Append-only ledger of every submitted trade
//!
//! # Security Model
//!
//! - The private key lives only in the wallet module and the provider's signer
//! - Quote-only operations never submit transactions

pub mod chain;
pub mod config;
pub mod ledger;
pub mod trading;
pub mod wallet;

mod error;

// Re-export commonly used types
pub use config::{Config, RpcConfig, TradeSettings, PRIVATE_KEY_ENV};
pub use error::{Error, Result};
pub use ledger::{InMemoryLedger, JsonFileLedger, LedgerEntry, LedgerStore};
pub use trading::{SellResult, TradeDirection, TradeExecutor, TradeOutcome, TradeStatus};
