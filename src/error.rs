//! Error types for the bonding-curve trader

use alloy::primitives::B256;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Execution reverted: {reason}")]
    Revert { reason: String },

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to decode contract response: {0}")]
    Decode(String),

    #[error("Approval transaction {tx_hash} reverted")]
    ApprovalFailed { tx_hash: B256 },

    #[error("Settlement of transaction {tx_hash} is unknown (timed out or cancelled)")]
    ConfirmationUnknown { tx_hash: B256 },

    #[error("Cancelled before the trade was submitted")]
    Cancelled,

    #[error("Invalid trade state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Ledger I/O error: {0}")]
    Ledger(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn revert(reason: impl Into<String>) -> Self {
        Error::Revert {
            reason: reason.into(),
        }
    }

    /// Whether the remote ledger rejected the call (as opposed to it never arriving)
    pub fn is_revert(&self) -> bool {
        matches!(self, Error::Revert { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
