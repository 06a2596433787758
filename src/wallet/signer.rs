//! Secure wallet implementation
//!
//! SECURITY: This is the ONLY place where the private key exists.
//! - The key is held in alloy's PrivateKeySigner
//! - The raw hex is only ever held in a SecretString
//! - Keys are never serialized or logged

use crate::{Error, Result};
use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use secrecy::{ExposeSecret, SecretString};

/// Signing credential held in memory for the lifetime of the process
///
/// The private key is:
/// - Stored in alloy's PrivateKeySigner
/// - Never serialized (no Serialize impl)
/// - Only reachable through the EthereumWallet handed to the provider
pub struct SecureWallet {
    /// Public address (safe to expose)
    address: Address,
    /// Ethereum wallet for alloy integration
    wallet: EthereumWallet,
}

impl SecureWallet {
    /// Create a wallet from an environment variable
    ///
    /// A missing or malformed key is a configuration error: callers treat it as
    /// fatal before any network client is built.
    pub fn from_env(var_name: &str) -> Result<Self> {
        Self::from_lookup(var_name, |name| std::env::var(name).ok())
    }

    /// Create a wallet from a variable resolved through `lookup`
    pub fn from_lookup<F>(var_name: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let key = lookup(var_name)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                Error::Config(format!(
                    "Environment variable {} not set. Required for signing transactions.",
                    var_name
                ))
            })?;

        Self::from_secret(&SecretString::from(key))
    }

    /// Create a wallet from a hex-encoded private key (with or without 0x)
    pub fn from_secret(key: &SecretString) -> Result<Self> {
        let key_hex = key.expose_secret().trim();
        let key_hex = key_hex.strip_prefix("0x").unwrap_or(key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| Error::Config(format!("Invalid private key: {}", e)))?;

        let address = signer.address();
        let wallet = EthereumWallet::from(signer);

        Ok(Self { address, wallet })
    }

    /// Get the public address (safe to share)
    pub fn address(&self) -> Address {
        self.address
    }

    /// Get the wallet for use with alloy providers
    ///
    /// EthereumWallet only exposes signing operations, not the raw key.
    pub fn wallet(&self) -> &EthereumWallet {
        &self.wallet
    }
}

// Implement Debug manually to avoid exposing the signer
impl std::fmt::Debug for SecureWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecureWallet")
            .field("address", &self.address)
            .field("signer", &"[REDACTED]")
            .finish()
    }
}
