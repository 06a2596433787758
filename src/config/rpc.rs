//! RPC endpoint configuration
//!
//! The endpoint is resolved in priority order:
//! 1. `MONAD_RPC_URL` environment variable
//! 2. `network.rpc_url` from the config file (or its default public endpoint)
//!
//! # Examples
//!
//! ```bash
//! # Private endpoint (recommended for trading)
//! export MONAD_RPC_URL="https://monad-mainnet.g.alchemy.com/v2/YOUR_KEY"
//!
//! # No env var - uses the public RPC (rate limited)
//! ```

use super::NetworkConfig;
use crate::{Error, Result};
use url::Url;

/// Environment variable overriding the configured endpoint
pub const RPC_URL_ENV: &str = "MONAD_RPC_URL";

/// Resolved RPC endpoint for the trading chain
#[derive(Debug, Clone)]
pub struct RpcConfig {
    url: Url,
    chain_id: u64,
}

impl RpcConfig {
    /// Resolve the endpoint from the process environment
    pub fn resolve(network: &NetworkConfig) -> Result<Self> {
        Self::resolve_with(network, |name| std::env::var(name).ok())
    }

    /// Resolve the endpoint using an explicit variable lookup
    pub fn resolve_with<F>(network: &NetworkConfig, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = match lookup(RPC_URL_ENV).filter(|v| !v.trim().is_empty()) {
            Some(url) => {
                tracing::debug!("Using {} for chain {}", RPC_URL_ENV, network.chain_id);
                url
            }
            None => {
                tracing::debug!(
                    rpc_url = %network.rpc_url,
                    "No {} set, using configured RPC", RPC_URL_ENV
                );
                network.rpc_url.clone()
            }
        };

        let url = raw
            .trim()
            .parse::<Url>()
            .map_err(|e| Error::Config(format!("Invalid RPC URL '{}': {}", raw, e)))?;

        Ok(Self {
            url,
            chain_id: network.chain_id,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_overrides_configured_url() {
        let network = NetworkConfig::default();
        let config = RpcConfig::resolve_with(&network, |name| {
            (name == RPC_URL_ENV).then(|| "https://custom.rpc/".to_string())
        })
        .unwrap();

        assert_eq!(config.url().as_str(), "https://custom.rpc/");
        assert_eq!(config.chain_id(), network.chain_id);
    }

    #[test]
    fn test_falls_back_to_configured_url() {
        let network = NetworkConfig::default();
        let config = RpcConfig::resolve_with(&network, |_| None).unwrap();

        assert_eq!(config.url().as_str(), "https://monad-mainnet.drpc.org/");
    }

    #[test]
    fn test_blank_env_is_ignored() {
        let network = NetworkConfig::default();
        let config = RpcConfig::resolve_with(&network, |_| Some("  ".to_string())).unwrap();

        assert_eq!(config.url().host_str(), Some("monad-mainnet.drpc.org"));
    }

    #[test]
    fn test_invalid_url_is_config_error() {
        let network = NetworkConfig {
            rpc_url: "not a url".to_string(),
            ..Default::default()
        };
        let err = RpcConfig::resolve_with(&network, |_| None).unwrap_err();

        assert!(matches!(err, Error::Config(_)));
    }
}
