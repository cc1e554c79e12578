//! Configuration module for the bridge client
//!
//! Defines the runtime configuration: RPC endpoints per chain, wallet key
//! source, quote debouncing and confirmation settings. Loaded from a YAML
//! file with environment-variable overrides; a process-wide instance lives
//! behind a `Lazy` lock.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::types::Chain;

/// Global configuration instance
pub static CONFIG: Lazy<Arc<RwLock<BridgeConfig>>> = Lazy::new(|| {
    let config = BridgeConfig::default();
    Arc::new(RwLock::new(config))
});

/// Main configuration structure for the bridge client
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BridgeConfig {
    /// General client settings
    pub general: GeneralConfig,

    /// Per-chain RPC endpoints, keyed by chain name
    pub chains: HashMap<String, ChainRpcConfig>,

    /// Wallet settings
    pub wallet: WalletConfig,
}

/// General client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,

    /// Idle window in milliseconds before a fee quote fires
    pub quote_debounce_ms: u64,

    /// Confirmations to wait for on approval and send transactions
    pub confirmations: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            quote_debounce_ms: 500,
            confirmations: 1,
        }
    }
}

/// RPC endpoints for one chain
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChainRpcConfig {
    /// HTTP JSON-RPC endpoint
    pub rpc_url: String,

    /// Optional websocket endpoint
    pub ws_url: Option<String>,
}

/// Wallet settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Environment variable holding the hex private key
    pub private_key_env: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            private_key_env: "BRIDGE_PRIVATE_KEY".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a YAML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read config file {}", path.as_ref().display()))?;
        let mut config: Self =
            serde_yaml::from_str(&raw).context("failed to parse config file")?;
        config.apply_env_overrides();
        info!(path = %path.as_ref().display(), "configuration loaded");
        Ok(config)
    }

    /// Override endpoints from `<CHAIN>_RPC_URL` environment variables,
    /// e.g. `ETHEREUM_RPC_URL`
    pub fn apply_env_overrides(&mut self) {
        for chain in [Chain::Ethereum, Chain::Arbitrum, Chain::Base] {
            let var = format!("{}_RPC_URL", chain.as_str().to_uppercase());
            if let Ok(url) = std::env::var(&var) {
                self.chains
                    .entry(chain.as_str().to_string())
                    .or_default()
                    .rpc_url = url;
            }
        }
    }

    /// HTTP RPC endpoint for a chain
    pub fn rpc_url(&self, chain: Chain) -> Result<String> {
        match self.chains.get(chain.as_str()) {
            Some(cfg) if !cfg.rpc_url.is_empty() => Ok(cfg.rpc_url.clone()),
            _ => bail!(
                "no RPC endpoint configured for {} (set {}_RPC_URL or add it to the config file)",
                chain,
                chain.as_str().to_uppercase()
            ),
        }
    }

    /// The private key from the configured environment variable
    pub fn private_key(&self) -> Result<String> {
        std::env::var(&self.wallet.private_key_env).with_context(|| {
            format!(
                "wallet private key not found in env var {}",
                self.wallet.private_key_env
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.general.quote_debounce_ms, 500);
        assert_eq!(config.general.confirmations, 1);
        assert_eq!(config.wallet.private_key_env, "BRIDGE_PRIVATE_KEY");
        assert!(config.rpc_url(Chain::Ethereum).is_err());
    }

    #[test]
    fn test_yaml_round_trip() {
        let mut config = BridgeConfig::default();
        config.chains.insert(
            "ethereum".to_string(),
            ChainRpcConfig {
                rpc_url: "http://localhost:8545".to_string(),
                ws_url: None,
            },
        );

        let yaml = serde_yaml::to_string(&config).unwrap();
        let parsed: BridgeConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(
            parsed.rpc_url(Chain::Ethereum).unwrap(),
            "http://localhost:8545"
        );
    }
}
