//! Token pool contract wrapper
//!
//! Read-only client for the GHO token pool backing a lane. The Ethereum
//! lock/release pool exposes a global bridge limit; every pool exposes the
//! outbound rate limiter state used for capacity checks.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::abi::Abi;
use ethers::contract::Contract;
use ethers::providers::Middleware;
use ethers::types::{Address, U256};

use super::{RateLimiterState, TokenPool};
use crate::error::BridgeError;

const TOKEN_POOL_ABI: &str = r#"
[
  {
    "inputs": [],
    "name": "getBridgeLimit",
    "outputs": [{"name": "", "type": "uint256"}],
    "stateMutability": "view",
    "type": "function"
  },
  {
    "inputs": [],
    "name": "getCurrentBridgedAmount",
    "outputs": [{"name": "", "type": "uint256"}],
    "stateMutability": "view",
    "type": "function"
  },
  {
    "inputs": [{"name": "remoteChainSelector", "type": "uint64"}],
    "name": "getCurrentOutboundRateLimiterState",
    "outputs": [{"name": "", "type": "tuple", "components": [
      {"name": "tokens", "type": "uint128"},
      {"name": "lastUpdated", "type": "uint32"},
      {"name": "isEnabled", "type": "bool"},
      {"name": "capacity", "type": "uint128"},
      {"name": "rate", "type": "uint128"}
    ]}],
    "stateMutability": "view",
    "type": "function"
  }
]
"#;

/// Ethers-backed token pool client
pub struct TokenPoolContract<M: Middleware> {
    contract: Contract<M>,
}

impl<M: Middleware + 'static> TokenPoolContract<M> {
    pub fn new(address: Address, client: Arc<M>) -> Result<Self, BridgeError> {
        let abi: Abi = serde_json::from_str(TOKEN_POOL_ABI)
            .map_err(|e| BridgeError::ConfigError(format!("token pool ABI parse failed: {}", e)))?;
        Ok(Self {
            contract: Contract::new(address, abi, client),
        })
    }
}

#[async_trait]
impl<M: Middleware + 'static> TokenPool for TokenPoolContract<M> {
    async fn bridge_limit(&self) -> Result<U256, BridgeError> {
        self.contract
            .method::<_, U256>("getBridgeLimit", ())
            .map_err(|e| BridgeError::ProviderError(format!("bad getBridgeLimit call: {}", e)))?
            .call()
            .await
            .map_err(|e| BridgeError::ProviderError(format!("getBridgeLimit failed: {}", e)))
    }

    async fn current_bridged_amount(&self) -> Result<U256, BridgeError> {
        self.contract
            .method::<_, U256>("getCurrentBridgedAmount", ())
            .map_err(|e| {
                BridgeError::ProviderError(format!("bad getCurrentBridgedAmount call: {}", e))
            })?
            .call()
            .await
            .map_err(|e| BridgeError::ProviderError(format!("getCurrentBridgedAmount failed: {}", e)))
    }

    async fn outbound_rate_limiter_state(
        &self,
        dest_selector: u64,
    ) -> Result<RateLimiterState, BridgeError> {
        let (tokens, last_updated, is_enabled, capacity, rate) = self
            .contract
            .method::<_, (U256, u32, bool, U256, U256)>(
                "getCurrentOutboundRateLimiterState",
                dest_selector,
            )
            .map_err(|e| {
                BridgeError::ProviderError(format!("bad rate limiter state call: {}", e))
            })?
            .call()
            .await
            .map_err(|e| BridgeError::ProviderError(format!("rate limiter state failed: {}", e)))?;

        Ok(RateLimiterState {
            tokens,
            last_updated,
            is_enabled,
            capacity,
            rate,
        })
    }
}
