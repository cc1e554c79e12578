//! ERC-20 token wrapper
//!
//! Covers the slice of the standard the bridge needs: allowance reads and
//! the `approve` write granting the router spend rights, plus decimals and
//! balance for input validation.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::abi::Abi;
use ethers::contract::Contract;
use ethers::providers::Middleware;
use ethers::types::{Address, H256, U256};
use tracing::info;

use super::TokenApi;
use crate::error::BridgeError;

const ERC20_ABI: &str = r#"
[
  {
    "constant": true,
    "inputs": [{"name": "owner", "type": "address"}, {"name": "spender", "type": "address"}],
    "name": "allowance",
    "outputs": [{"name": "", "type": "uint256"}],
    "stateMutability": "view",
    "type": "function"
  },
  {
    "constant": false,
    "inputs": [{"name": "spender", "type": "address"}, {"name": "value", "type": "uint256"}],
    "name": "approve",
    "outputs": [{"name": "", "type": "bool"}],
    "stateMutability": "nonpayable",
    "type": "function"
  },
  {
    "constant": true,
    "inputs": [],
    "name": "decimals",
    "outputs": [{"name": "", "type": "uint8"}],
    "stateMutability": "view",
    "type": "function"
  },
  {
    "constant": true,
    "inputs": [{"name": "account", "type": "address"}],
    "name": "balanceOf",
    "outputs": [{"name": "", "type": "uint256"}],
    "stateMutability": "view",
    "type": "function"
  }
]
"#;

/// Ethers-backed ERC-20 client
pub struct Erc20Token<M: Middleware> {
    contract: Contract<M>,
}

impl<M: Middleware + 'static> Erc20Token<M> {
    pub fn new(address: Address, client: Arc<M>) -> Result<Self, BridgeError> {
        let abi: Abi = serde_json::from_str(ERC20_ABI)
            .map_err(|e| BridgeError::ConfigError(format!("ERC20 ABI parse failed: {}", e)))?;
        Ok(Self {
            contract: Contract::new(address, abi, client),
        })
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }
}

#[async_trait]
impl<M: Middleware + 'static> TokenApi for Erc20Token<M> {
    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, BridgeError> {
        self.contract
            .method::<_, U256>("allowance", (owner, spender))
            .map_err(|e| BridgeError::ProviderError(format!("bad allowance call: {}", e)))?
            .call()
            .await
            .map_err(|e| BridgeError::ProviderError(format!("allowance failed: {}", e)))
    }

    async fn approve(&self, spender: Address, amount: U256) -> Result<H256, BridgeError> {
        let call = self
            .contract
            .method::<_, bool>("approve", (spender, amount))
            .map_err(|e| BridgeError::ApprovalError(format!("bad approve call: {}", e)))?;

        let pending = call
            .send()
            .await
            .map_err(|e| BridgeError::ApprovalError(format!("approve broadcast failed: {}", e)))?;
        let tx_hash = pending.tx_hash();

        let receipt = pending
            .await
            .map_err(|e| BridgeError::ApprovalError(format!("approve confirmation failed: {}", e)))?
            .ok_or_else(|| BridgeError::ApprovalError("approve transaction dropped".into()))?;

        if receipt.status == Some(0.into()) {
            return Err(BridgeError::ApprovalError(format!(
                "approve reverted in tx {:#x}",
                tx_hash
            )));
        }

        info!(
            token = %format!("{:#x}", self.contract.address()),
            spender = %format!("{:#x}", spender),
            amount = %amount,
            "approval mined"
        );
        Ok(tx_hash)
    }

    async fn decimals(&self) -> Result<u8, BridgeError> {
        self.contract
            .method::<_, u8>("decimals", ())
            .map_err(|e| BridgeError::ProviderError(format!("bad decimals call: {}", e)))?
            .call()
            .await
            .map_err(|e| BridgeError::ProviderError(format!("decimals failed: {}", e)))
    }

    async fn balance_of(&self, owner: Address) -> Result<U256, BridgeError> {
        self.contract
            .method::<_, U256>("balanceOf", owner)
            .map_err(|e| BridgeError::ProviderError(format!("bad balanceOf call: {}", e)))?
            .call()
            .await
            .map_err(|e| BridgeError::ProviderError(format!("balanceOf failed: {}", e)))
    }
}
