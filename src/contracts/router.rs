//! CCIP router contract wrapper
//!
//! Thin ethers wrapper over the router's three entry points. `getFee` and
//! `getSupportedTokens` are view calls; `ccipSend` is the single on-chain
//! write of the whole bridge flow and carries the quoted fee as native
//! value.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::abi::{Abi, Token};
use ethers::contract::Contract;
use ethers::providers::Middleware;
use ethers::types::{Address, H256, U256};
use tracing::{debug, info};

use super::BridgeRouter;
use crate::error::BridgeError;
use crate::message::Evm2AnyMessage;

/// Router ABI, limited to the surface this client uses
const ROUTER_ABI: &str = r#"
[
  {
    "inputs": [{"name": "chainSelector", "type": "uint64"}],
    "name": "getSupportedTokens",
    "outputs": [{"name": "tokens", "type": "address[]"}],
    "stateMutability": "view",
    "type": "function"
  },
  {
    "inputs": [
      {"name": "destinationChainSelector", "type": "uint64"},
      {"name": "message", "type": "tuple", "components": [
        {"name": "receiver", "type": "bytes"},
        {"name": "data", "type": "bytes"},
        {"name": "tokenAmounts", "type": "tuple[]", "components": [
          {"name": "token", "type": "address"},
          {"name": "amount", "type": "uint256"}
        ]},
        {"name": "feeToken", "type": "address"},
        {"name": "extraArgs", "type": "bytes"}
      ]}
    ],
    "name": "getFee",
    "outputs": [{"name": "fee", "type": "uint256"}],
    "stateMutability": "view",
    "type": "function"
  },
  {
    "inputs": [
      {"name": "destinationChainSelector", "type": "uint64"},
      {"name": "message", "type": "tuple", "components": [
        {"name": "receiver", "type": "bytes"},
        {"name": "data", "type": "bytes"},
        {"name": "tokenAmounts", "type": "tuple[]", "components": [
          {"name": "token", "type": "address"},
          {"name": "amount", "type": "uint256"}
        ]},
        {"name": "feeToken", "type": "address"},
        {"name": "extraArgs", "type": "bytes"}
      ]}
    ],
    "name": "ccipSend",
    "outputs": [{"name": "messageId", "type": "bytes32"}],
    "stateMutability": "payable",
    "type": "function"
  }
]
"#;

/// Ethers-backed router client bound to one source chain
pub struct CcipRouter<M: Middleware> {
    contract: Contract<M>,
}

impl<M: Middleware + 'static> CcipRouter<M> {
    pub fn new(address: Address, client: Arc<M>) -> Result<Self, BridgeError> {
        let abi: Abi = serde_json::from_str(ROUTER_ABI)
            .map_err(|e| BridgeError::ConfigError(format!("router ABI parse failed: {}", e)))?;
        Ok(Self {
            contract: Contract::new(address, abi, client),
        })
    }

    pub fn address(&self) -> Address {
        self.contract.address()
    }
}

#[async_trait]
impl<M: Middleware + 'static> BridgeRouter for CcipRouter<M> {
    async fn supported_tokens(&self, dest_selector: u64) -> Result<Vec<Address>, BridgeError> {
        self.contract
            .method::<_, Vec<Address>>("getSupportedTokens", dest_selector)
            .map_err(|e| BridgeError::QuoteError(format!("bad getSupportedTokens call: {}", e)))?
            .call()
            .await
            .map_err(|e| BridgeError::QuoteError(format!("getSupportedTokens failed: {}", e)))
    }

    async fn fee(&self, dest_selector: u64, message: &Evm2AnyMessage) -> Result<U256, BridgeError> {
        let params = vec![
            Token::Uint(U256::from(dest_selector)),
            message.clone().into_token(),
        ];
        let fee = self
            .contract
            .method::<_, U256>("getFee", params)
            .map_err(|e| BridgeError::QuoteError(format!("bad getFee call: {}", e)))?
            .call()
            .await
            .map_err(|e| BridgeError::QuoteError(format!("getFee reverted: {}", e)))?;

        debug!(dest_selector, fee = %fee, "router fee quote");
        Ok(fee)
    }

    async fn ccip_send(
        &self,
        dest_selector: u64,
        message: &Evm2AnyMessage,
        fee: U256,
    ) -> Result<H256, BridgeError> {
        let params = vec![
            Token::Uint(U256::from(dest_selector)),
            message.clone().into_token(),
        ];
        let call = self
            .contract
            .method::<_, H256>("ccipSend", params)
            .map_err(|e| BridgeError::SubmitError(format!("bad ccipSend call: {}", e)))?
            .value(fee);

        let pending = call
            .send()
            .await
            .map_err(|e| BridgeError::SubmitError(format!("ccipSend broadcast failed: {}", e)))?;
        let tx_hash = pending.tx_hash();

        let receipt = pending
            .await
            .map_err(|e| BridgeError::SubmitError(format!("ccipSend confirmation failed: {}", e)))?
            .ok_or_else(|| BridgeError::SubmitError("ccipSend transaction dropped".into()))?;

        if receipt.status == Some(0.into()) {
            return Err(BridgeError::SubmitError(format!(
                "ccipSend reverted in tx {:#x}",
                tx_hash
            )));
        }

        info!(tx_hash = %format!("{:#x}", tx_hash), dest_selector, "bridge send mined");
        Ok(tx_hash)
    }
}
