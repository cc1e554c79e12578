//! Contract call surfaces
//!
//! Traits for the three external contracts the bridge talks to: the CCIP
//! router, the ERC-20 token being bridged and the token pool enforcing
//! transfer limits. The orchestrator only depends on these traits; the
//! ethers-backed implementations live in the submodules.

pub mod erc20;
pub mod router;
pub mod token_pool;

use async_trait::async_trait;
use ethers::types::{Address, H256, U256};

use crate::error::BridgeError;
use crate::message::Evm2AnyMessage;

pub use erc20::Erc20Token;
pub use router::CcipRouter;
pub use token_pool::TokenPoolContract;

/// Read/write surface of the CCIP router on the source chain
#[async_trait]
pub trait BridgeRouter: Send + Sync {
    /// Tokens transferable to the destination identified by `dest_selector`
    async fn supported_tokens(&self, dest_selector: u64) -> Result<Vec<Address>, BridgeError>;

    /// Fee in source-chain fee-token units for delivering `message`
    async fn fee(&self, dest_selector: u64, message: &Evm2AnyMessage) -> Result<U256, BridgeError>;

    /// Submit the transfer, attaching `fee` as native value. One on-chain
    /// write; returns the source-chain transaction hash once mined.
    async fn ccip_send(
        &self,
        dest_selector: u64,
        message: &Evm2AnyMessage,
        fee: U256,
    ) -> Result<H256, BridgeError>;
}

/// ERC-20 surface of the bridged token
#[async_trait]
pub trait TokenApi: Send + Sync {
    async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, BridgeError>;

    /// Submit an `approve` transaction; returns the hash once mined
    async fn approve(&self, spender: Address, amount: U256) -> Result<H256, BridgeError>;

    async fn decimals(&self) -> Result<u8, BridgeError>;

    async fn balance_of(&self, owner: Address) -> Result<U256, BridgeError>;
}

/// Outbound rate limiter bucket state reported by a token pool
#[derive(Debug, Clone)]
pub struct RateLimiterState {
    /// Tokens currently available in the bucket
    pub tokens: U256,
    /// UNIX timestamp of the last bucket refill
    pub last_updated: u32,
    /// Whether the limiter is active on this lane
    pub is_enabled: bool,
    /// Maximum bucket size
    pub capacity: U256,
    /// Refill rate in tokens per second
    pub rate: U256,
}

/// Read surface of the token pool backing a lane
#[async_trait]
pub trait TokenPool: Send + Sync {
    /// Hard cap on the total amount bridged out of this pool. Only the
    /// Ethereum lock/release pool exposes this.
    async fn bridge_limit(&self) -> Result<U256, BridgeError>;

    /// Amount currently bridged out of this pool
    async fn current_bridged_amount(&self) -> Result<U256, BridgeError>;

    /// Outbound rate limiter state toward `dest_selector`
    async fn outbound_rate_limiter_state(
        &self,
        dest_selector: u64,
    ) -> Result<RateLimiterState, BridgeError>;
}
