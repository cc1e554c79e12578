//! Core bridge data types
//!
//! Defines the `Chain` enum for networks reachable over the bridge, the
//! status and record types for submitted bridge sends, and the fee quote
//! shape returned by the message builder.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Networks with a configured bridge lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Chain {
    /// Ethereum mainnet
    Ethereum,
    /// Arbitrum One
    Arbitrum,
    /// Base
    Base,
}

impl Chain {
    /// EVM chain id of the network
    pub fn chain_id(&self) -> u64 {
        match self {
            Chain::Ethereum => 1,
            Chain::Arbitrum => 42161,
            Chain::Base => 8453,
        }
    }

    /// Resolve a chain from its EVM chain id
    pub fn from_chain_id(id: u64) -> Option<Self> {
        match id {
            1 => Some(Chain::Ethereum),
            42161 => Some(Chain::Arbitrum),
            8453 => Some(Chain::Base),
            _ => None,
        }
    }

    /// Get string representation of the chain
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Ethereum => "ethereum",
            Chain::Arbitrum => "arbitrum",
            Chain::Base => "base",
        }
    }

    /// Symbol of the native gas token, used when the fee is paid with the
    /// zero-address fee token sentinel
    pub fn native_symbol(&self) -> &'static str {
        match self {
            Chain::Ethereum | Chain::Arbitrum | Chain::Base => "ETH",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ethereum" | "mainnet" => Ok(Self::Ethereum),
            "arbitrum" => Ok(Self::Arbitrum),
            "base" => Ok(Self::Base),
            _ => Err(format!("Unknown chain: {}", s)),
        }
    }
}

/// Status of a submitted bridge send on the source chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BridgeSendStatus {
    /// Broadcast but not yet mined
    Pending,
    /// Mined on the source chain; delivery on the destination is handled by
    /// the router network from here on
    Confirmed,
    /// Reverted or rejected, with reason
    Failed(String),
}

impl BridgeSendStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed(_))
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Self::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for BridgeSendStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Confirmed => write!(f, "Confirmed"),
            Self::Failed(reason) => write!(f, "Failed: {}", reason),
        }
    }
}

/// Record of a bridge send issued through the orchestrator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeTransaction {
    /// Source-chain transaction hash
    pub tx_hash: String,

    /// Source blockchain
    pub source_chain: Chain,

    /// Destination blockchain
    pub destination_chain: Chain,

    /// Sender address on the source chain
    pub sender: String,

    /// Receiver address on the destination chain
    pub receiver: String,

    /// Transferred amount in smallest units (as string for serialization)
    pub amount: String,

    /// Bridged token address
    pub token: String,

    /// Current status on the source chain
    pub status: BridgeSendStatus,

    /// UNIX timestamp (seconds) of the last status change
    pub timestamp: u64,
}

impl BridgeTransaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tx_hash: String,
        source_chain: Chain,
        destination_chain: Chain,
        sender: String,
        receiver: String,
        amount: String,
        token: String,
        status: BridgeSendStatus,
    ) -> Self {
        Self {
            tx_hash,
            source_chain,
            destination_chain,
            sender,
            receiver,
            amount,
            token,
            status,
            timestamp: unix_now(),
        }
    }

    /// Update the status, refreshing the timestamp on change
    pub fn update_status(&mut self, new_status: BridgeSendStatus) {
        if self.status != new_status {
            self.status = new_status;
            self.timestamp = unix_now();
        }
    }
}

impl fmt::Display for BridgeTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Bridge [{}] {} -> {}, Status: {}, Amount: {} [{}], Receiver: {}",
            self.tx_hash,
            self.source_chain,
            self.destination_chain,
            self.status,
            self.amount,
            self.token,
            self.receiver
        )
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Fee quote for a bridge transfer, paid in the source chain's native token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeEstimate {
    /// Fee in smallest units (as string for serialization)
    pub fee_raw: String,

    /// Fee as a human-readable decimal string
    pub fee_formatted: String,

    /// Symbol of the token the fee is denominated in
    pub fee_token: String,
}

impl FeeEstimate {
    pub fn new(fee_raw: String, fee_formatted: String, fee_token: String) -> Self {
        Self {
            fee_raw,
            fee_formatted,
            fee_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_conversions() {
        assert_eq!(Chain::Ethereum.chain_id(), 1);
        assert_eq!(Chain::Arbitrum.chain_id(), 42161);
        assert_eq!(Chain::from_chain_id(8453), Some(Chain::Base));
        assert_eq!(Chain::from_chain_id(999), None);

        assert_eq!(Chain::Ethereum.as_str(), "ethereum");
        assert_eq!("arbitrum".parse::<Chain>(), Ok(Chain::Arbitrum));
        assert_eq!("MAINNET".parse::<Chain>(), Ok(Chain::Ethereum));
        assert!("unknown".parse::<Chain>().is_err());

        assert_eq!(Chain::Base.to_string(), "base");
    }

    #[test]
    fn test_send_status() {
        assert!(BridgeSendStatus::Confirmed.is_terminal());
        assert!(BridgeSendStatus::Failed("reverted".into()).is_terminal());
        assert!(!BridgeSendStatus::Pending.is_terminal());

        assert_eq!(
            BridgeSendStatus::Failed("user rejected".into()).failure_reason(),
            Some("user rejected")
        );
        assert_eq!(BridgeSendStatus::Confirmed.failure_reason(), None);
    }

    #[test]
    fn test_transaction_status_update() {
        let mut tx = BridgeTransaction::new(
            "0xabc".to_string(),
            Chain::Ethereum,
            Chain::Arbitrum,
            "0xSender".to_string(),
            "0xReceiver".to_string(),
            "100000000000000000000".to_string(),
            "0xToken".to_string(),
            BridgeSendStatus::Pending,
        );

        tx.update_status(BridgeSendStatus::Confirmed);
        assert_eq!(tx.status, BridgeSendStatus::Confirmed);

        // Re-applying the same status keeps the record unchanged
        let ts = tx.timestamp;
        tx.update_status(BridgeSendStatus::Confirmed);
        assert_eq!(tx.timestamp, ts);
    }
}
