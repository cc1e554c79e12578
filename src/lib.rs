//! # GHO Bridge Client
//!
//! Client for bridging GHO between networks over the CCIP router:
//! lane configuration, message construction and fee quoting, allowance
//! tracking, and an orchestrator that sequences the
//! quote -> approve -> send flow as an explicit state machine.

pub mod approval;
pub mod config;
pub mod contracts;
pub mod debounce;
pub mod error;
pub mod lanes;
pub mod message;
pub mod orchestrator;
pub mod types;

pub use approval::{needs_approval, ApprovalState, ApprovalTracker};
pub use config::BridgeConfig;
pub use error::{BridgeError, BridgeErrorKind};
pub use lanes::LaneConfig;
pub use message::{build_and_quote, BridgeQuote, Evm2AnyMessage, EvmTokenAmount};
pub use orchestrator::{BridgeActionState, BridgeEvent, BridgeOrchestrator};
pub use types::{BridgeSendStatus, BridgeTransaction, Chain, FeeEstimate};
