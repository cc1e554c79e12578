use ethers::types::U256;
use thiserror::Error;

use crate::types::Chain;

/// Errors produced by the bridge client.
///
/// `UnsupportedChain` and `UnsupportedToken` are precondition failures and
/// must not be retried without reconfiguration. The remaining runtime
/// variants are surfaced to the orchestrator as a recoverable `Failed`
/// state and may be retried from scratch.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("no lane configuration for chain: {0}")]
    UnsupportedChain(Chain),
    #[error("token {token} is not supported on the {destination} lane")]
    UnsupportedToken { token: String, destination: Chain },
    #[error("fee quote failed: {0}")]
    QuoteError(String),
    #[error("approval failed: {0}")]
    ApprovalError(String),
    #[error("bridge send failed: {0}")]
    SubmitError(String),
    #[error("requested amount {requested} exceeds bridgeable capacity {available}")]
    CapacityExceeded { requested: U256, available: U256 },
    #[error("invalid bridge input: {0}")]
    InvalidInput(String),
    #[error("configuration error: {0}")]
    ConfigError(String),
    #[error("provider error: {0}")]
    ProviderError(String),
}

/// Coarse classification of a failure, carried by the orchestrator's
/// `Failed` state so the UI layer can decide how to present a retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeErrorKind {
    UnsupportedChain,
    UnsupportedToken,
    Quote,
    Approval,
    Submit,
    Capacity,
    Input,
}

impl BridgeErrorKind {
    /// Whether re-running the flow from the quote step can succeed without
    /// reconfiguration.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Quote | Self::Approval | Self::Submit)
    }
}

impl From<&BridgeError> for BridgeErrorKind {
    fn from(err: &BridgeError) -> Self {
        match err {
            BridgeError::UnsupportedChain(_) => Self::UnsupportedChain,
            BridgeError::UnsupportedToken { .. } => Self::UnsupportedToken,
            BridgeError::QuoteError(_) | BridgeError::ProviderError(_) => Self::Quote,
            BridgeError::ApprovalError(_) => Self::Approval,
            BridgeError::SubmitError(_) => Self::Submit,
            BridgeError::CapacityExceeded { .. } => Self::Capacity,
            BridgeError::InvalidInput(_) | BridgeError::ConfigError(_) => Self::Input,
        }
    }
}

impl std::fmt::Display for BridgeErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::UnsupportedChain => "unsupported chain",
            Self::UnsupportedToken => "unsupported token",
            Self::Quote => "quote error",
            Self::Approval => "approval error",
            Self::Submit => "submit error",
            Self::Capacity => "capacity exceeded",
            Self::Input => "invalid input",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_classification() {
        let err = BridgeError::QuoteError("rpc down".into());
        assert_eq!(BridgeErrorKind::from(&err), BridgeErrorKind::Quote);
        assert!(BridgeErrorKind::from(&err).is_retryable());

        let err = BridgeError::UnsupportedChain(Chain::Ethereum);
        assert_eq!(BridgeErrorKind::from(&err), BridgeErrorKind::UnsupportedChain);
        assert!(!BridgeErrorKind::from(&err).is_retryable());

        let err = BridgeError::CapacityExceeded {
            requested: U256::from(100),
            available: U256::from(50),
        };
        assert!(!BridgeErrorKind::from(&err).is_retryable());
    }
}
