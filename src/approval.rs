//! Allowance tracking and approval
//!
//! Decides whether the router needs a fresh spend approval for a requested
//! transfer and drives the `approve` transaction when it does. An off-chain
//! permit signature can stand in for an on-chain approval; the larger of
//! the two grants wins.

use std::sync::Arc;

use ethers::types::{Address, H256, U256};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::contracts::TokenApi;
use crate::error::BridgeError;

/// Whether `requested` exceeds every grant the spender currently holds.
/// Equality is sufficient: `requested == approved` needs no new approval.
pub fn needs_approval(approved: U256, requested: U256, signed: Option<U256>) -> bool {
    requested > approved.max(signed.unwrap_or_default())
}

/// Derived allowance snapshot for one (owner, spender, amount) triple
#[derive(Debug, Clone, Default)]
pub struct ApprovalState {
    /// True when the requested amount exceeds all current grants
    pub requires_approval: bool,
    /// On-chain allowance at the last refresh
    pub approved_amount: U256,
    /// Amount covered by an off-chain permit signature, if any
    pub signed_amount: Option<U256>,
    /// Set after an approval transaction was mined and the refetched
    /// allowance covers the request; cleared again if a later refresh shows
    /// the grant is too small for a new, larger request
    pub approval_confirmed: bool,
}

/// Tracks the token allowance granted to the router and issues approvals
pub struct ApprovalTracker {
    token: Arc<dyn TokenApi>,
    owner: Address,
    spender: Address,
    state: RwLock<ApprovalState>,
}

impl ApprovalTracker {
    pub fn new(token: Arc<dyn TokenApi>, owner: Address, spender: Address) -> Self {
        Self {
            token,
            owner,
            spender,
            state: RwLock::new(ApprovalState::default()),
        }
    }

    /// Refetch the on-chain allowance and re-derive the state against
    /// `requested`. If a previously confirmed approval no longer covers the
    /// request the confirmation flag is dropped so the caller re-prompts.
    pub async fn refresh(&self, requested: U256) -> Result<ApprovalState, BridgeError> {
        let allowance = self.token.allowance(self.owner, self.spender).await?;

        let mut state = self.state.write().await;
        state.approved_amount = allowance;
        state.requires_approval = needs_approval(allowance, requested, state.signed_amount);

        if state.approval_confirmed && state.requires_approval {
            warn!(
                allowance = %allowance,
                requested = %requested,
                "confirmed approval no longer covers request, re-prompting"
            );
            state.approval_confirmed = false;
        }

        Ok(state.clone())
    }

    /// Submit an on-chain approval for `amount`, then refetch the allowance
    /// to confirm the grant actually covers the request. If the mined
    /// approval still leaves the allowance short (e.g. a token that resets
    /// grants on re-approve) the confirmation flag stays cleared and
    /// `requires_approval` remains true so the caller re-prompts.
    pub async fn approve(&self, amount: U256) -> Result<H256, BridgeError> {
        let tx_hash = self.token.approve(self.spender, amount).await?;

        let refreshed = self.refresh(amount).await?;
        if refreshed.requires_approval {
            warn!(
                allowance = %refreshed.approved_amount,
                requested = %amount,
                "allowance still short after mined approval"
            );
            return Ok(tx_hash);
        }

        let mut state = self.state.write().await;
        state.approval_confirmed = true;
        info!(amount = %amount, tx_hash = %format!("{:#x}", tx_hash), "approval confirmed");
        Ok(tx_hash)
    }

    /// Record an off-chain permit signature covering `amount`
    pub async fn register_permit(&self, amount: U256) {
        let mut state = self.state.write().await;
        state.signed_amount = Some(amount);
    }

    /// Current derived state without refetching
    pub async fn state(&self) -> ApprovalState {
        self.state.read().await.clone()
    }

    /// Drop all derived state, e.g. when the flow is reset
    pub async fn clear(&self) {
        *self.state.write().await = ApprovalState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_needs_approval_boundaries() {
        let n = |v: u64| U256::from(v);

        assert!(needs_approval(n(50), n(100), None));
        assert!(!needs_approval(n(150), n(100), None));
        // Equality needs no approval
        assert!(!needs_approval(n(100), n(100), None));
        // A permit signature counts toward the grant
        assert!(!needs_approval(n(50), n(100), Some(n(100))));
        assert!(needs_approval(n(50), n(100), Some(n(99))));
        assert!(!needs_approval(U256::zero(), U256::zero(), None));
    }

    /// Token stub whose allowance is driven by an atomic so tests can model
    /// approvals taking effect (or failing to)
    struct StubToken {
        allowance: AtomicU64,
        grant_on_approve: bool,
    }

    #[async_trait]
    impl TokenApi for StubToken {
        async fn allowance(&self, _owner: Address, _spender: Address) -> Result<U256, BridgeError> {
            Ok(U256::from(self.allowance.load(Ordering::SeqCst)))
        }

        async fn approve(&self, _spender: Address, amount: U256) -> Result<H256, BridgeError> {
            if self.grant_on_approve {
                self.allowance.store(amount.as_u64(), Ordering::SeqCst);
            }
            Ok(H256::repeat_byte(1))
        }

        async fn decimals(&self) -> Result<u8, BridgeError> {
            Ok(18)
        }

        async fn balance_of(&self, _owner: Address) -> Result<U256, BridgeError> {
            Ok(U256::MAX)
        }
    }

    fn tracker(token: StubToken) -> ApprovalTracker {
        ApprovalTracker::new(
            Arc::new(token),
            Address::repeat_byte(0xaa),
            Address::repeat_byte(0xbb),
        )
    }

    #[tokio::test]
    async fn test_refresh_derives_requirement() {
        let t = tracker(StubToken {
            allowance: AtomicU64::new(50),
            grant_on_approve: true,
        });

        let state = t.refresh(U256::from(100)).await.unwrap();
        assert!(state.requires_approval);
        assert_eq!(state.approved_amount, U256::from(50));

        let state = t.refresh(U256::from(50)).await.unwrap();
        assert!(!state.requires_approval);
    }

    #[tokio::test]
    async fn test_approve_confirms_and_larger_request_reprompts() {
        let t = tracker(StubToken {
            allowance: AtomicU64::new(0),
            grant_on_approve: true,
        });

        t.approve(U256::from(100)).await.unwrap();
        assert!(t.state().await.approval_confirmed);

        // A bigger request invalidates the earlier confirmation
        let state = t.refresh(U256::from(200)).await.unwrap();
        assert!(state.requires_approval);
        assert!(!state.approval_confirmed);
    }

    #[tokio::test]
    async fn test_approve_detects_ineffective_grant() {
        let t = tracker(StubToken {
            allowance: AtomicU64::new(0),
            grant_on_approve: false,
        });

        t.approve(U256::from(100)).await.unwrap();
        let state = t.state().await;
        assert!(state.requires_approval);
        assert!(!state.approval_confirmed);
    }

    #[tokio::test]
    async fn test_permit_counts_toward_grant() {
        let t = tracker(StubToken {
            allowance: AtomicU64::new(0),
            grant_on_approve: true,
        });

        t.register_permit(U256::from(100)).await;
        let state = t.refresh(U256::from(100)).await.unwrap();
        assert!(!state.requires_approval);
    }
}
