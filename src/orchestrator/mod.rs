//! Bridge action orchestrator
//!
//! Owns one bridge attempt end to end: debounced fee quoting, the
//! allowance check, the approval write when required, and the final
//! `ccipSend`. The lifecycle lives in the pure state machine in
//! [`state`]; this driver feeds it events and performs all I/O. Quote,
//! allowance and fee values are owned here exclusively and replaced
//! atomically, never mutated concurrently. Runtime failures land in the
//! recoverable `Failed` state; the flow never panics out of a user action.

pub mod state;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use ethers::types::{Address, U256};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::approval::ApprovalTracker;
use crate::contracts::{BridgeRouter, TokenApi, TokenPool};
use crate::debounce::Debouncer;
use crate::error::{BridgeError, BridgeErrorKind};
use crate::lanes::{self, LaneConfig};
use crate::message::{build_and_quote, BridgeQuote};
use crate::types::{BridgeSendStatus, BridgeTransaction, Chain, FeeEstimate};

pub use state::{transition, BridgeActionState, BridgeEvent};

const MAX_RECENT_TXS: usize = 100;

/// Validated user input for one bridge attempt
#[derive(Debug, Clone)]
pub struct BridgeInput {
    pub amount: String,
    pub destination_account: Address,
}

#[derive(Debug)]
struct FlowState {
    action: BridgeActionState,
    input: Option<BridgeInput>,
    quote: Option<BridgeQuote>,
}

/// Drives a bridge transfer from one source chain to one destination
pub struct BridgeOrchestrator {
    source: Chain,
    destination: Chain,
    sender: Address,
    lane: &'static LaneConfig,
    dest_selector: u64,
    router: Arc<dyn BridgeRouter>,
    token: Arc<dyn TokenApi>,
    pool: Option<Arc<dyn TokenPool>>,
    approval: ApprovalTracker,
    debouncer: Debouncer,
    flow: RwLock<FlowState>,
    recent: RwLock<Vec<BridgeTransaction>>,
}

impl BridgeOrchestrator {
    /// Build an orchestrator for a (source, destination) lane pair.
    /// Fails fast with `UnsupportedChain` when either end has no lane
    /// configuration; this is a precondition violation, not retryable.
    pub fn new(
        source: Chain,
        destination: Chain,
        sender: Address,
        router: Arc<dyn BridgeRouter>,
        token: Arc<dyn TokenApi>,
        pool: Option<Arc<dyn TokenPool>>,
        debounce_window: Duration,
    ) -> Result<Self, BridgeError> {
        let lane = lanes::config_for(source)?;
        let dest_selector = lanes::chain_selector_for(destination)?;
        if source == destination {
            return Err(BridgeError::InvalidInput(
                "source and destination must differ".into(),
            ));
        }

        let approval = ApprovalTracker::new(token.clone(), sender, lane.router);

        Ok(Self {
            source,
            destination,
            sender,
            lane,
            dest_selector,
            router,
            token,
            pool,
            approval,
            debouncer: Debouncer::new(debounce_window),
            flow: RwLock::new(FlowState {
                action: BridgeActionState::Idle,
                input: None,
                quote: None,
            }),
            recent: RwLock::new(Vec::new()),
        })
    }

    /// Current lifecycle state
    pub async fn state(&self) -> BridgeActionState {
        self.flow.read().await.action
    }

    /// The priced message for the current input, if a quote completed
    pub async fn current_quote(&self) -> Option<BridgeQuote> {
        self.flow.read().await.quote.clone()
    }

    /// Fee estimate of the current quote in the lane's native token
    pub async fn fee_estimate(&self) -> Option<FeeEstimate> {
        self.flow.read().await.quote.as_ref().map(|q| {
            FeeEstimate::new(
                q.fee_raw.to_string(),
                q.fee_formatted.clone(),
                self.source.native_symbol().to_string(),
            )
        })
    }

    /// Recent sends issued through this orchestrator, newest last
    pub async fn recent_transactions(&self, limit: usize) -> Vec<BridgeTransaction> {
        let txs = self.recent.read().await;
        let skip = txs.len().saturating_sub(limit);
        txs.iter().skip(skip).cloned().collect()
    }

    /// Register an input change. Invalid input drops the flow back to
    /// `Idle`; valid input restarts the quote after the debounce window.
    /// Rapid successive calls coalesce: only the newest change quotes.
    pub async fn input_changed(&self, amount: &str, destination_account: &str) -> BridgeActionState {
        let account = Address::from_str(destination_account).ok();
        let amount_ok = amount.parse::<f64>().map(|v| v > 0.0).unwrap_or(false);

        let (valid_input, event) = match (account, amount_ok) {
            (Some(account), true) => (
                Some(BridgeInput {
                    amount: amount.to_string(),
                    destination_account: account,
                }),
                BridgeEvent::InputValid,
            ),
            _ => (None, BridgeEvent::InputCleared),
        };

        {
            let mut flow = self.flow.write().await;
            let next = transition(flow.action, event);
            if next == flow.action && flow.action.has_write_in_flight() {
                // A broadcast transaction cannot be retracted; ignore the
                // change until the write settles
                return flow.action;
            }
            flow.action = next;
            flow.input = valid_input.clone();
            // Any input change invalidates the previous quote
            flow.quote = None;
        }

        if valid_input.is_none() {
            self.debouncer.invalidate();
            return self.state().await;
        }

        match self.debouncer.settle().await {
            Some(gen) => self.run_quote(gen).await,
            // Superseded by a newer change; that call drives the flow
            None => self.state().await,
        }
    }

    /// Re-run the quote for the stored input after a failure. Clears all
    /// derived state first: allowance is re-evaluated from scratch.
    pub async fn retry(&self) -> BridgeActionState {
        {
            let mut flow = self.flow.write().await;
            if !matches!(flow.action, BridgeActionState::Failed(_)) {
                warn!(state = %flow.action, "retry ignored outside Failed");
                return flow.action;
            }
            if flow.input.is_none() {
                flow.action = BridgeActionState::Idle;
                return flow.action;
            }
            flow.action = transition(flow.action, BridgeEvent::Retry);
            flow.quote = None;
        }
        self.approval.clear().await;

        let gen = self.debouncer.invalidate();
        self.run_quote(gen).await
    }

    /// Close the flow: back to `Idle`, all derived state dropped
    pub async fn reset(&self) {
        let mut flow = self.flow.write().await;
        if flow.action.has_write_in_flight() {
            warn!(state = %flow.action, "reset with a write in flight; transaction stays broadcast");
        }
        flow.action = BridgeActionState::Idle;
        flow.input = None;
        flow.quote = None;
        drop(flow);

        self.approval.clear().await;
        self.debouncer.invalidate();
    }

    /// User confirmed the pending approval. Issues exactly one `approve`
    /// write, then re-derives the allowance verdict from a fresh fetch.
    pub async fn confirm_approval(&self) -> Result<BridgeActionState, BridgeError> {
        let amount = {
            let mut flow = self.flow.write().await;
            if flow.action != BridgeActionState::AwaitingApproval {
                return Err(BridgeError::InvalidInput(format!(
                    "no approval awaited in state {}",
                    flow.action
                )));
            }
            let amount = flow
                .quote
                .as_ref()
                .map(|q| q.amount)
                .ok_or_else(|| BridgeError::InvalidInput("no quote for approval".into()))?;
            flow.action = transition(flow.action, BridgeEvent::ApprovalSubmitted);
            amount
        };

        let event = match self.approval.approve(amount).await {
            Ok(_) => {
                let state = self.approval.state().await;
                if state.requires_approval {
                    BridgeEvent::ApprovalInsufficient
                } else {
                    BridgeEvent::ApprovalMined
                }
            }
            Err(err) => {
                warn!(error = %err, "approval failed");
                BridgeEvent::ApprovalFailed
            }
        };

        Ok(self.apply(event).await)
    }

    /// User confirmed the send. Consumes the quote (a message is submitted
    /// at most once) and issues exactly one `ccipSend` write.
    pub async fn confirm_send(&self) -> Result<BridgeTransaction, BridgeError> {
        let quote = {
            let mut flow = self.flow.write().await;
            if flow.action != BridgeActionState::ReadyToSubmit {
                return Err(BridgeError::InvalidInput(format!(
                    "not ready to submit in state {}",
                    flow.action
                )));
            }
            let quote = flow
                .quote
                .take()
                .ok_or_else(|| BridgeError::InvalidInput("no quote to submit".into()))?;
            flow.action = transition(flow.action, BridgeEvent::SendSubmitted);
            quote
        };

        let receiver = self
            .flow
            .read()
            .await
            .input
            .as_ref()
            .map(|i| i.destination_account);

        match self
            .router
            .ccip_send(self.dest_selector, &quote.message, quote.fee_raw)
            .await
        {
            Ok(tx_hash) => {
                let tx = BridgeTransaction::new(
                    format!("{:#x}", tx_hash),
                    self.source,
                    self.destination,
                    format!("{:#x}", self.sender),
                    receiver.map(|a| format!("{:#x}", a)).unwrap_or_default(),
                    quote.amount.to_string(),
                    format!("{:#x}", self.lane.token),
                    BridgeSendStatus::Confirmed,
                );
                self.store_transaction(tx.clone()).await;
                self.apply(BridgeEvent::SendMined).await;
                info!(%tx, "bridge transfer confirmed");
                Ok(tx)
            }
            Err(err) => {
                warn!(error = %err, "bridge send failed");
                self.apply(BridgeEvent::SendFailed).await;
                Err(err)
            }
        }
    }

    /// Bridgeable headroom on this lane right now: the pool's global limit
    /// (lock/release lanes only) intersected with the outbound rate
    /// limiter bucket when enabled. `None` when no pool client is wired.
    pub async fn available_capacity(&self) -> Result<Option<U256>, BridgeError> {
        let pool = match &self.pool {
            Some(pool) => pool,
            None => return Ok(None),
        };

        let mut available = U256::MAX;
        if self.lane.lock_release_token_pool.is_some() {
            let limit = pool.bridge_limit().await?;
            let bridged = pool.current_bridged_amount().await?;
            available = limit.saturating_sub(bridged);
        }

        let limiter = pool.outbound_rate_limiter_state(self.dest_selector).await?;
        if limiter.is_enabled {
            available = available.min(limiter.tokens);
        }

        Ok(Some(available))
    }

    async fn apply(&self, event: BridgeEvent) -> BridgeActionState {
        let mut flow = self.flow.write().await;
        flow.action = transition(flow.action, event);
        flow.action
    }

    /// Quote the stored input. `gen` is the debounce generation this work
    /// belongs to; results for superseded generations are discarded before
    /// touching state.
    async fn run_quote(&self, gen: u64) -> BridgeActionState {
        let input = match self.flow.read().await.input.clone() {
            Some(input) => input,
            None => return self.state().await,
        };

        let outcome = self.quote_once(&input).await;

        if !self.debouncer.is_current(gen) {
            debug!(gen, "discarding stale quote result");
            return self.state().await;
        }

        match outcome {
            Ok((quote, requires_approval)) => {
                let mut flow = self.flow.write().await;
                flow.quote = Some(quote);
                flow.action = transition(flow.action, BridgeEvent::QuoteReady { requires_approval });
                flow.action
            }
            Err(err) => {
                warn!(error = %err, "quote failed");
                let kind = BridgeErrorKind::from(&err);
                self.apply(BridgeEvent::QuoteFailed(kind)).await
            }
        }
    }

    async fn quote_once(&self, input: &BridgeInput) -> Result<(BridgeQuote, bool), BridgeError> {
        let decimals = self.token.decimals().await?;

        let quote = build_and_quote(
            self.router.as_ref(),
            self.source,
            self.destination,
            self.lane.token,
            &input.amount,
            decimals,
            input.destination_account,
        )
        .await?;

        if let Some(available) = self.available_capacity().await? {
            if quote.amount > available {
                return Err(BridgeError::CapacityExceeded {
                    requested: quote.amount,
                    available,
                });
            }
        }

        let approval_state = self.approval.refresh(quote.amount).await?;
        Ok((quote, approval_state.requires_approval))
    }

    async fn store_transaction(&self, tx: BridgeTransaction) {
        let mut txs = self.recent.write().await;
        txs.push(tx);
        let len = txs.len();
        if len > MAX_RECENT_TXS {
            txs.drain(..len - MAX_RECENT_TXS);
        }
    }
}
