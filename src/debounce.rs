//! Quote debouncing
//!
//! Coalesces rapid input changes into a single fee quote. Each change bumps
//! a generation counter and sleeps through the idle window; only the change
//! that is still the newest when its window elapses proceeds. The counter
//! doubles as a staleness guard: results are applied only if their
//! generation is still current.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::sleep;

/// Default idle window before a quote request fires
pub const DEFAULT_QUOTE_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    generation: AtomicU64,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            generation: AtomicU64::new(0),
        }
    }

    /// Register an input change and wait out the idle window. Returns the
    /// change's generation if it survived (no newer change arrived), `None`
    /// if it was superseded and the caller should do nothing.
    pub async fn settle(&self) -> Option<u64> {
        let gen = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        sleep(self.window).await;
        if self.generation.load(Ordering::SeqCst) == gen {
            Some(gen)
        } else {
            None
        }
    }

    /// Whether `gen` is still the newest registered change. Used to discard
    /// results computed for stale inputs before applying them to state.
    pub fn is_current(&self, gen: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == gen
    }

    /// Invalidate everything in flight without waiting out a window.
    /// Returns the new current generation, usable as a guard token for work
    /// that should start immediately (e.g. a retry).
    pub fn invalidate(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }
}
