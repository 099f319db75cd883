//! Cycle-scoped cancellation.
//!
//! Every streaming cycle runs under a [`CycleToken`] stamped with an epoch.
//! Starting a new cycle bumps the shared epoch, which cancels every token
//! handed out before it. Closing the world cancels all tokens for good.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

#[derive(Debug, Default)]
struct Shared {
    epoch: AtomicU64,
    closed: AtomicBool,
}

/// Owner side of the cancellation state, held by the world.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    shared: Arc<Shared>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels the running cycle, if any, and hands out a token for the next one.
    pub fn begin_cycle(&self) -> CycleToken {
        let epoch = self.shared.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        CycleToken {
            shared: Arc::clone(&self.shared),
            epoch,
        }
    }

    /// Cancels the running cycle without starting another.
    pub fn cancel_current(&self) {
        self.shared.epoch.fetch_add(1, Ordering::AcqRel);
    }

    /// Cancels everything, now and for every token handed out later.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    /// Epoch of the most recently started cycle.
    pub fn current_epoch(&self) -> u64 {
        self.shared.epoch.load(Ordering::Acquire)
    }
}

/// Worker side: checked before each unit of work.
#[derive(Clone, Debug)]
pub struct CycleToken {
    shared: Arc<Shared>,
    epoch: u64,
}

impl CycleToken {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// `true` once a newer cycle has started or the world has closed.
    pub fn is_cancelled(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
            || self.shared.epoch.load(Ordering::Acquire) != self.epoch
    }
}
