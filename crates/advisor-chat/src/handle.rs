//! A cloneable handle for stopping a turn from outside the advisor.

use parking_lot::Mutex;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tokio_util::sync::CancellationToken;

/// A cloneable handle for stopping the in-flight turn.
///
/// All fields are `Arc`-wrapped, so cloning is cheap.
#[derive(Clone)]
pub struct TurnHandle {
    cancel: Arc<Mutex<CancellationToken>>,
    is_running: Arc<AtomicBool>,
}

impl TurnHandle {
    pub(crate) fn new() -> Self {
        Self {
            cancel: Arc::new(Mutex::new(CancellationToken::new())),
            is_running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Mark a turn as running and hand out its fresh token.
    /// Returns `None` when a turn is already running.
    pub(crate) fn begin(&self) -> Option<CancellationToken> {
        if self
            .is_running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return None;
        }
        let token = CancellationToken::new();
        *self.cancel.lock() = token.clone();
        Some(token)
    }

    pub(crate) fn finish(&self) {
        self.is_running.store(false, Ordering::Release);
    }

    /// Stop the current turn. A no-op when idle.
    pub fn abort(&self) {
        self.cancel.lock().cancel();
    }

    /// Whether a turn is currently running.
    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::Acquire)
    }
}
