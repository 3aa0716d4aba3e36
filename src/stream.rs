//! Atomic helpers for cooperative cancellation and attempt accounting across workers.
use crate::observer::MiningObserver;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// Stop signal checked by miners between nonce attempts.
#[derive(Debug)]
pub struct StopFlag {
    stop: AtomicBool,
}

impl StopFlag {
    pub const fn new() -> Self {
        Self {
            stop: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    pub fn force_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }
}

impl Default for StopFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer that sums attempts from many sessions into one counter and
/// forwards the running total to an optional downstream observer.
#[derive(Debug)]
pub struct SharedAttempts {
    total: Arc<AtomicU64>,
    downstream: Option<Arc<dyn MiningObserver>>,
}

impl SharedAttempts {
    pub fn new(total: Arc<AtomicU64>, downstream: Option<Arc<dyn MiningObserver>>) -> Self {
        Self { total, downstream }
    }
}

impl MiningObserver for SharedAttempts {
    fn on_attempt(&self, _session_attempts: u64) {
        let total = self.total.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(observer) = &self.downstream {
            observer.on_attempt(total);
        }
    }
}
