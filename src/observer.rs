use std::fmt::Debug;
use std::sync::atomic::{AtomicU64, Ordering};

/// Receives mining progress. Purely informational; never affects the search.
pub trait MiningObserver: Debug + Send + Sync {
    /// Called after every nonce attempt with the number of attempts so far.
    fn on_attempt(&self, attempts: u64);
}

/// Holds the highest count reported, so concurrent forwarders cannot move it backwards.
impl MiningObserver for AtomicU64 {
    fn on_attempt(&self, attempts: u64) {
        self.fetch_max(attempts, Ordering::Relaxed);
    }
}

/// Emits an `info` event every `every` attempts.
#[derive(Debug, Clone, Copy)]
pub struct TracingProgress {
    every: u64,
}

impl TracingProgress {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
        }
    }
}

impl MiningObserver for TracingProgress {
    fn on_attempt(&self, attempts: u64) {
        if attempts % self.every == 0 {
            tracing::info!(attempts, "mining");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_counter_keeps_highest_count() {
        let counter = AtomicU64::new(0);
        counter.on_attempt(3);
        counter.on_attempt(5);
        counter.on_attempt(4);
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let progress = TracingProgress::new(0);
        assert_eq!(progress.every, 1);
        progress.on_attempt(5);
    }
}
