use crate::error::CoinError;
use crate::miner::Miner;
use crate::observer::MiningObserver;
use crate::stream::{SharedAttempts, StopFlag};
use crate::types::Mined;
use flume::{Receiver, Sender};
use rand::rngs::OsRng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

type SessionResult = Result<Mined, CoinError>;

/// Runs `workers` independent mining sessions and keeps the first good coin.
///
/// Each worker has its own keypair and its own `max_iterations` budget. Once a
/// worker finds a good coin the others stop at their next attempt.
#[derive(Debug, Clone)]
pub struct ParallelMiner {
    miner: Miner,
    workers: usize,
}

impl ParallelMiner {
    pub fn new(miner: Miner, workers: usize) -> Result<Self, CoinError> {
        if workers == 0 {
            return Err(CoinError::InvalidConfig("workers must be >= 1".into()));
        }
        Ok(Self { miner, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Mine until one worker succeeds or all budgets are spent.
    ///
    /// The first good coin or error reported by any worker is returned and
    /// stops the rest. Without either, the bad coin with the most trailing zero
    /// bits is returned, unless a worker panicked. `attempts` on the result is
    /// the total across all workers.
    pub fn mine(&self) -> Result<Mined, CoinError> {
        self.mine_with(|miner, stop| miner.mine_until(&mut OsRng, stop))
    }

    fn mine_with<F>(&self, session: F) -> Result<Mined, CoinError>
    where
        F: Fn(&Miner, &StopFlag) -> SessionResult + Send + Sync + 'static,
    {
        let session = Arc::new(session);
        let stop = Arc::new(StopFlag::new());
        let total = Arc::new(AtomicU64::new(0));
        let (tx, rx): (Sender<SessionResult>, Receiver<SessionResult>) =
            flume::bounded(self.workers);
        let mut joins = Vec::with_capacity(self.workers);

        for worker in 0..self.workers {
            let mut miner = self.miner.clone();
            let counter: Arc<dyn MiningObserver> =
                Arc::new(SharedAttempts::new(total.clone(), miner.observer.take()));
            miner.observer = Some(counter);
            let worker_stop = stop.clone();
            let worker_tx = tx.clone();
            let worker_session = session.clone();
            let join = thread::spawn(move || {
                let result = worker_session(&miner, &*worker_stop);
                let good = matches!(&result, Ok(mined) if mined.outcome.is_good());
                tracing::trace!(worker, ok = result.is_ok(), "mining worker done");
                // Sent before stopping the others so it is queued ahead of them.
                let _ = worker_tx.send(result);
                if good {
                    worker_stop.force_stop();
                }
            });
            joins.push(join);
        }
        drop(tx);

        // The first Good coin or error to arrive decides the result.
        let mut decided: Option<SessionResult> = None;
        let mut best: Option<Mined> = None;

        for result in rx.iter() {
            match result {
                Ok(mined) if !mined.outcome.is_good() => {
                    if best
                        .as_ref()
                        .map_or(true, |b| mined.zero_bits() > b.zero_bits())
                    {
                        best = Some(mined);
                    }
                }
                decisive => {
                    stop.force_stop();
                    if decided.is_none() {
                        decided = Some(decisive);
                    }
                }
            }
        }

        let mut panicked = 0usize;
        for join in joins {
            if join.join().is_err() {
                panicked += 1;
            }
        }
        if panicked > 0 {
            tracing::warn!(panicked, "mining workers panicked");
        }

        let attempts = total.load(Ordering::SeqCst);
        let chosen = match (decided, best) {
            (Some(result), _) => result?,
            (None, _) if panicked > 0 => return Err(CoinError::WorkerPanicked),
            (None, Some(mined)) => mined,
            (None, None) => return Err(CoinError::WorkerPanicked),
        };
        Ok(Mined { attempts, ..chosen })
    }
}
