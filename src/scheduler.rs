//! Bounded concurrent job scheduler for throughput phases
//!
//! A fixed-size worker pool drains a bounded backlog of repeated transfer
//! jobs for a fixed wall-clock budget. The producer blocks when the backlog
//! is full and workers block when it is empty, so the pre-enqueued job count
//! is throttled to actual worker throughput. When the budget elapses the
//! scheduler stops accepting and dispatching new work; an HTTP exchange
//! already in flight is allowed to complete rather than being aborted at
//! the boundary (the per-request timeout still bounds any single exchange).

use crate::error::{Result, SpeedtestError};
use crate::logging;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::Instant;

/// Capacity of the pending-job backlog
pub const BACKLOG_CAPACITY: usize = 10;

/// Upper bound on jobs enqueued per phase; with backpressure far fewer
/// usually execute before the timer fires
pub const MAX_QUEUED_JOBS: usize = 1000;

/// A named, stateless, re-executable unit of transfer work
#[async_trait]
pub trait TransferJob: Send + Sync {
    /// Short name used in log lines ("downLink" / "upLink")
    fn name(&self) -> &str;

    /// Perform one full HTTP exchange
    async fn run(&self) -> Result<()>;
}

/// Lifecycle of a scheduler instance; transitions are one-way
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Created, not yet run
    Idle,
    /// Workers executing, producer enqueuing
    Running,
    /// Timer fired; no new dispatches, in-flight work completing
    Draining,
    /// All workers exited
    Terminated,
}

impl SchedulerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SchedulerState::Idle,
            1 => SchedulerState::Running,
            2 => SchedulerState::Draining,
            _ => SchedulerState::Terminated,
        }
    }
}

/// Fixed-size worker pool with a bounded, blocking backlog
pub struct JobScheduler {
    concurrency: usize,
    backlog_capacity: usize,
    max_queued_jobs: usize,
    state: AtomicU8,
}

impl JobScheduler {
    /// Create a scheduler with `concurrency` workers (0 selects the number
    /// of available processing units)
    pub fn new(concurrency: usize) -> Self {
        let concurrency = if concurrency == 0 {
            num_cpus::get()
        } else {
            concurrency
        };
        Self {
            concurrency,
            backlog_capacity: BACKLOG_CAPACITY,
            max_queued_jobs: MAX_QUEUED_JOBS,
            state: AtomicU8::new(SchedulerState::Idle as u8),
        }
    }

    /// Number of workers in the pool
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Current lifecycle state
    pub fn state(&self) -> SchedulerState {
        SchedulerState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: SchedulerState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Run repeated instances of `job` until `duration_budget` elapses;
    /// returns the number of jobs dispatched
    ///
    /// Individual job failures are logged and swallowed so one failed
    /// transfer cannot abort the measurement window. A scheduler is
    /// single-use; a second call returns a test-execution error.
    pub async fn run(&self, job: Arc<dyn TransferJob>, duration_budget: Duration) -> Result<u64> {
        if self
            .state
            .compare_exchange(
                SchedulerState::Idle as u8,
                SchedulerState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            return Err(SpeedtestError::test_execution(
                "scheduler is single-use per test phase",
            ));
        }

        let deadline = Instant::now() + duration_budget;
        let (tx, rx) = mpsc::channel::<Arc<dyn TransferJob>>(self.backlog_capacity);
        let rx = Arc::new(Mutex::new(rx));
        let dispatched = Arc::new(AtomicU64::new(0));

        let mut workers = Vec::with_capacity(self.concurrency);
        for worker_id in 0..self.concurrency {
            let rx = Arc::clone(&rx);
            let dispatched = Arc::clone(&dispatched);
            workers.push(tokio::spawn(async move {
                loop {
                    // Stop dispatching once the deadline has passed; a job
                    // already running is left to finish on its own.
                    if Instant::now() >= deadline {
                        break;
                    }
                    let next = { rx.lock().await.recv().await };
                    match next {
                        Some(job) => {
                            // The deadline may have fired while this worker was
                            // parked in recv; drop the buffered job instead of
                            // starting fresh work past the budget.
                            if Instant::now() >= deadline {
                                break;
                            }
                            dispatched.fetch_add(1, Ordering::Relaxed);
                            if let Err(err) = job.run().await {
                                logging::debug(
                                    "scheduler",
                                    &format!(
                                        "worker {}: {} job failed ({}): {}",
                                        worker_id,
                                        job.name(),
                                        err.category(),
                                        err
                                    ),
                                );
                            }
                        }
                        None => break,
                    }
                }
            }));
        }

        // Pre-enqueue repeated job instances; the bounded channel blocks the
        // send when workers cannot keep up, and the timer cuts the loop off.
        let mut enqueued = 0usize;
        while enqueued < self.max_queued_jobs {
            if Instant::now() >= deadline {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => break,
                sent = tx.send(Arc::clone(&job)) => {
                    if sent.is_err() {
                        break;
                    }
                    enqueued += 1;
                }
            }
        }

        self.set_state(SchedulerState::Draining);
        drop(tx);
        for worker in workers {
            let _ = worker.await;
        }
        self.set_state(SchedulerState::Terminated);

        Ok(dispatched.load(Ordering::Relaxed))
    }
}
