//! Worker pool
//!
//! This module owns the concurrent side of the engine:
//! - A bounded task queue with blocking-on-full enqueue
//! - A fixed set of workers draining it
//! - The pool lifecycle: `Created -> Running -> ShuttingDown -> Stopped`
//!
//! Outcomes are never returned to the enqueuing caller. They are observable
//! only through the URL record's status in the store.

mod queue;
mod worker;

pub use queue::{task_queue, TaskReceiver, TaskSender};
pub use worker::{process_task, TaskOutcome};

use crate::analyzer::PageAnalyzer;
use crate::config::PoolSettings;
use crate::model::TaskId;
use crate::storage::RecordStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use worker::Worker;

/// Errors surfaced synchronously by pool lifecycle calls
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Worker pool already started")]
    AlreadyStarted,

    #[error("Worker pool is not running (state: {0:?})")]
    NotRunning(PoolState),

    #[error("Task queue is closed")]
    QueueClosed,

    #[error("Worker {index} exited abnormally: {message}")]
    WorkerFailed { index: usize, message: String },
}

/// Lifecycle state of a worker pool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    Created,
    Running,
    ShuttingDown,
    Stopped,
}

/// Fixed sizing of a worker pool
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Number of concurrent workers
    pub workers: usize,
    /// Capacity of the bounded task queue
    pub queue_capacity: usize,
    /// Deadline for one analysis attempt
    pub task_timeout: Duration,
}

impl PoolConfig {
    pub fn from_settings(settings: &PoolSettings) -> Self {
        Self {
            workers: settings.workers as usize,
            queue_capacity: settings.queue_capacity as usize,
            task_timeout: Duration::from_secs(settings.task_timeout_secs),
        }
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::from_settings(&PoolSettings::default())
    }
}

/// Counters of task outcomes since the pool started
#[derive(Debug, Default)]
pub struct PoolStats {
    done: AtomicU64,
    failed: AtomicU64,
    stopped: AtomicU64,
    dropped: AtomicU64,
}

impl PoolStats {
    fn record(&self, outcome: TaskOutcome) {
        let counter = match outcome {
            TaskOutcome::Done => &self.done,
            TaskOutcome::Failed => &self.failed,
            TaskOutcome::Stopped => &self.stopped,
            TaskOutcome::Dropped => &self.dropped,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PoolStatsSnapshot {
        PoolStatsSnapshot {
            done: self.done.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            stopped: self.stopped.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `PoolStats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStatsSnapshot {
    pub done: u64,
    pub failed: u64,
    pub stopped: u64,
    pub dropped: u64,
}

impl PoolStatsSnapshot {
    /// Tasks that reached any outcome
    pub fn processed(&self) -> u64 {
        self.done + self.failed + self.stopped + self.dropped
    }
}

struct Lifecycle {
    state: PoolState,
    sender: Option<TaskSender>,
    handles: Vec<JoinHandle<()>>,
}

/// Bounded pool of analysis workers
///
/// Constructed explicitly and shared by whatever issues `enqueue` calls.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use url_insight::{HttpPageAnalyzer, PoolConfig, RecordStore, SqliteStorage, WorkerPool};
/// use url_insight::config::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("config.toml"))?;
/// let store = Arc::new(SqliteStorage::new(Path::new(&config.output.database_path))?);
/// let analyzer = Arc::new(HttpPageAnalyzer::from_config(&config)?);
///
/// let pool = WorkerPool::new(store.clone(), analyzer, PoolConfig::from_settings(&config.pool));
/// pool.start()?;
/// let id = store.create_url("https://example.com/")?;
/// pool.enqueue(id).await?;
/// pool.shutdown().await?;
/// # Ok(())
/// # }
/// ```
pub struct WorkerPool {
    store: Arc<dyn RecordStore>,
    analyzer: Arc<dyn PageAnalyzer>,
    config: PoolConfig,
    stats: Arc<PoolStats>,
    lifecycle: Mutex<Lifecycle>,
    /// Flips to `true` once the pool reaches `Stopped`
    stopped: watch::Sender<bool>,
}

impl WorkerPool {
    pub fn new(
        store: Arc<dyn RecordStore>,
        analyzer: Arc<dyn PageAnalyzer>,
        config: PoolConfig,
    ) -> Self {
        Self {
            store,
            analyzer,
            config,
            stats: Arc::new(PoolStats::default()),
            lifecycle: Mutex::new(Lifecycle {
                state: PoolState::Created,
                sender: None,
                handles: Vec::new(),
            }),
            stopped: watch::channel(false).0,
        }
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        // The guarded data stays consistent even if a holder panicked
        self.lifecycle
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current lifecycle state
    pub fn state(&self) -> PoolState {
        self.lifecycle().state
    }

    /// Outcome counters so far
    pub fn stats(&self) -> PoolStatsSnapshot {
        self.stats.snapshot()
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Launches the workers
    ///
    /// Must be called from within a tokio runtime. Only the first call
    /// launches anything; later calls return `PoolError::AlreadyStarted`.
    pub fn start(&self) -> Result<(), PoolError> {
        let mut lifecycle = self.lifecycle();
        if lifecycle.state != PoolState::Created {
            return Err(PoolError::AlreadyStarted);
        }

        let workers = self.config.workers.max(1);
        let (sender, receiver) = task_queue(self.config.queue_capacity);

        lifecycle.handles = (0..workers)
            .map(|index| {
                let worker = Worker {
                    index,
                    receiver: receiver.clone(),
                    store: Arc::clone(&self.store),
                    analyzer: Arc::clone(&self.analyzer),
                    task_timeout: self.config.task_timeout,
                    stats: Arc::clone(&self.stats),
                };
                tokio::spawn(worker.run())
            })
            .collect();
        lifecycle.sender = Some(sender);
        lifecycle.state = PoolState::Running;

        tracing::info!(
            "Worker pool started: {} workers, queue capacity {}, task timeout {:?}",
            workers,
            self.config.queue_capacity,
            self.config.task_timeout
        );
        Ok(())
    }

    /// Schedules one task
    ///
    /// Waits while the queue is full. Valid only while the pool is running;
    /// the task's outcome is observable only through the record's status.
    pub async fn enqueue(&self, id: TaskId) -> Result<(), PoolError> {
        let sender = {
            let lifecycle = self.lifecycle();
            match (&lifecycle.sender, lifecycle.state) {
                (Some(sender), PoolState::Running) => sender.clone(),
                (_, state) => return Err(PoolError::NotRunning(state)),
            }
        };

        sender.enqueue(id).await?;
        tracing::debug!("Enqueued task {} ({} buffered)", id, sender.len());
        Ok(())
    }

    /// Stops accepting tasks, drains the queue and waits for every worker
    ///
    /// Tasks already accepted are processed to a terminal state; each is
    /// bounded by the per-task deadline. Calling this on a pool that is not
    /// running returns immediately; a call that races an ongoing shutdown
    /// waits until the drain has finished.
    pub async fn shutdown(&self) -> Result<(), PoolError> {
        let handles = {
            let mut lifecycle = self.lifecycle();
            match lifecycle.state {
                PoolState::Created => {
                    lifecycle.state = PoolState::Stopped;
                    self.stopped.send_replace(true);
                    return Ok(());
                }
                PoolState::Stopped => return Ok(()),
                PoolState::ShuttingDown => None,
                PoolState::Running => {
                    lifecycle.state = PoolState::ShuttingDown;
                    // Dropping the pool's sender closes the queue once in-flight enqueues finish
                    lifecycle.sender = None;
                    Some(std::mem::take(&mut lifecycle.handles))
                }
            }
        };

        let Some(handles) = handles else {
            tracing::debug!("Shutdown already in progress, waiting for it");
            let mut stopped = self.stopped.subscribe();
            // The sender lives in `self`, so the channel cannot close here
            let _ = stopped.wait_for(|done| *done).await;
            return Ok(());
        };

        tracing::info!("Shutting down worker pool, draining queued tasks");

        let mut first_error = None;
        for (index, handle) in handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                tracing::error!("Worker {} exited abnormally: {}", index, e);
                first_error.get_or_insert(PoolError::WorkerFailed {
                    index,
                    message: e.to_string(),
                });
            }
        }

        self.lifecycle().state = PoolState::Stopped;
        self.stopped.send_replace(true);

        let stats = self.stats();
        tracing::info!(
            "Worker pool stopped: {} done, {} failed, {} stopped, {} dropped",
            stats.done,
            stats.failed,
            stats.stopped,
            stats.dropped
        );

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
