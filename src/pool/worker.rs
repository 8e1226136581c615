//! Per-task processing
//!
//! Each worker loops "dequeue, process, repeat" until the queue closes. One
//! task moves its URL record through `running` to `done` or `error`; the
//! record is re-read from the store so the queue never carries stale data.

use crate::analyzer::PageAnalyzer;
use crate::model::{TaskId, UrlStatus};
use crate::pool::queue::TaskReceiver;
use crate::pool::PoolStats;
use crate::storage::RecordStore;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// How one task attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Results saved and status `done` written
    Done,
    /// Status `error` written (or attempted)
    Failed,
    /// The record was stopped by a caller; nothing was saved or overwritten
    Stopped,
    /// The record could not be loaded or marked running; no status written
    Dropped,
}

/// One concurrent execution unit of the pool
pub(crate) struct Worker {
    pub index: usize,
    pub receiver: TaskReceiver,
    pub store: Arc<dyn RecordStore>,
    pub analyzer: Arc<dyn PageAnalyzer>,
    pub task_timeout: Duration,
    pub stats: Arc<PoolStats>,
}

impl Worker {
    /// Drains the queue until it is closed and empty
    pub async fn run(self) {
        let span = tracing::info_span!("worker", worker = self.index);
        async {
            tracing::debug!("Worker started");

            while let Some(id) = self.receiver.dequeue().await {
                let task = process_task(
                    self.store.as_ref(),
                    self.analyzer.as_ref(),
                    id,
                    self.task_timeout,
                )
                .instrument(tracing::info_span!("task", task_id = id));

                let outcome = match AssertUnwindSafe(task).catch_unwind().await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        tracing::error!("Task {} panicked; marking it as error", id);
                        fail(self.store.as_ref(), id)
                    }
                };

                self.stats.record(outcome);
            }

            tracing::debug!("Task queue closed, worker exiting");
        }
        .instrument(span)
        .await
    }
}

/// Statuses a dequeued record may be claimed from; anything but `stopped`
const CLAIMABLE: &[UrlStatus] = &[
    UrlStatus::Queued,
    UrlStatus::Running,
    UrlStatus::Done,
    UrlStatus::Error,
];

/// Runs one task attempt to its terminal outcome
///
/// | Step | Failure |
/// |------|---------|
/// | Load record | Dropped, nothing written |
/// | Claim as `running` | Dropped, attempt aborted |
/// | Analyze (bounded by `task_timeout`) | `error`, nothing saved |
/// | Mark `done` + save result and links | `error` |
///
/// Every status write is conditional on the record's current status, so a
/// caller's `stopped` is never overwritten and its results are discarded.
pub async fn process_task(
    store: &dyn RecordStore,
    analyzer: &dyn PageAnalyzer,
    id: TaskId,
    task_timeout: Duration,
) -> TaskOutcome {
    let record = match store.load(id) {
        Ok(record) => record,
        Err(e) if e.is_not_found() => {
            tracing::warn!("URL record {} not found; dropping task", id);
            return TaskOutcome::Dropped;
        }
        Err(e) => {
            tracing::error!("Failed to load URL record {}: {}", id, e);
            return TaskOutcome::Dropped;
        }
    };

    match store.transition_status(id, CLAIMABLE, UrlStatus::Running) {
        Ok(true) => {}
        Ok(false) => {
            tracing::info!("URL {} was stopped before it started; skipping", id);
            return TaskOutcome::Stopped;
        }
        Err(e) => {
            tracing::error!("Failed to mark URL {} as running: {}", id, e);
            return TaskOutcome::Dropped;
        }
    }

    tracing::info!("Analyzing {}", record.original_url);

    let Some(address) = record.url() else {
        tracing::warn!("Malformed address for URL {}: {}", id, record.original_url);
        return fail(store, id);
    };

    let (result, links) = match tokio::time::timeout(task_timeout, analyzer.analyze(&address)).await
    {
        Ok(Ok(analysis)) => analysis,
        Ok(Err(e)) => {
            tracing::warn!("Analysis of {} failed: {}", address, e);
            return fail(store, id);
        }
        Err(_) => {
            tracing::warn!(
                "Analysis of {} exceeded {:?}; cancelled",
                address,
                task_timeout
            );
            return fail(store, id);
        }
    };

    match store.complete_analysis(id, &result, &links) {
        Ok(Some(_)) => {}
        Ok(None) => {
            tracing::info!("URL {} was stopped during analysis; discarding results", id);
            return TaskOutcome::Stopped;
        }
        Err(e) => {
            tracing::error!("Failed to save analysis for URL {}: {}", id, e);
            return fail(store, id);
        }
    }

    tracing::info!(
        "URL {} done: {:?} ({} links)",
        id,
        result.title,
        links.len()
    );
    TaskOutcome::Done
}

/// Moves a running task to `error`, unless a caller stopped it meanwhile
fn fail(store: &dyn RecordStore, id: TaskId) -> TaskOutcome {
    match store.transition_status(id, &[UrlStatus::Running], UrlStatus::Error) {
        Ok(true) => TaskOutcome::Failed,
        Ok(false) => {
            tracing::info!("URL {} is no longer running; leaving its status", id);
            TaskOutcome::Stopped
        }
        Err(e) => {
            tracing::error!(
                "Could not write status error for URL {}; its final state is unknown: {}",
                id,
                e
            );
            TaskOutcome::Failed
        }
    }
}
