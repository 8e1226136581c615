//! Bounded task queue
//!
//! A `tokio::sync::mpsc` channel carries task identifiers from any number of
//! producers to the worker set. The receiving half is shared by all workers
//! behind an async mutex, so each accepted task is handed to exactly one worker.

use crate::model::TaskId;
use crate::pool::PoolError;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Creates a bounded task queue with room for `capacity` pending tasks
pub fn task_queue(capacity: usize) -> (TaskSender, TaskReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        TaskSender { tx },
        TaskReceiver {
            rx: Arc::new(Mutex::new(rx)),
        },
    )
}

/// Producer half of the task queue
#[derive(Debug, Clone)]
pub struct TaskSender {
    tx: mpsc::Sender<TaskId>,
}

impl TaskSender {
    /// Places a task on the queue, waiting for room if the queue is full
    ///
    /// Fails only if every receiver is gone.
    pub async fn enqueue(&self, id: TaskId) -> Result<(), PoolError> {
        self.tx.send(id).await.map_err(|_| PoolError::QueueClosed)
    }

    /// Number of tasks currently buffered
    pub fn len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Consumer half of the task queue, cloned into every worker
#[derive(Debug, Clone)]
pub struct TaskReceiver {
    rx: Arc<Mutex<mpsc::Receiver<TaskId>>>,
}

impl TaskReceiver {
    /// Waits for the next task
    ///
    /// Returns None once every sender is dropped and the buffer is drained.
    pub async fn dequeue(&self) -> Option<TaskId> {
        self.rx.lock().await.recv().await
    }
}
