//! URL intake service
//!
//! The caller-facing surface: register an address, schedule its analysis,
//! stop it, and read back its record and results. Status is the only
//! channel through which the outcome of a scheduled task is observed.

use crate::model::{StoredAnalysis, StoredLink, TaskId, UrlRecord, UrlStatus};
use crate::pool::{PoolError, PoolState, WorkerPool};
use crate::storage::RecordStore;
use crate::url::validate_address;
use crate::Result;
use std::sync::Arc;

/// Everything stored for one URL
#[derive(Debug, Clone)]
pub struct UrlResults {
    pub record: UrlRecord,
    /// Analysis history, oldest first
    pub analyses: Vec<StoredAnalysis>,
    /// Links of every analysis, in discovery order within each
    pub links: Vec<StoredLink>,
}

impl UrlResults {
    /// Reads a record with its analysis history and links
    pub fn load(store: &dyn RecordStore, id: TaskId) -> Result<Self> {
        let record = store.load(id)?;
        let analyses = store.analysis_results(id)?;
        let links = store.links(id)?;
        Ok(Self {
            record,
            analyses,
            links,
        })
    }

    /// The most recent analysis, if any
    pub fn latest(&self) -> Option<&StoredAnalysis> {
        self.analyses.last()
    }

    /// Links belonging to the most recent analysis
    pub fn latest_links(&self) -> Vec<&StoredLink> {
        match self.latest() {
            Some(latest) => self
                .links
                .iter()
                .filter(|link| link.analysis_id == latest.id)
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Intake front door over a store and a running worker pool
pub struct UrlService {
    store: Arc<dyn RecordStore>,
    pool: Arc<WorkerPool>,
}

impl UrlService {
    pub fn new(store: Arc<dyn RecordStore>, pool: Arc<WorkerPool>) -> Self {
        Self { store, pool }
    }

    /// Registers an address and returns its id
    ///
    /// Only absolute http(s) addresses with a host are accepted. Registering
    /// the same address twice returns the existing id.
    pub fn create(&self, address: &str) -> Result<TaskId> {
        let url = validate_address(address)?;
        let id = self.store.create_url(url.as_str())?;
        tracing::info!("Registered URL {} as {}", url, id);
        Ok(id)
    }

    /// Marks the record `queued` and schedules an analysis
    ///
    /// Works from any state, so finished or stopped URLs can be re-analyzed.
    /// Waits while the pool's queue is full. If the pool is not running the
    /// record keeps its previous status.
    pub async fn start(&self, id: TaskId) -> Result<()> {
        let state = self.pool.state();
        if state != PoolState::Running {
            return Err(PoolError::NotRunning(state).into());
        }

        let previous = self.store.load(id)?.status;
        self.store.set_status(id, UrlStatus::Queued)?;

        if let Err(e) = self.pool.enqueue(id).await {
            // Shutdown won the race; undo the queued mark unless a stop landed first
            if let Err(restore) =
                self.store
                    .transition_status(id, &[UrlStatus::Queued], previous)
            {
                tracing::error!(
                    "Could not restore status {} for URL {}: {}",
                    previous,
                    id,
                    restore
                );
            }
            return Err(e.into());
        }
        Ok(())
    }

    /// Marks the record `stopped`
    ///
    /// A queued task is skipped when dequeued; a running one has its
    /// results discarded. Stopping a finished record is a no-op that
    /// returns its current status.
    pub fn stop(&self, id: TaskId) -> Result<UrlStatus> {
        let stoppable: Vec<UrlStatus> = UrlStatus::all_statuses()
            .into_iter()
            .filter(|status| status.can_transition_to(UrlStatus::Stopped))
            .collect();
        if self
            .store
            .transition_status(id, &stoppable, UrlStatus::Stopped)?
        {
            tracing::info!("Stopped URL {}", id);
            return Ok(UrlStatus::Stopped);
        }

        let status = self.store.load(id)?.status;
        tracing::debug!("URL {} is already {}; not stopping", id, status);
        Ok(status)
    }

    pub fn get(&self, id: TaskId) -> Result<UrlRecord> {
        Ok(self.store.load(id)?)
    }

    pub fn list(&self) -> Result<Vec<UrlRecord>> {
        Ok(self.store.list_urls()?)
    }

    pub fn results(&self, id: TaskId) -> Result<UrlResults> {
        UrlResults::load(self.store.as_ref(), id)
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }
}
