//! Record store contract and error types
//!
//! This module defines the narrow interface the worker pool and service layer
//! use to read URL records and persist analysis results.

use crate::model::{AnalysisResult, Link, StoredAnalysis, StoredLink, TaskId, UrlRecord, UrlStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("URL record not found: {0}")]
    NotFound(TaskId),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid stored data: {0}")]
    InvalidData(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl StorageError {
    /// Returns true if the error means the record does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for record store implementations
///
/// Every call is treated as atomic by its callers. Implementations must be
/// safe to share between workers; records with different identifiers may be
/// mutated concurrently.
pub trait RecordStore: Send + Sync {
    // ===== Engine Contract =====

    /// Loads a URL record by identifier
    ///
    /// Returns `StorageError::NotFound` if no such record exists.
    fn load(&self, id: TaskId) -> StorageResult<UrlRecord>;

    /// Writes the status of a URL record
    fn set_status(&self, id: TaskId, status: UrlStatus) -> StorageResult<()>;

    /// Persists one analysis result together with its links, all or nothing
    ///
    /// Links are stored in slice order; reading them back yields the same
    /// order. Returns the identifier of the stored analysis.
    fn save_analysis_batch(
        &self,
        id: TaskId,
        result: &AnalysisResult,
        links: &[Link],
    ) -> StorageResult<i64>;

    /// Moves a record to `to` only if its current status is one of `from`
    ///
    /// Returns `Ok(false)` when the record exists but its status did not
    /// match, in which case nothing is written.
    fn transition_status(
        &self,
        id: TaskId,
        from: &[UrlStatus],
        to: UrlStatus,
    ) -> StorageResult<bool>;

    /// Marks a `running` record `done` and persists its analysis batch in
    /// the same transaction
    ///
    /// Returns `Ok(None)` without writing anything when the record is no
    /// longer `running`.
    fn complete_analysis(
        &self,
        id: TaskId,
        result: &AnalysisResult,
        links: &[Link],
    ) -> StorageResult<Option<i64>>;

    // ===== Service Helpers =====

    /// Creates a record for `address` in `queued` status
    ///
    /// If the address is already stored, returns the existing identifier.
    fn create_url(&self, address: &str) -> StorageResult<TaskId>;

    /// Lists all URL records ordered by identifier
    fn list_urls(&self) -> StorageResult<Vec<UrlRecord>>;

    /// Gets every analysis snapshot of a record, oldest first
    fn analysis_results(&self, id: TaskId) -> StorageResult<Vec<StoredAnalysis>>;

    /// Gets every link row of a record in insertion order
    fn links(&self, id: TaskId) -> StorageResult<Vec<StoredLink>>;
}
