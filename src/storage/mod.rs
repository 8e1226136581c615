//! Storage module for URL records and analysis results
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - URL record loading and status updates
//! - All-or-nothing persistence of analysis batches
//!
//! The worker pool only depends on the `RecordStore` trait; `SqliteStorage`
//! is the bundled implementation.

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{RecordStore, StorageError, StorageResult};

use crate::InsightError;
use std::path::Path;

/// Opens (or creates) the SQLite record store at `path`
pub fn open_storage(path: &Path) -> Result<SqliteStorage, InsightError> {
    SqliteStorage::new(path)
}
