//! Storage traits and error types
//!
//! This module defines the trait interface for the dedup store and
//! associated error types.

use crate::storage::{RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for dedup store backends
///
/// Ids are opaque strings. Inserting an id twice is not an error.
pub trait FetchedStore {
    // ===== Dedup =====

    /// Durably records an id as fetched
    fn add_fetched(&mut self, id: &str) -> StorageResult<()>;

    /// Checks whether an id was recorded as fetched
    fn check_is_fetched(&self, id: &str) -> StorageResult<bool>;

    /// Counts all fetched ids
    fn count_fetched(&self) -> StorageResult<u64>;

    // ===== Run Management =====

    /// Creates a new harvest run in the `Running` state
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Marks a run as finished with its final status and harvested item count
    fn finish_run(&mut self, run_id: i64, status: RunStatus, items_harvested: u64)
        -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;
}
