//! Storage module for the dedup store
//!
//! This module handles all database operations for the harvester, including:
//! - SQLite database initialization and schema management
//! - The durable set of fetched item ids
//! - Harvest run tracking

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{FetchedStore, StorageError, StorageResult};

use std::path::Path;
use std::sync::{Arc, Mutex};

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Cloneable handle to the dedup store shared by every crawler
///
/// Calls are synchronous and the lock is released before returning, so the
/// handle can be used freely between `.await` points.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<Box<dyn FetchedStore + Send>>>,
}

impl SharedStore {
    pub fn new(store: impl FetchedStore + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Box::new(store))),
        }
    }

    /// Runs `f` with exclusive access to the underlying store
    pub fn with<T>(
        &self,
        f: impl FnOnce(&mut dyn FetchedStore) -> StorageResult<T>,
    ) -> StorageResult<T> {
        let mut guard = self.inner.lock().map_err(|_| StorageError::LockPoisoned)?;
        f(&mut **guard)
    }

    pub fn add_fetched(&self, id: &str) -> StorageResult<()> {
        self.with(|store| store.add_fetched(id))
    }

    pub fn check_is_fetched(&self, id: &str) -> StorageResult<bool> {
        self.with(|store| store.check_is_fetched(id))
    }

    pub fn count_fetched(&self) -> StorageResult<u64> {
        self.with(|store| store.count_fetched())
    }
}

/// Represents a driver pass in the database
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub items_harvested: u64,
}

/// Status of a harvest run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
