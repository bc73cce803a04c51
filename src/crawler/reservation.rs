//! On-disk reservation artifacts
//!
//! Every network-backed crawler stages the extracted text of an item in its
//! reservation directory. The existence of that file is treated as proof the
//! item was already harvested and is checked before the dedup store.

use crate::storage::SharedStore;
use std::io;
use std::path::{Path, PathBuf};

/// Reservation directory of one source
#[derive(Debug, Clone)]
pub struct Reservation {
    dir: PathBuf,
}

impl Reservation {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Full path of an artifact inside the reservation directory
    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    pub async fn exists(path: &Path) -> bool {
        tokio::fs::try_exists(path).await.unwrap_or(false)
    }

    /// Writes an artifact, creating the reservation directory on first use
    pub async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(path, contents).await
    }

    /// Moves an artifact byte-for-byte to a new name
    pub async fn migrate(&self, from: &Path, to: &Path) -> io::Result<()> {
        let contents = tokio::fs::read(from).await?;
        self.write(to, &contents).await?;
        tokio::fs::remove_file(from).await
    }

    /// True when the item was harvested before: artifact on disk or id in the store
    ///
    /// A failing store lookup counts as "not fetched"; the item is then
    /// fetched again rather than lost.
    pub async fn is_known(&self, crawler: &str, path: &Path, id: &str, store: &SharedStore) -> bool {
        if Self::exists(path).await {
            return true;
        }

        match store.check_is_fetched(id) {
            Ok(fetched) => fetched,
            Err(e) => {
                tracing::warn!("Crawler [{}]: dedup lookup failed for {}: {}", crawler, id, e);
                false
            }
        }
    }
}
