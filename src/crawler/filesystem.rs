//! Local filesystem source
//!
//! Lists the configured root directories once and hands out their entries one
//! file per call. There is no network involved, so the crawler is mostly an
//! id-assignment wrapper around file reads.

use crate::config::FilesystemConfig;
use crate::crawler::{item_id, Crawler, FetchResult};
use crate::storage::SharedStore;
use crate::HarvestError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

const NAME: &str = "filesystem";

pub struct FilesystemCrawler {
    dirs: Vec<PathBuf>,
    break_time: Duration,
    store: SharedStore,
    queue: Vec<PathBuf>,
    ready: bool,
}

impl FilesystemCrawler {
    pub fn new(config: &FilesystemConfig, store: SharedStore) -> Self {
        Self {
            dirs: config.dirs.iter().map(PathBuf::from).collect(),
            break_time: Duration::from_millis(config.break_time),
            store,
            queue: Vec::new(),
            ready: false,
        }
    }

    /// Lists one root, non-recursively, sorted by file name
    async fn list_dir(dir: &PathBuf) -> crate::Result<Vec<PathBuf>> {
        let missing_root = |source| HarvestError::MissingRoot {
            path: dir.clone(),
            source,
        };

        let mut entries = tokio::fs::read_dir(dir).await.map_err(missing_root)?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(missing_root)? {
            names.push(entry.file_name());
        }
        names.sort();

        Ok(names.into_iter().map(|name| dir.join(name)).collect())
    }
}

#[async_trait]
impl Crawler for FilesystemCrawler {
    fn name(&self) -> &str {
        NAME
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn break_time(&self) -> Duration {
        self.break_time
    }

    fn queue_len(&self) -> usize {
        self.queue.len()
    }

    async fn init(&mut self) -> crate::Result<()> {
        tracing::info!("Crawler [{}]: Reading corpus dirs contents", NAME);

        for dir in &self.dirs {
            let paths = Self::list_dir(dir).await?;
            tracing::debug!("Crawler [{}]: {} entries in {}", NAME, paths.len(), dir.display());
            self.queue.extend(paths);
        }

        tracing::info!("Crawler [{}]: {} files queued", NAME, self.queue.len());
        self.ready = true;
        Ok(())
    }

    async fn get_next(&mut self) -> FetchResult {
        let Some(path) = self.queue.pop() else {
            return FetchResult::exhausted();
        };
        let remaining = self.queue.len();
        let id = item_id(&path.to_string_lossy());

        tracing::info!(
            "Crawler [{}]: Reading {} ({} left)",
            NAME,
            path.display(),
            remaining
        );

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Crawler [{}]: Failed to read {}: {}", NAME, path.display(), e);
                return FetchResult::empty(Some(id), remaining);
            }
        };

        if let Err(e) = self.store.add_fetched(&id) {
            tracing::warn!("Crawler [{}]: Failed to record {} as fetched: {}", NAME, id, e);
        }

        let text = String::from_utf8_lossy(&bytes).into_owned();
        FetchResult::content(text, id, remaining)
    }
}
