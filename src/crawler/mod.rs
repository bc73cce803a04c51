//! Crawler module: the uniform crawler contract and its sources
//!
//! This module contains the core harvesting logic, including:
//! - The [`Crawler`] trait every source implements
//! - HTTP fetching with error classification
//! - HTML link and body-text extraction
//! - Request pacing and ban backoff
//! - The filesystem, archive and forum sources
//! - The driver that runs them

mod archive;
mod driver;
mod fetcher;
mod filesystem;
mod forum;
mod pacing;
mod parser;
mod reservation;

pub use archive::{ArchiveCrawler, DiscoveryCache};
pub use driver::{Driver, PassSummary};
pub use fetcher::{build_http_client, FetchError, Fetcher};
pub use filesystem::FilesystemCrawler;
pub use forum::{clean_thread_text, ForumCrawler};
pub use pacing::{BanBackoff, Pacing};
pub use parser::{body_text, decode_bytes, links_in, parse_document};
pub use reservation::Reservation;

use crate::config::Config;
use crate::storage::SharedStore;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Outcome of a single [`Crawler::get_next`] call
///
/// `text` is empty whenever no new content was retrieved. `next_available`
/// reflects the queue length after the pop that produced this result.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchResult {
    pub text: String,
    pub id: Option<String>,
    pub next_available: bool,
    /// Set only when the item was already known and no network call was made
    pub should_skip_delay: bool,
}

impl FetchResult {
    /// The queue was already empty
    pub fn exhausted() -> Self {
        Self::default()
    }

    /// Nothing new for this item: an error or housekeeping
    pub fn empty(id: Option<String>, remaining: usize) -> Self {
        Self {
            text: String::new(),
            id,
            next_available: remaining > 0,
            should_skip_delay: false,
        }
    }

    /// The item was harvested before; no request was sent
    pub fn skipped(id: String, remaining: usize) -> Self {
        Self {
            text: String::new(),
            id: Some(id),
            next_available: remaining > 0,
            should_skip_delay: true,
        }
    }

    /// Freshly harvested content
    pub fn content(text: String, id: String, remaining: usize) -> Self {
        Self {
            text,
            id: Some(id),
            next_available: remaining > 0,
            should_skip_delay: false,
        }
    }
}

/// Uniform contract between a source and the fetch loop
///
/// Implementations own their work queue exclusively and consume it in LIFO
/// order. Neither lifecycle method panics on remote failures:
/// - `init` degrades to an empty or partial queue, and only returns an error
///   for misconfiguration
/// - `get_next` folds every failure into an empty-text [`FetchResult`]
#[async_trait]
pub trait Crawler: Send {
    /// Short identifier used in logs and corpus file names
    fn name(&self) -> &str;

    /// True once `init` has completed, even if the queue ended up empty
    fn is_ready(&self) -> bool;

    /// Whether the driver should run this crawler again after its recall interval
    fn is_re_callable(&self) -> bool {
        false
    }

    /// Minimum delay the driver honors between two `get_next` calls
    fn break_time(&self) -> Duration;

    /// Number of items still waiting in the queue
    fn queue_len(&self) -> usize;

    /// Builds the work queue
    async fn init(&mut self) -> crate::Result<()>;

    /// Pops and processes exactly one item
    async fn get_next(&mut self) -> FetchResult;
}

/// Computes the content-addressed id of a canonical item key
///
/// Lowercase hex SHA-256; stable across processes and platforms.
pub fn item_id(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Removes duplicates, keeping the first occurrence of every value
pub(crate) fn dedup_preserving_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Builds every crawler enabled in `config`, in a fixed order
///
/// # Arguments
///
/// * `config` - The harvester configuration
/// * `store` - Dedup store shared by all crawlers
///
/// # Returns
///
/// * `Ok(Vec<Box<dyn Crawler>>)` - The enabled crawlers (possibly none)
/// * `Err(HarvestError)` - The HTTP client could not be built
pub fn build_crawlers(config: &Config, store: &SharedStore) -> crate::Result<Vec<Box<dyn Crawler>>> {
    let mut crawlers: Vec<Box<dyn Crawler>> = Vec::new();

    if config.crawlers.archive || config.crawlers.forum {
        let fetcher = Fetcher::new(&config.http)?;

        if config.crawlers.archive {
            crawlers.push(Box::new(ArchiveCrawler::new(
                config.archive.clone(),
                fetcher.clone(),
                store.clone(),
            )));
        }

        if config.crawlers.forum {
            crawlers.push(Box::new(ForumCrawler::new(
                config.forum.clone(),
                fetcher,
                store.clone(),
            )));
        }
    }

    if config.crawlers.filesystem {
        crawlers.push(Box::new(FilesystemCrawler::new(
            &config.filesystem,
            store.clone(),
        )));
    }

    Ok(crawlers)
}
