//! Static literature archive source
//!
//! The archive exposes no index of its books. Discovery walks it in two
//! phases:
//!
//! 1. Every category page is fetched and its links classified: document links
//!    go straight to the book queue, navigation and mirror links are dropped,
//!    everything else is an author page.
//! 2. Only if phase 1 found no documents at all, every author page is fetched
//!    and its document links queued.
//!
//! The result is persisted as a [`DiscoveryCache`] so that later startups
//! skip the walk entirely. A discovery that found nothing is not persisted,
//! and an empty cache file counts as a miss. Books are then fetched one per `get_next` call and
//! staged in the reservation directory.

use crate::config::ArchiveConfig;
use crate::crawler::pacing::Pacing;
use crate::crawler::parser::{body_text, links_in, parse_document};
use crate::crawler::reservation::Reservation;
use crate::crawler::{dedup_preserving_order, item_id, Crawler, FetchError, FetchResult, Fetcher};
use crate::storage::SharedStore;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const NAME: &str = "archive";

/// Marks a document link
const DOCUMENT_MARKER: &str = ".txt";

/// Marks a table-of-contents variant of a document
const TOC_MARKER: &str = ".txt_Content";

/// Alternate-encoding mirrors of the whole archive
const MIRROR_PREFIXES: [&str; 3] = ["koi/", "win/", "lat/"];

/// Snapshot of a completed discovery pass
///
/// Read back whole or not at all: any read or parse failure means a fresh
/// discovery. The legacy key spellings are accepted when reading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryCache {
    #[serde(rename = "authorUrls", alias = "authorsUrls")]
    pub author_urls: Vec<String>,

    #[serde(rename = "bookUrls", alias = "booksUrls")]
    pub book_urls: Vec<String>,
}

impl DiscoveryCache {
    /// True when the snapshot holds no url at all
    pub fn is_empty(&self) -> bool {
        self.author_urls.is_empty() && self.book_urls.is_empty()
    }

    pub async fn load(path: &Path) -> crate::Result<Self> {
        let raw = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    pub async fn save(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}

/// Where a link found on a category page leads
#[derive(Debug, Clone, PartialEq, Eq)]
enum CategoryLink {
    Book(String),
    Author(String),
}

/// Classifies one `href` of a category page
///
/// Returns `None` for links that lead nowhere useful: parent directories,
/// encoding mirrors, tables of contents, external sites and the denylisted
/// navigation sections.
fn classify_category_link(href: &str, category_url: &str, denylist: &[String]) -> Option<CategoryLink> {
    let link = href.replacen('/', "", 1);

    let excluded = link.is_empty()
        || link.starts_with("..")
        || link.starts_with('#')
        || link.contains(':')
        || MIRROR_PREFIXES.iter().any(|prefix| link.starts_with(prefix))
        || link.contains(TOC_MARKER)
        || denylist.iter().any(|entry| *entry == link);
    if excluded {
        return None;
    }

    let absolute = format!("{}{}", category_url, link);
    if link.contains(DOCUMENT_MARKER) {
        Some(CategoryLink::Book(absolute))
    } else {
        Some(CategoryLink::Author(absolute))
    }
}

/// Keeps the document links of an author page, made absolute
fn author_book_link(href: &str, author_url: &str) -> Option<String> {
    (href.contains(DOCUMENT_MARKER) && !href.contains(TOC_MARKER))
        .then(|| format!("{}/{}", author_url, href))
}

/// Running mean of fetch durations, for throughput logging only
#[derive(Debug, Default)]
struct FetchCounter {
    fetched: u32,
    total: Duration,
}

impl FetchCounter {
    /// Records one fetch and returns the mean time per book, pacing included
    fn record(&mut self, elapsed: Duration, break_time: Duration) -> Duration {
        self.fetched += 1;
        self.total += elapsed + break_time;
        self.total / self.fetched
    }
}

pub struct ArchiveCrawler {
    config: ArchiveConfig,
    fetcher: Fetcher,
    store: SharedStore,
    pacing: Pacing,
    reservation: Reservation,
    author_urls: Vec<String>,
    book_urls: Vec<String>,
    counter: FetchCounter,
    ready: bool,
}

impl ArchiveCrawler {
    pub fn new(config: ArchiveConfig, fetcher: Fetcher, store: SharedStore) -> Self {
        Self {
            pacing: Pacing::from_millis(config.break_time, config.ban_cooldown),
            reservation: Reservation::new(&config.reserv_path),
            config,
            fetcher,
            store,
            author_urls: Vec::new(),
            book_urls: Vec::new(),
            counter: FetchCounter::default(),
            ready: false,
        }
    }

    /// Author pages found by the last discovery (or loaded from cache)
    pub fn author_urls(&self) -> &[String] {
        &self.author_urls
    }

    /// Pending book urls; the last element is fetched next
    pub fn book_urls(&self) -> &[String] {
        &self.book_urls
    }

    fn short(&self, url: &str) -> String {
        url.strip_prefix(self.config.base_url.as_str())
            .unwrap_or(url)
            .to_string()
    }

    /// Current artifact location, readable by a human browsing the directory
    fn artifact_path(&self, url: &str, id: &str) -> PathBuf {
        let flattened = self.short(url).replace('/', "_");
        self.reservation.path(&format!(
            "{}_{}_{}.txt",
            self.config.artifact_prefix, flattened, id
        ))
    }

    /// Location used by earlier releases, named by id only
    fn legacy_artifact_path(&self, id: &str) -> PathBuf {
        self.reservation
            .path(&format!("{}_{}.txt", self.config.artifact_prefix, id))
    }

    async fn fetch_links(&self, url: &str) -> Result<Vec<String>, FetchError> {
        let raw = self.fetcher.get_bytes(url).await?;
        Ok(links_in(&parse_document(&raw)))
    }

    /// Phase 1: scans every category page
    async fn discover_categories(&mut self) {
        let categories = self.config.categories.clone();

        for category in &categories {
            let category_url = format!("{}{}", self.config.base_url, category);
            tracing::info!(
                "Crawler [{}]: Getting authors list for {} [delay {:?}]",
                NAME,
                category,
                self.pacing.break_time
            );

            match self.fetch_links(&category_url).await {
                Ok(links) => {
                    let (mut books, mut authors) = (0, 0);
                    for href in &links {
                        match classify_category_link(href, &category_url, &self.config.denylist) {
                            Some(CategoryLink::Book(url)) => {
                                books += 1;
                                self.book_urls.push(url);
                            }
                            Some(CategoryLink::Author(url)) => {
                                authors += 1;
                                self.author_urls.push(url);
                            }
                            None => {}
                        }
                    }
                    tracing::info!(
                        "Crawler [{}]: found {} authors and {} books in {}",
                        NAME,
                        authors,
                        books,
                        category
                    );
                }
                Err(e) => {
                    tracing::warn!("Crawler [{}]: Getting authors links failed: {}", NAME, e);
                    self.pacing.backoff(NAME, &e).await;
                }
            }

            self.pacing.pause().await;
        }

        self.author_urls = dedup_preserving_order(std::mem::take(&mut self.author_urls));
    }

    /// Phase 2: scans every author page for documents
    async fn discover_books(&mut self) {
        let authors = self.author_urls.clone();

        for (index, author_url) in authors.iter().enumerate() {
            tracing::info!(
                "Crawler [{}]: Processing author {} of {} ({})",
                NAME,
                index + 1,
                authors.len(),
                self.short(author_url)
            );

            match self.fetch_links(author_url).await {
                Ok(links) => {
                    let before = self.book_urls.len();
                    self.book_urls.extend(
                        links
                            .iter()
                            .filter_map(|href| author_book_link(href, author_url)),
                    );
                    tracing::debug!(
                        "Crawler [{}]: found {} books for {}",
                        NAME,
                        self.book_urls.len() - before,
                        self.short(author_url)
                    );
                }
                Err(e) => {
                    tracing::warn!("Crawler [{}]: Getting books links failed: {}", NAME, e);
                    self.pacing.backoff(NAME, &e).await;
                }
            }

            self.pacing.pause().await;
        }

        self.book_urls = dedup_preserving_order(std::mem::take(&mut self.book_urls));
    }

    async fn fetch_book(&self, url: &str) -> Result<String, FetchError> {
        let raw = self.fetcher.get_bytes(url).await?;
        Ok(body_text(&parse_document(&raw)))
    }
}

#[async_trait]
impl Crawler for ArchiveCrawler {
    fn name(&self) -> &str {
        NAME
    }

    fn is_ready(&self) -> bool {
        self.ready
    }

    fn break_time(&self) -> Duration {
        self.pacing.break_time
    }

    fn queue_len(&self) -> usize {
        self.book_urls.len()
    }

    async fn init(&mut self) -> crate::Result<()> {
        tracing::info!("Crawler [{}]: Start building the book list", NAME);
        let cache_path = PathBuf::from(&self.config.cache_path);

        let cache_hit = match DiscoveryCache::load(&cache_path).await {
            Ok(cache) if !cache.is_empty() => {
                self.author_urls = cache.author_urls;
                self.book_urls = cache.book_urls;
                true
            }
            Ok(_) => {
                tracing::info!(
                    "Crawler [{}]: Cache file is empty, starting online discovery",
                    NAME
                );
                false
            }
            Err(e) => {
                tracing::info!(
                    "Crawler [{}]: Cache file read failed ({}), starting online discovery",
                    NAME,
                    e
                );
                false
            }
        };

        if !cache_hit {
            self.discover_categories().await;
        }

        let scan_authors = self.book_urls.is_empty();
        if scan_authors {
            self.discover_books().await;
        }

        let cache = DiscoveryCache {
            author_urls: self.author_urls.clone(),
            book_urls: self.book_urls.clone(),
        };
        if cache.is_empty() {
            // nothing reachable this time; the next startup retries discovery
            tracing::warn!("Crawler [{}]: Discovery found nothing, cache not written", NAME);
        } else if !cache_hit || scan_authors {
            if let Err(e) = cache.save(&cache_path).await {
                tracing::warn!("Crawler [{}]: Failed to persist discovery cache: {}", NAME, e);
            }
        }

        tracing::info!("Crawler [{}]: Authors links found: {}", NAME, self.author_urls.len());
        tracing::info!("Crawler [{}]: Books links found: {}", NAME, self.book_urls.len());

        self.ready = true;
        Ok(())
    }

    async fn get_next(&mut self) -> FetchResult {
        let Some(url) = self.book_urls.pop() else {
            return FetchResult::exhausted();
        };
        let remaining = self.book_urls.len();
        let id = item_id(&url);
        let path = self.artifact_path(&url, &id);

        if self.reservation.is_known(NAME, &path, &id, &self.store).await {
            tracing::debug!("Crawler [{}]: {} already fetched", NAME, self.short(&url));
            return FetchResult::skipped(id, remaining);
        }

        let legacy_path = self.legacy_artifact_path(&id);
        if Reservation::exists(&legacy_path).await {
            tracing::info!(
                "Crawler [{}]: Found book in old-style path, moving to new-style (books in queue: {})",
                NAME,
                remaining
            );
            if let Err(e) = self.reservation.migrate(&legacy_path, &path).await {
                tracing::warn!(
                    "Crawler [{}]: Failed to migrate {}: {}",
                    NAME,
                    legacy_path.display(),
                    e
                );
            }
            return FetchResult::empty(Some(id), remaining);
        }

        tracing::info!(
            "Crawler [{}]: Getting book {} (books in queue: {})",
            NAME,
            self.short(&url),
            remaining
        );
        let started = Instant::now();

        let text = match self.fetch_book(&url).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    "Crawler [{}]: Error fetching book {}: {}",
                    NAME,
                    self.short(&url),
                    e
                );
                self.pacing.backoff(NAME, &e).await;
                return FetchResult::empty(Some(id), remaining);
            }
        };

        if let Err(e) = self.reservation.write(&path, text.as_bytes()).await {
            tracing::warn!("Crawler [{}]: Failed to write {}: {}", NAME, path.display(), e);
            return FetchResult::empty(Some(id), remaining);
        }
        if let Err(e) = self.store.add_fetched(&id) {
            tracing::warn!("Crawler [{}]: Failed to record {} as fetched: {}", NAME, id, e);
        }

        if text.is_empty() {
            tracing::warn!(
                "Crawler [{}]: No body text in {}, stored an empty artifact",
                NAME,
                self.short(&url)
            );
            return FetchResult::empty(Some(id), remaining);
        }

        let elapsed = started.elapsed();
        let average = self.counter.record(elapsed, self.pacing.break_time);
        let per_hour = Duration::from_secs(60 * 60).as_secs_f64() / average.as_secs_f64();
        tracing::info!(
            "Crawler [{}]: Fetched in {}ms, avg: {}ms, spd: {:.3} per hour (or {:.3} per day)",
            NAME,
            elapsed.as_millis(),
            average.as_millis(),
            per_hour,
            per_hour * 24.0
        );

        FetchResult::content(text, id, remaining)
    }
}
