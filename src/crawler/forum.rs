//! Paginated forum API source
//!
//! Discovery pages through the thread listing endpoint until an empty page or
//! the page ceiling. Each `get_next` call then fetches one thread and keeps
//! the distinct, non-quote lines of its replies.

use crate::config::ForumConfig;
use crate::crawler::pacing::Pacing;
use crate::crawler::reservation::Reservation;
use crate::crawler::{item_id, Crawler, FetchError, FetchResult, Fetcher};
use crate::storage::SharedStore;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;

const NAME: &str = "forum";

/// Prefix of reply-reference lines (`>>12345`)
const QUOTE_MARKER: &str = ">>";

/// Envelope of every API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    payload: Option<T>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Post {
    id: u64,
    /// Absent or `null` for replies without text
    #[serde(default)]
    truncated_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ThreadList {
    #[serde(default)]
    posts: Vec<Post>,
}

#[derive(Debug, Deserialize)]
struct ThreadDetail {
    thread_data: ThreadData,
}

#[derive(Debug, Deserialize)]
struct ThreadData {
    #[serde(default)]
    replies: Vec<Post>,
}

/// Normalizes the reply messages of a thread into corpus text
///
/// Lines are trimmed; lines shorter than two characters and quote references
/// are dropped; repeated lines keep their first occurrence only.
pub fn clean_thread_text<'a>(messages: impl IntoIterator<Item = &'a str>) -> String {
    let joined = messages.into_iter().collect::<Vec<_>>().join("\n");
    let mut seen = HashSet::new();

    joined
        .split('\n')
        .map(str::trim)
        .filter(|line| line.chars().count() > 1)
        .filter(|line| !line.starts_with(QUOTE_MARKER))
        .filter(|line| seen.insert(*line))
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct ForumCrawler {
    config: ForumConfig,
    fetcher: Fetcher,
    store: SharedStore,
    pacing: Pacing,
    reservation: Reservation,
    thread_ids: Vec<u64>,
    ready: bool,
}

impl ForumCrawler {
    pub fn new(config: ForumConfig, fetcher: Fetcher, store: SharedStore) -> Self {
        Self {
            pacing: Pacing::from_millis(config.break_time, config.ban_cooldown),
            reservation: Reservation::new(&config.reserv_path),
            config,
            fetcher,
            store,
            thread_ids: Vec::new(),
            ready: false,
        }
    }

    /// Pending thread ids; the last element is fetched next
    pub fn thread_ids(&self) -> &[u64] {
        &self.thread_ids
    }

    /// Requests one listing page
    ///
    /// `Ok(None)` means the API answered with an error message.
    async fn fetch_page(&self, page: u32) -> Result<Option<Vec<u64>>, FetchError> {
        let page_size = u64::from(self.config.page_size);
        let query = [
            ("limit", page_size.to_string()),
            ("offset", (u64::from(page) * page_size).to_string()),
        ];

        let response: ApiResponse<ThreadList> =
            self.fetcher.get_json(&self.config.listing_url, &query).await?;

        if let Some(error) = response.error {
            tracing::warn!("Crawler [{}]: error getting page {}: {}", NAME, page, error);
            return Ok(None);
        }

        let ids = response
            .payload
            .map(|list| list.posts.into_iter().map(|post| post.id).collect())
            .unwrap_or_default();
        Ok(Some(ids))
    }

    async fn fetch_thread(&self, url: &str) -> Result<String, FetchError> {
        let response: ApiResponse<ThreadDetail> = self.fetcher.get_json(url, &[]).await?;

        if let Some(error) = response.error {
            return Err(FetchError::malformed(url, error));
        }

        let replies = response
            .payload
            .map(|detail| detail.thread_data.replies)
            .unwrap_or_default();
        tracing::debug!("Crawler [{}]: {} replies in {}", NAME, replies.len(), url);

        Ok(clean_thread_text(
            replies
                .iter()
                .map(|reply| reply.truncated_message.as_deref().unwrap_or_default()),
        ))
    }
}

#[async_trait]
impl Crawler for ForumCrawler {
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
        self.thread_ids.len()
    }

    async fn init(&mut self) -> crate::Result<()> {
        tracing::info!("Crawler [{}]: Fetching all threads", NAME);

        let mut page: u32 = 0;
        loop {
            let mut last_page = false;

            match self.fetch_page(page).await {
                Ok(Some(ids)) => {
                    tracing::info!(
                        "Crawler [{}]: For page {} fetched {} threads [delay {:?}]",
                        NAME,
                        page,
                        ids.len(),
                        self.pacing.break_time
                    );
                    last_page = ids.is_empty();
                    self.thread_ids.extend(ids);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("Crawler [{}]: error getting page {}: {}", NAME, page, e);
                    self.pacing.backoff(NAME, &e).await;
                }
            }

            page += 1;
            self.pacing.pause().await;

            if last_page {
                break;
            }
            if page > self.config.max_page_threshold {
                tracing::warn!(
                    "Crawler [{}]: stopping discovery at the page ceiling ({})",
                    NAME,
                    self.config.max_page_threshold
                );
                break;
            }
        }

        tracing::info!("Crawler [{}]: Threads found: {}", NAME, self.thread_ids.len());
        self.ready = true;
        Ok(())
    }

    async fn get_next(&mut self) -> FetchResult {
        let thread_id = self.thread_ids.pop();
        let remaining = self.thread_ids.len();

        // no request is made here, but the driver still applies its break time
        let Some(thread_id) = thread_id.filter(|id| *id != 0) else {
            return FetchResult::empty(None, remaining);
        };

        let url = format!("{}/post/{}", self.config.base_url, thread_id);
        let id = item_id(&url);
        let path = self
            .reservation
            .path(&format!("{}_{}.txt", self.config.artifact_prefix, id));

        if self.reservation.is_known(NAME, &path, &id, &self.store).await {
            tracing::debug!("Crawler [{}]: thread #{} already fetched", NAME, thread_id);
            return FetchResult::skipped(id, remaining);
        }

        tracing::info!(
            "Crawler [{}]: getting thread #{} (threads in queue: {})",
            NAME,
            thread_id,
            remaining
        );

        let text = match self.fetch_thread(&url).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Crawler [{}]: error getting thread #{}: {}", NAME, thread_id, e);
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

        FetchResult::content(text, id, remaining)
    }
}
