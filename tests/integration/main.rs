//! Integration tests for the crawlers
//!
//! These tests use wiremock to stand in for the remote archive and forum,
//! and temporary directories for reservations, caches and the corpus.

mod archive;
mod filesystem;

use corpus_harvester::config::HttpConfig;
use corpus_harvester::crawler::Fetcher;
use corpus_harvester::storage::{SharedStore, SqliteStorage};

/// Fresh in-memory dedup store
pub fn memory_store() -> SharedStore {
    SharedStore::new(SqliteStorage::new_in_memory().unwrap())
}

/// Fetcher with a short retry delay
pub fn test_fetcher() -> Fetcher {
    let config = HttpConfig {
        retry_count: 1,
        retry_delay: 10,
        timeout_secs: 5,
        ..HttpConfig::default()
    };
    Fetcher::new(&config).unwrap()
}

/// Wraps text the way the archive serves documents
pub fn document_page(text: &str) -> String {
    format!("<html><body><pre>{}</pre></body></html>", text)
}

/// An index page linking to every href given
pub fn index_page(hrefs: &[&str]) -> String {
    let links: String = hrefs
        .iter()
        .map(|href| format!("<a href=\"{}\">{}</a>\n", href, href))
        .collect();
    format!("<html><body>\n{}</body></html>", links)
}
