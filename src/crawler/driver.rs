//! Fetch loop driving every enabled crawler
//!
//! Crawlers run strictly one after another; no two `init`/`get_next` calls are
//! ever in flight at the same time, which is what keeps the shared dedup store
//! and reservation directories consistent.

use crate::config::{Config, DriverConfig};
use crate::crawler::{build_crawlers, Crawler, FetchResult};
use crate::storage::{RunStatus, SharedStore};
use crate::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Counters collected over one driver pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub run_id: i64,
    /// Items whose text was written to the corpus
    pub items_harvested: u64,
    /// Items already known, for which no request was made
    pub items_skipped: u64,
    /// Names of crawlers whose initialization failed
    pub failed_crawlers: Vec<String>,
}

pub struct Driver {
    crawlers: Vec<Box<dyn Crawler>>,
    store: SharedStore,
    corpus_dir: PathBuf,
    recall_interval: Duration,
    config_hash: String,
}

impl Driver {
    /// Creates a driver for every crawler enabled in `config`
    ///
    /// # Arguments
    ///
    /// * `config` - The harvester configuration
    /// * `store` - Dedup store shared by the crawlers and the run log
    /// * `config_hash` - Hash recorded with every run
    ///
    /// # Returns
    ///
    /// * `Ok(Driver)` - Driver ready to run
    /// * `Err(HarvestError)` - The crawlers could not be built
    pub fn new(config: &Config, store: SharedStore, config_hash: impl Into<String>) -> crate::Result<Self> {
        let crawlers = build_crawlers(config, &store)?;
        Ok(Self::with_crawlers(crawlers, store, &config.driver, config_hash))
    }

    /// Creates a driver over an explicit set of crawlers
    pub fn with_crawlers(
        crawlers: Vec<Box<dyn Crawler>>,
        store: SharedStore,
        config: &DriverConfig,
        config_hash: impl Into<String>,
    ) -> Self {
        Self {
            crawlers,
            store,
            corpus_dir: PathBuf::from(&config.corpus_path),
            recall_interval: Duration::from_millis(config.recall_interval),
            config_hash: config_hash.into(),
        }
    }

    pub fn crawler_names(&self) -> Vec<&str> {
        self.crawlers.iter().map(|c| c.name()).collect()
    }

    /// Runs one pass over every crawler, then keeps re-running the re-callable ones
    ///
    /// Returns after the first pass when no crawler is re-callable.
    pub async fn run(&mut self) -> crate::Result<Vec<PassSummary>> {
        let mut summaries = vec![self.run_pass().await?];

        while self.crawlers.iter().any(|c| c.is_re_callable()) {
            tracing::info!(
                "Recalling re-callable crawlers in {:?}",
                self.recall_interval
            );
            tokio::time::sleep(self.recall_interval).await;
            summaries.push(self.run_selected(|c| c.is_re_callable()).await?);
        }

        Ok(summaries)
    }

    /// Initializes and drains every crawler once, recording the pass as a run
    pub async fn run_pass(&mut self) -> crate::Result<PassSummary> {
        self.run_selected(|_| true).await
    }

    async fn run_selected(
        &mut self,
        selected: impl Fn(&dyn Crawler) -> bool,
    ) -> crate::Result<PassSummary> {
        let run_id = self.store.with(|store| store.create_run(&self.config_hash))?;
        tracing::info!("Starting harvest run {}", run_id);

        let mut summary = PassSummary {
            run_id,
            ..PassSummary::default()
        };

        if let Err(e) = tokio::fs::create_dir_all(&self.corpus_dir).await {
            tracing::error!(
                "Cannot create corpus directory {}: {}",
                self.corpus_dir.display(),
                e
            );
            self.store
                .with(|store| store.finish_run(run_id, RunStatus::Failed, 0))?;
            return Err(e.into());
        }

        for crawler in self.crawlers.iter_mut() {
            if !selected(&**crawler) {
                continue;
            }
            drain(&mut **crawler, &self.corpus_dir, &mut summary).await;
        }

        self.store.with(|store| {
            store.finish_run(run_id, RunStatus::Completed, summary.items_harvested)
        })?;

        tracing::info!(
            "Harvest run {} finished: {} harvested, {} skipped, {} crawler(s) failed",
            run_id,
            summary.items_harvested,
            summary.items_skipped,
            summary.failed_crawlers.len()
        );

        Ok(summary)
    }
}

/// Runs `init` and then `get_next` until the crawler's queue is empty
async fn drain(crawler: &mut dyn Crawler, corpus_dir: &Path, summary: &mut PassSummary) {
    let name = crawler.name().to_string();

    if let Err(e) = crawler.init().await {
        match e.kind() {
            ErrorKind::ConfigFatal => {
                tracing::error!("Crawler [{}]: initialization failed: {}", name, e)
            }
            _ => tracing::warn!("Crawler [{}]: initialization failed: {}", name, e),
        }
        summary.failed_crawlers.push(name);
        return;
    }

    if crawler.queue_len() == 0 {
        tracing::info!("Crawler [{}]: nothing to fetch", name);
        return;
    }

    loop {
        let result = crawler.get_next().await;

        if result.should_skip_delay {
            summary.items_skipped += 1;
        } else if let Err(e) = write_corpus_file(corpus_dir, &name, &result).await {
            tracing::warn!("Crawler [{}]: Failed to write corpus file: {}", name, e);
        } else if !result.text.is_empty() {
            summary.items_harvested += 1;
        }

        if !result.next_available {
            break;
        }
        if !result.should_skip_delay {
            tokio::time::sleep(crawler.break_time()).await;
        }
    }

    tracing::info!("Crawler [{}]: queue drained", name);
}

/// Writes non-empty text to `{corpus_dir}/{crawler}_{id}.txt`
async fn write_corpus_file(
    corpus_dir: &Path,
    crawler: &str,
    result: &FetchResult,
) -> std::io::Result<()> {
    let Some(id) = result.id.as_deref() else {
        return Ok(());
    };
    if result.text.is_empty() {
        return Ok(());
    }

    let path = corpus_dir.join(format!("{}_{}.txt", crawler, id));
    tokio::fs::write(&path, result.text.as_bytes()).await
}
