//! Statistics about the harvested corpus
//!
//! Reads the dedup store and the corpus directory; nothing here writes.

use crate::storage::{FetchedStore, RunRecord};
use std::collections::BTreeMap;
use std::path::Path;

/// Snapshot of harvesting progress
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Number of ids recorded in the dedup store
    pub fetched_ids: u64,

    /// Most recent driver run, if any
    pub latest_run: Option<RunRecord>,

    /// Corpus file count per crawler name
    pub corpus_files: BTreeMap<String, u64>,
}

impl HarvestStatistics {
    pub fn total_corpus_files(&self) -> u64 {
        self.corpus_files.values().sum()
    }
}

/// Loads statistics from the store and the corpus directory
///
/// # Arguments
///
/// * `store` - The dedup store to query
/// * `corpus_dir` - Directory holding `{crawler}_{id}.txt` files; a missing
///   directory counts as an empty corpus
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - The store or the directory could not be read
pub fn load_statistics(store: &dyn FetchedStore, corpus_dir: &Path) -> crate::Result<HarvestStatistics> {
    let fetched_ids = store.count_fetched()?;
    let latest_run = store.get_latest_run()?;

    let mut corpus_files = BTreeMap::new();
    if corpus_dir.is_dir() {
        for entry in std::fs::read_dir(corpus_dir)? {
            let name = entry?.file_name();
            let name = name.to_string_lossy();
            let Some(stem) = name.strip_suffix(".txt") else {
                continue;
            };
            if let Some((crawler, _id)) = stem.rsplit_once('_') {
                *corpus_files.entry(crawler.to_string()).or_insert(0) += 1;
            }
        }
    }

    Ok(HarvestStatistics {
        fetched_ids,
        latest_run,
        corpus_files,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Dedup store:");
    println!("  Fetched ids: {}", stats.fetched_ids);
    println!();

    println!("Corpus files ({}):", stats.total_corpus_files());
    for (crawler, count) in &stats.corpus_files {
        println!("  {}: {}", crawler, count);
    }
    println!();

    match &stats.latest_run {
        Some(run) => {
            println!("Latest run #{}:", run.id);
            println!("  Status: {}", run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            println!(
                "  Finished: {}",
                run.finished_at.as_deref().unwrap_or("-")
            );
            println!("  Items harvested: {}", run.items_harvested);
        }
        None => println!("No harvest runs recorded"),
    }
}
