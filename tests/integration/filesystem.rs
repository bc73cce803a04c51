use crate::memory_store;
use corpus_harvester::config::{Config, FilesystemConfig};
use corpus_harvester::crawler::{item_id, FilesystemCrawler};
use corpus_harvester::{Crawler, Driver};

#[tokio::test]
async fn test_files_come_out_last_in_first_out() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), "alpha").unwrap();
    std::fs::write(dir.path().join("b.txt"), "beta").unwrap();

    let config = FilesystemConfig {
        dirs: vec![dir.path().to_string_lossy().into_owned()],
        break_time: 1,
    };
    let store = memory_store();
    let mut crawler = FilesystemCrawler::new(&config, store.clone());
    crawler.init().await.unwrap();

    let first = crawler.get_next().await;
    assert_eq!(first.text, "beta");
    assert!(first.next_available);

    let second = crawler.get_next().await;
    assert_eq!(second.text, "alpha");
    assert!(!second.next_available);

    let exhausted = crawler.get_next().await;
    assert!(exhausted.text.is_empty());
    assert!(exhausted.id.is_none());
    assert!(!exhausted.next_available);

    assert_eq!(store.count_fetched().unwrap(), 2);
}

#[tokio::test]
async fn test_driver_writes_filesystem_items_to_corpus() {
    let source = tempfile::tempdir().unwrap();
    let corpus = tempfile::tempdir().unwrap();
    std::fs::write(source.path().join("a.txt"), "alpha").unwrap();
    std::fs::write(source.path().join("b.txt"), "beta").unwrap();

    let mut config = Config::default();
    config.crawlers.archive = false;
    config.crawlers.filesystem = true;
    config.filesystem.dirs = vec![source.path().to_string_lossy().into_owned()];
    config.driver.corpus_path = corpus.path().to_string_lossy().into_owned();

    let store = memory_store();
    let mut driver = Driver::new(&config, store.clone(), "hash").unwrap();
    let summaries = driver.run().await.unwrap();

    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].items_harvested, 2);

    let a_id = item_id(&source.path().join("a.txt").to_string_lossy());
    let written = corpus.path().join(format!("filesystem_{}.txt", a_id));
    assert_eq!(std::fs::read_to_string(written).unwrap(), "alpha");

    let latest = store.with(|s| s.get_latest_run()).unwrap().unwrap();
    assert_eq!(latest.items_harvested, 2);
}

#[tokio::test]
async fn test_driver_survives_missing_root() {
    let corpus = tempfile::tempdir().unwrap();

    let mut config = Config::default();
    config.crawlers.archive = false;
    config.crawlers.filesystem = true;
    config.filesystem.dirs = vec!["/nonexistent/corpus-root".to_string()];
    config.driver.corpus_path = corpus.path().to_string_lossy().into_owned();

    let mut driver = Driver::new(&config, memory_store(), "hash").unwrap();
    let summary = driver.run_pass().await.unwrap();

    assert_eq!(summary.failed_crawlers, vec!["filesystem".to_string()]);
    assert_eq!(summary.items_harvested, 0);
}
