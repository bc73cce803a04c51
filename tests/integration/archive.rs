use crate::{document_page, index_page, memory_store, test_fetcher};
use corpus_harvester::config::ArchiveConfig;
use corpus_harvester::crawler::{item_id, ArchiveCrawler, DiscoveryCache};
use corpus_harvester::storage::SharedStore;
use corpus_harvester::Crawler;
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn archive_config(server: &MockServer, work_dir: &Path) -> ArchiveConfig {
    ArchiveConfig {
        base_url: format!("{}/", server.uri()),
        categories: vec!["PROZA/".to_string()],
        reserv_path: work_dir.join("reserv").to_string_lossy().into_owned(),
        cache_path: work_dir
            .join("storage")
            .join("urls.json")
            .to_string_lossy()
            .into_owned(),
        break_time: 1,
        ban_cooldown: 10,
        ..ArchiveConfig::default()
    }
}

fn crawler(config: &ArchiveConfig, store: &SharedStore) -> ArchiveCrawler {
    ArchiveCrawler::new(config.clone(), test_fetcher(), store.clone())
}

async fn mount_page(server: &MockServer, route: &str, body: String, expected: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_discovery_scans_authors_when_categories_hold_no_documents() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = archive_config(&server, dir.path());

    mount_page(
        &server,
        "/PROZA/",
        index_page(&["../", "AUTH/", "/koi/PROZA/", "What-s-new"]),
        1,
    )
    .await;
    mount_page(
        &server,
        "/PROZA/AUTH",
        index_page(&["book1.txt", "book1.txt_Contents", "book2.txt"]),
        1,
    )
    .await;

    let mut archive = crawler(&config, &memory_store());
    archive.init().await.unwrap();

    let base = config.base_url.clone();
    assert!(archive.is_ready());
    assert_eq!(archive.author_urls(), [format!("{}PROZA/AUTH", base)]);
    assert_eq!(
        archive.book_urls(),
        [
            format!("{}PROZA/AUTH/book1.txt", base),
            format!("{}PROZA/AUTH/book2.txt", base),
        ]
    );
    assert!(Path::new(&config.cache_path).exists());
}

#[tokio::test]
async fn test_documents_on_category_pages_skip_author_scan() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = archive_config(&server, dir.path());

    mount_page(&server, "/PROZA/", index_page(&["direct.txt", "AUTH/"]), 1).await;
    mount_page(&server, "/PROZA/AUTH", index_page(&["book1.txt"]), 0).await;

    let mut archive = crawler(&config, &memory_store());
    archive.init().await.unwrap();

    assert_eq!(archive.book_urls(), [format!("{}PROZA/direct.txt", config.base_url)]);
    assert_eq!(archive.author_urls().len(), 1);
}

#[tokio::test]
async fn test_cache_restores_the_same_queue_without_network() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = archive_config(&server, dir.path());

    // only the first crawler may hit the network
    mount_page(&server, "/PROZA/", index_page(&["AUTH/"]), 1).await;
    mount_page(&server, "/PROZA/AUTH", index_page(&["a.txt", "b.txt", "c.txt"]), 1).await;

    let store = memory_store();
    let mut first = crawler(&config, &store);
    first.init().await.unwrap();

    let mut second = crawler(&config, &store);
    second.init().await.unwrap();

    assert_eq!(first.book_urls(), second.book_urls());
    assert_eq!(first.author_urls(), second.author_urls());

    let cache = DiscoveryCache::load(Path::new(&config.cache_path)).await.unwrap();
    assert_eq!(cache.book_urls, first.book_urls());
}

#[tokio::test]
async fn test_unreadable_cache_falls_back_to_discovery() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = archive_config(&server, dir.path());
    std::fs::create_dir_all(Path::new(&config.cache_path).parent().unwrap()).unwrap();
    std::fs::write(&config.cache_path, "{ not json").unwrap();

    mount_page(&server, "/PROZA/", index_page(&["direct.txt"]), 1).await;

    let mut archive = crawler(&config, &memory_store());
    archive.init().await.unwrap();

    assert_eq!(archive.queue_len(), 1);
    // the broken cache is replaced by a valid one
    assert!(DiscoveryCache::load(Path::new(&config.cache_path)).await.is_ok());
}

#[tokio::test]
async fn test_books_are_fetched_last_in_first_out() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = archive_config(&server, dir.path());

    mount_page(&server, "/PROZA/", index_page(&["one.txt", "two.txt"]), 1).await;
    mount_page(&server, "/PROZA/one.txt", document_page("First book"), 1).await;
    mount_page(&server, "/PROZA/two.txt", document_page("Second book"), 1).await;

    let store = memory_store();
    let mut archive = crawler(&config, &store);
    archive.init().await.unwrap();

    let first = archive.get_next().await;
    assert_eq!(first.text, "Second book");
    assert!(first.next_available);
    assert!(!first.should_skip_delay);

    let second = archive.get_next().await;
    assert_eq!(second.text, "First book");
    assert!(!second.next_available);

    let id = item_id(&format!("{}PROZA/one.txt", config.base_url));
    assert_eq!(second.id.as_deref(), Some(id.as_str()));
    assert!(store.check_is_fetched(&id).unwrap());

    let artifact = Path::new(&config.reserv_path).join(format!("libru_PROZA_one.txt_{}.txt", id));
    assert_eq!(std::fs::read_to_string(artifact).unwrap(), "First book");
}

#[tokio::test]
async fn test_known_book_is_skipped_without_request() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = archive_config(&server, dir.path());

    mount_page(&server, "/PROZA/", index_page(&["seen.txt"]), 1).await;
    mount_page(&server, "/PROZA/seen.txt", document_page("Already have it"), 0).await;

    let store = memory_store();
    let id = item_id(&format!("{}PROZA/seen.txt", config.base_url));
    store.add_fetched(&id).unwrap();

    let mut archive = crawler(&config, &store);
    archive.init().await.unwrap();
    let result = archive.get_next().await;

    assert!(result.should_skip_delay);
    assert!(result.text.is_empty());
    assert_eq!(result.id.as_deref(), Some(id.as_str()));
    assert!(!result.next_available);
}

#[tokio::test]
async fn test_legacy_artifact_is_migrated_instead_of_fetched() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = archive_config(&server, dir.path());

    mount_page(&server, "/PROZA/", index_page(&["old.txt"]), 1).await;
    mount_page(&server, "/PROZA/old.txt", document_page("unused"), 0).await;

    let id = item_id(&format!("{}PROZA/old.txt", config.base_url));
    let reserv = Path::new(&config.reserv_path);
    std::fs::create_dir_all(reserv).unwrap();
    let legacy = reserv.join(format!("libru_{}.txt", id));
    std::fs::write(&legacy, "old text").unwrap();

    let store = memory_store();
    let mut archive = crawler(&config, &store);
    archive.init().await.unwrap();
    let result = archive.get_next().await;

    assert!(result.text.is_empty());
    assert!(!result.should_skip_delay);
    assert!(!legacy.exists());
    let migrated = reserv.join(format!("libru_PROZA_old.txt_{}.txt", id));
    assert_eq!(std::fs::read_to_string(migrated).unwrap(), "old text");
}

#[tokio::test]
async fn test_throttled_book_is_abandoned_and_crawl_continues() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = archive_config(&server, dir.path());

    mount_page(&server, "/PROZA/", index_page(&["fine.txt", "busy.txt"]), 1).await;
    Mock::given(method("GET"))
        .and(path("/PROZA/busy.txt"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/PROZA/fine.txt", document_page("Fine book"), 1).await;

    let store = memory_store();
    let mut archive = crawler(&config, &store);
    archive.init().await.unwrap();

    let throttled = archive.get_next().await;
    assert!(throttled.text.is_empty());
    assert!(throttled.next_available);
    let busy_id = item_id(&format!("{}PROZA/busy.txt", config.base_url));
    assert!(!store.check_is_fetched(&busy_id).unwrap());

    let fine = archive.get_next().await;
    assert_eq!(fine.text, "Fine book");
}

#[tokio::test]
async fn test_failed_discovery_is_retried_on_next_startup() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = archive_config(&server, dir.path());

    Mock::given(method("GET"))
        .and(path("/PROZA/"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/PROZA/", index_page(&["x.txt"]), 1).await;

    let store = memory_store();
    let mut unlucky = crawler(&config, &store);
    unlucky.init().await.unwrap();
    assert!(unlucky.is_ready());
    assert_eq!(unlucky.queue_len(), 0);
    assert!(!Path::new(&config.cache_path).exists());

    let mut recovered = crawler(&config, &store);
    recovered.init().await.unwrap();
    assert_eq!(recovered.book_urls(), [format!("{}PROZA/x.txt", config.base_url)]);
    assert!(DiscoveryCache::load(Path::new(&config.cache_path)).await.is_ok());
}

#[tokio::test]
async fn test_empty_cache_file_counts_as_miss() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = archive_config(&server, dir.path());
    DiscoveryCache::default()
        .save(Path::new(&config.cache_path))
        .await
        .unwrap();

    mount_page(&server, "/PROZA/", index_page(&["x.txt"]), 1).await;

    let mut archive = crawler(&config, &memory_store());
    archive.init().await.unwrap();

    assert_eq!(archive.queue_len(), 1);
}

#[tokio::test]
async fn test_throttled_category_pauses_then_scan_continues() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = archive_config(&server, dir.path());
    config.categories = vec!["A/".to_string(), "B/".to_string()];

    Mock::given(method("GET"))
        .and(path("/A/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/B/", index_page(&["x.txt"]), 1).await;

    let mut archive = crawler(&config, &memory_store());
    archive.init().await.unwrap();

    assert_eq!(archive.book_urls(), [format!("{}B/x.txt", config.base_url)]);
}

#[tokio::test]
async fn test_artifact_on_disk_is_skipped_without_request() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = archive_config(&server, dir.path());

    mount_page(&server, "/PROZA/", index_page(&["kept.txt"]), 1).await;
    mount_page(&server, "/PROZA/kept.txt", document_page("unused"), 0).await;

    let id = item_id(&format!("{}PROZA/kept.txt", config.base_url));
    let reserv = Path::new(&config.reserv_path);
    std::fs::create_dir_all(reserv).unwrap();
    std::fs::write(reserv.join(format!("libru_PROZA_kept.txt_{}.txt", id)), "kept").unwrap();

    // the store knows nothing about this book
    let store = memory_store();
    let mut archive = crawler(&config, &store);
    archive.init().await.unwrap();
    let result = archive.get_next().await;

    assert!(result.should_skip_delay);
    assert!(result.text.is_empty());
    assert!(!store.check_is_fetched(&id).unwrap());
}

#[tokio::test]
async fn test_book_without_text_is_not_requested_again() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let config = archive_config(&server, dir.path());

    mount_page(&server, "/PROZA/", index_page(&["blank.txt"]), 1).await;
    mount_page(&server, "/PROZA/blank.txt", document_page("   "), 1).await;

    let store = memory_store();
    let mut first = crawler(&config, &store);
    first.init().await.unwrap();
    let result = first.get_next().await;

    let id = item_id(&format!("{}PROZA/blank.txt", config.base_url));
    assert!(result.text.is_empty());
    assert!(!result.should_skip_delay);
    assert!(store.check_is_fetched(&id).unwrap());
    let artifact = Path::new(&config.reserv_path).join(format!("libru_PROZA_blank.txt_{}.txt", id));
    assert_eq!(std::fs::read_to_string(artifact).unwrap(), "");

    // the cache restores the queue; the book is now known
    let mut second = crawler(&config, &store);
    second.init().await.unwrap();
    assert!(second.get_next().await.should_skip_delay);
}
