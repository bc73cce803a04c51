use serde::Deserialize;

/// Main configuration structure for Corpus-Harvester
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub crawlers: CrawlersConfig,
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub filesystem: FilesystemConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub forum: ForumConfig,
}

/// Per-source enable flags
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlersConfig {
    #[serde(default)]
    pub filesystem: bool,
    #[serde(default = "default_true")]
    pub archive: bool,
    #[serde(default)]
    pub forum: bool,
}

impl Default for CrawlersConfig {
    fn default() -> Self {
        Self {
            filesystem: false,
            archive: true,
            forum: false,
        }
    }
}

/// Fetch-loop configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DriverConfig {
    /// Directory receiving one text file per harvested item
    #[serde(default = "default_corpus_path")]
    pub corpus_path: String,

    /// Delay before re-invoking re-callable crawlers (milliseconds)
    #[serde(default = "default_recall_interval")]
    pub recall_interval: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            corpus_path: default_corpus_path(),
            recall_interval: default_recall_interval(),
        }
    }
}

/// Dedup store configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Path to the SQLite database holding fetched ids and harvest runs
    #[serde(default = "default_fetched_path")]
    pub fetched_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            fetched_path: default_fetched_path(),
        }
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Whole-request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts after a connection or timeout failure
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Delay between transport retries (milliseconds)
    #[serde(default = "default_retry_delay")]
    pub retry_delay: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_delay: default_retry_delay(),
        }
    }
}

/// Local filesystem source
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FilesystemConfig {
    /// Root directories listed (non-recursively) at init
    #[serde(default)]
    pub dirs: Vec<String>,

    /// Pacing delay between items (milliseconds)
    #[serde(default = "default_fs_break_time")]
    pub break_time: u64,
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        Self {
            dirs: Vec::new(),
            break_time: default_fs_break_time(),
        }
    }
}

/// Static literature archive source
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArchiveConfig {
    /// Site root; category paths are appended to it
    #[serde(default = "default_archive_base_url")]
    pub base_url: String,

    /// Category pages scanned during discovery, relative to `base_url`
    #[serde(default = "default_archive_categories")]
    pub categories: Vec<String>,

    /// Navigation sections never treated as authors
    #[serde(default = "default_archive_denylist")]
    pub denylist: Vec<String>,

    /// Directory holding one extracted text file per book
    #[serde(default = "default_reserv_path")]
    pub reserv_path: String,

    /// Discovery cache file (JSON)
    #[serde(default = "default_archive_cache_path")]
    pub cache_path: String,

    /// File name prefix of reservation artifacts
    #[serde(default = "default_archive_prefix")]
    pub artifact_prefix: String,

    /// Pacing delay after every request (milliseconds)
    #[serde(default = "default_archive_break_time")]
    pub break_time: u64,

    /// Pause after a throttling response (milliseconds)
    #[serde(default = "default_ban_cooldown")]
    pub ban_cooldown: u64,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            base_url: default_archive_base_url(),
            categories: default_archive_categories(),
            denylist: default_archive_denylist(),
            reserv_path: default_reserv_path(),
            cache_path: default_archive_cache_path(),
            artifact_prefix: default_archive_prefix(),
            break_time: default_archive_break_time(),
            ban_cooldown: default_ban_cooldown(),
        }
    }
}

/// Paginated forum API source
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ForumConfig {
    /// API root; thread details live under `{base_url}/post/{id}`
    #[serde(default = "default_forum_base_url")]
    pub base_url: String,

    /// Paginated thread listing endpoint
    #[serde(default = "default_forum_listing_url")]
    pub listing_url: String,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Hard ceiling on listing pages requested during discovery
    #[serde(default = "default_max_page_threshold")]
    pub max_page_threshold: u32,

    #[serde(default = "default_reserv_path")]
    pub reserv_path: String,

    #[serde(default = "default_forum_prefix")]
    pub artifact_prefix: String,

    #[serde(default = "default_forum_break_time")]
    pub break_time: u64,

    #[serde(default = "default_ban_cooldown")]
    pub ban_cooldown: u64,
}

impl Default for ForumConfig {
    fn default() -> Self {
        Self {
            base_url: default_forum_base_url(),
            listing_url: default_forum_listing_url(),
            page_size: default_page_size(),
            max_page_threshold: default_max_page_threshold(),
            reserv_path: default_reserv_path(),
            artifact_prefix: default_forum_prefix(),
            break_time: default_forum_break_time(),
            ban_cooldown: default_ban_cooldown(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_corpus_path() -> String {
    "corpus/".to_string()
}

fn default_recall_interval() -> u64 {
    60 * 1000
}

fn default_fetched_path() -> String {
    "storage/fetched.db".to_string()
}

fn default_user_agent() -> String {
    format!("corpus-harvester/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    1000
}

fn default_fs_break_time() -> u64 {
    1
}

fn default_reserv_path() -> String {
    "corpus-reserv/".to_string()
}

fn default_archive_base_url() -> String {
    "http://lib.ru/".to_string()
}

fn default_archive_categories() -> Vec<String> {
    [
        "CULTURE/",
        "FILOSOF/",
        "URIKOVA/",
        "URIKOVA/SANTEM/",
        "ASTROLOGY/",
        "RELIGION/",
        "DIALEKTIKA/",
        "POLITOLOG/",
        "PSIHO/",
        "NLP/",
        "DPEOPLE/",
        "NTL/ECONOMY/",
        "NTL/KIBERNETIKA/",
        "NTL/ECOLOGY/",
        "NTL/AKUSTIKA/",
        "NTL/ASTRONOMY/",
        "NTL/CHEMISTRY/",
        "NTL/STROIT/",
        "NTL/TECH/",
        "NTL/STANDARTY/",
        "NTL/ARTICLES/",
        "RUSS_DETEKTIW/",
        "DETEKTIWY/",
        "HISTORY/",
        "MEMUARY/",
        "INOSTRHIST/",
        "HIST/",
        "RUFANT/",
        "INOFANT/",
        "TALES/",
        "PRIKL/",
        "POEEAST/",
        "INOOLD/",
        "PROZA/",
        "RUSSLIT/",
        "LITRA/",
        "SU/",
        "PXESY/",
        "NEWPROZA/",
        "INPROZ/",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_archive_denylist() -> Vec<String> {
    [
        "PROZA/",
        "INPROZ/",
        "POEZIQ/",
        "RUFANT/",
        "RUSS_DETEKTIW/",
        "HISTORY/",
        "What-s-new",
        "HITPARAD/",
        "Forum/",
        "Mirrors",
        ".dir_StripDir.html",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_archive_cache_path() -> String {
    "storage/crawler_lib_ru_urls.json".to_string()
}

fn default_archive_prefix() -> String {
    "libru".to_string()
}

fn default_archive_break_time() -> u64 {
    7500
}

fn default_ban_cooldown() -> u64 {
    15 * 60 * 1000
}

fn default_forum_base_url() -> String {
    "https://scheoble.xyz/api".to_string()
}

fn default_forum_listing_url() -> String {
    "https://scheoble.xyz/api/v2/board/b+cu+l+m+mod+t+v+vg+fap".to_string()
}

fn default_page_size() -> u32 {
    50
}

fn default_max_page_threshold() -> u32 {
    250
}

fn default_forum_prefix() -> String {
    "umechan".to_string()
}

fn default_forum_break_time() -> u64 {
    500
}
