//! Configuration module for Corpus-Harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so an empty file yields a runnable configuration
//! with only the archive source enabled.
//!
//! # Example
//!
//! ```no_run
//! use corpus_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvester.toml")).unwrap();
//! println!("Archive pacing: {}ms", config.archive.break_time);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    ArchiveConfig, Config, CrawlersConfig, DriverConfig, FilesystemConfig, ForumConfig,
    HttpConfig, StorageConfig,
};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
