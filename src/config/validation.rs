use crate::config::types::{ArchiveConfig, Config, DriverConfig, ForumConfig, HttpConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_driver_config(&config.driver)?;
    validate_http_config(&config.http)?;

    if config.storage.fetched_path.is_empty() {
        return Err(ConfigError::Validation(
            "fetched_path cannot be empty".to_string(),
        ));
    }

    if config.crawlers.archive {
        validate_archive_config(&config.archive)?;
    }
    if config.crawlers.forum {
        validate_forum_config(&config.forum)?;
    }
    if config.crawlers.filesystem && config.filesystem.dirs.is_empty() {
        return Err(ConfigError::Validation(
            "filesystem crawler is enabled but no dirs are configured".to_string(),
        ));
    }

    Ok(())
}

fn validate_driver_config(config: &DriverConfig) -> Result<(), ConfigError> {
    if config.corpus_path.is_empty() {
        return Err(ConfigError::Validation(
            "corpus_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_archive_config(config: &ArchiveConfig) -> Result<(), ConfigError> {
    validate_http_url("archive base_url", &config.base_url)?;

    // Category and author urls are built by string concatenation
    if !config.base_url.ends_with('/') {
        return Err(ConfigError::Validation(format!(
            "archive base_url must end with '/', got '{}'",
            config.base_url
        )));
    }

    if config.categories.is_empty() {
        return Err(ConfigError::Validation(
            "archive must have at least one category".to_string(),
        ));
    }

    validate_artifact_location("archive", &config.reserv_path, &config.artifact_prefix)?;

    if config.cache_path.is_empty() {
        return Err(ConfigError::Validation(
            "archive cache_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_forum_config(config: &ForumConfig) -> Result<(), ConfigError> {
    validate_http_url("forum base_url", &config.base_url)?;
    validate_http_url("forum listing_url", &config.listing_url)?;

    if config.page_size < 1 {
        return Err(ConfigError::Validation(format!(
            "forum page_size must be >= 1, got {}",
            config.page_size
        )));
    }

    validate_artifact_location("forum", &config.reserv_path, &config.artifact_prefix)?;

    Ok(())
}

fn validate_artifact_location(source: &str, reserv_path: &str, prefix: &str) -> Result<(), ConfigError> {
    if reserv_path.is_empty() {
        return Err(ConfigError::Validation(format!(
            "{} reserv_path cannot be empty",
            source
        )));
    }

    if prefix.is_empty() || prefix.contains(['/', '\\']) {
        return Err(ConfigError::Validation(format!(
            "{} artifact_prefix must be a non-empty file name fragment, got '{}'",
            source, prefix
        )));
    }

    Ok(())
}

/// Parses a URL and checks it uses an HTTP(S) scheme
fn validate_http_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} '{}': {}", field, raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, raw
        )));
    }

    Ok(url)
}
