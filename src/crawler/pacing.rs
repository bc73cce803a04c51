//! Request pacing and ban backoff
//!
//! Crawlers never run requests concurrently; politeness comes entirely from
//! sleeping between calls. Two delays exist:
//! - the per-crawler break time, slept after every discovery request
//! - the ban cooldown, slept once after a throttling response

use crate::crawler::FetchError;
use std::time::Duration;

/// Cooldown owed after a throttling response
///
/// Ephemeral: created from an error, resolved by sleeping, then dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BanBackoff {
    cooldown: Duration,
}

impl BanBackoff {
    /// Returns a backoff only when `error` is a throttling signal
    pub fn from_error(error: &FetchError, cooldown: Duration) -> Option<Self> {
        error.is_throttled().then_some(Self { cooldown })
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub async fn resolve(self, crawler: &str) {
        tracing::warn!(
            "Crawler [{}]: remote is throttling, sleeping for {:?}",
            crawler,
            self.cooldown
        );
        tokio::time::sleep(self.cooldown).await;
    }
}

/// Fixed pacing policy of one crawler
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    pub break_time: Duration,
    pub ban_cooldown: Duration,
}

impl Pacing {
    pub fn from_millis(break_time: u64, ban_cooldown: u64) -> Self {
        Self {
            break_time: Duration::from_millis(break_time),
            ban_cooldown: Duration::from_millis(ban_cooldown),
        }
    }

    /// Sleeps the ban cooldown if `error` is a throttling signal
    pub async fn backoff(&self, crawler: &str, error: &FetchError) {
        if let Some(backoff) = BanBackoff::from_error(error, self.ban_cooldown) {
            backoff.resolve(crawler).await;
        }
    }

    /// Sleeps the break time
    pub async fn pause(&self) {
        tokio::time::sleep(self.break_time).await;
    }
}
