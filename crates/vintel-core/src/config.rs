//! Client configuration model.
//!
//! Loaded from `config.toml` by the infrastructure layer. Every field has a
//! default so a missing or partial file still yields a usable config.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::conversation::model::{DEFAULT_MAX_MESSAGES, DEFAULT_ROUND_CAPACITY};
use crate::error::{Result, VintelError};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

const MAX_RETRY_ATTEMPTS: u32 = 10;
const MAX_INTERVAL_MS: u64 = 3_600_000;
const MAX_NOTIFICATION_TTL_MS: u64 = 86_400_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VintelConfig {
    /// Backend API root, e.g. `https://example.com/api`.
    pub base_url: String,
    /// Business entity whose content modules are managed. When set, content
    /// routes are scoped under `/business/{id}`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_id: Option<String>,
    /// Fallback tracing filter when `RUST_LOG` is not set.
    pub log_filter: String,
    pub transport: TransportSettings,
    pub retry: RetrySettings,
    pub feed: FeedSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransportSettings {
    pub prefer_push: bool,
    pub push_path: String,
    pub status_poll_interval_ms: u64,
    pub messages_poll_interval_ms: u64,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedSettings {
    pub max_messages: usize,
    pub round_capacity: u32,
    /// Render the newest message first. Storage order is always oldest first.
    pub newest_first: bool,
    pub tick_interval_ms: u64,
    pub notification_ttl_ms: u64,
}

impl Default for VintelConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            business_id: None,
            log_filter: "info".to_string(),
            transport: TransportSettings::default(),
            retry: RetrySettings::default(),
            feed: FeedSettings::default(),
        }
    }
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            prefer_push: true,
            push_path: "/conversation/events".to_string(),
            status_poll_interval_ms: 1_000,
            messages_poll_interval_ms: 5_000,
            request_timeout_ms: 10_000,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
        }
    }
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_MESSAGES,
            round_capacity: DEFAULT_ROUND_CAPACITY,
            newest_first: true,
            tick_interval_ms: 1_000,
            notification_ttl_ms: 5_000,
        }
    }
}

impl TransportSettings {
    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_millis(self.status_poll_interval_ms)
    }

    pub fn messages_poll_interval(&self) -> Duration {
        Duration::from_millis(self.messages_poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl RetrySettings {
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

impl FeedSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn notification_ttl(&self) -> chrono::Duration {
        chrono::Duration::milliseconds(self.notification_ttl_ms.min(MAX_NOTIFICATION_TTL_MS) as i64)
    }
}

impl VintelConfig {
    /// Rejects values the client cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.trim().is_empty() {
            return Err(VintelError::config("base_url must not be empty"));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(VintelError::config(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        let t = &self.transport;
        if !(1..=MAX_INTERVAL_MS).contains(&t.status_poll_interval_ms)
            || !(1..=MAX_INTERVAL_MS).contains(&t.messages_poll_interval_ms)
        {
            return Err(VintelError::config(format!(
                "poll intervals must be between 1 and {} ms",
                MAX_INTERVAL_MS
            )));
        }
        if !(1_000..=60_000).contains(&t.request_timeout_ms) {
            return Err(VintelError::config(
                "transport.request_timeout_ms must be between 1000 and 60000",
            ));
        }
        if !(1..=MAX_RETRY_ATTEMPTS).contains(&self.retry.max_attempts) {
            return Err(VintelError::config(format!(
                "retry.max_attempts must be between 1 and {}",
                MAX_RETRY_ATTEMPTS
            )));
        }
        if self.retry.base_delay_ms > MAX_INTERVAL_MS {
            return Err(VintelError::config(format!(
                "retry.base_delay_ms must be at most {}",
                MAX_INTERVAL_MS
            )));
        }
        let f = &self.feed;
        if f.max_messages == 0 || f.round_capacity == 0 {
            return Err(VintelError::config(
                "feed.max_messages and feed.round_capacity must be at least 1",
            ));
        }
        if !(1..=MAX_INTERVAL_MS).contains(&f.tick_interval_ms) {
            return Err(VintelError::config(format!(
                "feed.tick_interval_ms must be between 1 and {}",
                MAX_INTERVAL_MS
            )));
        }
        if f.notification_ttl_ms > MAX_NOTIFICATION_TTL_MS {
            return Err(VintelError::config(format!(
                "feed.notification_ttl_ms must be at most {}",
                MAX_NOTIFICATION_TTL_MS
            )));
        }
        Ok(())
    }

    /// Joins `path` onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
