//! Run configuration.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;

use crate::error::ConfigError;
use crate::fetcher::RateLimitedFetcher;
use crate::http_client::HttpClient;
use crate::retry::RetryConfig;
use crate::throttling::RequestThrottle;

pub const DEFAULT_CATALOG_URL: &str = "https://catalog.data.gov/dataset/fails-to-deliver-data";
pub const DEFAULT_ARCHIVE_MARKER: &str = "https://www.sec.gov/files/data/fails-deliver-data/";
pub const DEFAULT_ARCHIVE_HOST: &str = "https://www.sec.gov";

/// Everything a sync run needs, passed explicitly into the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Root of the issuer, universe and scratch files.
    pub destination: PathBuf,
    /// Directory of ticker map files.
    pub map_file_dir: PathBuf,
    pub catalog_url: String,
    /// Literal prefix identifying archive links on the catalog page.
    pub archive_marker: String,
    /// Host used to absolutize relative archive links.
    pub archive_host: String,
    /// Client-identifying `User-Agent`; the transport default applies when unset.
    pub user_agent: Option<String>,
    pub skip_processed: bool,
    pub requests_per_second: u32,
    pub max_retries: u32,
    pub retry_step: Duration,
    pub request_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            destination: PathBuf::from("sec-fails-to-deliver"),
            map_file_dir: PathBuf::from("map_files"),
            catalog_url: String::from(DEFAULT_CATALOG_URL),
            archive_marker: String::from(DEFAULT_ARCHIVE_MARKER),
            archive_host: String::from(DEFAULT_ARCHIVE_HOST),
            user_agent: None,
            skip_processed: true,
            requests_per_second: 5,
            max_retries: 5,
            retry_step: Duration::from_secs(1),
            request_timeout: Duration::from_secs(300),
        }
    }
}

impl SyncConfig {
    /// Defaults overridden by `FTDSYNC_HOME`, `FTDSYNC_MAP_FILES` and `SEC_USER_AGENT`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(home) = non_empty("FTDSYNC_HOME") {
            config.destination = PathBuf::from(home);
        }
        if let Some(map_files) = non_empty("FTDSYNC_MAP_FILES") {
            config.map_file_dir = PathBuf::from(map_files);
        }
        config.user_agent = non_empty("SEC_USER_AGENT");
        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.requests_per_second == 0 {
            return Err(ConfigError::ZeroRateLimit);
        }
        if self.max_retries == 0 {
            return Err(ConfigError::ZeroRetries);
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }

        let valid_url = Url::parse(&self.catalog_url)
            .is_ok_and(|url| matches!(url.scheme(), "http" | "https"));
        if !valid_url {
            return Err(ConfigError::InvalidCatalogUrl {
                url: self.catalog_url.clone(),
            });
        }
        Ok(())
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::linear(self.max_retries, self.retry_step)
    }

    pub fn throttle(&self) -> RequestThrottle {
        RequestThrottle::per_second(self.requests_per_second)
    }

    /// Fetcher over `client` sharing one fresh throttle.
    pub fn fetcher(&self, client: Arc<dyn HttpClient>) -> RateLimitedFetcher {
        let fetcher = RateLimitedFetcher::new(client, self.throttle(), self.retry_config())
            .with_timeout(self.request_timeout);
        match &self.user_agent {
            Some(user_agent) => fetcher.with_user_agent(user_agent.clone()),
            None => fetcher,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_documented_values() {
        let config = SyncConfig::default();

        assert_eq!(config.requests_per_second, 5);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(300));
        assert!(config.skip_processed);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn environment_overrides_defaults() {
        let vars = HashMap::from([
            ("FTDSYNC_HOME", "/data/ftd"),
            ("FTDSYNC_MAP_FILES", " "),
            ("SEC_USER_AGENT", "Research Desk research@example.com"),
        ]);

        let config = SyncConfig::from_lookup(|key| vars.get(key).map(|value| (*value).to_owned()));

        assert_eq!(config.destination, PathBuf::from("/data/ftd"));
        assert_eq!(config.map_file_dir, PathBuf::from("map_files"));
        assert_eq!(
            config.user_agent.as_deref(),
            Some("Research Desk research@example.com")
        );
    }

    #[test]
    fn validate_rejects_unusable_values() {
        let cases = [
            (
                SyncConfig {
                    requests_per_second: 0,
                    ..SyncConfig::default()
                },
                ConfigError::ZeroRateLimit,
            ),
            (
                SyncConfig {
                    max_retries: 0,
                    ..SyncConfig::default()
                },
                ConfigError::ZeroRetries,
            ),
            (
                SyncConfig {
                    request_timeout: Duration::ZERO,
                    ..SyncConfig::default()
                },
                ConfigError::ZeroTimeout,
            ),
            (
                SyncConfig {
                    catalog_url: String::from("ftp://catalog"),
                    ..SyncConfig::default()
                },
                ConfigError::InvalidCatalogUrl {
                    url: String::from("ftp://catalog"),
                },
            ),
        ];

        for (config, expected) in cases {
            assert_eq!(config.validate(), Err(expected));
        }
    }
}
