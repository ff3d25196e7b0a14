//! Rate-limited fetcher: the single choke point for outbound reads.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::FetchError;
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::retry::RetryConfig;
use crate::throttling::RequestThrottle;

/// Issues GET requests through a shared throttle with retry and linear backoff.
///
/// A 404 is terminal and yields an empty body; retryable failures (transport
/// errors, timeouts, 5xx, 408, 429) are retried up to the configured attempt count
/// before failing with [`FetchError::Exhausted`].
#[derive(Clone)]
pub struct RateLimitedFetcher {
    client: Arc<dyn HttpClient>,
    throttle: RequestThrottle,
    retry: RetryConfig,
    timeout: Duration,
    headers: BTreeMap<String, String>,
}

impl RateLimitedFetcher {
    pub fn new(client: Arc<dyn HttpClient>, throttle: RequestThrottle, retry: RetryConfig) -> Self {
        Self {
            client,
            throttle,
            retry,
            timeout: Duration::from_secs(300),
            headers: BTreeMap::from([(String::from("accept"), String::from("*/*"))]),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.headers
            .insert(String::from("user-agent"), user_agent.into());
        self
    }

    /// Fetches decoded text; empty when the resource does not exist.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        Ok(self
            .get(url)
            .await?
            .map(|response| response.text())
            .unwrap_or_default())
    }

    /// Fetches raw bytes; empty when the resource does not exist.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        Ok(self
            .get(url)
            .await?
            .map(|response| response.body)
            .unwrap_or_default())
    }

    async fn get(&self, url: &str) -> Result<Option<HttpResponse>, FetchError> {
        let request = HttpRequest::get(url)
            .with_headers(&self.headers)
            .with_timeout(self.timeout);
        let max_attempts = self.retry.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            self.throttle.acquire().await;

            match self.client.execute(request.clone()).await {
                Ok(response) if response.is_success() => {
                    debug!(url, attempt, bytes = response.body.len(), "fetched");
                    return Ok(Some(response));
                }
                Ok(response) if response.is_not_found() => {
                    warn!(url, "resource not found");
                    return Ok(None);
                }
                Ok(response) if self.retry.should_retry_status(response.status) => {
                    last_error = format!("status {}", response.status);
                }
                Ok(response) => {
                    return Err(FetchError::Rejected {
                        url: url.to_owned(),
                        status: response.status,
                    });
                }
                Err(error) if error.retryable() => {
                    last_error = error.message().to_owned();
                }
                Err(error) => {
                    return Err(FetchError::Unsendable {
                        url: url.to_owned(),
                        message: error.message().to_owned(),
                    });
                }
            }

            warn!(url, attempt, max_attempts, error = %last_error, "request failed");
            if attempt < max_attempts {
                tokio::time::sleep(self.retry.delay_for_attempt(attempt)).await;
            }
        }

        Err(FetchError::Exhausted {
            url: url.to_owned(),
            attempts: max_attempts,
            last_error,
        })
    }
}
