//! Shared HTTP page fetcher.

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use super::AdapterError;
use crate::config::ScraperConfig;

/// Thin wrapper around a `reqwest::Client` with the scraper's timeout and user agent.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    timeout: Duration,
}

impl PageFetcher {
    pub fn new(config: &ScraperConfig) -> Result<Self, AdapterError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| AdapterError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// GET `url` and return the body as text. Non-2xx statuses are network errors.
    pub async fn fetch_text(&self, url: &str) -> Result<String, AdapterError> {
        debug!(url = url, "Fetching upstream page");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::Network(format!("HTTP {} from {}", status, url)));
        }

        response.text().await.map_err(|e| self.map_error(e))
    }

    fn map_error(&self, e: reqwest::Error) -> AdapterError {
        if e.is_timeout() {
            AdapterError::Timeout(self.timeout.as_millis() as u64)
        } else {
            AdapterError::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_configured_timeout() {
        let config = ScraperConfig {
            timeout_secs: 7,
            ..Default::default()
        };
        let fetcher = PageFetcher::new(&config).unwrap();
        assert_eq!(fetcher.timeout(), Duration::from_secs(7));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let config = ScraperConfig {
            timeout_secs: 2,
            ..Default::default()
        };
        let fetcher = PageFetcher::new(&config).unwrap();
        // Port 9 on localhost (discard) is expected to refuse connections.
        let result = fetcher.fetch_text("http://127.0.0.1:9/status").await;
        assert!(matches!(
            result,
            Err(AdapterError::Network(_)) | Err(AdapterError::Timeout(_))
        ));
    }
}
