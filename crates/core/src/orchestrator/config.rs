//! Orchestrator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ScraperConfig;

/// Bounds applied to each fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Hard per-adapter time bound (milliseconds).
    /// An adapter exceeding it yields a Timeout failure for its resort only.
    #[serde(default = "default_adapter_timeout")]
    pub adapter_timeout_ms: u64,

    /// Maximum adapters in flight (0 = unlimited).
    /// When limited, waiting for a slot does not count against the timeout.
    #[serde(default)]
    pub max_concurrency: usize,
}

fn default_adapter_timeout() -> u64 {
    15_000
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            adapter_timeout_ms: default_adapter_timeout(),
            max_concurrency: 0,
        }
    }
}

impl OrchestratorConfig {
    pub fn adapter_timeout(&self) -> Duration {
        Duration::from_millis(self.adapter_timeout_ms)
    }
}

impl From<&ScraperConfig> for OrchestratorConfig {
    fn from(scraper: &ScraperConfig) -> Self {
        Self {
            adapter_timeout_ms: scraper.timeout_secs.saturating_mul(1000),
            max_concurrency: scraper.max_concurrency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.adapter_timeout_ms, 15_000);
        assert_eq!(config.max_concurrency, 0);
        assert_eq!(config.adapter_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_from_scraper_config() {
        let scraper = ScraperConfig {
            timeout_secs: 4,
            max_concurrency: 3,
            ..ScraperConfig::default()
        };
        let config = OrchestratorConfig::from(&scraper);
        assert_eq!(config.adapter_timeout_ms, 4000);
        assert_eq!(config.max_concurrency, 3);
    }

    #[test]
    fn test_deserialize_minimal() {
        let config: OrchestratorConfig = toml::from_str("max_concurrency = 2").unwrap();
        assert_eq!(config.max_concurrency, 2);
        assert_eq!(config.adapter_timeout_ms, 15_000);
    }
}
