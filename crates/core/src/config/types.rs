use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::registry::{RegistryError, ResortRegistry, ScrapeTarget};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    /// Replaces the built-in roster when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resorts: Option<Vec<ScrapeTarget>>,
}

impl Config {
    /// Resort registry for this configuration: the `[[resorts]]` override
    /// when present, the built-in roster otherwise.
    pub fn registry(&self) -> Result<ResortRegistry, RegistryError> {
        match &self.resorts {
            Some(targets) => ResortRegistry::new(targets.clone()),
            None => Ok(ResortRegistry::builtin()),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Authentication for the trigger endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Shared secret (required when method = "bearer_secret")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    BearerSecret,
}

/// Storage backend selection
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("liftwatch.db")
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Durable SQLite file at `storage.path`
    #[default]
    Sqlite,
    /// Process-lifetime in-memory store
    Memory,
}

/// Upstream fetch settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    /// Per-adapter time bound in seconds (default: 15)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Concurrent adapter limit (0 = launch all at once)
    #[serde(default)]
    pub max_concurrency: usize,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            max_concurrency: 0,
        }
    }
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_user_agent() -> String {
    format!("liftwatch/{}", env!("CARGO_PKG_VERSION"))
}

/// Background scheduler
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Seconds between scheduled runs (default: 900)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default)]
    pub mode: ScheduleMode,
    /// Runs still `running` after this many seconds are marked failed (default: 3600)
    #[serde(default = "default_orphan_after_secs")]
    pub orphan_after_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_interval_secs(),
            mode: ScheduleMode::default(),
            orphan_after_secs: default_orphan_after_secs(),
        }
    }
}

impl SchedulerConfig {
    /// `orphan_after_secs` as a duration; `None` when it does not fit one.
    pub fn orphan_after(&self) -> Option<chrono::Duration> {
        i64::try_from(self.orphan_after_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
    }
}

fn default_interval_secs() -> u64 {
    900
}

fn default_orphan_after_secs() -> u64 {
    3600
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleMode {
    /// Every tick scrapes the whole roster
    #[default]
    All,
    /// Ticks cycle through batch 1, 2, 3, 1, ...
    RotateBatches,
}

/// Alert delivery
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AlertsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_queue_size")]
    pub queue_size: usize,
    #[serde(default)]
    pub webhooks: Vec<WebhookConfig>,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            queue_size: default_queue_size(),
            webhooks: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_queue_size() -> usize {
    64
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebhookConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub format: WebhookFormat,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WebhookFormat {
    #[default]
    Generic,
    Slack,
    Discord,
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub scraper: ScraperConfig,
    pub scheduler: SchedulerConfig,
    pub alerts: SanitizedAlertsConfig,
    pub custom_roster: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: AuthMethod,
    pub secret_configured: bool,
}

/// Webhook URLs often embed tokens, so only names and formats are shown.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAlertsConfig {
    pub enabled: bool,
    pub webhooks: Vec<SanitizedWebhook>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedWebhook {
    pub name: String,
    pub format: WebhookFormat,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: config.auth.method,
                secret_configured: config
                    .auth
                    .secret
                    .as_ref()
                    .map(|s| !s.is_empty())
                    .unwrap_or(false),
            },
            server: config.server.clone(),
            storage: config.storage.clone(),
            scraper: config.scraper.clone(),
            scheduler: config.scheduler.clone(),
            alerts: SanitizedAlertsConfig {
                enabled: config.alerts.enabled,
                webhooks: config
                    .alerts
                    .webhooks
                    .iter()
                    .map(|w| SanitizedWebhook {
                        name: w.name.clone(),
                        format: w.format,
                    })
                    .collect(),
            },
            custom_roster: config.resorts.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal() {
        let toml = r#"
[auth]
method = "none"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.auth.method, AuthMethod::None);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.storage.backend, StorageBackend::Sqlite);
        assert_eq!(config.storage.path.to_str().unwrap(), "liftwatch.db");
        assert_eq!(config.scraper.timeout_secs, 15);
        assert_eq!(config.scraper.max_concurrency, 0);
        assert!(!config.scheduler.enabled);
        assert_eq!(config.scheduler.mode, ScheduleMode::All);
        assert!(config.alerts.enabled);
        assert!(config.alerts.webhooks.is_empty());
        assert!(config.resorts.is_none());
    }

    #[test]
    fn test_deserialize_missing_auth_fails() {
        let toml = r#"
[server]
port = 8080
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_full() {
        let toml = r#"
[auth]
method = "bearer_secret"
secret = "s3cret"

[storage]
backend = "memory"

[scraper]
timeout_secs = 5
max_concurrency = 4

[scheduler]
enabled = true
interval_secs = 600
mode = "rotate_batches"

[[alerts.webhooks]]
name = "ops"
url = "https://hooks.slack.com/services/T000/B000/XXX"
format = "slack"

[[resorts]]
resort_id = "baker"
name = "Mt. Baker"
url = "https://www.mtbaker.us/snow-report/"
batch = 1
strategy = { kind = "text_summary" }
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.auth.method, AuthMethod::BearerSecret);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.scraper.max_concurrency, 4);
        assert_eq!(config.scheduler.mode, ScheduleMode::RotateBatches);
        assert_eq!(config.alerts.webhooks[0].format, WebhookFormat::Slack);

        let registry = config.registry().unwrap();
        assert_eq!(registry.all_targets().len(), 1);
    }

    #[test]
    fn test_registry_defaults_to_builtin() {
        let config: Config = toml::from_str("[auth]\nmethod = \"none\"\n").unwrap();
        assert_eq!(config.registry().unwrap().all_targets().len(), 15);
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let toml = r#"
[auth]
method = "bearer_secret"
secret = "s3cret"

[[alerts.webhooks]]
name = "ops"
url = "https://hooks.example.com/token-abc"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.auth.secret_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("s3cret"));
        assert!(!json.contains("token-abc"));
        assert!(json.contains("\"ops\""));
        assert!(!sanitized.custom_roster);
    }
}
