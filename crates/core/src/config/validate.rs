use super::{
    types::{AuthMethod, Config},
    ConfigError,
};

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Validate configuration beyond what serde enforces.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::BearerSecret
        && config.auth.secret.as_deref().map_or(true, |s| s.trim().is_empty())
    {
        return Err(ConfigError::ValidationError(
            "auth.secret is required when auth.method = \"bearer_secret\"".to_string(),
        ));
    }

    if config.scraper.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "scraper.timeout_secs must be at least 1".to_string(),
        ));
    }

    if config.scheduler.interval_secs < 60 {
        return Err(ConfigError::ValidationError(format!(
            "scheduler.interval_secs must be at least 60 (got {})",
            config.scheduler.interval_secs
        )));
    }

    if config.scheduler.orphan_after().is_none() {
        return Err(ConfigError::ValidationError(format!(
            "scheduler.orphan_after_secs is out of range (got {})",
            config.scheduler.orphan_after_secs
        )));
    }
    if config.scheduler.orphan_after_secs <= config.scraper.timeout_secs {
        return Err(ConfigError::ValidationError(format!(
            "scheduler.orphan_after_secs ({}) must exceed scraper.timeout_secs ({})",
            config.scheduler.orphan_after_secs, config.scraper.timeout_secs
        )));
    }

    if config.alerts.queue_size == 0 {
        return Err(ConfigError::ValidationError(
            "alerts.queue_size cannot be 0".to_string(),
        ));
    }

    for webhook in &config.alerts.webhooks {
        if !is_http_url(&webhook.url) {
            return Err(ConfigError::ValidationError(format!(
                "alerts.webhooks[{}].url must be an http(s) URL",
                webhook.name
            )));
        }
    }

    config
        .registry()
        .map_err(|e| ConfigError::ValidationError(format!("resorts: {}", e)))?;

    Ok(())
}
