pub mod settings;

pub use settings::Config;

use crate::error::ConfigError;
use std::sync::Arc;

/// Loads the application configuration from the environment (and `.env`, if present),
/// validates it and returns it as an `Arc<Config>`. Logging is not set up yet at
/// this point; callers log the settings with `Config::log_settings` afterwards.
pub fn load_config() -> Result<Arc<Config>, ConfigError> {
    dotenv::dotenv().ok(); // Load .env file if present, ignore errors

    let config = Config::from_env();
    validate(&config)?;

    Ok(Arc::new(config))
}

pub fn validate(config: &Config) -> Result<(), ConfigError> {
    let non_zero = [
        ("CLASSIFICATION_TTL_SECS", config.classification_ttl_secs),
        ("FEED_TTL_SECS", config.feed_ttl_secs),
        ("NOT_FOUND_TTL_SECS", config.not_found_ttl_secs),
        ("REQUEST_TIMEOUT_SECS", config.request_timeout_secs),
    ];
    for (name, value) in non_zero {
        if value == 0 {
            return Err(ConfigError::Invalid {
                name,
                reason: "must be greater than zero".to_string(),
            });
        }
    }
    if config.probe_concurrency == 0 {
        return Err(ConfigError::Invalid {
            name: "PROBE_CONCURRENCY",
            reason: "must be at least 1".to_string(),
        });
    }

    let urls = [
        ("UPSTREAM_FEED_URL", &config.upstream_feed_url),
        ("SHORTS_URL_BASE", &config.shorts_url_base),
    ];
    for (name, value) in urls {
        url::Url::parse(value).map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        })?;
    }
    if !config.no_cache && config.redis_url.is_empty() {
        return Err(ConfigError::Invalid {
            name: "REDIS_URL",
            reason: "cannot be empty unless NO_CACHE is set".to_string(),
        });
    }

    Ok(())
}
