use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: String,
    pub no_cache: bool,
    pub listen_addr: String,
    pub upstream_feed_url: String,
    pub shorts_url_base: String,
    pub classification_ttl_secs: u64,
    pub feed_ttl_secs: u64,
    pub not_found_ttl_secs: u64,
    pub request_timeout_secs: u64,
    pub probe_concurrency: usize,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            redis_url: "redis://127.0.0.1:6379".to_string(),
            no_cache: false,
            listen_addr: "0.0.0.0:5000".to_string(),
            upstream_feed_url: "https://www.youtube.com/feeds/videos.xml".to_string(),
            shorts_url_base: "https://www.youtube.com/shorts".to_string(),
            classification_ttl_secs: 72 * 60 * 60,
            feed_ttl_secs: 15 * 60,
            not_found_ttl_secs: 72 * 60 * 60,
            request_timeout_secs: 30,
            probe_concurrency: 1,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Config {
            redis_url: env::var("REDIS_URL")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.redis_url),
            no_cache: env::var("NO_CACHE")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            listen_addr: env::var("LISTEN_ADDR")
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or(defaults.listen_addr),
            upstream_feed_url: env::var("UPSTREAM_FEED_URL").unwrap_or(defaults.upstream_feed_url),
            shorts_url_base: env::var("SHORTS_URL_BASE").unwrap_or(defaults.shorts_url_base),
            classification_ttl_secs: env::var("CLASSIFICATION_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.classification_ttl_secs),
            feed_ttl_secs: env::var("FEED_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.feed_ttl_secs),
            not_found_ttl_secs: env::var("NOT_FOUND_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.not_found_ttl_secs),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            probe_concurrency: env::var("PROBE_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.probe_concurrency),
            log_level: env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    pub fn classification_ttl(&self) -> Duration {
        Duration::from_secs(self.classification_ttl_secs)
    }

    pub fn feed_ttl(&self) -> Duration {
        Duration::from_secs(self.feed_ttl_secs)
    }

    pub fn not_found_ttl(&self) -> Duration {
        Duration::from_secs(self.not_found_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn log_settings(&self) {
        log::info!("Application Configuration Loaded: {:?}", self);
        if self.no_cache {
            log::warn!("NO_CACHE is set, every request will hit upstream");
        }
    }
}
