// src/main.rs
use anyhow::Context;
use enteral::{
    cache::{Cache, NoopCache, RedisCache},
    classifier::{Classifier, HttpProbe},
    config,
    feed::{FeedFilter, HttpFeedSource},
    server::{self, AppState},
    service::{FeedService, FeedTtls},
    utils::setup_logging,
};
use log::{info, warn};
use std::sync::Arc;
use url::Url;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_config = config::load_config()?;
    setup_logging(&app_config.log_level).context("Failed to initialize logging")?;
    app_config.log_settings();

    let cache: Arc<dyn Cache> = if app_config.no_cache {
        warn!("Caching disabled, using no-op cache");
        Arc::new(NoopCache)
    } else {
        Arc::new(
            RedisCache::new(&app_config.redis_url)
                .await
                .context("Failed to connect to Redis")?,
        )
    };

    let probe = HttpProbe::new(&app_config.shorts_url_base)?;
    let classifier = Classifier::new(cache.clone(), Arc::new(probe), app_config.classification_ttl());
    let filter = FeedFilter::new(Arc::new(HttpFeedSource::new()), classifier)
        .with_concurrency(app_config.probe_concurrency);

    let upstream_base = Url::parse(&app_config.upstream_feed_url)?;
    let ttls = FeedTtls {
        found: app_config.feed_ttl(),
        not_found: app_config.not_found_ttl(),
    };
    let service = FeedService::new(cache, filter, upstream_base, ttls);

    let state = AppState {
        service: Arc::new(service),
        request_timeout: app_config.request_timeout(),
    };

    let listener = tokio::net::TcpListener::bind(&app_config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", app_config.listen_addr))?;
    server::serve(listener, state).await?;

    info!("server stopped");
    Ok(())
}
