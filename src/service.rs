//! Cache-aside layer over the feed filter.
//!
//! Rendered documents are stored under `filtered-feed:<channelId>` for the
//! positive TTL; a missing upstream feed is stored as a negative marker for the
//! (much longer) negative TTL. Failures other than "not found" are never cached.

use crate::cache::{Cache, Namespace};
use crate::error::{FeedError, FilterError};
use crate::feed::source::channel_feed_url;
use crate::feed::{render, FeedFilter};
use crate::utils::cancellable;
use log::{debug, error, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Stored value for a negative result. Rendered documents start with an XML
/// declaration, so they never decode as this marker.
pub const NOT_FOUND_MARKER: &str = "404";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedTtls {
    pub found: Duration,
    pub not_found: Duration,
}

impl Default for FeedTtls {
    fn default() -> Self {
        FeedTtls {
            found: Duration::from_secs(15 * 60),
            not_found: Duration::from_secs(72 * 60 * 60),
        }
    }
}

/// Decoded state of a `filtered-feed` cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CachedFeed {
    Absent,
    NegativeHit,
    PositiveHit(String),
}

impl CachedFeed {
    pub fn decode(value: Option<String>) -> Self {
        match value {
            None => CachedFeed::Absent,
            Some(v) if v == NOT_FOUND_MARKER => CachedFeed::NegativeHit,
            Some(v) => CachedFeed::PositiveHit(v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedResponse {
    /// Rendered Atom document
    Document(String),
    NotFound,
}

#[derive(Clone)]
pub struct FeedService {
    cache: Arc<dyn Cache>,
    filter: FeedFilter,
    upstream_base: Url,
    ttls: FeedTtls,
}

impl FeedService {
    pub fn new(cache: Arc<dyn Cache>, filter: FeedFilter, upstream_base: Url, ttls: FeedTtls) -> Self {
        Self {
            cache,
            filter,
            upstream_base,
            ttls,
        }
    }

    pub async fn get_feed(
        &self,
        channel_id: &str,
        cancel: &CancellationToken,
    ) -> Result<FeedResponse, FeedError> {
        let lookup = self.cache.get(Namespace::FilteredFeed, channel_id);
        let cached = match cancellable(cancel, lookup).await? {
            Ok(value) => CachedFeed::decode(value),
            Err(e) => {
                warn!("Feed: cache get error: {}", e);
                CachedFeed::Absent
            }
        };

        match cached {
            CachedFeed::NegativeHit => {
                debug!("Feed {}: cached not-found", channel_id);
                return Ok(FeedResponse::NotFound);
            }
            CachedFeed::PositiveHit(doc) => {
                debug!("Feed {}: cached document", channel_id);
                return Ok(FeedResponse::Document(doc));
            }
            CachedFeed::Absent => {}
        }

        let url = channel_feed_url(&self.upstream_base, channel_id);
        let feed = match self.filter.filter_feed(channel_id, url.as_str(), cancel).await {
            Ok(feed) => feed,
            Err(FilterError::NotFound) => {
                self.store(channel_id, self.ttls.not_found, NOT_FOUND_MARKER, cancel)
                    .await;
                return Ok(FeedResponse::NotFound);
            }
            Err(e) => {
                error!("while processing {}: {}", url, e);
                return Err(e.into());
            }
        };

        let doc = render::to_atom(&feed).map_err(|e| {
            error!("while generating atom for {}: {}", url, e);
            e
        })?;

        self.store(channel_id, self.ttls.found, &doc, cancel).await;
        Ok(FeedResponse::Document(doc))
    }

    /// Best-effort write. The response is already computed, so a failed or
    /// cancelled write is only logged.
    async fn store(&self, channel_id: &str, ttl: Duration, value: &str, cancel: &CancellationToken) {
        let write = self.cache.set(Namespace::FilteredFeed, channel_id, ttl, value);
        match cancellable(cancel, write).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Feed: cache set error for {}: {}", channel_id, e),
            Err(e) => warn!("Feed: cache set for {} abandoned: {}", channel_id, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::classifier::Classifier;
    use crate::feed::UpstreamFeed;
    use crate::testing::{upstream_item, FailingCache, StallingCache, StubFeedSource, StubProbe};

    const BASE: &str = "https://feeds.example.com/videos.xml";

    fn upstream_url(channel_id: &str) -> String {
        format!("{}?channel_id={}", BASE, channel_id)
    }

    fn service(cache: Arc<dyn Cache>, source: Arc<StubFeedSource>, ttls: FeedTtls) -> FeedService {
        let probe = StubProbe::new().with_status("long", 303).with_status("short", 200);
        let classifier = Classifier::new(cache.clone(), Arc::new(probe), Duration::from_secs(60));
        let filter = FeedFilter::new(source, classifier);
        FeedService::new(cache, filter, Url::parse(BASE).unwrap(), ttls)
    }

    fn channel_feed() -> UpstreamFeed {
        UpstreamFeed {
            title: "Chan".to_string(),
            link: Some("https://example.com/c".to_string()),
            authors: vec!["Chan".to_string()],
            published: None,
            items: vec![upstream_item("long"), upstream_item("short")],
        }
    }

    #[test]
    fn test_cached_feed_decode() {
        assert_eq!(CachedFeed::decode(None), CachedFeed::Absent);
        assert_eq!(CachedFeed::decode(Some("404".to_string())), CachedFeed::NegativeHit);
        assert_eq!(
            CachedFeed::decode(Some("<?xml ...".to_string())),
            CachedFeed::PositiveHit("<?xml ...".to_string())
        );
    }

    #[tokio::test]
    async fn test_document_cached_and_reused() {
        let cache = Arc::new(MemoryCache::new());
        let source = Arc::new(StubFeedSource::new().with_feed(&upstream_url("UC1"), channel_feed()));
        let svc = service(cache.clone(), source.clone(), FeedTtls::default());
        let cancel = CancellationToken::new();

        let first = svc.get_feed("UC1", &cancel).await.unwrap();
        let FeedResponse::Document(doc) = first.clone() else {
            panic!("expected document, got {:?}", first);
        };
        assert!(doc.contains("yt:video:long"));
        assert!(!doc.contains("yt:video:short"));
        assert_eq!(
            cache.get(Namespace::FilteredFeed, "UC1").await.unwrap(),
            Some(doc.clone())
        );

        let second = svc.get_feed("UC1", &cancel).await.unwrap();
        assert_eq!(second, first);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_not_found_cached_negatively() {
        let cache = Arc::new(MemoryCache::new());
        let source = Arc::new(StubFeedSource::new());
        let svc = service(cache.clone(), source.clone(), FeedTtls::default());
        let cancel = CancellationToken::new();

        assert_eq!(svc.get_feed("gone", &cancel).await.unwrap(), FeedResponse::NotFound);
        assert_eq!(
            cache.get(Namespace::FilteredFeed, "gone").await.unwrap().as_deref(),
            Some(NOT_FOUND_MARKER)
        );

        assert_eq!(svc.get_feed("gone", &cancel).await.unwrap(), FeedResponse::NotFound);
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_negative_entry_expires_independently() {
        let cache = Arc::new(MemoryCache::new());
        let source = Arc::new(StubFeedSource::new());
        let ttls = FeedTtls {
            found: Duration::from_secs(60),
            not_found: Duration::from_millis(30),
        };
        let svc = service(cache, source.clone(), ttls);
        let cancel = CancellationToken::new();

        svc.get_feed("gone", &cancel).await.unwrap();
        tokio::time::sleep(Duration::from_millis(80)).await;
        svc.get_feed("gone", &cancel).await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_upstream_error_not_cached() {
        let cache = Arc::new(MemoryCache::new());
        let source = Arc::new(StubFeedSource::new().with_status(&upstream_url("UC1"), 500));
        let svc = service(cache.clone(), source.clone(), FeedTtls::default());
        let cancel = CancellationToken::new();

        let result = svc.get_feed("UC1", &cancel).await;
        assert!(matches!(result, Err(FeedError::Filter(FilterError::Upstream(_)))));
        assert_eq!(cache.get(Namespace::FilteredFeed, "UC1").await.unwrap(), None);

        let _ = svc.get_feed("UC1", &cancel).await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_cache_failures_do_not_fail_response() {
        let source = Arc::new(StubFeedSource::new().with_feed(&upstream_url("UC1"), channel_feed()));
        let svc = service(Arc::new(FailingCache), source.clone(), FeedTtls::default());
        let cancel = CancellationToken::new();

        let result = svc.get_feed("UC1", &cancel).await.unwrap();
        assert!(matches!(result, FeedResponse::Document(_)));
        assert_eq!(svc.get_feed("missing", &cancel).await.unwrap(), FeedResponse::NotFound);
    }

    #[tokio::test]
    async fn test_cancelled_request_is_an_error() {
        let cache = Arc::new(MemoryCache::new());
        let source = Arc::new(StubFeedSource::new().with_feed(&upstream_url("UC1"), channel_feed()));
        let svc = service(cache.clone(), source.clone(), FeedTtls::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = svc.get_feed("UC1", &cancel).await;
        assert!(matches!(result, Err(FeedError::Cancelled(_))));
        assert_eq!(source.calls(), 0);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_write_still_returns_document() {
        let cache = Arc::new(StallingCache::new(Namespace::FilteredFeed, Duration::from_secs(30)));
        let source = Arc::new(StubFeedSource::new().with_feed(&upstream_url("UC1"), channel_feed()));
        let svc = service(cache.clone(), source, FeedTtls::default());
        let cancel = CancellationToken::new();
        let deadline = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            deadline.cancel();
        });

        let result = svc.get_feed("UC1", &cancel).await.unwrap();
        let FeedResponse::Document(doc) = result else {
            panic!("expected document, got {:?}", result);
        };
        assert!(doc.contains("yt:video:long"));
        assert_eq!(cache.get(Namespace::FilteredFeed, "UC1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cancelled_marker_write_still_returns_not_found() {
        let cache = Arc::new(StallingCache::new(Namespace::FilteredFeed, Duration::from_secs(30)));
        let svc = service(cache, Arc::new(StubFeedSource::new()), FeedTtls::default());
        let cancel = CancellationToken::new();
        let deadline = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            deadline.cancel();
        });

        assert_eq!(svc.get_feed("gone", &cancel).await.unwrap(), FeedResponse::NotFound);
    }
}
