//! Test doubles for the network-facing collaborators and the cache.

use crate::cache::{Cache, MemoryCache, Namespace};
use crate::classifier::Probe;
use crate::error::{CacheError, ProbeError, SourceError};
use crate::feed::source::{FeedSource, UpstreamFeed, UpstreamItem};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Item whose link yields `id`, with guid `yt:video:<id>`.
pub fn upstream_item(id: &str) -> UpstreamItem {
    UpstreamItem {
        guid: format!("yt:video:{}", id),
        title: format!("Video {}", id),
        link: format!("https://www.youtube.com/watch?v={}", id),
        published: Some("2024-05-01T12:00:00+00:00".to_string()),
        updated: Some("2024-05-02T12:00:00+00:00".to_string()),
        description: None,
    }
}

/// Probe answering from a fixed status table; unknown ids answer 404.
#[derive(Debug, Default)]
pub struct StubProbe {
    statuses: HashMap<String, u16>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, item_id: &str, status: u16) -> Self {
        self.statuses.insert(item_id.to_string(), status);
        self
    }

    /// Every probe sleeps for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Probe for StubProbe {
    async fn probe(&self, item_id: &str) -> Result<u16, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.statuses.get(item_id).copied().unwrap_or(404))
    }
}

#[derive(Debug, Clone)]
enum Scripted {
    Feed(UpstreamFeed),
    Status(u16),
}

/// Feed source keyed by URL; unknown URLs are `SourceError::NotFound`.
#[derive(Debug, Default)]
pub struct StubFeedSource {
    feeds: HashMap<String, Scripted>,
    calls: AtomicUsize,
}

impl StubFeedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, url: &str, feed: UpstreamFeed) -> Self {
        self.feeds.insert(url.to_string(), Scripted::Feed(feed));
        self
    }

    /// Makes `url` fail with `SourceError::Status(status)`.
    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.feeds.insert(url.to_string(), Scripted::Status(status));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedSource for StubFeedSource {
    async fn fetch(&self, url: &str) -> Result<UpstreamFeed, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.feeds.get(url) {
            Some(Scripted::Feed(feed)) => Ok(feed.clone()),
            Some(Scripted::Status(status)) => Err(SourceError::Status(*status)),
            None => Err(SourceError::NotFound),
        }
    }
}

/// Cache whose every call fails as if the backend were unreachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingCache;

fn unreachable_backend() -> CacheError {
    CacheError::Redis(redis::RedisError::from((
        redis::ErrorKind::IoError,
        "connection refused",
    )))
}

#[async_trait]
impl Cache for FailingCache {
    async fn get(&self, _namespace: Namespace, _id: &str) -> Result<Option<String>, CacheError> {
        Err(unreachable_backend())
    }

    async fn set(
        &self,
        _namespace: Namespace,
        _id: &str,
        _ttl: Duration,
        _value: &str,
    ) -> Result<(), CacheError> {
        Err(unreachable_backend())
    }
}

/// A write observed by `RecordingCache`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedSet {
    pub namespace: Namespace,
    pub id: String,
    pub ttl: Duration,
    pub value: String,
}

/// `MemoryCache` that also records every call, for asserting TTLs and traffic.
#[derive(Debug, Default)]
pub struct RecordingCache {
    inner: MemoryCache,
    gets: AtomicUsize,
    sets: Mutex<Vec<RecordedSet>>,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> Vec<RecordedSet> {
        self.sets.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Cache for RecordingCache {
    async fn get(&self, namespace: Namespace, id: &str) -> Result<Option<String>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(namespace, id).await
    }

    async fn set(
        &self,
        namespace: Namespace,
        id: &str,
        ttl: Duration,
        value: &str,
    ) -> Result<(), CacheError> {
        if let Ok(mut sets) = self.sets.lock() {
            sets.push(RecordedSet {
                namespace,
                id: id.to_string(),
                ttl,
                value: value.to_string(),
            });
        }
        self.inner.set(namespace, id, ttl, value).await
    }
}

/// `MemoryCache` whose writes to one namespace hang for `delay` before landing.
#[derive(Debug)]
pub struct StallingCache {
    inner: MemoryCache,
    namespace: Namespace,
    delay: Duration,
}

impl StallingCache {
    pub fn new(namespace: Namespace, delay: Duration) -> Self {
        Self {
            inner: MemoryCache::new(),
            namespace,
            delay,
        }
    }
}

#[async_trait]
impl Cache for StallingCache {
    async fn get(&self, namespace: Namespace, id: &str) -> Result<Option<String>, CacheError> {
        self.inner.get(namespace, id).await
    }

    async fn set(
        &self,
        namespace: Namespace,
        id: &str,
        ttl: Duration,
        value: &str,
    ) -> Result<(), CacheError> {
        if namespace == self.namespace {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.set(namespace, id, ttl, value).await
    }
}
