//! In-process cache backed by a `DashMap`. Expired entries are dropped lazily on read.

use super::{backend_key, ttl_millis, Cache, Namespace};
use crate::error::CacheError;
use async_trait::async_trait;
use dashmap::DashMap;
use log::debug;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Arc<DashMap<String, Entry>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing is stored, counting expired entries not yet evicted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, namespace: Namespace, id: &str) -> Result<Option<String>, CacheError> {
        let key = backend_key(namespace, id);
        let now = Instant::now();

        if let Some(entry) = self.entries.get(&key) {
            if entry.expires_at > now {
                debug!("Cache HIT for key: {}", key);
                return Ok(Some(entry.value.clone()));
            }
        } else {
            debug!("Cache MISS for key: {}", key);
            return Ok(None);
        }

        // The read guard is released above; only remove if still expired.
        self.entries.remove_if(&key, |_, entry| entry.expires_at <= now);
        debug!("Cache entry expired for key: {}", key);
        Ok(None)
    }

    async fn set(
        &self,
        namespace: Namespace,
        id: &str,
        ttl: Duration,
        value: &str,
    ) -> Result<(), CacheError> {
        let ttl = Duration::from_millis(ttl_millis(ttl)?);
        let key = backend_key(namespace, id);
        self.entries.insert(
            key,
            Entry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }
}
