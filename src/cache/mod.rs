//! Key/value cache with per-entry expiry.
//!
//! Every backend honours the same contract: `get` returns `Ok(None)` for a key that
//! was never written *and* for a key whose TTL has elapsed; the two are
//! indistinguishable. Any other failure is an `Err`, never a miss.
//!
//! Implementations must be safe to share between concurrent requests; the server
//! holds a single `Arc<dyn Cache>` for the whole process.

pub mod memory;
pub mod noop;
pub mod redis_cache;

pub use memory::MemoryCache;
pub use noop::NoopCache;
pub use redis_cache::RedisCache;

use crate::error::CacheError;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

/// Prefix shared by every key this crate writes to an external store.
pub const KEY_PREFIX: &str = "enteral-cache";

/// Logical key spaces. None of the names contain `:`, which keeps
/// `prefix:namespace:id` unambiguous for any `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    IsShort,
    FilteredFeed,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::IsShort => "is-short",
            Namespace::FilteredFeed => "filtered-feed",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps `(namespace, id)` onto a single backend key.
pub fn backend_key(namespace: Namespace, id: &str) -> String {
    format!("{}:{}:{}", KEY_PREFIX, namespace, id)
}

/// Whole milliseconds of `ttl`; zero is rejected because no backend can honour it.
pub(crate) fn ttl_millis(ttl: Duration) -> Result<u64, CacheError> {
    let ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
    if ms == 0 {
        return Err(CacheError::InvalidTtl(ttl));
    }
    Ok(ms)
}

#[async_trait]
pub trait Cache: Send + Sync {
    /// Returns the stored value, or `Ok(None)` when the key is absent or expired.
    async fn get(&self, namespace: Namespace, id: &str) -> Result<Option<String>, CacheError>;

    /// Stores `value` with a mandatory TTL enforced by the backend. Once this returns
    /// `Ok`, subsequent `get`s for the same pair observe the value.
    async fn set(
        &self,
        namespace: Namespace,
        id: &str,
        ttl: Duration,
        value: &str,
    ) -> Result<(), CacheError>;
}
