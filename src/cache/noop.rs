use super::{Cache, Namespace};
use crate::error::CacheError;
use async_trait::async_trait;
use std::time::Duration;

/// Cache that never stores anything. Selected with `NO_CACHE=1`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait]
impl Cache for NoopCache {
    async fn get(&self, _namespace: Namespace, _id: &str) -> Result<Option<String>, CacheError> {
        Ok(None)
    }

    async fn set(
        &self,
        _namespace: Namespace,
        _id: &str,
        _ttl: Duration,
        _value: &str,
    ) -> Result<(), CacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_cache_swallows_writes() {
        let cache = NoopCache;
        cache
            .set(Namespace::IsShort, "id", Duration::from_secs(60), "1")
            .await
            .unwrap();
        assert_eq!(cache.get(Namespace::IsShort, "id").await.unwrap(), None);
    }
}
