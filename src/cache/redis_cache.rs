//! Durable cache on Redis/Valkey.

use super::{backend_key, ttl_millis, Cache, Namespace};
use crate::error::CacheError;
use async_trait::async_trait;
use log::{debug, error, info, warn};
use redis::{aio::ConnectionManager, AsyncCommands};
use std::fmt;
use std::time::Duration;

/// Shared Redis client.
/// `ConnectionManager` is cheap to clone and multiplexes one reconnecting
/// connection, so a single `RedisCache` serves all concurrent requests.
#[derive(Clone)]
pub struct RedisCache {
    conn_manager: ConnectionManager,
    redis_url: String,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("redis_url", &self.redis_url)
            .field("conn_manager", &"<ConnectionManager instance>")
            .finish()
    }
}

impl RedisCache {
    pub async fn new(redis_url: &str) -> Result<Self, CacheError> {
        info!("Initializing Redis connection manager for URL: {}", redis_url);
        let client = redis::Client::open(redis_url)?;
        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            error!("Failed to create Redis ConnectionManager: {}", e);
            e
        })?;
        info!("Redis ConnectionManager initialized successfully.");
        Ok(Self {
            conn_manager,
            redis_url: redis_url.to_string(),
        })
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, namespace: Namespace, id: &str) -> Result<Option<String>, CacheError> {
        let key = backend_key(namespace, id);
        let mut conn = self.conn_manager.clone();

        match conn.get::<_, Option<String>>(&key).await {
            Ok(Some(value)) => {
                debug!("Cache HIT for key: {}", key);
                Ok(Some(value))
            }
            Ok(None) => {
                debug!("Cache MISS for key: {}", key);
                Ok(None)
            }
            Err(e) => {
                warn!("Redis GET error for key {}: {}", key, e);
                Err(e.into())
            }
        }
    }

    async fn set(
        &self,
        namespace: Namespace,
        id: &str,
        ttl: Duration,
        value: &str,
    ) -> Result<(), CacheError> {
        let ttl_ms = ttl_millis(ttl)?;
        let key = backend_key(namespace, id);
        let mut conn = self.conn_manager.clone();

        let result = redis::cmd("SET")
            .arg(&key)
            .arg(value)
            .arg("PX")
            .arg(ttl_ms)
            .query_async::<_, ()>(&mut conn)
            .await;

        match result {
            Ok(()) => {
                debug!("Cache SET PX success for key: {} with TTL: {}ms", key, ttl_ms);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to SET key '{}' in Redis: {}", key, e);
                Err(e.into())
            }
        }
    }
}
