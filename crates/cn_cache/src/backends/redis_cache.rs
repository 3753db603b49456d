use async_trait::async_trait;
use cn_core::{Error, Result};
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use std::fmt;
use std::future::Future;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use crate::{CacheConfig, CacheStore};

/// Redis-backed cache.
///
/// The connection is opened on first use and dropped after any failed
/// command; the next call reconnects.
pub struct RedisCache {
    client: redis::Client,
    connection: Mutex<Option<MultiplexedConnection>>,
    config: CacheConfig,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("address", &self.config.address())
            .field("password", &self.config.password.as_ref().map(|_| "<redacted>"))
            .field("default_ttl_secs", &self.config.default_ttl_secs)
            .finish()
    }
}

impl RedisCache {
    pub fn new(config: CacheConfig) -> Result<Self> {
        let url = config.connection_url()?;
        let client = redis::Client::open(url.as_str()).map_err(|e| Error::Cache(e.to_string()))?;
        info!(
            "Redis cache configured for {} (default TTL {}s)",
            config.address(),
            config.default_ttl_secs
        );
        Ok(Self {
            client,
            connection: Mutex::new(None),
            config,
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        let mut guard = self.connection.lock().await;
        if let Some(conn) = guard.as_ref() {
            return Ok(conn.clone());
        }
        debug!("Opening Redis connection to {}", self.config.address());
        let conn = self
            .bounded(self.client.get_multiplexed_async_connection())
            .await?;
        *guard = Some(conn.clone());
        Ok(conn)
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.config.timeout, fut).await {
            Ok(result) => result.map_err(|e| Error::Cache(e.to_string())),
            Err(_) => Err(Error::Cache(format!(
                "Redis at {} did not answer within {:?}",
                self.config.address(),
                self.config.timeout
            ))),
        }
    }

    async fn reset(&self) {
        *self.connection.lock().await = None;
    }

    async fn try_get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        self.bounded(conn.get::<_, Option<String>>(key)).await
    }

    async fn try_set(&self, key: &str, value: &str, ttl: u64) -> Result<()> {
        let mut conn = self.connection().await?;
        self.bounded(conn.set_ex::<_, _, ()>(key, value, ttl)).await
    }

    async fn try_delete(&self, key: &str) -> Result<i64> {
        let mut conn = self.connection().await?;
        self.bounded(conn.del::<_, i64>(key)).await
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get_cache(&self, key: &str) -> Option<String> {
        match self.try_get(key).await {
            Ok(value) => value,
            Err(e) => {
                error!("Redis get error: {}", e);
                self.reset().await;
                None
            }
        }
    }

    async fn set_cache(&self, key: &str, value: &str, expiration: Option<u64>) -> bool {
        let ttl = expiration.unwrap_or(self.config.default_ttl_secs);
        match self.try_set(key, value, ttl).await {
            Ok(()) => true,
            Err(e) => {
                error!("Redis set error: {}", e);
                self.reset().await;
                false
            }
        }
    }

    async fn delete_cache(&self, key: &str) -> bool {
        match self.try_delete(key).await {
            Ok(count) => count > 0,
            Err(e) => {
                error!("Redis delete error: {}", e);
                self.reset().await;
                false
            }
        }
    }
}
