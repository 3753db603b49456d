//! Best-effort key/value cache with expiration.
//!
//! Every operation swallows backend failures: they are logged and turned
//! into `None` / `false`, so callers must never rely on the cache for
//! correctness.

use async_trait::async_trait;
use cn_core::{Error, Result};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub mod backends;

pub use backends::*;

const DEFAULT_EXPIRATION_SECS: u64 = 3600;

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Value stored under `key`, or `None` when missing, expired or unreachable
    async fn get_cache(&self, key: &str) -> Option<String>;

    /// Store `value` for `expiration` seconds (backend default when `None`)
    async fn set_cache(&self, key: &str, value: &str, expiration: Option<u64>) -> bool;

    async fn delete_cache(&self, key: &str) -> bool;
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub default_ttl_secs: u64,
    pub timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            password: None,
            default_ttl_secs: DEFAULT_EXPIRATION_SECS,
            timeout: Duration::from_secs(5),
        }
    }
}

impl CacheConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            host: env::var("REDIS_HOST").unwrap_or(defaults.host),
            port: parse_env("REDIS_PORT")?.unwrap_or(defaults.port),
            password: env::var("REDIS_PASSWORD").ok().filter(|p| !p.is_empty()),
            default_ttl_secs: parse_env("REDIS_EXPIRATION")?.unwrap_or(defaults.default_ttl_secs),
            timeout: defaults.timeout,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// `redis://` URL with the password percent-encoded
    pub fn connection_url(&self) -> Result<Url> {
        let mut url = Url::parse(&format!("redis://{}/", self.address()))?;
        if let Some(password) = &self.password {
            url.set_password(Some(password))
                .map_err(|_| Error::Config(format!("Cannot set Redis password on {}", self.address())))?;
        }
        Ok(url)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} is not a valid number: {}", name, raw))),
        Err(_) => Ok(None),
    }
}

pub async fn create_cache(backend: &str, config: CacheConfig) -> Result<Arc<dyn CacheStore>> {
    match backend {
        "redis" => Ok(Arc::new(RedisCache::new(config)?)),
        "memory" => Ok(Arc::new(MemoryCache::new(config.default_ttl_secs))),
        other => Err(Error::Config(format!("Unknown cache backend: {}", other))),
    }
}
