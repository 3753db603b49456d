use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use crate::CacheStore;

struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-process cache that enforces expiry on read.
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
    default_ttl_secs: u64,
}

impl MemoryCache {
    pub fn new(default_ttl_secs: u64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl_secs,
        }
    }

    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.read().await.values().filter(|e| e.expires_at > now).count()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get_cache(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.expires_at > now => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        debug!("Cache entry expired: {}", key);
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|e| e.expires_at <= now) {
            entries.remove(key);
        }
        None
    }

    async fn set_cache(&self, key: &str, value: &str, expiration: Option<u64>) -> bool {
        let ttl = expiration.unwrap_or(self.default_ttl_secs);
        if ttl == 0 {
            warn!("Cache set error: invalid expire time for key {}", key);
            return false;
        }
        let Some(expires_at) = Instant::now().checked_add(Duration::from_secs(ttl)) else {
            warn!("Cache set error: expire time {}s out of range for key {}", ttl, key);
            return false;
        };
        let entry = Entry {
            value: value.to_string(),
            expires_at,
        };
        self.entries.write().await.insert(key.to_string(), entry);
        true
    }

    async fn delete_cache(&self, key: &str) -> bool {
        self.entries.write().await.remove(key).is_some()
    }
}
