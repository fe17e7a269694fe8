//! Key/value cache with per-entry expiry.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::ApiResult;

#[async_trait]
pub trait CacheService: Send + Sync {
    async fn set(&self, key: &str, value: String, ttl: Duration) -> ApiResult<()>;

    /// `None` when the key is absent or expired.
    async fn get(&self, key: &str) -> ApiResult<Option<String>>;

    async fn delete(&self, key: &str) -> ApiResult<()>;
}

/// In-process cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, (String, Option<Instant>)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn set(&self, key: &str, value: String, ttl: Duration) -> ApiResult<()> {
        // An expiry past what `Instant` can represent never expires.
        let expires_at = Instant::now().checked_add(ttl);
        self.entries
            .write()
            .await
            .insert(key.to_string(), (value, expires_at));
        Ok(())
    }

    async fn get(&self, key: &str) -> ApiResult<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| expires_at.is_none_or(|at| at > Instant::now()))
            .map(|(value, _)| value.clone()))
    }

    async fn delete(&self, key: &str) -> ApiResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}
