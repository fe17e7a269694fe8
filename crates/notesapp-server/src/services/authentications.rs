//! Refresh tokens currently in circulation.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{ApiError, ApiResult};

#[async_trait]
pub trait AuthenticationsService: Send + Sync {
    async fn add_refresh_token(&self, token: &str) -> ApiResult<()>;

    /// Client fault unless `token` is stored.
    async fn verify_refresh_token(&self, token: &str) -> ApiResult<()>;

    async fn delete_refresh_token(&self, token: &str) -> ApiResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryAuthentications {
    tokens: RwLock<HashSet<String>>,
}

impl MemoryAuthentications {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuthenticationsService for MemoryAuthentications {
    async fn add_refresh_token(&self, token: &str) -> ApiResult<()> {
        self.tokens.write().await.insert(token.to_string());
        Ok(())
    }

    async fn verify_refresh_token(&self, token: &str) -> ApiResult<()> {
        if self.tokens.read().await.contains(token) {
            Ok(())
        } else {
            Err(ApiError::BadRequest("refresh token invalid: not issued or revoked".to_string()))
        }
    }

    async fn delete_refresh_token(&self, token: &str) -> ApiResult<()> {
        self.tokens.write().await.remove(token);
        Ok(())
    }
}
