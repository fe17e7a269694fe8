//! User accounts.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::RwLock;

use crate::auth::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::services::new_id;

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub fullname: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub fullname: String,
}

#[async_trait]
pub trait UsersService: Send + Sync {
    /// Create a user; a taken username is a client fault.
    async fn add_user(&self, user: NewUser) -> ApiResult<String>;

    async fn get_user_by_id(&self, id: &str) -> ApiResult<User>;

    /// Users whose username contains `fragment`.
    async fn get_users_by_username(&self, fragment: &str) -> ApiResult<Vec<User>>;

    /// Check a username/password pair and return the user id.
    async fn verify_user_credential(&self, username: &str, password: &str) -> ApiResult<String>;
}

struct Account {
    user: User,
    password_hash: String,
}

#[derive(Default)]
pub struct MemoryUsers {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsersService for MemoryUsers {
    async fn add_user(&self, user: NewUser) -> ApiResult<String> {
        let password_hash = hash_password(&user.password)?;

        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.user.username == user.username) {
            return Err(ApiError::BadRequest(format!(
                "username {} is already taken",
                user.username
            )));
        }

        let id = new_id("user");
        accounts.insert(
            id.clone(),
            Account {
                user: User {
                    id: id.clone(),
                    username: user.username,
                    fullname: user.fullname,
                },
                password_hash,
            },
        );
        Ok(id)
    }

    async fn get_user_by_id(&self, id: &str) -> ApiResult<User> {
        self.accounts
            .read()
            .await
            .get(id)
            .map(|a| a.user.clone())
            .ok_or_else(|| ApiError::NotFound(format!("user {id}")))
    }

    async fn get_users_by_username(&self, fragment: &str) -> ApiResult<Vec<User>> {
        let accounts = self.accounts.read().await;
        let mut users: Vec<User> = accounts
            .values()
            .filter(|a| a.user.username.contains(fragment))
            .map(|a| a.user.clone())
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn verify_user_credential(&self, username: &str, password: &str) -> ApiResult<String> {
        let (id, hash) = {
            let accounts = self.accounts.read().await;
            match accounts.values().find(|a| a.user.username == username) {
                Some(a) => (a.user.id.clone(), a.password_hash.clone()),
                None => return Err(ApiError::Unauthorized("Invalid credentials".to_string())),
            }
        };

        if !verify_password(password, &hash)? {
            return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
        }
        Ok(id)
    }
}

impl std::fmt::Debug for MemoryUsers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryUsers").finish_non_exhaustive()
    }
}
