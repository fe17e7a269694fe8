//! User registration and lookup.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    routing::{get, post},
};
use notesapp_core::ResponseEnvelope;
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::extract::Payload;
use crate::registrar::{FeatureModule, Route};
use crate::services::{NewUser, User, UsersService};
use crate::validation::UsersValidator;

#[derive(Debug, Clone, Deserialize)]
pub struct UserPayload {
    pub username: String,
    pub password: String,
    pub fullname: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCreated {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
pub struct UserDetail {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct UserList {
    pub users: Vec<User>,
}

#[derive(Debug, Deserialize)]
pub struct UserSearch {
    #[serde(default)]
    pub username: String,
}

#[derive(Clone)]
pub struct UsersModule {
    service: Arc<dyn UsersService>,
    validator: UsersValidator,
}

impl UsersModule {
    pub fn new(service: Arc<dyn UsersService>, validator: UsersValidator) -> Self {
        Self { service, validator }
    }
}

impl FeatureModule for UsersModule {
    fn name(&self) -> &'static str {
        "users"
    }

    fn routes(&self) -> Vec<Route> {
        vec![
            Route::public(Method::POST, "/users", post(add_user).with_state(self.clone())),
            Route::public(Method::GET, "/users", get(search_users).with_state(self.clone())),
            Route::public(Method::GET, "/users/{id}", get(get_user).with_state(self.clone())),
        ]
    }
}

async fn add_user(
    State(module): State<UsersModule>,
    Payload(payload): Payload<UserPayload>,
) -> ApiResult<(StatusCode, Json<ResponseEnvelope<UserCreated>>)> {
    module.validator.validate_user_payload(&payload)?;
    let user_id = module
        .service
        .add_user(NewUser {
            username: payload.username,
            password: payload.password,
            fullname: payload.fullname,
        })
        .await?;

    tracing::info!(%user_id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(ResponseEnvelope::success(UserCreated { user_id }).with_message("user added")),
    ))
}

async fn get_user(
    State(module): State<UsersModule>,
    Path(id): Path<String>,
) -> ApiResult<Json<ResponseEnvelope<UserDetail>>> {
    let user = module.service.get_user_by_id(&id).await?;
    Ok(Json(ResponseEnvelope::success(UserDetail { user })))
}

async fn search_users(
    State(module): State<UsersModule>,
    Query(search): Query<UserSearch>,
) -> ApiResult<Json<ResponseEnvelope<UserList>>> {
    let users = module.service.get_users_by_username(&search.username).await?;
    Ok(Json(ResponseEnvelope::success(UserList { users })))
}
