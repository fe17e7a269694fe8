//! Login, token refresh and logout.
//!
//! A login issues an access token and a refresh token. The refresh token is
//! stored, so that logout can revoke it; refreshing needs both a valid
//! signature and a stored token.

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{Method, StatusCode},
    routing::{delete, post, put},
};
use chrono::Utc;
use notesapp_core::ResponseEnvelope;
use serde::{Deserialize, Serialize};

use crate::auth::TokenManager;
use crate::error::ApiResult;
use crate::extract::Payload;
use crate::registrar::{FeatureModule, Route};
use crate::services::{AuthenticationsService, UsersService};
use crate::validation::AuthenticationsValidator;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenPayload {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessToken {
    pub access_token: String,
}

#[derive(Clone)]
pub struct AuthenticationsModule {
    authentications: Arc<dyn AuthenticationsService>,
    users: Arc<dyn UsersService>,
    tokens: Arc<TokenManager>,
    validator: AuthenticationsValidator,
}

impl AuthenticationsModule {
    pub fn new(
        authentications: Arc<dyn AuthenticationsService>,
        users: Arc<dyn UsersService>,
        tokens: Arc<TokenManager>,
        validator: AuthenticationsValidator,
    ) -> Self {
        Self {
            authentications,
            users,
            tokens,
            validator,
        }
    }
}

impl FeatureModule for AuthenticationsModule {
    fn name(&self) -> &'static str {
        "authentications"
    }

    fn routes(&self) -> Vec<Route> {
        vec![
            Route::public(Method::POST, "/authentications", post(login).with_state(self.clone())),
            Route::public(Method::PUT, "/authentications", put(refresh).with_state(self.clone())),
            Route::public(
                Method::DELETE,
                "/authentications",
                delete(logout).with_state(self.clone()),
            ),
        ]
    }
}

async fn login(
    State(module): State<AuthenticationsModule>,
    Payload(payload): Payload<LoginPayload>,
) -> ApiResult<(StatusCode, Json<ResponseEnvelope<TokenPair>>)> {
    module.validator.validate_login_payload(&payload)?;
    let id = module
        .users
        .verify_user_credential(&payload.username, &payload.password)
        .await?;

    let now = Utc::now();
    let access_token = module.tokens.issue_access_token(&id, now)?;
    let refresh_token = module.tokens.issue_refresh_token(&id, now)?;
    module.authentications.add_refresh_token(&refresh_token).await?;

    tracing::info!(user_id = %id, "user logged in");
    Ok((
        StatusCode::CREATED,
        Json(
            ResponseEnvelope::success(TokenPair {
                access_token,
                refresh_token,
            })
            .with_message("authentication added"),
        ),
    ))
}

async fn refresh(
    State(module): State<AuthenticationsModule>,
    Payload(payload): Payload<RefreshTokenPayload>,
) -> ApiResult<Json<ResponseEnvelope<AccessToken>>> {
    module.validator.validate_refresh_token_payload(&payload)?;
    module
        .authentications
        .verify_refresh_token(&payload.refresh_token)
        .await?;
    let id = module.tokens.verify_refresh_token(&payload.refresh_token)?;

    let access_token = module.tokens.issue_access_token(&id, Utc::now())?;
    Ok(Json(
        ResponseEnvelope::success(AccessToken { access_token }).with_message("access token refreshed"),
    ))
}

async fn logout(
    State(module): State<AuthenticationsModule>,
    Payload(payload): Payload<RefreshTokenPayload>,
) -> ApiResult<Json<ResponseEnvelope>> {
    module.validator.validate_refresh_token_payload(&payload)?;
    module
        .authentications
        .verify_refresh_token(&payload.refresh_token)
        .await?;
    module
        .authentications
        .delete_refresh_token(&payload.refresh_token)
        .await?;
    Ok(Json(ResponseEnvelope::acknowledged("refresh token deleted")))
}
