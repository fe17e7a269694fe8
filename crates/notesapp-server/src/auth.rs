//! Authentication: bearer-token verification, token issuance and password hashing.

use std::sync::Arc;
use std::time::Duration;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use notesapp_core::Identity;
use serde::{Deserialize, Serialize};

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};

/// Payload of access and refresh tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Principal identifier.
    pub id: String,
    /// Issued at (unix seconds).
    #[serde(default)]
    pub iat: Option<i64>,
    /// Optional expiry (unix seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Why a bearer token was refused.
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("token carries no iat claim")]
    MissingIssuedAt,

    #[error("token carries an empty id claim")]
    MissingId,

    #[error("token issued in the future")]
    IssuedInFuture,

    #[error("token older than {max_age_secs}s")]
    TooOld { max_age_secs: u64 },

    #[error("token expired")]
    Expired,
}

impl From<VerifyError> for ApiError {
    fn from(e: VerifyError) -> Self {
        ApiError::Unauthorized(e.to_string())
    }
}

/// Validates signed bearer tokens and extracts the caller identity.
///
/// Only the HS256 signature and the token age are checked. Audience, issuer
/// and subject claims are not validated.
pub struct CredentialVerifier {
    key: DecodingKey,
    validation: Validation,
    max_age: Duration,
}

impl CredentialVerifier {
    pub fn new(secret: &str, max_age: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time-based checks run against the clock passed to `verify`.
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            max_age,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(&config.access_token_key, config.access_token_age)
    }

    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Verify `token` as of `now`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, VerifyError> {
        let claims = jsonwebtoken::decode::<TokenClaims>(token, &self.key, &self.validation)?.claims;

        let now = now.timestamp();
        let issued_at = claims.iat.ok_or(VerifyError::MissingIssuedAt)?;
        if issued_at > now {
            return Err(VerifyError::IssuedInFuture);
        }
        let max_age_secs = self.max_age.as_secs();
        let max_age = i64::try_from(max_age_secs).unwrap_or(i64::MAX);
        match now.checked_sub(issued_at) {
            Some(age) if age <= max_age => {}
            _ => return Err(VerifyError::TooOld { max_age_secs }),
        }
        if claims.exp.is_some_and(|exp| now >= exp) {
            return Err(VerifyError::Expired);
        }
        if claims.id.is_empty() {
            return Err(VerifyError::MissingId);
        }

        Ok(Identity::new(claims.id))
    }
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

/// Middleware for routes that require an authenticated caller.
///
/// Verifies the bearer token and inserts the resulting [`Identity`] into the
/// request extensions before the handler runs.
pub async fn authenticate(
    State(verifier): State<Arc<CredentialVerifier>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = request
        .headers()
        .typed_get::<Authorization<Bearer>>()
        .ok_or_else(|| ApiError::Unauthorized("missing Authorization: Bearer <token> header".into()))?;

    let identity = verifier.verify(bearer.token(), Utc::now()).map_err(|e| {
        tracing::debug!(error = %e, "bearer token rejected");
        e
    })?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Issues access and refresh tokens, and checks refresh tokens.
pub struct TokenManager {
    access_key: EncodingKey,
    refresh_key: EncodingKey,
    refresh_decoding: DecodingKey,
    refresh_validation: Validation,
}

impl TokenManager {
    pub fn new(access_secret: &str, refresh_secret: &str) -> Self {
        let mut refresh_validation = Validation::new(Algorithm::HS256);
        refresh_validation.required_spec_claims.clear();
        refresh_validation.validate_exp = false;
        refresh_validation.validate_aud = false;

        Self {
            access_key: EncodingKey::from_secret(access_secret.as_bytes()),
            refresh_key: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_validation,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(&config.access_token_key, &config.refresh_token_key)
    }

    /// Sign an access token for `id`.
    pub fn issue_access_token(&self, id: &str, now: DateTime<Utc>) -> ApiResult<String> {
        sign(id, now, &self.access_key)
    }

    /// Sign a refresh token for `id`.
    pub fn issue_refresh_token(&self, id: &str, now: DateTime<Utc>) -> ApiResult<String> {
        sign(id, now, &self.refresh_key)
    }

    /// Check a refresh token's signature and return the principal id it names.
    pub fn verify_refresh_token(&self, token: &str) -> ApiResult<String> {
        jsonwebtoken::decode::<TokenClaims>(token, &self.refresh_decoding, &self.refresh_validation)
            .map(|data| data.claims.id)
            .map_err(|e| ApiError::BadRequest(format!("refresh token invalid: {e}")))
    }
}

fn sign(id: &str, now: DateTime<Utc>, key: &EncodingKey) -> ApiResult<String> {
    let claims = TokenClaims {
        id: id.to_string(),
        iat: Some(now.timestamp()),
        exp: None,
    };
    jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, key)
        .map_err(|e| ApiError::Internal(format!("Failed to create token: {}", e)))
}

/// Hash a password using Argon2.
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(password_hash.to_string())
}

/// Verify a password against a hash.
pub fn verify_password(password: &str, hash: &str) -> ApiResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| ApiError::Internal(format!("Invalid password hash: {}", e)))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;
    use notesapp_core::Kind;

    use super::*;

    const SECRET: &str = "test_access_secret";

    fn mint(claims: serde_json::Value, secret: &str) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn verifier() -> CredentialVerifier {
        CredentialVerifier::new(SECRET, Duration::from_secs(1800))
    }

    #[test]
    fn test_valid_token_yields_payload_id() {
        let now = Utc::now();
        let token = mint(
            serde_json::json!({ "id": "user-Qbax5Oy7L8WKf74l", "iat": now.timestamp() }),
            SECRET,
        );
        let identity = verifier().verify(&token, now).unwrap();
        assert_eq!(identity.id(), "user-Qbax5Oy7L8WKf74l");
    }

    #[test]
    fn test_wrong_key_rejected() {
        let now = Utc::now();
        let token = mint(
            serde_json::json!({ "id": "user-1", "iat": now.timestamp() }),
            "some_other_secret",
        );
        let err = verifier().verify(&token, now).unwrap_err();
        assert!(matches!(err, VerifyError::Invalid(_)));
        assert_eq!(ApiError::from(err).kind(), Kind::AuthenticationRejected);
    }

    #[test]
    fn test_token_older_than_max_age_rejected() {
        let now = Utc::now();
        let issued = now - ChronoDuration::seconds(1801);
        let token = mint(
            serde_json::json!({ "id": "user-1", "iat": issued.timestamp() }),
            SECRET,
        );
        let err = verifier().verify(&token, now).unwrap_err();
        assert!(matches!(err, VerifyError::TooOld { max_age_secs: 1800 }));
    }

    #[test]
    fn test_token_at_max_age_accepted() {
        let now = Utc::now();
        let issued = now - ChronoDuration::seconds(1800);
        let token = mint(
            serde_json::json!({ "id": "user-1", "iat": issued.timestamp() }),
            SECRET,
        );
        assert!(verifier().verify(&token, now).is_ok());
    }

    #[test]
    fn test_extreme_iat_rejected() {
        let token = mint(serde_json::json!({ "id": "user-1", "iat": i64::MIN }), SECRET);
        let err = verifier().verify(&token, Utc::now()).unwrap_err();
        assert!(matches!(err, VerifyError::TooOld { .. }));
    }

    #[test]
    fn test_unbounded_max_age_accepts_fresh_token() {
        let now = Utc::now();
        let token = mint(serde_json::json!({ "id": "user-1", "iat": now.timestamp() }), SECRET);
        let verifier = CredentialVerifier::new(SECRET, Duration::from_secs(u64::MAX));
        assert_eq!(verifier.verify(&token, now).unwrap().id(), "user-1");
    }

    #[test]
    fn test_missing_iat_rejected() {
        let token = mint(serde_json::json!({ "id": "user-1" }), SECRET);
        let err = verifier().verify(&token, Utc::now()).unwrap_err();
        assert!(matches!(err, VerifyError::MissingIssuedAt));
    }

    #[test]
    fn test_future_iat_rejected() {
        let now = Utc::now();
        let token = mint(
            serde_json::json!({ "id": "user-1", "iat": (now + ChronoDuration::hours(1)).timestamp() }),
            SECRET,
        );
        assert!(matches!(
            verifier().verify(&token, now),
            Err(VerifyError::IssuedInFuture)
        ));
    }

    #[test]
    fn test_explicit_exp_honoured() {
        let now = Utc::now();
        let token = mint(
            serde_json::json!({
                "id": "user-1",
                "iat": (now - ChronoDuration::seconds(60)).timestamp(),
                "exp": (now - ChronoDuration::seconds(1)).timestamp(),
            }),
            SECRET,
        );
        assert!(matches!(verifier().verify(&token, now), Err(VerifyError::Expired)));
    }

    #[test]
    fn test_audience_and_issuer_ignored() {
        let now = Utc::now();
        let token = mint(
            serde_json::json!({
                "id": "user-1",
                "iat": now.timestamp(),
                "aud": "someone-else",
                "iss": "unknown-issuer",
                "sub": "whatever",
            }),
            SECRET,
        );
        assert_eq!(verifier().verify(&token, now).unwrap().id(), "user-1");
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            verifier().verify("not.a.token", Utc::now()),
            Err(VerifyError::Invalid(_))
        ));
    }

    #[test]
    fn test_issued_access_token_verifies() {
        let manager = TokenManager::new(SECRET, "refresh_secret");
        let now = Utc::now();
        let token = manager.issue_access_token("user-7", now).unwrap();
        assert_eq!(verifier().verify(&token, now).unwrap().id(), "user-7");
    }

    #[test]
    fn test_refresh_token_round_trip_and_key_separation() {
        let manager = TokenManager::new(SECRET, "refresh_secret");
        let now = Utc::now();
        let refresh = manager.issue_refresh_token("user-7", now).unwrap();
        assert_eq!(manager.verify_refresh_token(&refresh).unwrap(), "user-7");

        // A refresh token is not an access token, and vice versa.
        assert!(verifier().verify(&refresh, now).is_err());
        let access = manager.issue_access_token("user-7", now).unwrap();
        let err = manager.verify_refresh_token(&access).unwrap_err();
        assert_eq!(err.kind(), Kind::ClientFault);
    }

    #[test]
    fn test_hash_and_verify_password() {
        let password = "test_password_123";
        let hash = hash_password(password).unwrap();
        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }
}
