//! Shared harness: a real server on an ephemeral port, driven over HTTP.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use notesapp_server::{
    FeatureModule, Registrar, ServerConfig, Services, app::with_interceptors, modules,
    services::MemoryQueue,
};
use reqwest::StatusCode;
use serde_json::{Value, json};

pub const ACCESS_TOKEN_KEY: &str = "test-access-secret";
pub const REFRESH_TOKEN_KEY: &str = "test-refresh-secret";
pub const ACCESS_TOKEN_AGE_SECS: i64 = 1800;
pub const MAX_UPLOAD_BYTES: usize = 1024;

pub struct TestServer {
    pub base_url: String,
    pub client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
    _uploads: tempfile::TempDir,
}

impl TestServer {
    pub async fn spawn() -> Self {
        Self::spawn_with(Vec::new()).await
    }

    /// Same composition as production, plus `extra` modules registered last.
    pub async fn spawn_with(extra: Vec<Box<dyn FeatureModule>>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let uploads = tempfile::tempdir().unwrap();
        let config = test_config(&base_url, uploads.path());
        let services = Services::build(&config, Arc::new(MemoryQueue::new())).unwrap();

        let mut registrar = Registrar::new(services.verifier().clone());
        modules::register_all(&mut registrar, &services, &config).unwrap();
        for module in &extra {
            registrar.register(module.as_ref()).unwrap();
        }
        let app = with_interceptors(registrar.into_router(), &config).unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
            _uploads: uploads,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register a user and log in; returns (user id, access token, refresh token).
    pub async fn sign_up(&self, username: &str) -> (String, String, String) {
        let res = self
            .client
            .post(self.url("/users"))
            .json(&json!({
                "username": username,
                "password": "secret-password",
                "fullname": "Test User",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        let user_id = body["data"]["userId"].as_str().unwrap().to_string();

        let res = self
            .client
            .post(self.url("/authentications"))
            .json(&json!({ "username": username, "password": "secret-password" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        let access = body["data"]["accessToken"].as_str().unwrap().to_string();
        let refresh = body["data"]["refreshToken"].as_str().unwrap().to_string();

        (user_id, access, refresh)
    }

    pub async fn add_note(&self, token: &str, title: &str) -> String {
        let res = self
            .client
            .post(self.url("/notes"))
            .bearer_auth(token)
            .json(&json!({ "title": title, "body": "body", "tags": ["t"] }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body: Value = res.json().await.unwrap();
        body["data"]["noteId"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn test_config(base_url: &str, uploads: &Path) -> ServerConfig {
    let vars: HashMap<&str, String> = HashMap::from([
        ("HOST", "127.0.0.1".to_string()),
        ("ACCESS_TOKEN_KEY", ACCESS_TOKEN_KEY.to_string()),
        ("REFRESH_TOKEN_KEY", REFRESH_TOKEN_KEY.to_string()),
        ("ACCESS_TOKEN_AGE", ACCESS_TOKEN_AGE_SECS.to_string()),
        ("UPLOADS_DIR", uploads.display().to_string()),
        ("MAX_UPLOAD_BYTES", MAX_UPLOAD_BYTES.to_string()),
        ("PUBLIC_BASE_URL", base_url.to_string()),
    ]);
    ServerConfig::from_lookup(move |name| vars.get(name).cloned()).unwrap()
}

/// Sign an access token by hand, issued `age_secs` ago.
pub fn mint_token(secret: &str, id: &str, age_secs: i64) -> String {
    let claims = json!({ "id": id, "iat": Utc::now().timestamp() - age_secs });
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

/// Assert a failure envelope: exact status, tag and message, nothing else.
pub async fn assert_envelope(res: reqwest::Response, status: StatusCode, tag: &str, message: &str) {
    assert_eq!(res.status(), status);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "status": tag, "message": message }));
}
