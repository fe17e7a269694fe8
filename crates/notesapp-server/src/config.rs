//! Server configuration from environment variables.

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: IpAddr,
    /// Server port to listen on.
    pub port: u16,
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log line format.
    pub log_format: LogFormat,
    /// CORS allowed origins (comma-separated or "*" for all).
    pub cors_allowed_origins: String,
    /// HS256 secret that signs and verifies access tokens.
    pub access_token_key: String,
    /// HS256 secret that signs and verifies refresh tokens.
    pub refresh_token_key: String,
    /// Maximum access token age, measured from its `iat` claim.
    pub access_token_age: Duration,
    /// Lifetime of cached note listings.
    pub cache_ttl: Duration,
    /// Directory uploaded images are written to.
    pub uploads_dir: PathBuf,
    /// Upper bound for an upload request body.
    pub max_upload_bytes: usize,
    /// Base URL used when handing out upload locations.
    pub public_base_url: String,
    /// Outbound messages buffered before publishing waits.
    pub queue_capacity: usize,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `ACCESS_TOKEN_KEY`: access token secret (non-blank)
    /// - `REFRESH_TOKEN_KEY`: refresh token secret (non-blank)
    /// - `ACCESS_TOKEN_AGE`: access token max age in seconds (> 0)
    ///
    /// Optional:
    /// - `HOST` (default: 0.0.0.0), `PORT` (default: 5000)
    /// - `LOG_LEVEL` (default: "info"), `LOG_FORMAT` (text | json)
    /// - `CORS_ALLOWED_ORIGINS` (default: "*")
    /// - `CACHE_TTL_SECS` (default: 1800)
    /// - `UPLOADS_DIR` (default: "uploads/images")
    /// - `MAX_UPLOAD_BYTES` (default: 512000)
    /// - `PUBLIC_BASE_URL` (default: http://{HOST}:{PORT})
    /// - `QUEUE_CAPACITY` (default: 1024)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = match lookup("HOST") {
            Some(raw) => raw.parse().map_err(|_| invalid("HOST", "not an IP address"))?,
            None => IpAddr::from([0, 0, 0, 0]),
        };

        let port = match lookup("PORT") {
            Some(raw) => raw.parse().map_err(|_| invalid("PORT", "not a port number"))?,
            None => 5000,
        };

        let log_level = lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(_) => return Err(invalid("LOG_FORMAT", "expected 'text' or 'json'")),
        };

        let cors_allowed_origins =
            lookup("CORS_ALLOWED_ORIGINS").unwrap_or_else(|| "*".to_string());

        let access_token_key = required_secret(&lookup, "ACCESS_TOKEN_KEY")?;
        let refresh_token_key = required_secret(&lookup, "REFRESH_TOKEN_KEY")?;

        let access_token_age = lookup("ACCESS_TOKEN_AGE")
            .ok_or_else(|| ConfigError::MissingEnvVar("ACCESS_TOKEN_AGE".to_string()))?;
        let access_token_age = seconds(&access_token_age, "ACCESS_TOKEN_AGE")?;

        let cache_ttl = match lookup("CACHE_TTL_SECS") {
            Some(raw) => seconds(&raw, "CACHE_TTL_SECS")?,
            None => Duration::from_secs(1800),
        };

        let uploads_dir = lookup("UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("uploads/images"));

        let max_upload_bytes = match lookup("MAX_UPLOAD_BYTES") {
            Some(raw) => usize::try_from(positive(&raw, "MAX_UPLOAD_BYTES")?)
                .map_err(|_| invalid("MAX_UPLOAD_BYTES", "too large for this platform"))?,
            None => 512_000,
        };

        let public_base_url = lookup("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://{host}:{port}"))
            .trim_end_matches('/')
            .to_string();

        let queue_capacity = match lookup("QUEUE_CAPACITY") {
            Some(raw) => usize::try_from(positive(&raw, "QUEUE_CAPACITY")?)
                .map_err(|_| invalid("QUEUE_CAPACITY", "too large for this platform"))?,
            None => 1024,
        };

        Ok(Self {
            host,
            port,
            log_level,
            log_format,
            cors_allowed_origins,
            access_token_key,
            refresh_token_key,
            access_token_age,
            cache_ttl,
            uploads_dir,
            max_upload_bytes,
            public_base_url,
            queue_capacity,
        })
    }

    /// Get the socket address for the server.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn required_secret<F>(lookup: &F, name: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(name).ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))?;
    if value.trim().is_empty() {
        return Err(invalid(name, "secret must not be blank"));
    }
    Ok(value)
}

fn positive(raw: &str, name: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(invalid(name, "must be greater than zero")),
        Ok(value) => Ok(value),
        Err(_) => Err(invalid(name, "not a positive integer")),
    }
}

/// A positive number of seconds that also fits a signed unix timestamp.
fn seconds(raw: &str, name: &str) -> Result<Duration, ConfigError> {
    let secs = positive(raw, name)?;
    if i64::try_from(secs).is_err() {
        return Err(invalid(name, "too large"));
    }
    Ok(Duration::from_secs(secs))
}

fn invalid(name: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid environment variable value.
    #[error("invalid value for environment variable {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}
