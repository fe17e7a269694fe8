//! notesapp-server: HTTP API server for the notes app
//!
//! This crate provides:
//! - Bearer credential verification for protected routes
//! - Failure classification into the public response envelope
//! - Composition of feature modules into one router
//! - The feature modules themselves (notes, users, authentications,
//!   collaborations, exports, uploads) over in-memory services
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use notesapp_server::{app, config::ServerConfig, services::{ChannelQueue, log_outbox}, state::Services};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::from_env()?;
//!     let (queue, outbox) = ChannelQueue::new(config.queue_capacity);
//!     tokio::spawn(log_outbox(outbox));
//!     let services = Services::build(&config, Arc::new(queue))?;
//!     let app = app::build_app(&config, &services)?;
//!     let listener = tokio::net::TcpListener::bind(config.socket_addr()).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod health;
pub mod middleware;
pub mod modules;
pub mod normalize;
pub mod registrar;
pub mod services;
pub mod state;
pub mod validation;

// Re-exports for convenience
pub use app::{StartupError, build_app};
pub use auth::{CredentialVerifier, TokenManager};
pub use config::{ConfigError, LogFormat, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use registrar::{FeatureModule, Registrar, RegistrationError, Route};
pub use state::Services;

// Re-export dependent crates
pub use notesapp_core;
