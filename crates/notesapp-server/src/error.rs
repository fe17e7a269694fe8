//! Handler error type.
//!
//! Handlers and services return [`ApiError`]. Turning one into a response does
//! not format a body: it produces a bare status response that carries the
//! corresponding [`Failure`] in its extensions, and the response normalizer
//! (`crate::normalize`) decides what the caller sees.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use notesapp_core::{Failure, Kind};

/// API error that can be returned from handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad request (400): the payload breaks an input constraint.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Unauthorized (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Internal server error (500).
    #[error("internal error: {0}")]
    Internal(String),

    /// A framework rejection, forwarded to the caller as-is.
    #[error("request rejected ({status}): {body}")]
    Rejected { status: StatusCode, body: String },

    /// Any other failure value.
    #[error(transparent)]
    Failure(#[from] Failure),
}

impl ApiError {
    /// The failure this error stands for.
    pub fn failure(&self) -> Failure {
        match self {
            Self::BadRequest(detail) => Failure::invalid(detail.clone()),
            Self::NotFound(detail) => Failure::not_found(detail.clone()),
            Self::Unauthorized(detail) => Failure::authentication_rejected(detail.clone()),
            Self::Forbidden(detail) => Failure::authorization_denied(detail.clone()),
            Self::Internal(detail) => Failure::internal(detail.clone()),
            Self::Rejected { status, body } => Failure::unrecognized(*status, body.clone()),
            Self::Failure(failure) => failure.clone(),
        }
    }

    pub fn kind(&self) -> Kind {
        self.failure().kind()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let failure = self.failure();
        let mut response = match self {
            // Keep the framework's own body so a pass-through forwards it intact.
            Self::Rejected { status, body } => (status, body).into_response(),
            _ => failure.status().into_response(),
        };
        response.extensions_mut().insert(failure);
        response
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
