//! Failure taxonomy for the notes API.
//!
//! Every way a request can fail is represented by a [`Failure`]: a closed
//! [`Kind`] tag, the status code the failure asks for, and an internal detail
//! message. The detail is for operators; it never reaches API consumers for
//! server-side failures (see [`crate::classify`]).

use std::fmt;

use http::StatusCode;
use thiserror::Error;

/// Why a request could not be completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// The addressed resource does not exist.
    NotFound,
    /// The caller is known but not entitled to the resource.
    AuthorizationDenied,
    /// The caller could not be authenticated.
    AuthenticationRejected,
    /// The request itself is malformed or violates a constraint.
    ClientFault,
    /// Everything else, including values nobody classified.
    ServerFault,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NotFound => "not_found",
            Self::AuthorizationDenied => "authorization_denied",
            Self::AuthenticationRejected => "authentication_rejected",
            Self::ClientFault => "client_fault",
            Self::ServerFault => "server_fault",
        })
    }
}

/// A value signaling that a request could not be completed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} ({status}): {detail}")]
pub struct Failure {
    kind: Kind,
    status: StatusCode,
    detail: String,
}

impl Failure {
    /// Create a failure with an explicit kind and status.
    pub fn new(kind: Kind, status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            detail: detail.into(),
        }
    }

    /// 404 for a resource that does not exist.
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(Kind::NotFound, StatusCode::NOT_FOUND, detail)
    }

    /// 403 for a caller that may not touch the resource.
    pub fn authorization_denied(detail: impl Into<String>) -> Self {
        Self::new(Kind::AuthorizationDenied, StatusCode::FORBIDDEN, detail)
    }

    /// 401 for a caller whose credentials were refused.
    pub fn authentication_rejected(detail: impl Into<String>) -> Self {
        Self::new(Kind::AuthenticationRejected, StatusCode::UNAUTHORIZED, detail)
    }

    /// 400 for a request violating an input constraint.
    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::client(StatusCode::BAD_REQUEST, detail)
    }

    /// A client fault with a specific 4xx status.
    pub fn client(status: StatusCode, detail: impl Into<String>) -> Self {
        Self::new(Kind::ClientFault, status, detail)
    }

    /// 500 for a failure that originated on the server.
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(Kind::ServerFault, StatusCode::INTERNAL_SERVER_ERROR, detail)
    }

    /// A failure that nobody classified, keeping whatever status it came with.
    ///
    /// Whether it ends up forwarded or replaced by a generic server error
    /// depends only on [`Failure::is_server_fault`].
    pub fn unrecognized(status: StatusCode, detail: impl Into<String>) -> Self {
        Self::new(Kind::ServerFault, status, detail)
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Internal detail message. Not for API consumers.
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// True when the status code is in the 5xx range.
    pub fn is_server_fault(&self) -> bool {
        self.status.is_server_error()
    }

    /// True when the status code is in the 4xx range.
    ///
    /// Every named client kind satisfies this, so a `NotFound` is also a
    /// client fault structurally; classification order decides which wins.
    pub fn is_client_fault(&self) -> bool {
        self.status.is_client_error()
    }
}
