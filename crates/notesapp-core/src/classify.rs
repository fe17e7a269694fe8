//! Error classification.
//!
//! [`classify`] turns a [`Failure`] into what the caller will see. The arms
//! are evaluated in a fixed priority order and the first match wins:
//!
//! 1. `NotFound`
//! 2. `AuthorizationDenied`
//! 3. `ClientFault`
//! 4. `AuthenticationRejected`
//! 5. anything unrecognized that is not a server fault: forwarded untouched
//! 6. everything else: generic 500
//!
//! Public messages are fixed strings. They never depend on the failure's
//! detail.

use http::StatusCode;

use crate::envelope::StatusTag;
use crate::failure::{Failure, Kind};

pub const NOT_FOUND_MESSAGE: &str = "resource not found";
pub const AUTHORIZATION_DENIED_MESSAGE: &str = "caller is not entitled to access this resource";
pub const CLIENT_FAULT_MESSAGE: &str = "request does not satisfy required constraints";
pub const AUTHENTICATION_REJECTED_MESSAGE: &str = "caller's access is currently restricted";
pub const SERVER_FAULT_MESSAGE: &str = "an internal failure occurred";

/// The status code, tag and public message for a classified failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub status: StatusCode,
    pub tag: StatusTag,
    pub message: &'static str,
}

impl Verdict {
    fn fail(failure: &Failure, message: &'static str) -> Self {
        Self {
            status: failure.status(),
            tag: StatusTag::Fail,
            message,
        }
    }

    fn error() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            tag: StatusTag::Error,
            message: SERVER_FAULT_MESSAGE,
        }
    }
}

/// What to do with a failed outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Replace the response with an envelope built from the verdict.
    Respond(Verdict),
    /// Forward the original response unmodified.
    PassThrough,
}

impl Disposition {
    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            Self::Respond(verdict) => Some(verdict),
            Self::PassThrough => None,
        }
    }
}

/// Classify a failure. Pure; safe to call from any number of requests.
pub fn classify(failure: &Failure) -> Disposition {
    let verdict = match failure.kind() {
        Kind::NotFound => Verdict::fail(failure, NOT_FOUND_MESSAGE),
        Kind::AuthorizationDenied => Verdict::fail(failure, AUTHORIZATION_DENIED_MESSAGE),
        Kind::ClientFault => Verdict::fail(failure, CLIENT_FAULT_MESSAGE),
        Kind::AuthenticationRejected => Verdict::fail(failure, AUTHENTICATION_REJECTED_MESSAGE),
        Kind::ServerFault if !failure.is_server_fault() => return Disposition::PassThrough,
        Kind::ServerFault => Verdict::error(),
    };
    Disposition::Respond(verdict)
}
