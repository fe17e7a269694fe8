//! The JSON envelope every response body is wrapped in.
//!
//! ```text
//! success: { "status": "success", "data": { ... } }
//! fail:    { "status": "fail", "message": "<public_message>" }
//! error:   { "status": "error", "message": "<public_message>" }
//! ```

use serde::Serialize;

use crate::classify::Verdict;

/// Outcome tag carried in the `status` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusTag {
    Success,
    Fail,
    Error,
}

/// Response body wrapper.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseEnvelope<T = serde_json::Value> {
    pub status: StatusTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ResponseEnvelope<T> {
    /// Successful result carrying data.
    pub fn success(data: T) -> Self {
        Self {
            status: StatusTag::Success,
            message: None,
            data: Some(data),
        }
    }

    /// Attach an informational message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ResponseEnvelope {
    /// Successful result with an informational message and no data.
    pub fn acknowledged(message: impl Into<String>) -> Self {
        Self {
            status: StatusTag::Success,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Failure envelope for a classified failure.
    pub fn from_verdict(verdict: &Verdict) -> Self {
        Self {
            status: verdict.tag,
            message: Some(verdict.message.to_string()),
            data: None,
        }
    }
}
