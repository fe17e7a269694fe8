//! Response normalization.
//!
//! [`normalize_response`] runs once for every completed request. Responses
//! that carry a [`Failure`] in their extensions are classified and replaced by
//! a [`ResponseEnvelope`]; everything else is forwarded untouched, except bare
//! 5xx responses, which nobody classified and are treated as server faults.

use std::any::Any;

use axum::{
    Json,
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use notesapp_core::{Disposition, Failure, ResponseEnvelope, StatusTag, classify};

use crate::middleware::request_id::REQUEST_ID_HEADER;

/// Middleware that turns failed outcomes into the public envelope.
pub async fn normalize_response(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let response = next.run(request).await;

    let failure = match response.extensions().get::<Failure>() {
        Some(failure) => failure.clone(),
        None if response.status().is_server_error() => Failure::unrecognized(
            response.status(),
            "handler produced an unclassified server error response",
        ),
        None => return response,
    };

    let verdict = match classify(&failure) {
        Disposition::Respond(verdict) => verdict,
        Disposition::PassThrough => {
            tracing::debug!(%method, %path, status = %failure.status(), "forwarding soft failure");
            return response;
        }
    };

    if verdict.tag == StatusTag::Error {
        tracing::error!(
            %method,
            %path,
            request_id = request_id.as_deref().unwrap_or("-"),
            kind = %failure.kind(),
            status = %failure.status(),
            detail = %failure.detail(),
            "request failed with an internal failure"
        );
    } else {
        tracing::debug!(%method, %path, kind = %failure.kind(), detail = %failure.detail(), "request failed");
    }

    (verdict.status, Json(ResponseEnvelope::from_verdict(&verdict))).into_response()
}

/// Response for a handler that panicked; see `tower_http::catch_panic`.
///
/// The panic message becomes the failure detail, so it is logged by
/// [`normalize_response`] and never sent to the caller.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "handler panicked with a non-string payload".to_string()
    };

    let failure = Failure::unrecognized(
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("handler panicked: {detail}"),
    );
    let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
    response.extensions_mut().insert(failure);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_response_keeps_message_internal() {
        let response = panic_response(Box::new("index out of bounds"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let failure = response.extensions().get::<Failure>().unwrap();
        assert!(failure.is_server_fault());
        assert_eq!(failure.detail(), "handler panicked: index out of bounds");
    }

    #[test]
    fn test_panic_response_with_formatted_payload() {
        let response = panic_response(Box::new(format!("bad note {}", 7)));
        let failure = response.extensions().get::<Failure>().unwrap();
        assert_eq!(failure.detail(), "handler panicked: bad note 7");
    }
}
