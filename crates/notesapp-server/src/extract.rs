//! Request body extraction.

use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body extractor.
///
/// Well-formed JSON of the wrong shape is the caller's fault and becomes a
/// `BadRequest`. Any other rejection (bad syntax, missing content type) keeps
/// the framework's status and body.
#[derive(Debug, Clone, Copy, Default)]
pub struct Payload<T>(pub T);

impl<T, S> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(JsonRejection::JsonDataError(e)) => Err(ApiError::BadRequest(e.body_text())),
            Err(rejection) => Err(ApiError::Rejected {
                status: rejection.status(),
                body: rejection.body_text(),
            }),
        }
    }
}
