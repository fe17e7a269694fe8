//! Note export requests.
//!
//! The export itself is done by a separate consumer; this module only
//! publishes the request.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::{Method, StatusCode},
    routing::post,
};
use notesapp_core::{Identity, ResponseEnvelope};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::extract::Payload;
use crate::registrar::{FeatureModule, Route};
use crate::services::MessageProducer;
use crate::validation::ExportsValidator;

/// Queue export requests are published to.
pub const EXPORT_NOTES_QUEUE: &str = "export:notes";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportPayload {
    pub target_email: String,
}

/// Message body consumed by the exporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportMessage {
    pub user_id: String,
    pub target_email: String,
}

#[derive(Clone)]
pub struct ExportsModule {
    producer: Arc<dyn MessageProducer>,
    validator: ExportsValidator,
}

impl ExportsModule {
    pub fn new(producer: Arc<dyn MessageProducer>, validator: ExportsValidator) -> Self {
        Self {
            producer,
            validator,
        }
    }
}

impl FeatureModule for ExportsModule {
    fn name(&self) -> &'static str {
        "exports"
    }

    fn routes(&self) -> Vec<Route> {
        vec![Route::authenticated(
            Method::POST,
            "/export/notes",
            post(export_notes).with_state(self.clone()),
        )]
    }
}

async fn export_notes(
    State(module): State<ExportsModule>,
    Extension(identity): Extension<Identity>,
    Payload(payload): Payload<ExportPayload>,
) -> ApiResult<(StatusCode, Json<ResponseEnvelope>)> {
    module.validator.validate_export_payload(&payload)?;

    let message = ExportMessage {
        user_id: identity.id().to_string(),
        target_email: payload.target_email,
    };
    let body = serde_json::to_string(&message)
        .map_err(|e| ApiError::Internal(format!("Failed to encode export request: {}", e)))?;
    module.producer.send_message(EXPORT_NOTES_QUEUE, body).await?;

    tracing::info!(user_id = %identity, "export requested");
    Ok((
        StatusCode::CREATED,
        Json(ResponseEnvelope::acknowledged("export request queued")),
    ))
}
