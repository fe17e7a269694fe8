//! Sharing notes with other users.
//!
//! Only a note's owner may add or remove collaborators.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::State,
    http::{Method, StatusCode},
    routing::{delete, post},
};
use notesapp_core::{Identity, ResponseEnvelope};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::extract::Payload;
use crate::registrar::{FeatureModule, Route};
use crate::services::{CollaborationsService, NotesService, UsersService};
use crate::validation::CollaborationsValidator;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationPayload {
    pub note_id: String,
    pub user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollaborationCreated {
    pub collaboration_id: String,
}

#[derive(Clone)]
pub struct CollaborationsModule {
    collaborations: Arc<dyn CollaborationsService>,
    notes: Arc<dyn NotesService>,
    users: Arc<dyn UsersService>,
    validator: CollaborationsValidator,
}

impl CollaborationsModule {
    pub fn new(
        collaborations: Arc<dyn CollaborationsService>,
        notes: Arc<dyn NotesService>,
        users: Arc<dyn UsersService>,
        validator: CollaborationsValidator,
    ) -> Self {
        Self {
            collaborations,
            notes,
            users,
            validator,
        }
    }
}

impl FeatureModule for CollaborationsModule {
    fn name(&self) -> &'static str {
        "collaborations"
    }

    fn routes(&self) -> Vec<Route> {
        vec![
            Route::authenticated(
                Method::POST,
                "/collaborations",
                post(add_collaboration).with_state(self.clone()),
            ),
            Route::authenticated(
                Method::DELETE,
                "/collaborations",
                delete(delete_collaboration).with_state(self.clone()),
            ),
        ]
    }
}

async fn add_collaboration(
    State(module): State<CollaborationsModule>,
    Extension(identity): Extension<Identity>,
    Payload(payload): Payload<CollaborationPayload>,
) -> ApiResult<(StatusCode, Json<ResponseEnvelope<CollaborationCreated>>)> {
    module.validator.validate_collaboration_payload(&payload)?;
    module
        .notes
        .verify_note_owner(&payload.note_id, identity.id())
        .await?;
    module.users.get_user_by_id(&payload.user_id).await?;

    let collaboration_id = module
        .collaborations
        .add_collaboration(&payload.note_id, &payload.user_id)
        .await?;

    tracing::info!(note_id = %payload.note_id, user_id = %payload.user_id, "collaborator added");
    Ok((
        StatusCode::CREATED,
        Json(
            ResponseEnvelope::success(CollaborationCreated { collaboration_id })
                .with_message("collaboration added"),
        ),
    ))
}

async fn delete_collaboration(
    State(module): State<CollaborationsModule>,
    Extension(identity): Extension<Identity>,
    Payload(payload): Payload<CollaborationPayload>,
) -> ApiResult<Json<ResponseEnvelope>> {
    module.validator.validate_collaboration_payload(&payload)?;
    module
        .notes
        .verify_note_owner(&payload.note_id, identity.id())
        .await?;
    module
        .collaborations
        .delete_collaboration(&payload.note_id, &payload.user_id)
        .await?;
    Ok(Json(ResponseEnvelope::acknowledged("collaboration deleted")))
}
