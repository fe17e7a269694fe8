//! Notes: create, list, read, edit and delete.
//!
//! Every route requires an authenticated caller. Reading and editing are open
//! to the owner and collaborators; deleting is reserved for the owner.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use notesapp_core::{Identity, ResponseEnvelope};
use serde::{Deserialize, Serialize};

use crate::error::ApiResult;
use crate::extract::Payload;
use crate::registrar::{FeatureModule, Route};
use crate::services::{Note, NoteContent, NotesService};
use crate::validation::NotesValidator;

/// Set on listings served from the cache.
pub const DATA_SOURCE_HEADER: HeaderName = HeaderName::from_static("x-data-source");

#[derive(Debug, Clone, Deserialize)]
pub struct NotePayload {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

impl From<NotePayload> for NoteContent {
    fn from(payload: NotePayload) -> Self {
        Self {
            title: payload.title,
            body: payload.body,
            tags: payload.tags,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteCreated {
    pub note_id: String,
}

#[derive(Debug, Serialize)]
pub struct NoteList {
    pub notes: Vec<Note>,
}

#[derive(Debug, Serialize)]
pub struct NoteDetail {
    pub note: Note,
}

#[derive(Clone)]
pub struct NotesModule {
    service: Arc<dyn NotesService>,
    validator: NotesValidator,
}

impl NotesModule {
    pub fn new(service: Arc<dyn NotesService>, validator: NotesValidator) -> Self {
        Self { service, validator }
    }
}

impl FeatureModule for NotesModule {
    fn name(&self) -> &'static str {
        "notes"
    }

    fn routes(&self) -> Vec<Route> {
        vec![
            Route::authenticated(Method::POST, "/notes", post(add_note).with_state(self.clone())),
            Route::authenticated(Method::GET, "/notes", get(list_notes).with_state(self.clone())),
            Route::authenticated(Method::GET, "/notes/{id}", get(get_note).with_state(self.clone())),
            Route::authenticated(Method::PUT, "/notes/{id}", put(edit_note).with_state(self.clone())),
            Route::authenticated(
                Method::DELETE,
                "/notes/{id}",
                delete(delete_note).with_state(self.clone()),
            ),
        ]
    }
}

async fn add_note(
    State(module): State<NotesModule>,
    Extension(identity): Extension<Identity>,
    Payload(payload): Payload<NotePayload>,
) -> ApiResult<(StatusCode, Json<ResponseEnvelope<NoteCreated>>)> {
    module.validator.validate_note_payload(&payload)?;
    let note_id = module.service.add_note(identity.id(), payload.into()).await?;

    tracing::info!(%note_id, owner = %identity, "note added");
    Ok((
        StatusCode::CREATED,
        Json(ResponseEnvelope::success(NoteCreated { note_id }).with_message("note added")),
    ))
}

async fn list_notes(
    State(module): State<NotesModule>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Response> {
    let listing = module.service.get_notes(identity.id()).await?;
    let body = Json(ResponseEnvelope::success(NoteList {
        notes: listing.notes,
    }));

    if listing.from_cache {
        Ok(([(DATA_SOURCE_HEADER, HeaderValue::from_static("cache"))], body).into_response())
    } else {
        Ok(body.into_response())
    }
}

async fn get_note(
    State(module): State<NotesModule>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Json<ResponseEnvelope<NoteDetail>>> {
    module.service.verify_note_access(&id, identity.id()).await?;
    let note = module.service.get_note_by_id(&id).await?;
    Ok(Json(ResponseEnvelope::success(NoteDetail { note })))
}

async fn edit_note(
    State(module): State<NotesModule>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    Payload(payload): Payload<NotePayload>,
) -> ApiResult<Json<ResponseEnvelope>> {
    module.validator.validate_note_payload(&payload)?;
    module.service.verify_note_access(&id, identity.id()).await?;
    module.service.edit_note_by_id(&id, payload.into()).await?;
    Ok(Json(ResponseEnvelope::acknowledged("note updated")))
}

async fn delete_note(
    State(module): State<NotesModule>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> ApiResult<Json<ResponseEnvelope>> {
    module.service.verify_note_owner(&id, identity.id()).await?;
    module.service.delete_note_by_id(&id).await?;

    tracing::info!(note_id = %id, owner = %identity, "note deleted");
    Ok(Json(ResponseEnvelope::acknowledged("note deleted")))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::registrar::Access;
    use crate::services::{MemoryCache, MemoryCollaborations, MemoryNotes};

    fn module() -> NotesModule {
        let cache = Arc::new(MemoryCache::new());
        let collaborations = Arc::new(MemoryCollaborations::new(cache.clone()));
        NotesModule::new(
            Arc::new(MemoryNotes::new(collaborations, cache, Duration::from_secs(60))),
            NotesValidator,
        )
    }

    #[test]
    fn test_route_table() {
        let routes = module().routes();
        let table: Vec<String> = routes
            .iter()
            .map(|r| format!("{} {}", r.method(), r.path()))
            .collect();
        assert_eq!(
            table,
            [
                "POST /notes",
                "GET /notes",
                "GET /notes/{id}",
                "PUT /notes/{id}",
                "DELETE /notes/{id}"
            ]
        );
        assert!(routes.iter().all(|r| r.access() == Access::Authenticated));
    }

    #[test]
    fn test_payload_requires_tags() {
        let err = serde_json::from_str::<NotePayload>(r#"{"title":"t","body":"b"}"#).unwrap_err();
        assert!(err.to_string().contains("tags"));
    }
}
