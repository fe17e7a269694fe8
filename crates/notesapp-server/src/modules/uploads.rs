//! Image uploads and retrieval.

use std::sync::Arc;

use axum::{
    Json,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{Method, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use notesapp_core::ResponseEnvelope;
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::registrar::{FeatureModule, Route};
use crate::services::StorageService;
use crate::validation::UploadsValidator;

/// Multipart field holding the image.
pub const IMAGE_FIELD: &str = "data";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCreated {
    pub file_location: String,
}

#[derive(Clone)]
pub struct UploadsModule {
    storage: Arc<dyn StorageService>,
    validator: UploadsValidator,
    public_base_url: Arc<str>,
    max_upload_bytes: usize,
}

impl UploadsModule {
    pub fn new(
        storage: Arc<dyn StorageService>,
        validator: UploadsValidator,
        public_base_url: &str,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            storage,
            validator,
            public_base_url: Arc::from(public_base_url.trim_end_matches('/')),
            max_upload_bytes,
        }
    }

    fn location_of(&self, name: &str) -> String {
        format!("{}/upload/images/{name}", self.public_base_url)
    }
}

impl FeatureModule for UploadsModule {
    fn name(&self) -> &'static str {
        "uploads"
    }

    fn routes(&self) -> Vec<Route> {
        vec![
            Route::public(
                Method::POST,
                "/upload/images",
                post(upload_image)
                    .layer(DefaultBodyLimit::max(self.max_upload_bytes))
                    .with_state(self.clone()),
            ),
            Route::public(
                Method::GET,
                "/upload/images/{file}",
                get(serve_image).with_state(self.clone()),
            ),
        ]
    }
}

async fn upload_image(
    State(module): State<UploadsModule>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ResponseEnvelope<UploadCreated>>)> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        module.validator.validate_image_content_type(field.content_type())?;
        let original_name = field.file_name().unwrap_or("image").to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;

        let name = module.storage.write_file(&original_name, bytes).await?;
        tracing::info!(file = %name, "image uploaded");
        return Ok((
            StatusCode::CREATED,
            Json(
                ResponseEnvelope::success(UploadCreated {
                    file_location: module.location_of(&name),
                })
                .with_message("image uploaded"),
            ),
        ));
    }

    Err(ApiError::BadRequest(format!("\"{IMAGE_FIELD}\" is required")))
}

async fn serve_image(
    State(module): State<UploadsModule>,
    Path(file): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let stored = module.storage.read_file(&file).await?;
    Ok(([(header::CONTENT_TYPE, stored.content_type)], stored.bytes))
}

/// Keep the framework's verdict on a broken multipart body (for example, an
/// oversized one) instead of reclassifying it.
fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::Rejected {
        status: err.status(),
        body: err.body_text(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::LocalStorage;

    #[test]
    fn test_location_of() {
        let dir = tempfile::tempdir().unwrap();
        let module = UploadsModule::new(
            Arc::new(LocalStorage::new(dir.path()).unwrap()),
            UploadsValidator,
            "http://localhost:5000/",
            1024,
        );
        assert_eq!(
            module.location_of("1700000000000cat.png"),
            "http://localhost:5000/upload/images/1700000000000cat.png"
        );
    }
}
