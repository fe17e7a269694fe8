//! Payload validators.
//!
//! Body shape (required fields, field types) is enforced while deserializing.
//! The validators here check what serde cannot, and every violation is a
//! `BadRequest`.

use crate::error::{ApiError, ApiResult};
use crate::modules::authentications::{LoginPayload, RefreshTokenPayload};
use crate::modules::collaborations::CollaborationPayload;
use crate::modules::exports::ExportPayload;
use crate::modules::notes::NotePayload;
use crate::modules::users::UserPayload;

/// Upper bound on a username's length.
pub const MAX_USERNAME_LEN: usize = 50;

/// Image types accepted for upload.
pub const IMAGE_CONTENT_TYPES: &[&str] = &[
    "image/apng",
    "image/avif",
    "image/gif",
    "image/jpeg",
    "image/png",
    "image/webp",
];

fn require(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("\"{field}\" is not allowed to be empty")));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NotesValidator;

impl NotesValidator {
    pub fn validate_note_payload(&self, payload: &NotePayload) -> ApiResult<()> {
        require("title", &payload.title)?;
        require("body", &payload.body)?;
        for tag in &payload.tags {
            require("tags", tag)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UsersValidator;

impl UsersValidator {
    pub fn validate_user_payload(&self, payload: &UserPayload) -> ApiResult<()> {
        require("username", &payload.username)?;
        if payload.username.chars().count() > MAX_USERNAME_LEN {
            return Err(ApiError::BadRequest(format!(
                "\"username\" length must be less than or equal to {MAX_USERNAME_LEN} characters long"
            )));
        }
        require("password", &payload.password)?;
        require("fullname", &payload.fullname)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AuthenticationsValidator;

impl AuthenticationsValidator {
    pub fn validate_login_payload(&self, payload: &LoginPayload) -> ApiResult<()> {
        require("username", &payload.username)?;
        require("password", &payload.password)
    }

    pub fn validate_refresh_token_payload(&self, payload: &RefreshTokenPayload) -> ApiResult<()> {
        require("refreshToken", &payload.refresh_token)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CollaborationsValidator;

impl CollaborationsValidator {
    pub fn validate_collaboration_payload(&self, payload: &CollaborationPayload) -> ApiResult<()> {
        require("noteId", &payload.note_id)?;
        require("userId", &payload.user_id)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExportsValidator;

impl ExportsValidator {
    pub fn validate_export_payload(&self, payload: &ExportPayload) -> ApiResult<()> {
        require("targetEmail", &payload.target_email)?;
        if !is_email(&payload.target_email) {
            return Err(ApiError::BadRequest("\"targetEmail\" must be a valid email".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UploadsValidator;

impl UploadsValidator {
    /// Accept only the image types in [`IMAGE_CONTENT_TYPES`].
    pub fn validate_image_content_type(&self, content_type: Option<&str>) -> ApiResult<()> {
        let Some(content_type) = content_type else {
            return Err(ApiError::BadRequest("\"content-type\" is required".to_string()));
        };
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if IMAGE_CONTENT_TYPES.contains(&essence.as_str()) {
            Ok(())
        } else {
            Err(ApiError::BadRequest(format!(
                "\"content-type\" must be one of [{}]",
                IMAGE_CONTENT_TYPES.join(", ")
            )))
        }
    }
}

fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

#[cfg(test)]
mod tests {
    use notesapp_core::Kind;

    use super::*;

    #[test]
    fn test_note_payload() {
        let validator = NotesValidator;
        let mut payload = NotePayload {
            title: "Catatan".into(),
            body: "isi".into(),
            tags: vec!["a".into()],
        };
        validator.validate_note_payload(&payload).unwrap();

        payload.title = "  ".into();
        let err = validator.validate_note_payload(&payload).unwrap_err();
        assert_eq!(err.kind(), Kind::ClientFault);

        payload.title = "ok".into();
        payload.tags = vec![String::new()];
        assert!(validator.validate_note_payload(&payload).is_err());
    }

    #[test]
    fn test_user_payload_username_length() {
        let validator = UsersValidator;
        let mut payload = UserPayload {
            username: "a".repeat(MAX_USERNAME_LEN),
            password: "secret".into(),
            fullname: "Someone".into(),
        };
        validator.validate_user_payload(&payload).unwrap();

        payload.username.push('a');
        assert!(validator.validate_user_payload(&payload).is_err());
    }

    #[test]
    fn test_email() {
        assert!(is_email("reader@example.com"));
        assert!(is_email("a.b+c@mail.example.org"));
        assert!(!is_email("reader"));
        assert!(!is_email("reader@localhost"));
        assert!(!is_email("@example.com"));
        assert!(!is_email("a@b@example.com"));
        assert!(!is_email("a b@example.com"));
        assert!(!is_email("a@example..com"));
    }

    #[test]
    fn test_image_content_type() {
        let validator = UploadsValidator;
        validator.validate_image_content_type(Some("image/png")).unwrap();
        validator
            .validate_image_content_type(Some("IMAGE/JPEG; charset=binary"))
            .unwrap();
        assert!(validator.validate_image_content_type(Some("text/plain")).is_err());
        assert!(validator.validate_image_content_type(None).is_err());
    }
}
