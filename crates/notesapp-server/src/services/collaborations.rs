//! Who besides the owner may work on a note.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{ApiError, ApiResult};
use crate::services::{CacheService, new_id};

#[async_trait]
pub trait CollaborationsService: Send + Sync {
    /// Grant `user_id` access to `note_id`; returns the collaboration id.
    async fn add_collaboration(&self, note_id: &str, user_id: &str) -> ApiResult<String>;

    async fn delete_collaboration(&self, note_id: &str, user_id: &str) -> ApiResult<()>;

    /// `Forbidden` unless `user_id` collaborates on `note_id`.
    async fn verify_collaborator(&self, note_id: &str, user_id: &str) -> ApiResult<()>;

    /// Ids of notes shared with `user_id`.
    async fn notes_shared_with(&self, user_id: &str) -> ApiResult<Vec<String>>;

    /// Ids of users collaborating on `note_id`.
    async fn collaborators_of(&self, note_id: &str) -> ApiResult<Vec<String>>;

    /// Drop every collaboration on `note_id`. Absent rows are not an error.
    async fn remove_note(&self, note_id: &str) -> ApiResult<()>;
}

#[derive(Debug, Clone)]
struct Collaboration {
    id: String,
    note_id: String,
    user_id: String,
}

pub struct MemoryCollaborations {
    cache: Arc<dyn CacheService>,
    rows: RwLock<Vec<Collaboration>>,
}

impl MemoryCollaborations {
    pub fn new(cache: Arc<dyn CacheService>) -> Self {
        Self {
            cache,
            rows: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CollaborationsService for MemoryCollaborations {
    async fn add_collaboration(&self, note_id: &str, user_id: &str) -> ApiResult<String> {
        let id = {
            let mut rows = self.rows.write().await;
            if rows.iter().any(|c| c.note_id == note_id && c.user_id == user_id) {
                return Err(ApiError::BadRequest(format!(
                    "{user_id} already collaborates on {note_id}"
                )));
            }
            let id = new_id("collab");
            rows.push(Collaboration {
                id: id.clone(),
                note_id: note_id.to_string(),
                user_id: user_id.to_string(),
            });
            id
        };

        self.cache.delete(&format!("notes:{user_id}")).await?;
        Ok(id)
    }

    async fn delete_collaboration(&self, note_id: &str, user_id: &str) -> ApiResult<()> {
        {
            let mut rows = self.rows.write().await;
            let before = rows.len();
            rows.retain(|c| !(c.note_id == note_id && c.user_id == user_id));
            if rows.len() == before {
                return Err(ApiError::BadRequest(format!(
                    "no collaboration of {user_id} on {note_id} to delete"
                )));
            }
        }

        self.cache.delete(&format!("notes:{user_id}")).await
    }

    async fn verify_collaborator(&self, note_id: &str, user_id: &str) -> ApiResult<()> {
        let rows = self.rows.read().await;
        if rows.iter().any(|c| c.note_id == note_id && c.user_id == user_id) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!(
                "{user_id} does not collaborate on {note_id}"
            )))
        }
    }

    async fn notes_shared_with(&self, user_id: &str) -> ApiResult<Vec<String>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| c.note_id.clone())
            .collect())
    }

    async fn collaborators_of(&self, note_id: &str) -> ApiResult<Vec<String>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .filter(|c| c.note_id == note_id)
            .map(|c| c.user_id.clone())
            .collect())
    }

    async fn remove_note(&self, note_id: &str) -> ApiResult<()> {
        self.rows.write().await.retain(|c| c.note_id != note_id);
        Ok(())
    }
}

impl std::fmt::Debug for MemoryCollaborations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCollaborations").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use notesapp_core::Kind;

    use super::*;
    use crate::services::MemoryCache;

    #[tokio::test]
    async fn test_add_verify_delete() {
        let cache = Arc::new(MemoryCache::new());
        let collaborations = MemoryCollaborations::new(cache.clone());

        let id = collaborations
            .add_collaboration("note-1", "user-2")
            .await
            .unwrap();
        assert!(id.starts_with("collab-"));
        collaborations
            .verify_collaborator("note-1", "user-2")
            .await
            .unwrap();
        assert_eq!(
            collaborations.notes_shared_with("user-2").await.unwrap(),
            vec!["note-1".to_string()]
        );

        collaborations
            .delete_collaboration("note-1", "user-2")
            .await
            .unwrap();
        let err = collaborations
            .verify_collaborator("note-1", "user-2")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::AuthorizationDenied);
    }

    #[tokio::test]
    async fn test_remove_note_drops_its_rows_only() {
        let collaborations = MemoryCollaborations::new(Arc::new(MemoryCache::new()));
        collaborations.add_collaboration("note-1", "user-2").await.unwrap();
        collaborations.add_collaboration("note-1", "user-3").await.unwrap();
        collaborations.add_collaboration("note-2", "user-2").await.unwrap();

        collaborations.remove_note("note-1").await.unwrap();
        assert!(collaborations.collaborators_of("note-1").await.unwrap().is_empty());
        assert_eq!(
            collaborations.notes_shared_with("user-2").await.unwrap(),
            vec!["note-2".to_string()]
        );
        collaborations.remove_note("note-unknown").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_is_client_fault() {
        let collaborations = MemoryCollaborations::new(Arc::new(MemoryCache::new()));
        let err = collaborations
            .delete_collaboration("note-1", "user-2")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::ClientFault);
    }

    #[tokio::test]
    async fn test_changes_invalidate_collaborator_cache() {
        let cache = Arc::new(MemoryCache::new());
        cache
            .set("notes:user-2", "[]".into(), Duration::from_secs(60))
            .await
            .unwrap();
        let collaborations = MemoryCollaborations::new(cache.clone());

        collaborations
            .add_collaboration("note-1", "user-2")
            .await
            .unwrap();
        assert_eq!(cache.get("notes:user-2").await.unwrap(), None);
    }
}
