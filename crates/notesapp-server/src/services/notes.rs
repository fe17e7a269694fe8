//! Note storage, access checks and cached listings.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{ApiError, ApiResult};
use crate::services::{CacheService, CollaborationsService, new_id};

/// A stored note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The editable part of a note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteContent {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

/// Notes visible to a user, and whether they came from the cache.
#[derive(Debug, Clone)]
pub struct NoteListing {
    pub notes: Vec<Note>,
    pub from_cache: bool,
}

#[async_trait]
pub trait NotesService: Send + Sync {
    async fn add_note(&self, owner: &str, content: NoteContent) -> ApiResult<String>;

    /// Notes owned by or shared with `user_id`, oldest first.
    async fn get_notes(&self, user_id: &str) -> ApiResult<NoteListing>;

    async fn get_note_by_id(&self, id: &str) -> ApiResult<Note>;

    async fn edit_note_by_id(&self, id: &str, content: NoteContent) -> ApiResult<()>;

    async fn delete_note_by_id(&self, id: &str) -> ApiResult<()>;

    /// `NotFound` for an unknown note, `Forbidden` if `owner` does not own it.
    async fn verify_note_owner(&self, id: &str, owner: &str) -> ApiResult<()>;

    /// Like [`verify_note_owner`](Self::verify_note_owner), but collaborators
    /// pass too.
    async fn verify_note_access(&self, id: &str, user_id: &str) -> ApiResult<()>;
}

pub struct MemoryNotes {
    collaborations: Arc<dyn CollaborationsService>,
    cache: Arc<dyn CacheService>,
    cache_ttl: Duration,
    notes: RwLock<HashMap<String, Note>>,
}

impl MemoryNotes {
    pub fn new(
        collaborations: Arc<dyn CollaborationsService>,
        cache: Arc<dyn CacheService>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            collaborations,
            cache,
            cache_ttl,
            notes: RwLock::new(HashMap::new()),
        }
    }

    /// Drop the cached listings of everyone who can see the note.
    async fn invalidate(&self, note_id: &str, owner: &str) -> ApiResult<()> {
        self.cache.delete(&listing_key(owner)).await?;
        for user_id in self.collaborations.collaborators_of(note_id).await? {
            self.cache.delete(&listing_key(&user_id)).await?;
        }
        Ok(())
    }

    async fn owner_of(&self, id: &str) -> ApiResult<String> {
        self.notes
            .read()
            .await
            .get(id)
            .map(|note| note.owner.clone())
            .ok_or_else(|| ApiError::NotFound(format!("note {id}")))
    }
}

fn listing_key(user_id: &str) -> String {
    format!("notes:{user_id}")
}

#[async_trait]
impl NotesService for MemoryNotes {
    async fn add_note(&self, owner: &str, content: NoteContent) -> ApiResult<String> {
        let id = new_id("note");
        let now = Utc::now();
        let note = Note {
            id: id.clone(),
            title: content.title,
            body: content.body,
            tags: content.tags,
            owner: owner.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.notes.write().await.insert(id.clone(), note);

        self.cache.delete(&listing_key(owner)).await?;
        Ok(id)
    }

    async fn get_notes(&self, user_id: &str) -> ApiResult<NoteListing> {
        let key = listing_key(user_id);
        match self.cache.get(&key).await {
            Ok(Some(cached)) => match serde_json::from_str::<Vec<Note>>(&cached) {
                Ok(notes) => {
                    return Ok(NoteListing {
                        notes,
                        from_cache: true,
                    });
                }
                Err(e) => tracing::warn!(%key, error = %e, "discarding unreadable cache entry"),
            },
            Ok(None) => {}
            Err(e) => tracing::warn!(%key, error = %e, "cache read failed, loading from store"),
        }

        let shared = self.collaborations.notes_shared_with(user_id).await?;
        let mut notes: Vec<Note> = self
            .notes
            .read()
            .await
            .values()
            .filter(|note| note.owner == user_id || shared.contains(&note.id))
            .cloned()
            .collect();
        notes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        let serialized = serde_json::to_string(&notes)
            .map_err(|e| ApiError::Internal(format!("Failed to serialize notes: {}", e)))?;
        self.cache.set(&key, serialized, self.cache_ttl).await?;

        Ok(NoteListing {
            notes,
            from_cache: false,
        })
    }

    async fn get_note_by_id(&self, id: &str) -> ApiResult<Note> {
        self.notes
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(format!("note {id}")))
    }

    async fn edit_note_by_id(&self, id: &str, content: NoteContent) -> ApiResult<()> {
        let owner = {
            let mut notes = self.notes.write().await;
            let note = notes
                .get_mut(id)
                .ok_or_else(|| ApiError::NotFound(format!("note {id}")))?;
            note.title = content.title;
            note.body = content.body;
            note.tags = content.tags;
            note.updated_at = Utc::now();
            note.owner.clone()
        };

        self.invalidate(id, &owner).await
    }

    async fn delete_note_by_id(&self, id: &str) -> ApiResult<()> {
        let note = self
            .notes
            .write()
            .await
            .remove(id)
            .ok_or_else(|| ApiError::NotFound(format!("note {id}")))?;

        self.invalidate(id, &note.owner).await?;
        self.collaborations.remove_note(id).await
    }

    async fn verify_note_owner(&self, id: &str, owner: &str) -> ApiResult<()> {
        if self.owner_of(id).await? == owner {
            Ok(())
        } else {
            Err(ApiError::Forbidden(format!("{owner} does not own note {id}")))
        }
    }

    async fn verify_note_access(&self, id: &str, user_id: &str) -> ApiResult<()> {
        match self.verify_note_owner(id, user_id).await {
            Ok(()) => Ok(()),
            Err(ApiError::Forbidden(_)) => self.collaborations.verify_collaborator(id, user_id).await,
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for MemoryNotes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryNotes")
            .field("cache_ttl", &self.cache_ttl)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use notesapp_core::Kind;

    use super::*;
    use crate::services::{MemoryCache, MemoryCollaborations};

    struct Fixture {
        notes: MemoryNotes,
        collaborations: Arc<MemoryCollaborations>,
    }

    fn fixture() -> Fixture {
        let cache: Arc<dyn CacheService> = Arc::new(MemoryCache::new());
        let collaborations = Arc::new(MemoryCollaborations::new(cache.clone()));
        let notes = MemoryNotes::new(collaborations.clone(), cache, Duration::from_secs(60));
        Fixture {
            notes,
            collaborations,
        }
    }

    fn content(title: &str) -> NoteContent {
        NoteContent {
            title: title.to_string(),
            body: "body".to_string(),
            tags: vec!["tag".to_string()],
        }
    }

    #[tokio::test]
    async fn test_add_and_get_note() {
        let f = fixture();
        let id = f.notes.add_note("user-1", content("first")).await.unwrap();
        assert!(id.starts_with("note-"));

        let note = f.notes.get_note_by_id(&id).await.unwrap();
        assert_eq!(note.title, "first");
        assert_eq!(note.owner, "user-1");
    }

    #[tokio::test]
    async fn test_unknown_note_is_not_found() {
        let f = fixture();
        let err = f.notes.get_note_by_id("note-missing").await.unwrap_err();
        assert_eq!(err.kind(), Kind::NotFound);
        let err = f
            .notes
            .verify_note_owner("note-missing", "user-1")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Kind::NotFound);
    }

    #[tokio::test]
    async fn test_listing_is_cached_until_a_change() {
        let f = fixture();
        f.notes.add_note("user-1", content("a")).await.unwrap();

        let first = f.notes.get_notes("user-1").await.unwrap();
        assert!(!first.from_cache);
        assert_eq!(first.notes.len(), 1);

        let second = f.notes.get_notes("user-1").await.unwrap();
        assert!(second.from_cache);
        assert_eq!(second.notes, first.notes);

        f.notes.add_note("user-1", content("b")).await.unwrap();
        let third = f.notes.get_notes("user-1").await.unwrap();
        assert!(!third.from_cache);
        assert_eq!(third.notes.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_drops_collaborations() {
        let f = fixture();
        let id = f.notes.add_note("owner", content("shared")).await.unwrap();
        f.collaborations.add_collaboration(&id, "friend").await.unwrap();

        f.notes.delete_note_by_id(&id).await.unwrap();
        assert!(f.collaborations.notes_shared_with("friend").await.unwrap().is_empty());
        assert!(f.collaborations.collaborators_of(&id).await.unwrap().is_empty());
        let err = f.notes.verify_note_access(&id, "friend").await.unwrap_err();
        assert_eq!(err.kind(), Kind::NotFound);
    }

    #[tokio::test]
    async fn test_access_owner_collaborator_stranger() {
        let f = fixture();
        let id = f.notes.add_note("owner", content("shared")).await.unwrap();
        f.collaborations
            .add_collaboration(&id, "friend")
            .await
            .unwrap();

        f.notes.verify_note_access(&id, "owner").await.unwrap();
        f.notes.verify_note_access(&id, "friend").await.unwrap();
        let err = f.notes.verify_note_access(&id, "stranger").await.unwrap_err();
        assert_eq!(err.kind(), Kind::AuthorizationDenied);

        let err = f.notes.verify_note_owner(&id, "friend").await.unwrap_err();
        assert_eq!(err.kind(), Kind::AuthorizationDenied);

        let shared = f.notes.get_notes("friend").await.unwrap();
        assert_eq!(shared.notes.len(), 1);
    }

    #[tokio::test]
    async fn test_edit_invalidates_collaborator_listing() {
        let f = fixture();
        let id = f.notes.add_note("owner", content("before")).await.unwrap();
        f.collaborations.add_collaboration(&id, "friend").await.unwrap();
        f.notes.get_notes("friend").await.unwrap();

        f.notes.edit_note_by_id(&id, content("after")).await.unwrap();
        let listing = f.notes.get_notes("friend").await.unwrap();
        assert!(!listing.from_cache);
        assert_eq!(listing.notes[0].title, "after");
    }

    #[tokio::test]
    async fn test_delete_note() {
        let f = fixture();
        let id = f.notes.add_note("owner", content("gone")).await.unwrap();
        f.notes.delete_note_by_id(&id).await.unwrap();
        let err = f.notes.delete_note_by_id(&id).await.unwrap_err();
        assert_eq!(err.kind(), Kind::NotFound);
    }
}
