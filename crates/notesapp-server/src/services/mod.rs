//! Services the feature modules depend on.
//!
//! Each service is a trait so that modules only see the operations they call.
//! The implementations here keep their state in memory; they are built once
//! at startup by [`crate::state::Services`].

pub mod authentications;
pub mod cache;
pub mod collaborations;
pub mod notes;
pub mod producer;
pub mod storage;
pub mod users;

pub use authentications::{AuthenticationsService, MemoryAuthentications};
pub use cache::{CacheService, MemoryCache};
pub use collaborations::{CollaborationsService, MemoryCollaborations};
pub use notes::{MemoryNotes, Note, NoteContent, NoteListing, NotesService};
pub use producer::{ChannelQueue, MemoryQueue, MessageProducer, QueuedMessage, log_outbox};
pub use storage::{LocalStorage, StorageService, StoredFile};
pub use users::{MemoryUsers, NewUser, User, UsersService};

/// Generate a prefixed identifier such as `note-3f9a0c1d2b4e5f60`.
pub(crate) fn new_id(prefix: &str) -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}-{}", &raw[..16])
}
