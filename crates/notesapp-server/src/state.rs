//! Service construction.

use std::sync::Arc;

use crate::auth::{CredentialVerifier, TokenManager};
use crate::config::ServerConfig;
use crate::services::{
    AuthenticationsService, CacheService, CollaborationsService, LocalStorage,
    MemoryAuthentications, MemoryCache, MemoryCollaborations, MemoryNotes, MemoryUsers, MessageProducer, NotesService, StorageService, UsersService,
};

/// Every service instance the application uses, built once at startup and
/// handed to module constructors.
#[derive(Clone)]
pub struct Services {
    cache: Arc<dyn CacheService>,
    collaborations: Arc<dyn CollaborationsService>,
    notes: Arc<dyn NotesService>,
    users: Arc<dyn UsersService>,
    authentications: Arc<dyn AuthenticationsService>,
    storage: Arc<dyn StorageService>,
    producer: Arc<dyn MessageProducer>,
    tokens: Arc<TokenManager>,
    verifier: Arc<CredentialVerifier>,
}

impl Services {
    /// Build the services from configuration around `producer`. Fails only
    /// if the uploads directory cannot be created.
    pub fn build(config: &ServerConfig, producer: Arc<dyn MessageProducer>) -> std::io::Result<Self> {
        let cache: Arc<dyn CacheService> = Arc::new(MemoryCache::new());
        let collaborations: Arc<dyn CollaborationsService> =
            Arc::new(MemoryCollaborations::new(cache.clone()));
        let notes: Arc<dyn NotesService> = Arc::new(MemoryNotes::new(
            collaborations.clone(),
            cache.clone(),
            config.cache_ttl,
        ));
        let storage: Arc<dyn StorageService> = Arc::new(LocalStorage::new(&config.uploads_dir)?);

        Ok(Self {
            cache,
            collaborations,
            notes,
            users: Arc::new(MemoryUsers::new()),
            authentications: Arc::new(MemoryAuthentications::new()),
            storage,
            producer,
            tokens: Arc::new(TokenManager::from_config(config)),
            verifier: Arc::new(CredentialVerifier::from_config(config)),
        })
    }

    pub fn cache(&self) -> &Arc<dyn CacheService> {
        &self.cache
    }

    pub fn collaborations(&self) -> &Arc<dyn CollaborationsService> {
        &self.collaborations
    }

    pub fn notes(&self) -> &Arc<dyn NotesService> {
        &self.notes
    }

    pub fn users(&self) -> &Arc<dyn UsersService> {
        &self.users
    }

    pub fn authentications(&self) -> &Arc<dyn AuthenticationsService> {
        &self.authentications
    }

    pub fn storage(&self) -> &Arc<dyn StorageService> {
        &self.storage
    }

    pub fn producer(&self) -> &Arc<dyn MessageProducer> {
        &self.producer
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    pub fn verifier(&self) -> &Arc<CredentialVerifier> {
        &self.verifier
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("verifier", &self.verifier)
            .finish_non_exhaustive()
    }
}
