//! Feature modules.

pub mod authentications;
pub mod collaborations;
pub mod exports;
pub mod notes;
pub mod uploads;
pub mod users;

pub use authentications::AuthenticationsModule;
pub use collaborations::CollaborationsModule;
pub use exports::ExportsModule;
pub use notes::NotesModule;
pub use uploads::UploadsModule;
pub use users::UsersModule;

use crate::config::ServerConfig;
use crate::registrar::{FeatureModule, Registrar, RegistrationError};
use crate::state::Services;
use crate::validation::{
    AuthenticationsValidator, CollaborationsValidator, ExportsValidator, NotesValidator,
    UploadsValidator, UsersValidator,
};

/// Build every feature module, in registration order, with its dependencies.
pub fn all(services: &Services, config: &ServerConfig) -> Vec<Box<dyn FeatureModule>> {
    vec![
        Box::new(NotesModule::new(services.notes().clone(), NotesValidator)),
        Box::new(UsersModule::new(services.users().clone(), UsersValidator)),
        Box::new(AuthenticationsModule::new(
            services.authentications().clone(),
            services.users().clone(),
            services.tokens().clone(),
            AuthenticationsValidator,
        )),
        Box::new(CollaborationsModule::new(
            services.collaborations().clone(),
            services.notes().clone(),
            services.users().clone(),
            CollaborationsValidator,
        )),
        Box::new(ExportsModule::new(services.producer().clone(), ExportsValidator)),
        Box::new(UploadsModule::new(
            services.storage().clone(),
            UploadsValidator,
            &config.public_base_url,
            config.max_upload_bytes,
        )),
    ]
}

/// Register every feature module: notes, users, authentications,
/// collaborations, exports, uploads.
pub fn register_all(
    registrar: &mut Registrar,
    services: &Services,
    config: &ServerConfig,
) -> Result<(), RegistrationError> {
    for module in all(services, config) {
        registrar.register(module.as_ref())?;
    }
    Ok(())
}
