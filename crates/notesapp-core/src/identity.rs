//! Caller identity established by credential verification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The authenticated principal of one request.
///
/// Built once by the credential verifier and attached to the request; nothing
/// mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    id: String,
}

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// The principal's unique identifier, exactly as carried by the token.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
