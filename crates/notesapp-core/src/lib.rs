//! notesapp-core: request outcome types for the notes API.
//!
//! This crate holds the transport-agnostic half of the request lifecycle:
//!
//! - [`Failure`] and [`Kind`]: the closed failure taxonomy
//! - [`classify`]: maps a failure to status code, tag and public message
//! - [`ResponseEnvelope`]: the stable JSON body shape
//! - [`Identity`]: the caller established by credential verification
//!
//! It has no dependency on the HTTP server; `notesapp-server` wires these
//! into axum middleware.

pub mod classify;
pub mod envelope;
pub mod failure;
pub mod identity;

pub use classify::{Disposition, Verdict, classify};
pub use envelope::{ResponseEnvelope, StatusTag};
pub use failure::{Failure, Kind};
pub use identity::Identity;
