//! # Simulator Types
//!
//! Domain entities shared across the whole workspace: the block record and
//! its fingerprint identity (`entities`), the envelope/action vocabulary
//! used on the wire (`envelope`), and configuration errors (`errors`).

pub mod entities;
pub mod envelope;
pub mod errors;

pub use entities::{Block, Fingerprint, ParentRef};
pub use envelope::{Action, Envelope, Payload};
pub use errors::ConfigError;
