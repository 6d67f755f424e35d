//! Data model shared by every `jobctl` crate.
//!
//! Nothing in here spawns processes or owns runtime state: descriptors describe work,
//! snapshots and events describe what happened to it.

mod domain;
pub use domain::*;

mod error;
pub use error::ModelError;

pub mod jobfile;
