//! Storage subsystem
//!
//! Owns the on-disk lifecycle of captured screenshots.
//!
//! Components:
//! - `artifact_store`: the two bounded FIFO queues and their directories.
//! - `types`: modes, queue identifiers, artifact metadata and delete outcomes.

pub mod artifact_store;
pub mod types;

pub use artifact_store::ArtifactStore;
pub use types::{Artifact, DeleteOutcome, Mode, QueueKind, QueueSelector};
