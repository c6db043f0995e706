//! Prompt-to-3D generation pipeline.
//!
//! - [`enhancer`] -- best-effort prompt expansion through a local model.
//! - [`persistence`] -- fixed artifact slots on durable storage.
//! - [`stage`] -- the linear stage sequence and per-stage fatality.
//! - [`orchestrator`] -- runs the stages and assembles the response.

pub mod enhancer;
pub mod orchestrator;
pub mod persistence;
pub mod stage;

pub use enhancer::{EnhancementError, PromptEnhancer};
pub use orchestrator::{Pipeline, PipelineError, StageError};
pub use persistence::{ArtifactStore, LocalArtifactStore, PersistenceError};
pub use stage::{Fatality, Stage};
