//! Domain types shared by the prompt-to-3D pipeline.
//!
//! Holds the request/response model, artifact slots, the per-user
//! configuration store, and runtime settings. Nothing in this crate
//! performs network I/O.

pub mod artifact;
pub mod config;
pub mod error;
pub mod result;
pub mod settings;
pub mod types;
