//! Clients for the generative capabilities the pipeline calls.
//!
//! - [`invoker::CapabilityInvoker`] -- invoke a remote capability by
//!   identifier; [`api::CapabilityApi`] is the HTTP implementation.
//! - [`generator::TextGenerator`] -- local text generation;
//!   [`ollama::OllamaClient`] is the Ollama implementation.

pub mod api;
pub mod generator;
mod http;
pub mod invoker;
pub mod ollama;
pub mod payload;

pub use api::CapabilityApi;
pub use generator::{GenerationError, TextGenerator};
pub use invoker::{CapabilityError, CapabilityInvoker};
pub use ollama::OllamaClient;
pub use payload::{CapabilityPayload, CapabilityResponse, PayloadValue, ResultValue};
