//! Local generative-text seam used for prompt enhancement.

/// Errors from a local text generation call.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The HTTP request failed (server down, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("Text generation API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The body did not contain a usable answer.
    #[error("Malformed generation response: {0}")]
    MalformedResponse(String),
}

/// Produces text from a single instruction.
pub trait TextGenerator: Send + Sync {
    /// Send `instruction` as one user message and return the raw answer.
    fn generate(
        &self,
        instruction: &str,
    ) -> impl std::future::Future<Output = Result<String, GenerationError>> + Send;
}
