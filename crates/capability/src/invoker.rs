//! The "invoke capability by identifier" seam.
//!
//! The pipeline depends only on [`CapabilityInvoker`]; the HTTP
//! implementation lives in [`crate::api`]. Tests substitute in-process
//! fakes.

use crate::payload::{CapabilityPayload, CapabilityResponse};

/// Errors from invoking a remote capability.
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    /// The caller's allowlist does not include this capability.
    #[error("Capability '{capability_id}' is not permitted for this caller")]
    NotPermitted {
        /// Identifier that was refused.
        capability_id: String,
    },

    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The capability host returned a non-2xx status code.
    #[error("Capability API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response could not be interpreted.
    #[error("Malformed capability response: {0}")]
    MalformedResponse(String),
}

/// Performs a synchronous (from the caller's view) remote call to a
/// named capability on behalf of a caller.
pub trait CapabilityInvoker: Send + Sync {
    /// Invoke `capability_id` with `payload` as `caller_id`.
    fn invoke(
        &self,
        capability_id: &str,
        payload: CapabilityPayload,
        caller_id: &str,
    ) -> impl std::future::Future<Output = Result<CapabilityResponse, CapabilityError>> + Send;
}
