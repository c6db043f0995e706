//! HTTP client for remote capability hosts.
//!
//! Each capability identifier is a host name. Executions are submitted
//! with `POST {scheme}://{capability_id}/execution`; binary results that
//! the host stores server-side are fetched from `/resource?reid=<id>`.
//! Only identifiers on the caller's allowlist are reachable.

use std::sync::Arc;
use std::time::Duration;

use dreamforge_core::config::UserConfiguration;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};

use crate::http::check_status;
use crate::invoker::{CapabilityError, CapabilityInvoker};
use crate::payload::{CapabilityPayload, CapabilityResponse, PayloadValue};

/// Header carrying the caller identity on every execution request.
pub const CALLER_HEADER: &str = "x-caller-id";

/// HTTP client bound to one caller's capability allowlist.
pub struct CapabilityApi {
    client: reqwest::Client,
    scheme: String,
    allowlist: Arc<UserConfiguration>,
}

impl CapabilityApi {
    /// Create a client with its own connection pool and request timeout.
    ///
    /// * `scheme` - `https` in production, `http` for local hosts.
    pub fn new(
        allowlist: Arc<UserConfiguration>,
        scheme: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CapabilityError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, scheme, allowlist))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        scheme: impl Into<String>,
        allowlist: Arc<UserConfiguration>,
    ) -> Self {
        Self {
            client,
            scheme: scheme.into(),
            allowlist,
        }
    }

    /// Base URL of a capability host.
    pub fn base_url(&self, capability_id: &str) -> String {
        format!("{}://{}", self.scheme, capability_id)
    }

    /// Refuse identifiers missing from the allowlist.
    fn check_permitted(&self, capability_id: &str) -> Result<(), CapabilityError> {
        if self.allowlist.permits(capability_id) {
            Ok(())
        } else {
            Err(CapabilityError::NotPermitted {
                capability_id: capability_id.to_string(),
            })
        }
    }

    /// Submit an execution and decode its response.
    async fn execute(
        &self,
        capability_id: &str,
        payload: CapabilityPayload,
        caller_id: &str,
    ) -> Result<CapabilityResponse, CapabilityError> {
        let url = format!("{}/execution", self.base_url(capability_id));
        let request = self
            .client
            .post(&url)
            .header(CALLER_HEADER, caller_id);

        let request = match payload.to_json() {
            Some(body) => request.json(&body),
            None => request.multipart(build_form(payload)),
        };

        let response = Self::ensure_success(request.send().await?).await?;
        let response = Self::decode_response(response).await?;

        match response.resource_reference().map(str::to_string) {
            Some(reid) => {
                tracing::debug!(capability_id, reid = %reid, "Fetching result resource");
                let bytes = self.fetch_resource(capability_id, &reid).await?;
                Ok(response.with_result_bytes(bytes))
            }
            None => Ok(response),
        }
    }

    /// Download a stored result by resource id.
    ///
    /// Sends a `GET /resource?reid={reid}` request and returns the raw
    /// body.
    pub async fn fetch_resource(
        &self,
        capability_id: &str,
        reid: &str,
    ) -> Result<Vec<u8>, CapabilityError> {
        self.check_permitted(capability_id)?;
        let response = self
            .client
            .get(format!("{}/resource", self.base_url(capability_id)))
            .query(&[("reid", reid)])
            .send()
            .await?;

        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    // ---- private helpers ----

    /// Map a non-2xx reply from a capability host to
    /// [`CapabilityError::Api`], keeping the host's error text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, CapabilityError> {
        check_status(response)
            .await
            .map_err(|(status, body)| CapabilityError::Api { status, body })
    }

    /// JSON bodies are parsed as a response object; anything else is the
    /// result itself.
    async fn decode_response(
        response: reqwest::Response,
    ) -> Result<CapabilityResponse, CapabilityError> {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if is_json_content_type(content_type.as_deref()) {
            let body: serde_json::Value = response.json().await?;
            CapabilityResponse::from_json(body)
        } else {
            let bytes = response.bytes().await?;
            Ok(CapabilityResponse::from_bytes(bytes.to_vec()))
        }
    }
}

impl CapabilityInvoker for CapabilityApi {
    async fn invoke(
        &self,
        capability_id: &str,
        payload: CapabilityPayload,
        caller_id: &str,
    ) -> Result<CapabilityResponse, CapabilityError> {
        self.check_permitted(capability_id)?;

        tracing::info!(
            capability_id,
            caller = %caller_id,
            payload_bytes = payload.byte_len(),
            "Invoking capability",
        );

        let result = self.execute(capability_id, payload, caller_id).await;
        if let Err(e) = &result {
            tracing::warn!(capability_id, error = %e, "Capability call failed");
        }
        result
    }
}

/// Whether a `Content-Type` header value denotes JSON.
pub fn is_json_content_type(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.split(';').next())
        .map(|mime| {
            let mime = mime.trim().to_ascii_lowercase();
            mime == "application/json" || mime.ends_with("+json")
        })
        .unwrap_or(false)
}

/// Encode a payload that contains binary fields as a multipart form.
fn build_form(payload: CapabilityPayload) -> Form {
    let mut form = Form::new();
    for (name, value) in payload.into_fields() {
        form = match value {
            PayloadValue::Text(text) => form.text(name, text),
            PayloadValue::Json(json) => form.text(name, json.to_string()),
            PayloadValue::Bytes(bytes) => {
                let part = Part::bytes(bytes).file_name(name.clone());
                form.part(name, part)
            }
        };
    }
    form
}
