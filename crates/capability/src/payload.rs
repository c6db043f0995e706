//! Request and response payloads exchanged with remote capabilities.
//!
//! A payload is an ordered list of named fields. Text and JSON fields
//! travel as a JSON object; any binary field switches the request to
//! `multipart/form-data`.

use serde_json::{Map, Value};

use crate::invoker::CapabilityError;

/// Name of the response field carrying the capability's output.
pub const RESULT_FIELD: &str = "result";

/// A single field value in a capability request.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    Text(String),
    Bytes(Vec<u8>),
    Json(Value),
}

/// Ordered field-name to value mapping sent to a capability.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapabilityPayload {
    fields: Vec<(String, PayloadValue)>,
}

impl CapabilityPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a text field.
    pub fn with_text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(name, PayloadValue::Text(value.into()))
    }

    /// Add (or replace) a binary field.
    pub fn with_bytes(self, name: impl Into<String>, value: Vec<u8>) -> Self {
        self.with(name, PayloadValue::Bytes(value))
    }

    /// Add (or replace) a structured field.
    pub fn with_json(self, name: impl Into<String>, value: Value) -> Self {
        self.with(name, PayloadValue::Json(value))
    }

    fn with(mut self, name: impl Into<String>, value: PayloadValue) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
        self
    }

    pub fn fields(&self) -> &[(String, PayloadValue)] {
        &self.fields
    }

    pub fn into_fields(self) -> Vec<(String, PayloadValue)> {
        self.fields
    }

    pub fn get(&self, name: &str) -> Option<&PayloadValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Whether any field is binary (forces a multipart request).
    pub fn has_bytes(&self) -> bool {
        self.fields
            .iter()
            .any(|(_, v)| matches!(v, PayloadValue::Bytes(_)))
    }

    /// Total size of binary fields, for logging.
    pub fn byte_len(&self) -> usize {
        self.fields
            .iter()
            .map(|(_, v)| match v {
                PayloadValue::Bytes(b) => b.len(),
                _ => 0,
            })
            .sum()
    }

    /// Render as a JSON object. Returns `None` if the payload carries
    /// binary fields.
    pub fn to_json(&self) -> Option<Value> {
        let mut obj = Map::new();
        for (name, value) in &self.fields {
            let value = match value {
                PayloadValue::Text(s) => Value::String(s.clone()),
                PayloadValue::Json(v) => v.clone(),
                PayloadValue::Bytes(_) => return None,
            };
            obj.insert(name.clone(), value);
        }
        Some(Value::Object(obj))
    }
}

/// The `result` field of a capability response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultValue {
    Bytes(Vec<u8>),
    Json(Value),
}

/// Response returned by a capability call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapabilityResponse {
    result: Option<ResultValue>,
    /// Every other top-level field of a JSON response.
    extra: Map<String, Value>,
}

impl CapabilityResponse {
    /// Wrap a raw binary body as `{"result": <bytes>}`.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            result: Some(ResultValue::Bytes(bytes)),
            extra: Map::new(),
        }
    }

    /// Interpret a JSON body. The body must be an object.
    pub fn from_json(body: Value) -> Result<Self, CapabilityError> {
        let Value::Object(mut obj) = body else {
            return Err(CapabilityError::MalformedResponse(
                "response body is not a JSON object".into(),
            ));
        };
        let result = obj.remove(RESULT_FIELD).map(ResultValue::Json);
        Ok(Self { result, extra: obj })
    }

    pub fn result(&self) -> Option<&ResultValue> {
        self.result.as_ref()
    }

    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// A string `result` names a server-side resource whose bytes must be
    /// fetched separately.
    pub fn resource_reference(&self) -> Option<&str> {
        match &self.result {
            Some(ResultValue::Json(Value::String(reid))) => Some(reid),
            _ => None,
        }
    }

    /// Replace the result with fetched bytes.
    pub fn with_result_bytes(mut self, bytes: Vec<u8>) -> Self {
        self.result = Some(ResultValue::Bytes(bytes));
        self
    }

    /// Take the binary result, failing if it is missing or structured.
    pub fn into_result_bytes(self) -> Result<Vec<u8>, CapabilityError> {
        match self.result {
            Some(ResultValue::Bytes(bytes)) => Ok(bytes),
            Some(ResultValue::Json(value)) => Err(CapabilityError::MalformedResponse(format!(
                "expected binary result, got JSON {}",
                json_kind(&value)
            ))),
            None => Err(CapabilityError::MalformedResponse(
                "response has no result field".into(),
            )),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
