use serde::{Deserialize, Serialize};

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Caller identity used when none is supplied by the hosting runtime.
pub const DEFAULT_CALLER_ID: &str = "super-user";

/// A single user request entering the pipeline.
///
/// Immutable once built; discarded after the run completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    /// Raw creative prompt as typed by the user. Not validated here.
    pub prompt: String,
    /// Principal the request runs as; selects the user configuration.
    pub caller_id: String,
}

impl PromptRequest {
    pub fn new(prompt: impl Into<String>, caller_id: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            caller_id: caller_id.into(),
        }
    }
}

/// Output of the prompt enhancement stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpandedPrompt {
    /// Text handed to image synthesis.
    pub text: String,
    /// `true` when `text` came from the local model, `false` when it is
    /// the original prompt.
    pub was_enhanced: bool,
}

impl ExpandedPrompt {
    /// Wrap a model response that has already been trimmed.
    pub fn enhanced(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            was_enhanced: true,
        }
    }

    /// Fall back to the original prompt, verbatim.
    pub fn fallback(original: impl Into<String>) -> Self {
        Self {
            text: original.into(),
            was_enhanced: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_keeps_original_text() {
        let expanded = ExpandedPrompt::fallback("  a red fox in snow ");
        assert_eq!(expanded.text, "  a red fox in snow ");
        assert!(!expanded.was_enhanced);
    }

    #[test]
    fn enhanced_sets_provenance_flag() {
        let expanded = ExpandedPrompt::enhanced("A red fox at dusk");
        assert!(expanded.was_enhanced);
    }

    #[test]
    fn prompt_request_deserializes_from_json() {
        let req: PromptRequest = serde_json::from_value(serde_json::json!({
            "prompt": "a red fox in snow",
            "caller_id": "alice",
        }))
        .unwrap();
        assert_eq!(req, PromptRequest::new("a red fox in snow", "alice"));
    }
}
