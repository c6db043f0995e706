//! Final pipeline response and per-stage status.

use serde::Serialize;

use crate::artifact::ArtifactRef;
use crate::types::{ExpandedPrompt, Timestamp};

/// Outcome of a single pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StageStatus {
    /// The stage produced its output.
    Succeeded,
    /// The stage failed and a fallback value was used instead.
    Fallback { reason: String },
    /// The stage failed; its output is absent.
    Failed { reason: String },
}

impl StageStatus {
    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Failure or fallback reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Fallback { reason } | Self::Failed { reason } => Some(reason),
            Self::Succeeded => None,
        }
    }
}

/// Response returned by a completed run.
///
/// Only produced when the image stage succeeded; the model stage may
/// still have failed, in which case `model` is `None`.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub run_id: uuid::Uuid,
    pub original_prompt: String,
    pub expanded_prompt: ExpandedPrompt,
    pub image: ArtifactRef,
    pub model: Option<ArtifactRef>,
    pub enhance_status: StageStatus,
    pub image_status: StageStatus,
    pub model_status: StageStatus,
    pub started_at: Timestamp,
    pub finished_at: Timestamp,
}

impl PipelineResult {
    /// The single text field handed back to the caller.
    ///
    /// Always names both prompts; appends a note when the 3D model is
    /// unavailable.
    pub fn message(&self) -> String {
        let mut message = format!(
            "Original Prompt: {}\nExpanded Prompt: {}",
            self.original_prompt, self.expanded_prompt.text
        );
        if self.model.is_none() {
            let reason = self.model_status.reason().unwrap_or("not generated");
            message.push_str(&format!("\n3D Model: unavailable ({reason})"));
        }
        message
    }

    /// `true` when every stage produced its output.
    pub fn is_complete(&self) -> bool {
        self.enhance_status.is_succeeded()
            && self.image_status.is_succeeded()
            && self.model_status.is_succeeded()
    }
}
