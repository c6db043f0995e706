//! Best-effort prompt enhancement.
//!
//! [`PromptEnhancer::try_enhance`] exposes the typed failure;
//! [`PromptEnhancer::enhance`] applies the fallback so that callers
//! always get a usable prompt back.

use dreamforge_capability::{GenerationError, TextGenerator};
use dreamforge_core::result::StageStatus;
use dreamforge_core::types::ExpandedPrompt;

/// Why enhancement produced nothing usable.
#[derive(Debug, thiserror::Error)]
pub enum EnhancementError {
    #[error("Local model call failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("Local model returned an empty response")]
    EmptyResponse,
}

/// Build the instruction sent to the local model. The raw prompt is
/// embedded verbatim.
pub fn build_instruction(raw_prompt: &str) -> String {
    format!(
        "Expand this visual idea for art generation with detailed style, emotion, and environment: \"{raw_prompt}\""
    )
}

/// Wraps a [`TextGenerator`] and turns short prompts into expanded
/// visual descriptions.
pub struct PromptEnhancer<G> {
    generator: G,
}

impl<G: TextGenerator> PromptEnhancer<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Single attempt, no retry. Returns the trimmed model answer.
    pub async fn try_enhance(&self, raw_prompt: &str) -> Result<String, EnhancementError> {
        let answer = self.generator.generate(&build_instruction(raw_prompt)).await?;
        let trimmed = answer.trim();
        if trimmed.is_empty() {
            return Err(EnhancementError::EmptyResponse);
        }
        Ok(trimmed.to_string())
    }

    /// Enhance, falling back to `raw_prompt` unchanged on any failure.
    pub async fn enhance(&self, raw_prompt: &str) -> ExpandedPrompt {
        self.enhance_with_status(raw_prompt).await.0
    }

    /// Like [`enhance`](Self::enhance), also reporting how the stage went.
    pub async fn enhance_with_status(&self, raw_prompt: &str) -> (ExpandedPrompt, StageStatus) {
        match self.try_enhance(raw_prompt).await {
            Ok(text) => {
                tracing::info!(expanded = %text, "Expanded prompt from local model");
                (ExpandedPrompt::enhanced(text), StageStatus::Succeeded)
            }
            Err(e) => {
                tracing::error!(error = %e, "Prompt enhancement failed, using original prompt");
                (
                    ExpandedPrompt::fallback(raw_prompt),
                    StageStatus::Fallback {
                        reason: e.to_string(),
                    },
                )
            }
        }
    }
}
