//! Sequences enhancement, image synthesis, and 3D synthesis.
//!
//! [`Pipeline::run`] walks the stages in [`Stage`] order. The image bytes
//! returned by synthesis are persisted and then handed to the 3D stage
//! directly from memory; storage is a side effect, not the transport
//! between stages.

use dreamforge_capability::{CapabilityError, CapabilityInvoker, CapabilityPayload, TextGenerator};
use dreamforge_core::artifact::{ArtifactRef, ArtifactSlot};
use dreamforge_core::config::UserConfiguration;
use dreamforge_core::result::{PipelineResult, StageStatus};
use dreamforge_core::settings::PipelineSettings;
use dreamforge_core::types::PromptRequest;
use tracing::Instrument;

use crate::enhancer::PromptEnhancer;
use crate::persistence::{ArtifactStore, PersistenceError};
use crate::stage::{Fatality, Stage};

/// Payload field carrying the expanded prompt to text-to-image.
pub const PROMPT_FIELD: &str = "prompt";

/// Payload field carrying the image bytes to image-to-3D.
pub const IMAGE_FIELD: &str = "image";

/// A run that produced no usable result.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Image synthesis failed: {0}")]
    ImageSynthesis(#[source] CapabilityError),

    #[error("Image persistence failed: {0}")]
    ImagePersistence(#[source] PersistenceError),
}

/// Failure of a single synthesis or persistence stage.
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl StageError {
    /// Promote a fatal stage failure to a run failure. Only the image
    /// stages are fatal, so capability errors map to synthesis and
    /// storage errors to persistence.
    fn into_fatal(self) -> PipelineError {
        match self {
            Self::Capability(e) => PipelineError::ImageSynthesis(e),
            Self::Persistence(e) => PipelineError::ImagePersistence(e),
        }
    }
}

// The run result always carries the image, so its stages must abort.
const _: () = assert!(matches!(Stage::SynthesizeImage.fatality(), Fatality::Fatal));
const _: () = assert!(matches!(Stage::PersistImage.fatality(), Fatality::Fatal));

/// Decide what a failed stage does to the run from its [`Fatality`].
///
/// Fatal stages abort with a [`PipelineError`]; every other stage leaves
/// a [`StageStatus::Failed`] behind and the run continues.
fn settle(stage: Stage, error: StageError) -> Result<StageStatus, PipelineError> {
    match stage.fatality() {
        Fatality::Fatal => {
            tracing::error!(%stage, error = %error, "Fatal stage failure, aborting run");
            Err(error.into_fatal())
        }
        Fatality::Degrading | Fatality::Absorbed => {
            tracing::error!(%stage, error = %error, "Stage failed, continuing without its output");
            Ok(StageStatus::Failed {
                reason: error.to_string(),
            })
        }
    }
}

/// Settle a stage whose output the run result requires.
fn abort(stage: Stage, error: StageError) -> PipelineError {
    match settle(stage, error) {
        Err(fatal) => fatal,
        // Image stages are asserted fatal above.
        Ok(_) => unreachable!("{stage} is not fatal"),
    }
}

/// The three-stage prompt-to-3D pipeline.
pub struct Pipeline<G, I, S> {
    enhancer: PromptEnhancer<G>,
    invoker: I,
    store: S,
    image_capability_id: String,
    model_capability_id: String,
}

impl<G, I, S> Pipeline<G, I, S>
where
    G: TextGenerator,
    I: CapabilityInvoker,
    S: ArtifactStore,
{
    pub fn new(
        enhancer: PromptEnhancer<G>,
        invoker: I,
        store: S,
        image_capability_id: impl Into<String>,
        model_capability_id: impl Into<String>,
    ) -> Self {
        Self {
            enhancer,
            invoker,
            store,
            image_capability_id: image_capability_id.into(),
            model_capability_id: model_capability_id.into(),
        }
    }

    /// Build a pipeline using the capability identifiers in `settings`.
    pub fn from_settings(
        enhancer: PromptEnhancer<G>,
        invoker: I,
        store: S,
        settings: &PipelineSettings,
    ) -> Self {
        Self::new(
            enhancer,
            invoker,
            store,
            settings.image_capability_id.clone(),
            settings.model_capability_id.clone(),
        )
    }

    pub fn enhancer(&self) -> &PromptEnhancer<G> {
        &self.enhancer
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    /// Execute one run for `request` under `config`.
    ///
    /// Fails only when the image cannot be synthesized or stored. A
    /// failed 3D stage yields `Ok` with `model == None`.
    pub async fn run(
        &self,
        request: &PromptRequest,
        config: &UserConfiguration,
    ) -> Result<PipelineResult, PipelineError> {
        let run_id = uuid::Uuid::now_v7();
        let span = tracing::info_span!("pipeline_run", %run_id, caller = %request.caller_id);
        self.run_stages(run_id, request, config).instrument(span).await
    }

    async fn run_stages(
        &self,
        run_id: uuid::Uuid,
        request: &PromptRequest,
        config: &UserConfiguration,
    ) -> Result<PipelineResult, PipelineError> {
        let started_at = chrono::Utc::now();
        tracing::info!(
            prompt = %request.prompt,
            allowlist_len = config.app_ids.len(),
            "Pipeline run started",
        );
        for capability_id in [&self.image_capability_id, &self.model_capability_id] {
            if !config.permits(capability_id) {
                tracing::debug!(capability_id = %capability_id, "Stage capability not on caller allowlist");
            }
        }

        // -- Enhance (absorbed) --
        let (expanded, enhance_status) = self.enhancer.enhance_with_status(&request.prompt).await;
        tracing::info!(stage = %Stage::Enhance, enhanced = expanded.was_enhanced, "Stage completed");

        // -- SynthesizeImage / PersistImage (fatal) --
        let (image_bytes, image) = self
            .image_stages(&expanded.text, &request.caller_id)
            .await
            .map_err(|(stage, e)| abort(stage, e))?;

        // -- SynthesizeModel / PersistModel (degrading) --
        let (model, model_status) = match self.model_stages(image_bytes, &request.caller_id).await {
            Ok(artifact) => (Some(artifact), StageStatus::Succeeded),
            Err((stage, e)) => (None, settle(stage, e)?),
        };

        let result = PipelineResult {
            run_id,
            original_prompt: request.prompt.clone(),
            expanded_prompt: expanded,
            image,
            model,
            enhance_status,
            image_status: StageStatus::Succeeded,
            model_status,
            started_at,
            finished_at: chrono::Utc::now(),
        };

        tracing::info!(
            enhanced = result.expanded_prompt.was_enhanced,
            model_available = result.model.is_some(),
            "Pipeline run finished",
        );
        Ok(result)
    }

    /// Synthesize the image from the expanded prompt and persist it.
    async fn image_stages(
        &self,
        prompt: &str,
        caller_id: &str,
    ) -> Result<(Vec<u8>, ArtifactRef), (Stage, StageError)> {
        let payload = CapabilityPayload::new().with_text(PROMPT_FIELD, prompt);
        let image_bytes = self
            .synthesize(&self.image_capability_id, payload, caller_id)
            .await
            .map_err(|e| (Stage::SynthesizeImage, e))?;
        tracing::info!(stage = %Stage::SynthesizeImage, "Stage completed");

        let image = self
            .persist(ArtifactSlot::Image, &image_bytes, &self.image_capability_id)
            .await
            .map_err(|e| (Stage::PersistImage, e))?;
        tracing::info!(stage = %Stage::PersistImage, path = %image.path.display(), "Stage completed");

        Ok((image_bytes, image))
    }

    /// Run the 3D stages on freshly produced image bytes.
    async fn model_stages(
        &self,
        image_bytes: Vec<u8>,
        caller_id: &str,
    ) -> Result<ArtifactRef, (Stage, StageError)> {
        let payload = CapabilityPayload::new().with_bytes(IMAGE_FIELD, image_bytes);
        let model_bytes = self
            .synthesize(&self.model_capability_id, payload, caller_id)
            .await
            .map_err(|e| (Stage::SynthesizeModel, e))?;
        tracing::info!(stage = %Stage::SynthesizeModel, "Stage completed");

        let model = self
            .persist(ArtifactSlot::Model, &model_bytes, &self.model_capability_id)
            .await
            .map_err(|e| (Stage::PersistModel, e))?;
        tracing::info!(stage = %Stage::PersistModel, path = %model.path.display(), "Stage completed");

        Ok(model)
    }

    /// Invoke a capability and take its binary result.
    async fn synthesize(
        &self,
        capability_id: &str,
        payload: CapabilityPayload,
        caller_id: &str,
    ) -> Result<Vec<u8>, StageError> {
        let response = self.invoker.invoke(capability_id, payload, caller_id).await?;
        let bytes = response.into_result_bytes()?;
        tracing::debug!(capability_id, bytes = bytes.len(), "Capability returned result");
        Ok(bytes)
    }

    /// Write bytes to a slot and describe the stored artifact.
    async fn persist(
        &self,
        slot: ArtifactSlot,
        bytes: &[u8],
        capability_id: &str,
    ) -> Result<ArtifactRef, StageError> {
        let path = self.store.persist(slot, bytes).await?;
        Ok(ArtifactRef {
            slot,
            path,
            byte_len: bytes.len() as u64,
            content_type: slot.detect_content_type(bytes),
            source_capability_id: capability_id.to_string(),
        })
    }
}
