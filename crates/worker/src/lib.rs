//! Process wiring for the `dreamforge-worker` binary.
//!
//! Builds the production pipeline from [`PipelineSettings`]: Ollama for
//! enhancement, the HTTP capability API for synthesis, and the local
//! artifact store for persistence.

use clap::Parser;
use dreamforge_capability::{CapabilityApi, CapabilityError, GenerationError, OllamaClient};
use dreamforge_core::config::ConfigStore;
use dreamforge_core::error::CoreError;
use dreamforge_core::result::PipelineResult;
use dreamforge_core::settings::PipelineSettings;
use dreamforge_core::types::PromptRequest;
use dreamforge_pipeline::{LocalArtifactStore, Pipeline, PipelineError, PromptEnhancer};

/// Command line of the `dreamforge-worker` binary.
#[derive(Debug, Parser)]
#[command(name = "dreamforge-worker")]
#[command(about = "Turn a text prompt into an image and a 3D model", long_about = None)]
pub struct Cli {
    /// Prompt words; joined with single spaces. Falls back to `PROMPT`.
    #[arg(env = "PROMPT", num_args = 1.., required = true)]
    pub prompt: Vec<String>,
}

impl Cli {
    /// The prompt as one string. An explicitly empty argument is passed
    /// through unchanged.
    pub fn prompt(&self) -> String {
        self.prompt.join(" ")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error(transparent)]
    Config(#[from] CoreError),

    #[error("Failed to build capability client: {0}")]
    Capability(#[from] CapabilityError),

    #[error("Failed to build enhancement client: {0}")]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// Run one prompt through the full pipeline.
pub async fn execute(
    settings: &PipelineSettings,
    prompt: String,
) -> Result<PipelineResult, WorkerError> {
    let store = ConfigStore::new();
    if let Some(path) = &settings.user_config_path {
        let loaded = store.load_file(path).await?;
        tracing::info!(path = %path.display(), users = loaded, "Loaded user configurations");
    }

    let request = PromptRequest::new(prompt, settings.caller_id.clone());
    let config = store.resolve_active(&request.caller_id).await;

    let generator = OllamaClient::new(
        settings.ollama_url.clone(),
        settings.ollama_model.clone(),
        settings.enhance_timeout,
    )?;
    let invoker = CapabilityApi::new(
        config.clone(),
        settings.capability_scheme.clone(),
        settings.capability_timeout,
    )?;
    let artifacts = LocalArtifactStore::new(settings.artifact_dir.clone());

    let pipeline =
        Pipeline::from_settings(PromptEnhancer::new(generator), invoker, artifacts, settings);

    Ok(pipeline.run(&request, &config).await?)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use assert_matches::assert_matches;

    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("dreamforge-worker").chain(args.iter().copied()))
    }

    #[test]
    fn args_are_joined() {
        assert_eq!(parse(&["a", "red", "fox"]).unwrap().prompt(), "a red fox");
    }

    #[test]
    fn empty_arg_is_kept() {
        assert_eq!(parse(&[""]).unwrap().prompt(), "");
    }

    #[test]
    fn missing_prompt_is_usage_error() {
        if std::env::var_os("PROMPT").is_some() {
            return;
        }
        let err = parse(&[]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_arg_is_usage_error() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        let args = [
            OsString::from("dreamforge-worker"),
            OsString::from_vec(vec![0xff, 0xfe]),
        ];
        let err = Cli::try_parse_from(args).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidUtf8);
    }

    fn offline_settings(dir: &std::path::Path) -> PipelineSettings {
        PipelineSettings {
            artifact_dir: dir.to_path_buf(),
            ollama_url: "http://127.0.0.1:9".into(),
            enhance_timeout: Duration::from_secs(2),
            capability_timeout: Duration::from_secs(2),
            ..PipelineSettings::default()
        }
    }

    #[tokio::test]
    async fn unconfigured_caller_cannot_reach_capabilities() {
        let dir = tempfile::tempdir().unwrap();
        let settings = offline_settings(dir.path());

        let err = execute(&settings, "a red fox in snow".into())
            .await
            .unwrap_err();
        assert_matches!(
            err,
            WorkerError::Pipeline(PipelineError::ImageSynthesis(
                CapabilityError::NotPermitted { .. }
            ))
        );
        assert!(!dir.path().join("output.png").exists());
    }

    #[tokio::test]
    async fn unreadable_user_config_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let settings = PipelineSettings {
            user_config_path: Some(dir.path().join("missing.json")),
            ..offline_settings(dir.path())
        };

        let err = execute(&settings, "prompt".into()).await.unwrap_err();
        assert_matches!(err, WorkerError::Config(_));
    }
}
