use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreError;
use crate::types::DEFAULT_CALLER_ID;

/// Text-to-image capability used when `IMAGE_CAPABILITY_ID` is unset.
pub const DEFAULT_IMAGE_CAPABILITY_ID: &str =
    "f0997a01-d6d3-a5fe-53d8-561300318557.node3.openfabric.network";

/// Image-to-3D capability used when `MODEL_CAPABILITY_ID` is unset.
pub const DEFAULT_MODEL_CAPABILITY_ID: &str =
    "69543f29-4d41-4afc-7f29-3d51591f11eb.node3.openfabric.network";

pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "deepseek-coder";
pub const DEFAULT_ENHANCE_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CAPABILITY_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_CAPABILITY_SCHEME: &str = "https";

/// Runtime settings for one pipeline process.
///
/// All fields have defaults matching the production deployment; override
/// via environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Capability invoked for text-to-image synthesis.
    pub image_capability_id: String,
    /// Capability invoked for image-to-3D synthesis.
    pub model_capability_id: String,
    /// Directory holding the fixed artifact slots.
    pub artifact_dir: PathBuf,
    /// Base URL of the local Ollama server.
    pub ollama_url: String,
    /// Model used for prompt enhancement.
    pub ollama_model: String,
    /// Timeout for the enhancement call.
    pub enhance_timeout: Duration,
    /// Timeout for each remote capability call.
    pub capability_timeout: Duration,
    /// URL scheme used to reach capability hosts (`https` or `http`).
    pub capability_scheme: String,
    /// Caller identity used when the request does not name one.
    pub caller_id: String,
    /// Optional JSON file with stored user configurations.
    pub user_config_path: Option<PathBuf>,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            image_capability_id: DEFAULT_IMAGE_CAPABILITY_ID.to_string(),
            model_capability_id: DEFAULT_MODEL_CAPABILITY_ID.to_string(),
            artifact_dir: PathBuf::from("."),
            ollama_url: DEFAULT_OLLAMA_URL.to_string(),
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
            enhance_timeout: Duration::from_secs(DEFAULT_ENHANCE_TIMEOUT_SECS),
            capability_timeout: Duration::from_secs(DEFAULT_CAPABILITY_TIMEOUT_SECS),
            capability_scheme: DEFAULT_CAPABILITY_SCHEME.to_string(),
            caller_id: DEFAULT_CALLER_ID.to_string(),
            user_config_path: None,
        }
    }
}

impl PipelineSettings {
    /// Load settings from environment variables with defaults.
    ///
    /// | Env Var                   | Default                        |
    /// |---------------------------|--------------------------------|
    /// | `IMAGE_CAPABILITY_ID`     | text-to-image app host         |
    /// | `MODEL_CAPABILITY_ID`     | image-to-3D app host           |
    /// | `ARTIFACT_DIR`            | `.`                            |
    /// | `OLLAMA_URL`              | `http://127.0.0.1:11434`       |
    /// | `OLLAMA_MODEL`            | `deepseek-coder`               |
    /// | `ENHANCE_TIMEOUT_SECS`    | `120`                          |
    /// | `CAPABILITY_TIMEOUT_SECS` | `300`                          |
    /// | `CAPABILITY_SCHEME`       | `https`                        |
    /// | `CALLER_ID`               | `super-user`                   |
    /// | `USER_CONFIG_PATH`        | unset                          |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Empty values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let enhance_timeout = match get("ENHANCE_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_secs("ENHANCE_TIMEOUT_SECS", &raw)?),
            None => defaults.enhance_timeout,
        };
        let capability_timeout = match get("CAPABILITY_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_secs("CAPABILITY_TIMEOUT_SECS", &raw)?),
            None => defaults.capability_timeout,
        };

        let capability_scheme = get("CAPABILITY_SCHEME").unwrap_or(defaults.capability_scheme);
        if capability_scheme != "https" && capability_scheme != "http" {
            return Err(CoreError::Validation(format!(
                "CAPABILITY_SCHEME must be 'http' or 'https', got '{capability_scheme}'"
            )));
        }

        Ok(Self {
            image_capability_id: get("IMAGE_CAPABILITY_ID").unwrap_or(defaults.image_capability_id),
            model_capability_id: get("MODEL_CAPABILITY_ID").unwrap_or(defaults.model_capability_id),
            artifact_dir: get("ARTIFACT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.artifact_dir),
            ollama_url: get("OLLAMA_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.ollama_url),
            ollama_model: get("OLLAMA_MODEL").unwrap_or(defaults.ollama_model),
            enhance_timeout,
            capability_timeout,
            capability_scheme,
            caller_id: get("CALLER_ID").unwrap_or(defaults.caller_id),
            user_config_path: get("USER_CONFIG_PATH").map(PathBuf::from),
        })
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<u64, CoreError> {
    match raw.parse::<u64>() {
        Ok(0) => Err(CoreError::Validation(format!("{key} must be positive"))),
        Ok(secs) => Ok(secs),
        Err(_) => Err(CoreError::Validation(format!(
            "{key} must be a whole number of seconds, got '{raw}'"
        ))),
    }
}
