//! Artifact slots and handles.
//!
//! Every run owns exactly two storage slots: one for the generated image
//! and one for the generated 3D model. A slot maps to a fixed file name
//! and is overwritten by each run.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// File name of the image slot.
pub const IMAGE_FILE_NAME: &str = "output.png";

/// File name of the 3D model slot.
pub const MODEL_FILE_NAME: &str = "output.glb";

/// Content type reported when the bytes are not recognised.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Content type of binary glTF models.
pub const GLTF_BINARY: &str = "model/gltf-binary";

/// Magic header of a binary glTF container.
const GLB_MAGIC: &[u8; 4] = b"glTF";

/// One of the two fixed storage locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactSlot {
    Image,
    Model,
}

impl ArtifactSlot {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Image => IMAGE_FILE_NAME,
            Self::Model => MODEL_FILE_NAME,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Model => "model",
        }
    }

    /// Absolute or relative path of this slot under `base_dir`.
    pub fn path_in(self, base_dir: &Path) -> PathBuf {
        base_dir.join(self.file_name())
    }

    /// Best-effort content type for bytes destined for this slot.
    pub fn detect_content_type(self, bytes: &[u8]) -> &'static str {
        match self {
            Self::Image => image::guess_format(bytes)
                .map(|format| format.to_mime_type())
                .unwrap_or(OCTET_STREAM),
            Self::Model => {
                if bytes.starts_with(GLB_MAGIC) {
                    GLTF_BINARY
                } else {
                    OCTET_STREAM
                }
            }
        }
    }
}

impl std::fmt::Display for ArtifactSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle to a persisted artifact.
///
/// Carries enough metadata to describe the artifact without holding its
/// bytes; readers fetch the contents from `path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRef {
    pub slot: ArtifactSlot,
    pub path: PathBuf,
    pub byte_len: u64,
    pub content_type: &'static str,
    /// Capability that produced the bytes.
    pub source_capability_id: String,
}
