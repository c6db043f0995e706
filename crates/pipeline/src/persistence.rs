//! Durable storage for the two artifact slots.
//!
//! [`LocalArtifactStore`] writes each slot to a fixed file under a base
//! directory. Bytes go to a temporary sibling first and are renamed over
//! the slot file, so a slot either holds the previous run's bytes or the
//! new ones in full.

use std::path::{Path, PathBuf};

use dreamforge_core::artifact::ArtifactSlot;

/// A slot write or read failed.
#[derive(Debug, thiserror::Error)]
#[error("Failed to {action} {slot} artifact at {}: {source}", .path.display())]
pub struct PersistenceError {
    pub slot: ArtifactSlot,
    pub action: &'static str,
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Storage for fixed, overwrite-in-place artifact slots.
pub trait ArtifactStore: Send + Sync {
    /// Replace the contents of `slot` with `bytes`, returning its path.
    fn persist(
        &self,
        slot: ArtifactSlot,
        bytes: &[u8],
    ) -> impl std::future::Future<Output = Result<PathBuf, PersistenceError>> + Send;

    /// Current contents of `slot`, or `None` if nothing was ever written.
    fn read(
        &self,
        slot: ArtifactSlot,
    ) -> impl std::future::Future<Output = Result<Option<Vec<u8>>, PersistenceError>> + Send;
}

/// Filesystem-backed [`ArtifactStore`].
#[derive(Debug, Clone)]
pub struct LocalArtifactStore {
    base_dir: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn slot_path(&self, slot: ArtifactSlot) -> PathBuf {
        slot.path_in(&self.base_dir)
    }

    fn temp_path(&self, slot: ArtifactSlot) -> PathBuf {
        self.base_dir
            .join(format!(".{}.{}.tmp", slot.file_name(), uuid::Uuid::new_v4()))
    }
}

impl ArtifactStore for LocalArtifactStore {
    async fn persist(&self, slot: ArtifactSlot, bytes: &[u8]) -> Result<PathBuf, PersistenceError> {
        let path = self.slot_path(slot);
        let fail = |source| PersistenceError {
            slot,
            action: "write",
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.base_dir).await.map_err(fail)?;

        let temp = self.temp_path(slot);
        if let Err(e) = tokio::fs::write(&temp, bytes).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(fail(e));
        }
        if let Err(e) = tokio::fs::rename(&temp, &path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(fail(e));
        }

        tracing::info!(%slot, path = %path.display(), bytes = bytes.len(), "Artifact saved");
        Ok(path)
    }

    async fn read(&self, slot: ArtifactSlot) -> Result<Option<Vec<u8>>, PersistenceError> {
        let path = self.slot_path(slot);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError {
                slot,
                action: "read",
                path,
                source,
            }),
        }
    }
}
