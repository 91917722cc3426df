//! Object-storage seam for the training artifact
//!
//! Upload failures surface as run failures; already-generated samples are
//! left on disk for inspection rather than cleaned up.

use crate::errors::{DriftError, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;

/// Artifact upload seam
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Upload a local artifact; returns its remote identifier
    async fn upload(&self, local_path: &Path) -> Result<String>;
}

/// Directory-backed artifact store
pub struct LocalArtifactStore {
    dir: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }
}

#[async_trait]
impl ArtifactStore for LocalArtifactStore {
    async fn upload(&self, local_path: &Path) -> Result<String> {
        let file_name = local_path
            .file_name()
            .ok_or_else(|| DriftError::StorageError(format!(
                "Artifact path has no file name: {}",
                local_path.display()
            )))?;

        if !local_path.exists() {
            return Err(DriftError::StorageError(format!(
                "Artifact does not exist: {}",
                local_path.display()
            )));
        }

        let dest = self.dir.join(file_name);
        fs::copy(local_path, &dest)?;

        info!(from = %local_path.display(), to = %dest.display(), "Uploaded artifact");
        Ok(dest.display().to_string())
    }
}

/// Recording artifact store for tests and embedded use
#[derive(Default)]
pub struct MemoryArtifactStore {
    uploads: Mutex<Vec<PathBuf>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths uploaded so far
    pub fn uploads(&self) -> Vec<PathBuf> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn upload(&self, local_path: &Path) -> Result<String> {
        if !local_path.exists() {
            return Err(DriftError::StorageError(format!(
                "Artifact does not exist: {}",
                local_path.display()
            )));
        }
        self.uploads.lock().unwrap().push(local_path.to_path_buf());
        Ok(local_path.display().to_string())
    }
}
