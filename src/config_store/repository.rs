//! ConfigStore Repository
//!
//! File persistence layer for the configuration document. This is the
//! single persistence boundary: callers serialize all writes through the
//! registry mutex, the repository guarantees atomic replace-on-write
//! (write temp file, fsync, rename).

use super::types::ConfigDocument;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// ConfigStore repository for file operations
#[derive(Clone)]
pub struct ConfigRepository {
    path: PathBuf,
}

impl ConfigRepository {
    /// Create new repository backed by the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, or return defaults when the file does not exist yet
    pub async fn load(&self) -> Result<ConfigDocument> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => {
                let doc: ConfigDocument = serde_json::from_slice(&bytes)?;
                tracing::info!(
                    path = %self.path.display(),
                    cameras = doc.cameras.len(),
                    layouts = doc.grid_fusion.layouts.len(),
                    "Configuration loaded"
                );
                Ok(doc)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(
                    path = %self.path.display(),
                    "No configuration file yet, starting with defaults"
                );
                Ok(ConfigDocument::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Durably write the full document: temp file, fsync, rename
    pub async fn save(&self, doc: &ConfigDocument) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }

        let json = serde_json::to_vec_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&json).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;

        tracing::debug!(
            path = %self.path.display(),
            bytes = json.len(),
            "Configuration saved"
        );
        Ok(())
    }
}
