use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use super::ArchiveStore;
use crate::error::Result;

/// An archive stored in a local file
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
}

impl LocalFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ArchiveStore for LocalFile {
    async fn load(&self) -> Result<Vec<u8>> {
        Ok(fs::read(&self.path).await?)
    }

    async fn save(&self, data: &[u8]) -> Result<()> {
        // Create parent directories if needed
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(&self.path, data).await?;
        log::debug!("Saved {} bytes to {}", data.len(), self.path.display());
        Ok(())
    }

    async fn exists(&self) -> Result<bool> {
        Ok(fs::try_exists(&self.path).await?)
    }
}
