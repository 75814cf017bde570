mod local;

pub use local::LocalFile;

use async_trait::async_trait;

use crate::error::Result;

/// Whole-buffer storage for an archive.
#[async_trait]
pub trait ArchiveStore: Send + Sync {
    /// Read the complete archive.
    async fn load(&self) -> Result<Vec<u8>>;

    /// Replace the stored archive with `data`.
    async fn save(&self, data: &[u8]) -> Result<()>;

    /// Whether there is anything to load yet.
    async fn exists(&self) -> Result<bool>;
}
