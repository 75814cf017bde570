use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::directory::ZipArchive;
use super::entry::ZipEntry;
use crate::codec::Compressor;
use crate::error::Result;
use crate::path::sanitize;

/// What happened to one entry during extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    Written(PathBuf),
    Directory(PathBuf),
    /// The target existed and overwriting was off.
    Skipped(PathBuf),
}

/// Writes archive entries below a base directory.
///
/// Every entry name goes through [`sanitize`] before the filesystem is
/// touched, so nothing is ever written outside the base directory.
pub struct ZipExtractor<C: Compressor> {
    base: PathBuf,
    codec: C,
    overwrite: bool,
}

impl<C: Compressor> ZipExtractor<C> {
    /// An extractor writing below `base`; an empty path means the current directory.
    pub fn new(base: impl Into<PathBuf>, codec: C) -> Self {
        Self {
            base: base.into(),
            codec,
            overwrite: false,
        }
    }

    /// Replace existing files instead of skipping them.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// The path `entry` would be written to.
    pub fn target_path(&self, entry: &ZipEntry) -> Result<PathBuf> {
        sanitize(&self.base, entry.name())
    }

    /// Extract file data to memory
    pub fn extract_to_memory(&self, entry: &ZipEntry) -> Result<Vec<u8>> {
        entry.data(&self.codec)
    }

    /// Extract one entry to disk, creating parent directories as needed.
    pub async fn extract_entry(&self, entry: &ZipEntry) -> Result<Extracted> {
        let path = self.target_path(entry)?;

        if entry.is_directory() {
            fs::create_dir_all(&path).await?;
            return Ok(Extracted::Directory(path));
        }

        if !self.overwrite && fs::try_exists(&path).await? {
            return Ok(Extracted::Skipped(path));
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let data = self.extract_to_memory(entry)?;
        let mut file = fs::File::create(&path).await?;
        file.write_all(&data).await?;
        file.flush().await?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, std::fs::Permissions::from_mode(mode)).await?;
        }

        log::debug!("Extracted {} to {}", entry.name(), path.display());
        Ok(Extracted::Written(path))
    }

    /// Extract every entry of `archive`.
    pub async fn extract_all(&self, archive: &mut ZipArchive) -> Result<Vec<Extracted>> {
        let mut results = Vec::new();
        for entry in archive.entries()? {
            results.push(self.extract_entry(entry).await?);
        }
        Ok(results)
    }

    /// Extract file to stdout
    pub async fn extract_to_stdout(&self, entry: &ZipEntry) -> Result<()> {
        let data = self.extract_to_memory(entry)?;

        let mut stdout = tokio::io::stdout();
        stdout.write_all(&data).await?;
        stdout.flush().await?;

        Ok(())
    }
}
