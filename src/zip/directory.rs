//! The in-memory entry directory of an archive.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use super::entry::ZipEntry;
use super::main_header::MainHeader;
use super::parser::ZipParser;
use crate::error::Result;

/// Options for reading and rewriting an archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// Scan the whole buffer for the end record instead of the last 64 KiB.
    pub deep_search: bool,
    /// Walk the central directory while opening instead of on first use.
    pub read_entries: bool,
    /// Keep insertion order when saving instead of sorting by name.
    pub no_sort: bool,
}

/// Whether `name` is `dir` itself or lies below it.
fn is_child_of(name: &str, dir: &str) -> bool {
    match name.strip_prefix(dir) {
        Some(rest) => rest.is_empty() || dir.ends_with('/') || rest.starts_with('/'),
        None => false,
    }
}

/// An archive's entries, lookup index, end record and comment.
///
/// Opening an archive only reads its end records. The central directory is
/// walked on the first operation that needs entries; until then
/// [`entry_count`](Self::entry_count) answers from the end record.
#[derive(Debug, Default)]
pub struct ZipArchive {
    pub(super) entries: Vec<ZipEntry>,
    index: HashMap<String, usize>,
    loaded: bool,
    pub(super) main_header: MainHeader,
    pub(super) comment: Vec<u8>,
    source: Option<ZipParser>,
    pub(super) options: ReadOptions,
}

impl ZipArchive {
    /// An empty archive.
    pub fn new(options: ReadOptions) -> Self {
        Self {
            loaded: true,
            options,
            ..Default::default()
        }
    }

    /// Open an archive held in memory.
    ///
    /// # Errors
    ///
    /// Fails when the end records are missing or malformed, when the archive
    /// spans several disks, and (with `read_entries`) on any central
    /// directory error.
    pub fn from_buffer(data: impl Into<Arc<[u8]>>, options: ReadOptions) -> Result<Self> {
        let parser = ZipParser::new(data);
        let (main_header, comment) = parser.read_main_header(options.deep_search)?;
        let mut archive = Self {
            main_header,
            comment,
            source: Some(parser),
            options,
            ..Default::default()
        };
        if options.read_entries {
            archive.load()?;
        }
        Ok(archive)
    }

    pub(super) fn load(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }
        if let Some(parser) = &self.source {
            self.entries = parser.read_entries(&self.main_header)?;
        }
        self.loaded = true;
        self.rebuild_index();
        Ok(())
    }

    pub(super) fn rebuild_index(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.name().to_string(), i))
            .collect();
    }

    fn update_counts(&mut self) {
        let count = self.entries.len() as u64;
        self.main_header.total_entries = count;
        self.main_header.disk_entries = count;
    }

    pub fn options(&self) -> ReadOptions {
        self.options
    }

    pub fn main_header(&self) -> &MainHeader {
        &self.main_header
    }

    /// Number of entries, without walking the central directory.
    pub fn entry_count(&self) -> u64 {
        if self.loaded {
            self.entries.len() as u64
        } else {
            self.main_header.disk_entries
        }
    }

    pub fn entries(&mut self) -> Result<&[ZipEntry]> {
        self.load()?;
        Ok(&self.entries)
    }

    pub fn entries_mut(&mut self) -> Result<&mut [ZipEntry]> {
        self.load()?;
        Ok(&mut self.entries)
    }

    /// Look up an entry by name. With duplicate names the last one wins.
    pub fn entry(&mut self, name: &str) -> Result<Option<&ZipEntry>> {
        self.load()?;
        Ok(self.index.get(name).map(|&i| &self.entries[i]))
    }

    pub fn entry_mut(&mut self, name: &str) -> Result<Option<&mut ZipEntry>> {
        self.load()?;
        Ok(self.index.get(name).map(|&i| &mut self.entries[i]))
    }

    /// Append an entry and index it by name.
    pub fn set_entry(&mut self, entry: ZipEntry) -> Result<()> {
        self.load()?;
        self.index.insert(entry.name().to_string(), self.entries.len());
        self.entries.push(entry);
        self.update_counts();
        Ok(())
    }

    /// Delete an entry. Deleting a directory also deletes everything below it.
    ///
    /// # Returns
    ///
    /// `false` when no entry has that name.
    pub fn delete_entry(&mut self, name: &str) -> Result<bool> {
        self.load()?;
        let Some(&pos) = self.index.get(name) else {
            return Ok(false);
        };

        if self.entries[pos].is_directory() {
            let dir = self.entries[pos].name().to_string();
            self.entries.retain(|entry| !is_child_of(entry.name(), &dir));
        } else {
            self.entries.remove(pos);
        }
        log::debug!("Deleted {name}, {} entries left", self.entries.len());

        self.rebuild_index();
        self.update_counts();
        Ok(true)
    }

    /// A directory entry and every entry below it; empty for files and unknown names.
    pub fn entry_children(&mut self, name: &str) -> Result<Vec<&ZipEntry>> {
        self.load()?;
        let Some(&pos) = self.index.get(name) else {
            return Ok(Vec::new());
        };
        let dir = &self.entries[pos];
        if !dir.is_directory() {
            return Ok(Vec::new());
        }
        Ok(self
            .entries
            .iter()
            .filter(|entry| is_child_of(entry.name(), dir.name()))
            .collect())
    }

    pub fn comment(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.comment)
    }

    pub fn set_comment(&mut self, comment: &str) {
        self.comment = comment.as_bytes().to_vec();
    }

    /// Order entries by lowercased name, unless `no_sort` is set.
    ///
    /// This compares lowercased UTF-8 bytes, which only approximates
    /// locale-aware collation: accented and non-Latin names order by code
    /// point, not by dictionary position.
    pub(super) fn sort_entries(&mut self) {
        if self.entries.len() > 1 && !self.options.no_sort {
            self.entries.sort_by_cached_key(|entry| entry.name().to_lowercase());
            self.rebuild_index();
        }
    }
}
