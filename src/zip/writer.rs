//! Write path: assembling a complete archive from the entry directory.
//!
//! Each entry contributes a local header followed by its compressed data.
//! The central directory follows all data blocks, and the end records close
//! the archive. Offsets are assigned while walking the entries in order, so
//! entry N+1 is only laid out once entry N's compressed length is known.

use super::directory::ZipArchive;
use super::entry::ZipEntry;
use super::main_header::MainHeader;
use crate::codec::{AsyncCompressor, Compressor};
use crate::error::Result;

/// Notified around each entry's compression in
/// [`ZipArchive::compress_to_buffer_async`].
pub trait Progress {
    fn item_start(&mut self, _name: &str) {}

    fn item_end(&mut self, _name: &str) {}
}

impl Progress for () {}

/// Blocks collected during one serialization pass.
#[derive(Default)]
struct Layout {
    data_blocks: Vec<Vec<u8>>,
    central_blocks: Vec<Vec<u8>>,
    /// Running offset of the next local header, and finally of the central directory
    offset: u64,
    central_size: u64,
    zip64: bool,
}

impl Layout {
    fn push(&mut self, entry: &mut ZipEntry, data: Vec<u8>) -> Result<()> {
        entry.header_mut().set_offset(self.offset);
        let local = entry.pack_local_header()?;
        log::debug!(
            "{} at offset {}: {} bytes of data",
            entry.name(),
            self.offset,
            data.len()
        );
        self.offset += (local.len() + data.len()) as u64;
        self.data_blocks.push(local);
        self.data_blocks.push(data);

        let central = entry.pack_central_header()?;
        self.central_size += central.len() as u64;
        self.central_blocks.push(central);
        self.zip64 |= entry.header().zip64();
        Ok(())
    }

    fn finish(self, main: &mut MainHeader, comment: &[u8]) -> Result<Vec<u8>> {
        main.size = self.central_size;
        main.offset = self.offset;
        main.zip64_format |= self.zip64;

        let total = self.offset as usize + self.central_size as usize + main.main_header_size(comment.len());
        let mut out = Vec::with_capacity(total);
        for block in self.data_blocks.iter().chain(&self.central_blocks) {
            out.extend_from_slice(block);
        }
        out.extend_from_slice(&main.to_bytes(comment)?);
        log::debug!(
            "Wrote {} bytes, central directory at {} ({} bytes), zip64: {}",
            out.len(),
            main.offset,
            main.size,
            main.is_zip64()
        );
        Ok(out)
    }
}

impl ZipArchive {
    fn prepare_write(&mut self) -> Result<Layout> {
        self.load()?;
        self.sort_entries();
        let count = self.entries.len() as u64;
        self.main_header.disk_entries = count;
        self.main_header.total_entries = count;
        self.main_header.size = 0;
        self.main_header.offset = 0;
        Ok(Layout::default())
    }

    /// Serialize the archive into a single buffer.
    ///
    /// Entries are sorted first unless `no_sort` is set. New content is
    /// compressed with `codec`; entries read from an archive are copied as
    /// they are. Any error aborts the pass and no buffer is returned.
    pub fn compress_to_buffer(&mut self, codec: &impl Compressor) -> Result<Vec<u8>> {
        let mut layout = self.prepare_write()?;
        for entry in &mut self.entries {
            let data = entry.compressed_data(codec)?;
            layout.push(entry, data)?;
        }
        layout.finish(&mut self.main_header, &self.comment)
    }

    /// Asynchronous form of [`compress_to_buffer`](Self::compress_to_buffer).
    ///
    /// Entries are compressed one after the other in archive order;
    /// `progress` hears about each one before and after its compression.
    pub async fn compress_to_buffer_async<C, P>(&mut self, codec: &C, progress: &mut P) -> Result<Vec<u8>>
    where
        C: AsyncCompressor + ?Sized,
        P: Progress + ?Sized,
    {
        let mut layout = self.prepare_write()?;
        for entry in &mut self.entries {
            let name = entry.name().to_string();
            progress.item_start(&name);
            let data = entry.compressed_data_async(codec).await?;
            progress.item_end(&name);
            layout.push(entry, data)?;
        }
        layout.finish(&mut self.main_header, &self.comment)
    }
}
