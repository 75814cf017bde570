//! A single archive entry.

use std::borrow::Cow;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use jiff::civil::DateTime;

use super::extra::ExtraFields;
use super::header::CentralDirectoryHeader;
use super::structures::{CompressionMethod, DosDateTime};
use crate::codec::{AsyncCompressor, Compressor};
use crate::crc::crc32;
use crate::error::{Result, ZipError};
use crate::path::zip_name_fix;

/// DOS directory attribute bit.
const DOS_DIRECTORY: u32 = 0x10;
const S_IFDIR: u32 = 0o040000;
const S_IFREG: u32 = 0o100000;

/// Where an entry's bytes come from.
#[derive(Clone)]
enum Payload {
    /// Already compressed bytes inside the archive the entry was read from.
    Archived { source: Arc<[u8]>, range: Range<usize> },
    /// Plain bytes, compressed when the archive is saved.
    Uncompressed(Vec<u8>),
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Archived { range, .. } => f.debug_tuple("Archived").field(range).finish(),
            Payload::Uncompressed(data) => write!(f, "Uncompressed({} bytes)", data.len()),
        }
    }
}

/// One file or directory in an archive.
#[derive(Debug, Clone)]
pub struct ZipEntry {
    name: String,
    raw_name: Vec<u8>,
    header: CentralDirectoryHeader,
    extra: ExtraFields,
    local_extra: ExtraFields,
    comment: Vec<u8>,
    payload: Payload,
}

impl ZipEntry {
    /// Create an empty entry. The name is normalized with [`zip_name_fix`];
    /// a trailing `/` makes it a directory.
    pub fn new(name: &str) -> Self {
        let name = zip_name_fix(name);
        let mut header = CentralDirectoryHeader::default();
        if name.ends_with('/') {
            header.attr |= DOS_DIRECTORY;
        }
        Self {
            raw_name: name.as_bytes().to_vec(),
            name,
            header,
            extra: ExtraFields::new(),
            local_extra: ExtraFields::new(),
            comment: Vec::new(),
            payload: Payload::Uncompressed(Vec::new()),
        }
    }

    pub fn with_data(name: &str, data: Vec<u8>) -> Self {
        let mut entry = Self::new(name);
        entry.set_data(data);
        entry
    }

    /// Entry read from an archive; `range` is where its compressed bytes sit in `source`.
    /// The stored name bytes are kept as-is and written back unchanged.
    pub(crate) fn from_archive(
        raw_name: Vec<u8>,
        header: CentralDirectoryHeader,
        extra: ExtraFields,
        local_extra: ExtraFields,
        comment: Vec<u8>,
        source: Arc<[u8]>,
        range: Range<usize>,
    ) -> Self {
        Self {
            name: String::from_utf8_lossy(&raw_name).into_owned(),
            raw_name,
            header,
            extra,
            local_extra,
            comment,
            payload: Payload::Archived { source, range },
        }
    }

    /// The name as text; bytes that are not UTF-8 show as U+FFFD.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name exactly as stored in the archive.
    pub fn raw_name(&self) -> &[u8] {
        &self.raw_name
    }

    pub fn is_directory(&self) -> bool {
        self.name.ends_with('/')
    }

    pub fn header(&self) -> &CentralDirectoryHeader {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut CentralDirectoryHeader {
        &mut self.header
    }

    pub fn extra(&self) -> &ExtraFields {
        &self.extra
    }

    pub fn extra_mut(&mut self) -> &mut ExtraFields {
        &mut self.extra
    }

    pub fn comment(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.comment)
    }

    pub fn set_comment(&mut self, comment: &str) {
        self.comment = comment.as_bytes().to_vec();
    }

    pub fn time(&self) -> Option<DateTime> {
        self.header.time.to_datetime()
    }

    pub fn set_time(&mut self, time: DateTime) {
        self.header.time = DosDateTime::from_datetime(time);
    }

    /// Replace the entry's content. It is compressed on the next save.
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.header.set_size(data.len() as u64);
        self.payload = Payload::Uncompressed(data);
    }

    /// Store Unix permission bits in the high half of the external attributes.
    pub fn set_unix_mode(&mut self, mode: u32) {
        let (kind, dos) = if self.is_directory() {
            (S_IFDIR, DOS_DIRECTORY)
        } else {
            (S_IFREG, 0)
        };
        self.header.attr = ((kind | (mode & 0o7777)) << 16) | dos;
    }

    /// Unix permission bits, if the archive recorded any.
    pub fn unix_mode(&self) -> Option<u32> {
        let mode = self.header.file_attr() as u32;
        (mode != 0).then_some(mode)
    }

    /// The uncompressed content, checked against the stored CRC-32.
    pub fn data(&self, codec: &impl Compressor) -> Result<Vec<u8>> {
        let (source, range) = match &self.payload {
            Payload::Uncompressed(data) => return Ok(data.clone()),
            Payload::Archived { source, range } => (source, range),
        };
        if self.header.encrypted() {
            return Err(ZipError::NotImplemented("encrypted entries"));
        }

        let raw = &source[range.clone()];
        let size_hint = usize::try_from(self.header.size()).unwrap_or(0);
        let data = match self.header.method() {
            CompressionMethod::Stored => raw.to_vec(),
            CompressionMethod::Deflated => codec.decompress(raw, size_hint)?,
            CompressionMethod::Unknown(_) => return Err(ZipError::NotImplemented("compression method")),
        };

        let actual = crc32(&data);
        if actual != self.header.crc {
            return Err(ZipError::ChecksumMismatch {
                expected: self.header.crc,
                actual,
            });
        }
        Ok(data)
    }

    /// The bytes to store after the local header.
    ///
    /// Archived entries are returned as they are. Plain content is stored for
    /// directories and empty files and deflated otherwise; CRC, sizes and
    /// method are updated to match.
    pub fn compressed_data(&mut self, codec: &impl Compressor) -> Result<Vec<u8>> {
        let data = match &self.payload {
            Payload::Archived { source, range } => return Ok(source[range.clone()].to_vec()),
            Payload::Uncompressed(data) => data,
        };
        let compressed = match self.method_for_save() {
            CompressionMethod::Deflated => codec.compress(data)?,
            _ => data.clone(),
        };
        self.record_compression(compressed.len());
        Ok(compressed)
    }

    /// Asynchronous form of [`compressed_data`](Self::compressed_data).
    pub async fn compressed_data_async<C>(&mut self, codec: &C) -> Result<Vec<u8>>
    where
        C: AsyncCompressor + ?Sized,
    {
        let data = match &self.payload {
            Payload::Archived { source, range } => return Ok(source[range.clone()].to_vec()),
            Payload::Uncompressed(data) => data.clone(),
        };
        let compressed = match self.method_for_save() {
            CompressionMethod::Deflated => codec.compress_async(data).await?,
            _ => data,
        };
        self.record_compression(compressed.len());
        Ok(compressed)
    }

    fn method_for_save(&self) -> CompressionMethod {
        match &self.payload {
            Payload::Uncompressed(data) if !data.is_empty() && !self.is_directory() => {
                CompressionMethod::Deflated
            }
            _ => CompressionMethod::Stored,
        }
    }

    fn record_compression(&mut self, compressed_len: usize) {
        let method = self.method_for_save();
        if let Payload::Uncompressed(data) = &self.payload {
            self.header.crc = crc32(data);
            self.header.set_size(data.len() as u64);
        }
        self.header.set_method(method);
        self.header.set_compressed_size(compressed_len as u64);
    }

    /// Local header, name and local extra field, ready to precede the compressed data.
    pub fn pack_local_header(&self) -> Result<Vec<u8>> {
        self.header.write_local(&self.raw_name, &self.local_extra)
    }

    /// Central directory record for this entry.
    pub fn pack_central_header(&mut self) -> Result<Vec<u8>> {
        self.header
            .write_central(&self.raw_name, &self.extra, &self.comment)
    }
}
