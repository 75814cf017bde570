//! Read path: locating the end records and walking the central directory.
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) near the end of the buffer
//! 2. If a zip64 locator sits right before it, read the zip64 EOCD it points to
//! 3. Walk the Central Directory to get metadata for all entries
//! 4. For each entry, read its Local File Header to find where its data starts
//!
//! The parser works on a whole archive held in memory and shares that buffer
//! with the entries it produces, so archived data is never copied until it
//! is written out again.

use std::fmt;
use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};

use super::constants::*;
use super::entry::ZipEntry;
use super::extra::ExtraFields;
use super::header::CentralDirectoryHeader;
use super::main_header::{MainHeader, Zip64Locator};
use crate::error::{Result, ZipError, slice_at};

/// Low-level ZIP archive parser over an in-memory buffer.
///
/// ## Example
///
/// ```
/// use rezip::zip::ZipParser;
///
/// // An empty archive is a lone end of central directory record.
/// let mut empty = b"PK\x05\x06".to_vec();
/// empty.extend_from_slice(&[0; 18]);
///
/// let parser = ZipParser::new(empty);
/// let (main, comment) = parser.read_main_header(false).unwrap();
/// assert_eq!(main.total_entries, 0);
/// assert!(comment.is_empty());
/// ```
pub struct ZipParser {
    /// The whole archive
    data: Arc<[u8]>,
}

impl fmt::Debug for ZipParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ZipParser").field("len", &self.data.len()).finish()
    }
}

impl ZipParser {
    /// Create a new parser for the given archive bytes.
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self { data: data.into() }
    }

    pub fn data(&self) -> &Arc<[u8]> {
        &self.data
    }

    /// Find the End of Central Directory record by scanning backwards.
    ///
    /// The record is at least 22 bytes from the end and, because the archive
    /// comment is at most 65535 bytes long, at most that much further back.
    ///
    /// # Arguments
    ///
    /// * `deep_search` - Scan the entire buffer instead of the last 64 KiB,
    ///   for archives whose comment length was tampered with
    ///
    /// # Returns
    ///
    /// The offset of the record's signature.
    ///
    /// # Errors
    ///
    /// [`ZipError::MissingEndOfCentralDirectory`] when no signature is found.
    pub fn find_eocd(&self, deep_search: bool) -> Result<u64> {
        let data = &self.data[..];
        let start = data
            .len()
            .checked_sub(ENDHDR)
            .ok_or(ZipError::MissingEndOfCentralDirectory)?;
        let stop = if deep_search {
            0
        } else {
            start.saturating_sub(MAX_COMMENT_SIZE)
        };

        (stop..=start)
            .rev()
            // quick check that the byte is 'P'
            .filter(|&i| data[i] == 0x50)
            .find(|&i| LittleEndian::read_u32(&data[i..]) == ENDSIG)
            .map(|i| i as u64)
            .ok_or(ZipError::MissingEndOfCentralDirectory)
    }

    /// Read the archive-wide header and comment.
    ///
    /// Parses the 32-bit end record, then checks the 20 bytes before it for a
    /// zip64 locator. The zip64 end record is only read when the locator is
    /// consistent with the end record's disk numbers.
    ///
    /// # Errors
    ///
    /// Fails on a missing or malformed end record, and with
    /// [`ZipError::NotImplemented`] for multi-disk archives.
    pub fn read_main_header(&self, deep_search: bool) -> Result<(MainHeader, Vec<u8>)> {
        let end = self.find_eocd(deep_search)?;
        let mut main = MainHeader::parse_eocd32(&self.data, end)?;
        log::debug!(
            "End of central directory at {end}: {} entries, directory at {} ({} bytes)",
            main.total_entries,
            main.offset,
            main.size
        );

        let locator = end
            .checked_sub(ZIP64LOCHDR as u64)
            .and_then(|pos| Zip64Locator::parse(&self.data, pos));
        if let Some(locator) = locator {
            let this_disk = main.disk_number;
            let last_disk = locator.num_disks.checked_sub(1);
            if (Some(this_disk) == last_disk || this_disk == ZIP64_OR_16 as u32)
                && locator.ecd64_disk < locator.num_disks
            {
                if locator.ecd64_disk != this_disk && this_disk != ZIP64_OR_16 as u32 {
                    return Err(ZipError::NotImplemented("zip64 end record on another disk"));
                }
                main.parse_eocd64(&self.data, locator.ecd64_offset)?;
                log::debug!(
                    "Zip64 end of central directory at {}: {} entries",
                    locator.ecd64_offset,
                    main.total_entries
                );
            } else {
                log::warn!("Ignoring inconsistent zip64 locator: {locator:?}");
            }
        }

        if main.cd_disk != main.disk_number {
            return Err(ZipError::NotImplemented("multi-disk archives"));
        }

        let comment_start = end as usize + ENDHDR;
        let comment_end = (comment_start + main.comment_length as usize).min(self.data.len());
        let comment = self.data[comment_start..comment_end].to_vec();

        Ok((main, comment))
    }

    /// Walk the central directory described by `main`.
    ///
    /// Reads exactly `disk_entries` records starting at the directory offset,
    /// resolves their zip64 fields and loads each local header so the data
    /// range of every entry is known.
    ///
    /// # Returns
    ///
    /// The entries in directory order.
    pub fn read_entries(&self, main: &MainHeader) -> Result<Vec<ZipEntry>> {
        let capacity = (main.disk_entries as usize).min(self.data.len() / CENHDR);
        let mut entries = Vec::with_capacity(capacity);
        let mut index = main.offset;

        for _ in 0..main.disk_entries {
            let fixed = slice_at(&self.data, index, CENHDR as u64)?;
            let mut header = CentralDirectoryHeader::parse_central(fixed)?;

            let variable_len = header.central_header_size() - CENHDR;
            let variable = slice_at(&self.data, index + CENHDR as u64, variable_len as u64)?;
            let (name, rest) = variable.split_at(header.file_name_length as usize);
            let (extra, comment) = rest.split_at(header.extra_length as usize);

            let extra = ExtraFields::parse(extra)?;
            header.resolve_zip64(&extra)?;

            let local_extra = header.load_local_header(&self.data)?;
            let local_extra = ExtraFields::parse(local_extra).unwrap_or_else(|err| {
                log::warn!(
                    "Ignoring malformed local extra field of {}: {err}",
                    String::from_utf8_lossy(name)
                );
                ExtraFields::new()
            });

            let start = header.real_data_offset()?;
            let compressed = slice_at(&self.data, start, header.compressed_size())?;
            let range = start as usize..start as usize + compressed.len();

            index += header.central_header_size() as u64;
            entries.push(ZipEntry::from_archive(
                name.to_vec(),
                header,
                extra,
                local_extra,
                comment.to_vec(),
                self.data.clone(),
                range,
            ));
        }

        log::debug!("Read {} central directory entries", entries.len());
        Ok(entries)
    }
}
