//! Local and central directory file headers.
//!
//! The central header is the authoritative description of an entry. Its
//! size, offset and disk fields are [`SizeField`]/[`DiskField`] values, so the
//! sentinel written to the fixed record and the zip64 extra block written
//! next to it are always derived from the same value.

use std::io::Cursor;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};

use super::constants::*;
use super::extra::{ExtraFields, Zip64ExtendedInfo, Zip64Fields};
use super::structures::{CompressionMethod, DiskField, DosDateTime, GeneralPurposeFlags, SizeField};
use crate::error::{Result, ZipError, check_signature, slice_at};

#[cfg(windows)]
const OS_TYPE: u8 = 0x0a;
#[cfg(not(windows))]
const OS_TYPE: u8 = 0x03;

/// Version 2.0, written for every compression method.
const DEFAULT_VERSION: u16 = 20;

fn field_len(field: &'static str, len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| ZipError::FieldOverflow { field, len })
}

/// Local File Header - 30 bytes followed by the name and extra field.
///
/// Sizes carrying the escalation sentinel are kept as read; the central
/// header holds the resolved values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalFileHeader {
    pub version: u16,
    pub flags: GeneralPurposeFlags,
    pub method: CompressionMethod,
    pub time: DosDateTime,
    pub crc: u32,
    pub compressed_size: SizeField,
    pub size: SizeField,
    pub file_name_length: u16,
    pub extra_length: u16,
}

impl LocalFileHeader {
    pub const SIGNATURE: u32 = LOCSIG;
    pub const SIZE: usize = LOCHDR;

    /// Parse the local header found at `offset` in `buffer`.
    ///
    /// # Errors
    ///
    /// Fails when the record runs past the buffer or does not start with `PK\x03\x04`.
    pub fn parse_local(buffer: &[u8], offset: u64) -> Result<Self> {
        let data = slice_at(buffer, offset, Self::SIZE as u64)?;
        check_signature(data, Self::SIGNATURE, "local file header")?;

        let mut cursor = Cursor::new(&data[LOCVER..]);

        Ok(Self {
            version: cursor.read_u16::<LittleEndian>()?,
            flags: GeneralPurposeFlags(cursor.read_u16::<LittleEndian>()?),
            method: CompressionMethod::from_u16(cursor.read_u16::<LittleEndian>()?),
            time: DosDateTime(cursor.read_u32::<LittleEndian>()?),
            crc: cursor.read_u32::<LittleEndian>()?,
            compressed_size: SizeField::from_zip32(cursor.read_u32::<LittleEndian>()?),
            size: SizeField::from_zip32(cursor.read_u32::<LittleEndian>()?),
            file_name_length: cursor.read_u16::<LittleEndian>()?,
            extra_length: cursor.read_u16::<LittleEndian>()?,
        })
    }

    pub fn to_bytes(&self) -> [u8; LOCHDR] {
        let mut buf = [0u8; LOCHDR];
        LittleEndian::write_u32(&mut buf, Self::SIGNATURE);
        LittleEndian::write_u16(&mut buf[LOCVER..], self.version);
        LittleEndian::write_u16(&mut buf[LOCFLG..], self.flags.0);
        LittleEndian::write_u16(&mut buf[LOCHOW..], self.method.as_u16());
        LittleEndian::write_u32(&mut buf[LOCTIM..], self.time.0);
        LittleEndian::write_u32(&mut buf[LOCCRC..], self.crc);
        LittleEndian::write_u32(&mut buf[LOCSIZ..], self.compressed_size.zip32());
        LittleEndian::write_u32(&mut buf[LOCLEN..], self.size.zip32());
        LittleEndian::write_u16(&mut buf[LOCNAM..], self.file_name_length);
        LittleEndian::write_u16(&mut buf[LOCEXT..], self.extra_length);
        buf
    }
}

/// Central Directory File Header - 46 bytes followed by name, extra field and comment.
///
/// The compression method and the escalating fields are private: changing
/// them also changes the version needed and the zip64 layout, and the
/// setters below apply both halves together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryHeader {
    pub made: u8,
    pub os_type: u8,
    pub version: u16,
    pub flags: GeneralPurposeFlags,
    method: CompressionMethod,
    pub time: DosDateTime,
    pub crc: u32,
    compressed_size: SizeField,
    size: SizeField,
    offset: SizeField,
    disk_num_start: DiskField,
    pub file_name_length: u16,
    pub extra_length: u16,
    pub comment_length: u16,
    pub inattr: u16,
    pub attr: u32,
    local: Option<LocalFileHeader>,
}

impl Default for CentralDirectoryHeader {
    fn default() -> Self {
        let mut flags = GeneralPurposeFlags::default();
        // Names and comments are always written as UTF-8.
        flags.set_utf8(true);

        Self {
            made: 20,
            os_type: OS_TYPE,
            version: 10,
            flags,
            method: CompressionMethod::Stored,
            time: DosDateTime::now(),
            crc: 0,
            compressed_size: SizeField::default(),
            size: SizeField::default(),
            offset: SizeField::default(),
            disk_num_start: DiskField::default(),
            file_name_length: 0,
            extra_length: 0,
            comment_length: 0,
            inattr: 0,
            attr: 0,
            local: None,
        }
    }
}

impl CentralDirectoryHeader {
    pub const SIGNATURE: u32 = CENSIG;
    pub const SIZE: usize = CENHDR;

    /// Parse the fixed part of a central directory record.
    ///
    /// Escalated fields hold the sentinel until [`resolve_zip64`](Self::resolve_zip64)
    /// is called with the record's extra field.
    ///
    /// # Arguments
    ///
    /// * `data` - Bytes starting at the record's signature, at least 46 long
    ///
    /// # Errors
    ///
    /// Fails when `data` is short or does not start with `PK\x01\x02`.
    pub fn parse_central(data: &[u8]) -> Result<Self> {
        let data = slice_at(data, 0, Self::SIZE as u64)?;
        check_signature(data, Self::SIGNATURE, "central directory file header")?;

        let mut cursor = Cursor::new(&data[CENVEM..]);

        Ok(Self {
            made: cursor.read_u8()?,
            os_type: cursor.read_u8()?,
            version: cursor.read_u16::<LittleEndian>()?,
            flags: GeneralPurposeFlags(cursor.read_u16::<LittleEndian>()?),
            method: CompressionMethod::from_u16(cursor.read_u16::<LittleEndian>()?),
            time: DosDateTime(cursor.read_u32::<LittleEndian>()?),
            crc: cursor.read_u32::<LittleEndian>()?,
            compressed_size: SizeField::from_zip32(cursor.read_u32::<LittleEndian>()?),
            size: SizeField::from_zip32(cursor.read_u32::<LittleEndian>()?),
            file_name_length: cursor.read_u16::<LittleEndian>()?,
            extra_length: cursor.read_u16::<LittleEndian>()?,
            comment_length: cursor.read_u16::<LittleEndian>()?,
            disk_num_start: DiskField::from_zip16(cursor.read_u16::<LittleEndian>()?),
            inattr: cursor.read_u16::<LittleEndian>()?,
            attr: cursor.read_u32::<LittleEndian>()?,
            offset: SizeField::from_zip32(cursor.read_u32::<LittleEndian>()?),
            local: None,
        })
    }

    /// Serialize the record followed by `name`, `extra` and `comment`.
    ///
    /// The zip64 block of `extra` is replaced by one derived from this
    /// header's escalated fields, or dropped when none are escalated. The
    /// stored length fields are updated to what was written.
    pub fn write_central(&mut self, name: &[u8], extra: &ExtraFields, comment: &[u8]) -> Result<Vec<u8>> {
        let mut extra = extra.clone();
        extra.set_zip64(&self.zip64_info());
        let extra = extra.to_bytes();

        self.file_name_length = field_len("file name", name.len())?;
        self.extra_length = field_len("extra field", extra.len())?;
        self.comment_length = field_len("entry comment", comment.len())?;

        let mut buf = vec![0u8; self.central_header_size()];
        LittleEndian::write_u32(&mut buf, Self::SIGNATURE);
        buf[CENVEM] = self.made;
        buf[CENVEM + 1] = self.os_type;
        LittleEndian::write_u16(&mut buf[CENVER..], self.version_needed());
        LittleEndian::write_u16(&mut buf[CENFLG..], self.flags.0);
        LittleEndian::write_u16(&mut buf[CENHOW..], self.method.as_u16());
        LittleEndian::write_u32(&mut buf[CENTIM..], self.time.0);
        LittleEndian::write_u32(&mut buf[CENCRC..], self.crc);
        LittleEndian::write_u32(&mut buf[CENSIZ..], self.compressed_size.zip32());
        LittleEndian::write_u32(&mut buf[CENLEN..], self.size.zip32());
        LittleEndian::write_u16(&mut buf[CENNAM..], self.file_name_length);
        LittleEndian::write_u16(&mut buf[CENEXT..], self.extra_length);
        LittleEndian::write_u16(&mut buf[CENCOM..], self.comment_length);
        LittleEndian::write_u16(&mut buf[CENDSK..], self.disk_num_start.zip16());
        LittleEndian::write_u16(&mut buf[CENATT..], self.inattr);
        LittleEndian::write_u32(&mut buf[CENATX..], self.attr);
        LittleEndian::write_u32(&mut buf[CENOFF..], self.offset.zip32());

        let (name_buf, rest) = buf[CENHDR..].split_at_mut(name.len());
        name_buf.copy_from_slice(name);
        let (extra_buf, comment_buf) = rest.split_at_mut(extra.len());
        extra_buf.copy_from_slice(&extra);
        comment_buf.copy_from_slice(comment);

        Ok(buf)
    }

    /// Serialize the local header for this entry followed by `name` and `extra`.
    ///
    /// Local records carry no offset or disk in their zip64 block. Once either
    /// size escalates, both sizes go into the block and both fixed fields
    /// hold the sentinel. Sizes are always known up front, so the data
    /// descriptor flag is cleared.
    pub fn write_local(&self, name: &[u8], extra: &ExtraFields) -> Result<Vec<u8>> {
        let zip64 = self.size.is_escalated() || self.compressed_size.is_escalated();
        let (size, compressed_size) = if zip64 {
            (
                SizeField::Escalated(self.size.get()),
                SizeField::Escalated(self.compressed_size.get()),
            )
        } else {
            (self.size, self.compressed_size)
        };

        let mut extra = extra.clone();
        extra.set_zip64(&Zip64ExtendedInfo {
            size: zip64.then_some(size.get()),
            compressed_size: zip64.then_some(compressed_size.get()),
            ..Default::default()
        });
        let extra = extra.to_bytes();

        let mut flags = self.flags;
        flags.set_data_descriptor(false);

        let local = LocalFileHeader {
            version: self.version_needed(),
            flags,
            method: self.method,
            time: self.time,
            crc: self.crc,
            compressed_size,
            size,
            file_name_length: field_len("file name", name.len())?,
            extra_length: field_len("local extra field", extra.len())?,
        };

        let mut buf = Vec::with_capacity(LOCHDR + name.len() + extra.len());
        buf.extend_from_slice(&local.to_bytes());
        buf.extend_from_slice(name);
        buf.extend_from_slice(&extra);
        Ok(buf)
    }

    pub fn method(&self) -> CompressionMethod {
        self.method
    }

    /// Set the compression method together with the version needed to extract.
    ///
    /// Version 2.0 is recorded for every method, stored included.
    pub fn set_method(&mut self, method: CompressionMethod) {
        self.method = method;
        self.version = DEFAULT_VERSION;
    }

    pub fn size(&self) -> u64 {
        self.size.get()
    }

    pub fn set_size(&mut self, size: u64) {
        self.size = SizeField::new(size);
    }

    pub fn compressed_size(&self) -> u64 {
        self.compressed_size.get()
    }

    pub fn set_compressed_size(&mut self, size: u64) {
        self.compressed_size = SizeField::new(size);
    }

    /// Offset of the local header from the start of the archive.
    pub fn offset(&self) -> u64 {
        self.offset.get()
    }

    pub fn set_offset(&mut self, offset: u64) {
        self.offset = SizeField::new(offset);
    }

    pub fn disk_num_start(&self) -> u32 {
        self.disk_num_start.get()
    }

    pub fn set_disk_num_start(&mut self, disk: u32) {
        self.disk_num_start = DiskField::new(disk);
    }

    /// Whether any field needs the zip64 extra block.
    pub fn zip64(&self) -> bool {
        self.sentinels() != Zip64Fields::default()
    }

    /// The fields whose fixed record value is the escalation sentinel.
    pub fn sentinels(&self) -> Zip64Fields {
        Zip64Fields {
            size: self.size.is_escalated(),
            compressed_size: self.compressed_size.is_escalated(),
            offset: self.offset.is_escalated(),
            disk_num_start: self.disk_num_start.is_escalated(),
        }
    }

    /// The zip64 block content for the escalated fields.
    pub fn zip64_info(&self) -> Zip64ExtendedInfo {
        let escalated = |field: SizeField| field.is_escalated().then(|| field.get());
        Zip64ExtendedInfo {
            size: escalated(self.size),
            compressed_size: escalated(self.compressed_size),
            offset: escalated(self.offset),
            disk_num_start: self.disk_num_start.is_escalated().then(|| self.disk_num_start.get()),
        }
    }

    /// Replace every sentinel-valued field with its true value from `info`.
    ///
    /// Fields stay escalated even when the true value is small, so the record
    /// is written back the way it was read.
    pub fn apply_zip64(&mut self, info: &Zip64ExtendedInfo) -> Result<()> {
        let present = self.sentinels();
        let take = |flagged: bool, value: Option<u64>, field: &'static str| -> Result<Option<u64>> {
            if !flagged {
                return Ok(None);
            }
            value.map(Some).ok_or(ZipError::MissingZip64Value { field })
        };

        if let Some(size) = take(present.size, info.size, "size")? {
            self.size = SizeField::Escalated(size);
        }
        if let Some(size) = take(present.compressed_size, info.compressed_size, "compressed size")? {
            self.compressed_size = SizeField::Escalated(size);
        }
        if let Some(offset) = take(present.offset, info.offset, "local header offset")? {
            self.offset = SizeField::Escalated(offset);
        }
        if present.disk_num_start {
            let disk = info.disk_num_start.ok_or(ZipError::MissingZip64Value {
                field: "disk number start",
            })?;
            self.disk_num_start = DiskField::Escalated(disk);
        }
        Ok(())
    }

    /// Decode the zip64 block of `extra` and back-patch the escalated fields.
    pub fn resolve_zip64(&mut self, extra: &ExtraFields) -> Result<()> {
        let present = self.sentinels();
        if present == Zip64Fields::default() {
            return Ok(());
        }
        match extra.zip64(present)? {
            Some(info) => self.apply_zip64(&info),
            None => Err(ZipError::MissingZip64Value {
                field: "zip64 extended information",
            }),
        }
    }

    /// Version needed to extract, raised to 4.5 when zip64 fields are present.
    pub fn version_needed(&self) -> u16 {
        if self.zip64() {
            self.version.max(ZIP64_VERSION)
        } else {
            self.version
        }
    }

    /// Unix permission bits from the high half of the external attributes.
    pub fn file_attr(&self) -> u16 {
        ((self.attr >> 16) & 0xfff) as u16
    }

    pub fn encrypted(&self) -> bool {
        self.flags.encrypted()
    }

    pub fn central_header_size(&self) -> usize {
        CENHDR + self.file_name_length as usize + self.extra_length as usize + self.comment_length as usize
    }

    pub fn local_header(&self) -> Option<&LocalFileHeader> {
        self.local.as_ref()
    }

    /// Read this entry's local header from `buffer` and return its extra field bytes.
    pub fn load_local_header<'a>(&mut self, buffer: &'a [u8]) -> Result<&'a [u8]> {
        let offset = self.offset.get();
        let local = LocalFileHeader::parse_local(buffer, offset)?;
        let extra_start = offset + LOCHDR as u64 + local.file_name_length as u64;
        let extra = slice_at(buffer, extra_start, local.extra_length as u64)?;
        self.local = Some(local);
        Ok(extra)
    }

    /// Offset of the entry's data: past the local header, its name and its extra field.
    ///
    /// # Errors
    ///
    /// Returns [`ZipError::LocalHeaderNotLoaded`] before
    /// [`load_local_header`](Self::load_local_header) has succeeded.
    pub fn real_data_offset(&self) -> Result<u64> {
        let local = self.local.as_ref().ok_or(ZipError::LocalHeaderNotLoaded)?;
        Ok(self.offset.get() + LOCHDR as u64 + local.file_name_length as u64 + local.extra_length as u64)
    }
}
