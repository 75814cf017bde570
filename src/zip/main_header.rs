//! End of central directory records.
//!
//! A plain archive ends with the 22-byte end record. A zip64 archive puts the
//! zip64 end record and its locator in front of it; the 32-bit record then
//! carries sentinels and the true values live in the 64-bit one.

use std::io::Cursor;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};

use super::constants::*;
use crate::error::{Result, ZipError, check_signature, slice_at};

/// Version needed to extract an archive without zip64 records.
const DEFAULT_NEEDED: u16 = 20;

/// Archive-wide counters and central directory location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainHeader {
    /// Number of this disk
    pub disk_number: u32,
    /// Disk holding the start of the central directory
    pub cd_disk: u32,
    pub disk_entries: u64,
    pub total_entries: u64,
    /// Central directory size in bytes
    pub size: u64,
    /// Central directory offset from the start of the archive
    pub offset: u64,
    pub comment_length: u16,
    /// Set when the archive was read with, or must be written with, zip64 records.
    pub zip64_format: bool,
    pub made: u16,
    needed: u16,
    /// Extensible data sector of the zip64 end record, kept verbatim.
    pub zip64_ext_data: Vec<u8>,
}

impl Default for MainHeader {
    fn default() -> Self {
        Self {
            disk_number: 0,
            cd_disk: 0,
            disk_entries: 0,
            total_entries: 0,
            size: 0,
            offset: 0,
            comment_length: 0,
            zip64_format: false,
            made: ZIP64_VERSION,
            needed: DEFAULT_NEEDED,
            zip64_ext_data: Vec::new(),
        }
    }
}

/// Zip64 End of Central Directory Locator - 20 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zip64Locator {
    pub ecd64_disk: u32,
    pub ecd64_offset: u64,
    pub num_disks: u32,
}

impl Zip64Locator {
    pub const SIGNATURE: u32 = ZIP64LOCSIG;
    pub const SIZE: usize = ZIP64LOCHDR;

    /// Parse a locator at `pos`, or `None` when there is no locator there.
    pub fn parse(data: &[u8], pos: u64) -> Option<Self> {
        let data = slice_at(data, pos, Self::SIZE as u64).ok()?;
        check_signature(data, Self::SIGNATURE, "zip64 end of central directory locator").ok()?;

        Some(Self {
            ecd64_disk: LittleEndian::read_u32(&data[ZIP64LOCCDR..]),
            ecd64_offset: LittleEndian::read_u64(&data[ZIP64LOCOFF..]),
            num_disks: LittleEndian::read_u32(&data[ZIP64LOCDISKS..]),
        })
    }
}

impl MainHeader {
    pub const SIGNATURE: u32 = ENDSIG;
    pub const SIZE: usize = ENDHDR;

    /// Version needed to extract, at least 4.5 once zip64 records are written.
    pub fn needed(&self) -> u16 {
        let floor = if self.is_zip64() { ZIP64_VERSION } else { DEFAULT_NEEDED };
        floor.max(self.needed)
    }

    /// Whether the zip64 end record and locator must be written.
    pub fn is_zip64(&self) -> bool {
        (self.zip64_format && self.disk_entries > 0)
            || self.disk_number as u64 >= ZIP64_OR_8
            || self.disk_entries >= ZIP64_OR_16
            || self.total_entries >= ZIP64_OR_16
            || self.size >= ZIP64_OR_32
            || self.offset >= ZIP64_OR_32
    }

    /// Size of everything [`to_bytes`](Self::to_bytes) writes for a comment of `comment_len` bytes.
    pub fn main_header_size(&self, comment_len: usize) -> usize {
        let zip64 = if self.is_zip64() {
            ZIP64ENDHDR + ZIP64LOCHDR + self.zip64_ext_data.len()
        } else {
            0
        };
        zip64 + ENDHDR + comment_len
    }

    /// Parse the 32-bit end of central directory record at `pos`.
    ///
    /// # Errors
    ///
    /// Fails when fewer than 22 bytes remain or the signature is not `PK\x05\x06`.
    pub fn parse_eocd32(data: &[u8], pos: u64) -> Result<Self> {
        let data = slice_at(data, pos, Self::SIZE as u64)?;
        check_signature(data, Self::SIGNATURE, "end of central directory")?;

        let mut cursor = Cursor::new(&data[ENDDSK..]);

        Ok(Self {
            disk_number: cursor.read_u16::<LittleEndian>()? as u32,
            cd_disk: cursor.read_u16::<LittleEndian>()? as u32,
            disk_entries: cursor.read_u16::<LittleEndian>()? as u64,
            total_entries: cursor.read_u16::<LittleEndian>()? as u64,
            size: cursor.read_u32::<LittleEndian>()? as u64,
            offset: cursor.read_u32::<LittleEndian>()? as u64,
            comment_length: cursor.read_u16::<LittleEndian>()?,
            ..Default::default()
        })
    }

    /// Overlay the fields of the zip64 end record at `pos`.
    ///
    /// # Errors
    ///
    /// Fails when the record is short, its signature is not `PK\x06\x06`, or
    /// its extensible data runs past the buffer.
    pub fn parse_eocd64(&mut self, data: &[u8], pos: u64) -> Result<()> {
        let record = slice_at(data, pos, ZIP64ENDHDR as u64)?;
        check_signature(record, ZIP64ENDSIG, "zip64 end of central directory")?;

        let mut cursor = Cursor::new(&record[ZIP64ENDSIZE..]);
        let record_size = cursor.read_u64::<LittleEndian>()?;
        self.made = cursor.read_u16::<LittleEndian>()?;
        self.needed = cursor.read_u16::<LittleEndian>()?;
        self.disk_number = cursor.read_u32::<LittleEndian>()?;
        self.cd_disk = cursor.read_u32::<LittleEndian>()?;
        self.disk_entries = cursor.read_u64::<LittleEndian>()?;
        self.total_entries = cursor.read_u64::<LittleEndian>()?;
        self.size = cursor.read_u64::<LittleEndian>()?;
        self.offset = cursor.read_u64::<LittleEndian>()?;

        let fixed = (ZIP64ENDHDR - ZIP64ENDLEAD) as u64;
        let ext_len = record_size.saturating_sub(fixed);
        self.zip64_ext_data = slice_at(data, pos + ZIP64EXTRA as u64, ext_len)?.to_vec();
        self.zip64_format = true;
        Ok(())
    }

    /// Serialize the end records followed by `comment`.
    ///
    /// When [`is_zip64`](Self::is_zip64) holds, the zip64 end record and the
    /// locator come first and the 32-bit record carries sentinels for size
    /// and offset.
    pub fn to_bytes(&mut self, comment: &[u8]) -> Result<Vec<u8>> {
        if comment.len() > MAX_COMMENT_SIZE {
            return Err(ZipError::FieldOverflow {
                field: "archive comment",
                len: comment.len(),
            });
        }
        self.comment_length = comment.len() as u16;

        let zip64 = self.is_zip64();
        let mut buf = vec![0u8; self.main_header_size(comment.len())];
        let mut pos = 0;

        if zip64 {
            let record = &mut buf[pos..];
            let record_size = (ZIP64ENDHDR - ZIP64ENDLEAD + self.zip64_ext_data.len()) as u64;
            LittleEndian::write_u32(record, ZIP64ENDSIG);
            LittleEndian::write_u64(&mut record[ZIP64ENDSIZE..], record_size);
            LittleEndian::write_u16(&mut record[ZIP64ENDVEM..], self.made);
            LittleEndian::write_u16(&mut record[ZIP64ENDVER..], self.needed());
            LittleEndian::write_u32(&mut record[ZIP64ENDDSK..], self.disk_number);
            LittleEndian::write_u32(&mut record[ZIP64ENDDSKDIR..], self.disk_number);
            LittleEndian::write_u64(&mut record[ZIP64ENDSUB..], self.disk_entries);
            LittleEndian::write_u64(&mut record[ZIP64ENDTOT..], self.total_entries);
            LittleEndian::write_u64(&mut record[ZIP64ENDSIZ..], self.size);
            LittleEndian::write_u64(&mut record[ZIP64ENDOFF..], self.offset);
            record[ZIP64EXTRA..ZIP64EXTRA + self.zip64_ext_data.len()].copy_from_slice(&self.zip64_ext_data);
            pos += ZIP64ENDHDR + self.zip64_ext_data.len();

            let locator = &mut buf[pos..];
            LittleEndian::write_u32(locator, ZIP64LOCSIG);
            LittleEndian::write_u32(&mut locator[ZIP64LOCCDR..], self.disk_number);
            LittleEndian::write_u64(&mut locator[ZIP64LOCOFF..], self.size + self.offset);
            LittleEndian::write_u32(&mut locator[ZIP64LOCDISKS..], 1);
            pos += ZIP64LOCHDR;
        }

        let zip32 = |value: u64| {
            if zip64 { ZIP64_OR_32 as u32 } else { value.min(ZIP64_OR_32) as u32 }
        };
        let zip16 = |value: u64| value.min(ZIP64_OR_16) as u16;

        let record = &mut buf[pos..];
        LittleEndian::write_u32(record, ENDSIG);
        LittleEndian::write_u16(&mut record[ENDDSK..], zip16(self.disk_number as u64));
        LittleEndian::write_u16(&mut record[ENDCDR..], zip16(self.disk_number as u64));
        LittleEndian::write_u16(&mut record[ENDSUB..], zip16(self.disk_entries));
        LittleEndian::write_u16(&mut record[ENDTOT..], zip16(self.total_entries));
        LittleEndian::write_u32(&mut record[ENDSIZ..], zip32(self.size));
        LittleEndian::write_u32(&mut record[ENDOFF..], zip32(self.offset));
        LittleEndian::write_u16(&mut record[ENDCOM..], self.comment_length);
        record[ENDHDR..].copy_from_slice(comment);

        Ok(buf)
    }
}
