//! Extra field registry.
//!
//! An extra field is a run of `(id: u16, length: u16, payload)` blocks. The
//! registry keeps the blocks it does not understand as opaque bytes, in the
//! order they were first seen, and knows how to encode and decode the zip64
//! extended information block.

use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};
use indexmap::IndexMap;

use super::constants::{ID_ZIP64, MAX_SAFE_VALUE};
use crate::error::{Result, ZipError};

/// Which fixed-record fields of a header carried the escalation sentinel.
///
/// The zip64 payload holds exactly these fields, in declaration order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zip64Fields {
    pub size: bool,
    pub compressed_size: bool,
    pub offset: bool,
    pub disk_num_start: bool,
}

/// Decoded zip64 extended information block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zip64ExtendedInfo {
    pub size: Option<u64>,
    pub compressed_size: Option<u64>,
    pub offset: Option<u64>,
    pub disk_num_start: Option<u32>,
}

impl Zip64ExtendedInfo {
    /// Decodes the payload (without its 4-byte block header), reading only the
    /// fields flagged in `present`.
    pub fn parse(data: &[u8], present: Zip64Fields) -> Result<Self> {
        let mut cursor = Cursor::new(data);
        let mut read_u64 = |flagged: bool, field: &'static str| -> Result<Option<u64>> {
            if !flagged {
                return Ok(None);
            }
            let value = cursor
                .read_u64::<LittleEndian>()
                .map_err(|_| ZipError::MissingZip64Value { field })?;
            if value > MAX_SAFE_VALUE {
                return Err(ZipError::TooLarge { field, value });
            }
            Ok(Some(value))
        };

        let size = read_u64(present.size, "size")?;
        let compressed_size = read_u64(present.compressed_size, "compressed size")?;
        let offset = read_u64(present.offset, "local header offset")?;
        let disk_num_start = if present.disk_num_start {
            Some(
                cursor
                    .read_u32::<LittleEndian>()
                    .map_err(|_| ZipError::MissingZip64Value {
                        field: "disk number start",
                    })?,
            )
        } else {
            None
        };

        let mut rest = Vec::new();
        cursor.read_to_end(&mut rest)?;
        if !rest.is_empty() {
            log::warn!("Ignoring {} trailing bytes in zip64 extra field", rest.len());
        }

        Ok(Self {
            size,
            compressed_size,
            offset,
            disk_num_start,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(28);
        for value in [self.size, self.compressed_size, self.offset].into_iter().flatten() {
            data.extend_from_slice(&value.to_le_bytes());
        }
        if let Some(disk) = self.disk_num_start {
            data.extend_from_slice(&disk.to_le_bytes());
        }
        data
    }

    pub fn is_empty(&self) -> bool {
        self.size.is_none()
            && self.compressed_size.is_none()
            && self.offset.is_none()
            && self.disk_num_start.is_none()
    }
}

/// Ordered collection of extra field blocks keyed by their 16-bit id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraFields {
    fields: IndexMap<u16, Vec<u8>>,
}

impl ExtraFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a complete extra field. A later block with an already seen id
    /// replaces the earlier one.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut fields = IndexMap::new();
        let mut cursor = Cursor::new(data);
        while (cursor.position() as usize) < data.len() {
            let truncated = |_| ZipError::Truncated {
                record: "extra field",
            };
            let id = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
            let size = cursor.read_u16::<LittleEndian>().map_err(truncated)?;
            let mut payload = vec![0u8; size as usize];
            cursor.read_exact(&mut payload).map_err(truncated)?;
            fields.insert(id, payload);
        }
        Ok(Self { fields })
    }

    pub fn get(&self, id: u16) -> Option<&[u8]> {
        self.fields.get(&id).map(Vec::as_slice)
    }

    pub fn contains(&self, id: u16) -> bool {
        self.fields.contains_key(&id)
    }

    /// Stores a block, keeping the position of an existing block with the same id.
    pub fn insert(&mut self, id: u16, data: Vec<u8>) -> Result<()> {
        if data.len() > u16::MAX as usize {
            return Err(ZipError::FieldOverflow {
                field: "extra field block",
                len: data.len(),
            });
        }
        self.fields.insert(id, data);
        Ok(())
    }

    pub fn remove(&mut self, id: u16) -> Option<Vec<u8>> {
        self.fields.shift_remove(&id)
    }

    /// Number of blocks.
    pub fn count(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Serialized length: every payload plus its 4-byte block header.
    pub fn byte_len(&self) -> usize {
        self.fields.values().map(|data| data.len() + 4).sum()
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_len());
        for (id, data) in &self.fields {
            out.extend_from_slice(&id.to_le_bytes());
            out.extend_from_slice(&(data.len() as u16).to_le_bytes());
            out.extend_from_slice(data);
        }
        out
    }

    /// Decodes the zip64 block, if any, for a header whose sentinels are `present`.
    pub fn zip64(&self, present: Zip64Fields) -> Result<Option<Zip64ExtendedInfo>> {
        self.get(ID_ZIP64)
            .map(|data| Zip64ExtendedInfo::parse(data, present))
            .transpose()
    }

    /// Replaces the zip64 block with `info`, removing it when nothing is escalated.
    pub fn set_zip64(&mut self, info: &Zip64ExtendedInfo) {
        if info.is_empty() {
            self.remove(ID_ZIP64);
        } else {
            self.fields.insert(ID_ZIP64, info.to_bytes());
        }
    }
}
