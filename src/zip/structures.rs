use jiff::civil::DateTime;

use super::constants::{MAX_DIRECT_16, MAX_DIRECT_32, ZIP64_OR_16, ZIP64_OR_32};

/// ZIP compression methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionMethod {
    #[default]
    Stored,
    Deflated,
    Unknown(u16),
}

impl CompressionMethod {
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => CompressionMethod::Stored,
            8 => CompressionMethod::Deflated,
            _ => CompressionMethod::Unknown(value),
        }
    }

    pub fn as_u16(&self) -> u16 {
        match self {
            CompressionMethod::Stored => 0,
            CompressionMethod::Deflated => 8,
            CompressionMethod::Unknown(v) => *v,
        }
    }
}

/// General purpose bit flags of a local or central header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GeneralPurposeFlags(pub u16);

impl GeneralPurposeFlags {
    /// Entry data is encrypted.
    pub const ENCRYPTED: u16 = 1 << 0;
    /// Sizes and CRC follow the data in a data descriptor.
    pub const DATA_DESCRIPTOR: u16 = 1 << 3;
    /// Name and comment are UTF-8 (language encoding flag).
    pub const UTF8: u16 = 1 << 11;

    pub fn encrypted(&self) -> bool {
        self.0 & Self::ENCRYPTED != 0
    }

    pub fn data_descriptor(&self) -> bool {
        self.0 & Self::DATA_DESCRIPTOR != 0
    }

    pub fn utf8(&self) -> bool {
        self.0 & Self::UTF8 != 0
    }

    pub fn set_data_descriptor(&mut self, value: bool) {
        self.set(Self::DATA_DESCRIPTOR, value);
    }

    pub fn set_utf8(&mut self, value: bool) {
        self.set(Self::UTF8, value);
    }

    fn set(&mut self, bit: u16, value: bool) {
        if value {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }
}

/// A 32-bit size or offset field that escalates to the zip64 extra block.
///
/// `Direct` values are written as is. `Escalated` values are written as the
/// `0xFFFFFFFF` sentinel in the fixed record and in full in the zip64 block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeField {
    Direct(u32),
    Escalated(u64),
}

impl Default for SizeField {
    fn default() -> Self {
        SizeField::Direct(0)
    }
}

impl SizeField {
    pub fn new(value: u64) -> Self {
        if value > MAX_DIRECT_32 {
            SizeField::Escalated(value)
        } else {
            SizeField::Direct(value as u32)
        }
    }

    /// Interprets a value read from a fixed record; the sentinel marks an escalated field.
    pub(crate) fn from_zip32(value: u32) -> Self {
        SizeField::new(value as u64)
    }

    pub fn get(&self) -> u64 {
        match *self {
            SizeField::Direct(v) => v as u64,
            SizeField::Escalated(v) => v,
        }
    }

    /// The value as stored in the fixed 32-bit field.
    pub fn zip32(&self) -> u32 {
        match *self {
            SizeField::Direct(v) => v,
            SizeField::Escalated(_) => ZIP64_OR_32 as u32,
        }
    }

    pub fn is_escalated(&self) -> bool {
        matches!(self, SizeField::Escalated(_))
    }
}

/// The 16-bit disk-number-start field, escalating to a 32-bit zip64 value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiskField {
    Direct(u16),
    Escalated(u32),
}

impl Default for DiskField {
    fn default() -> Self {
        DiskField::Direct(0)
    }
}

impl DiskField {
    pub fn new(value: u32) -> Self {
        if value > MAX_DIRECT_16 {
            DiskField::Escalated(value)
        } else {
            DiskField::Direct(value as u16)
        }
    }

    pub(crate) fn from_zip16(value: u16) -> Self {
        DiskField::new(value as u32)
    }

    pub fn get(&self) -> u32 {
        match *self {
            DiskField::Direct(v) => v as u32,
            DiskField::Escalated(v) => v,
        }
    }

    pub fn zip16(&self) -> u16 {
        match *self {
            DiskField::Direct(v) => v,
            DiskField::Escalated(_) => ZIP64_OR_16 as u16,
        }
    }

    pub fn is_escalated(&self) -> bool {
        matches!(self, DiskField::Escalated(_))
    }
}

/// A packed MS-DOS timestamp: date in the high 16 bits, time in the low 16 bits.
///
/// Seconds are stored halved, so odd seconds are lost when converting from a
/// calendar time. Years before 1980 cannot be represented and encode as zero;
/// times after 2107 saturate to the last representable instant.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DosDateTime(pub u32);

impl DosDateTime {
    /// 2107-12-31 23:59:58.
    pub const MAX: DosDateTime =
        DosDateTime((((127 << 9) | (12 << 5) | 31) << 16) | (23 << 11) | (59 << 5) | 29);

    /// The current local time.
    pub fn now() -> Self {
        Self::from_datetime(jiff::Zoned::now().datetime())
    }

    pub fn from_datetime(dt: DateTime) -> Self {
        if dt.year() < 1980 {
            return DosDateTime(0);
        }
        if dt.year() > 2107 {
            return DosDateTime::MAX;
        }
        let date = (((dt.year() - 1980) as u32) << 9)
            | ((dt.month() as u32) << 5)
            | dt.day() as u32;
        let time =
            ((dt.hour() as u32) << 11) | ((dt.minute() as u32) << 5) | ((dt.second() as u32) >> 1);
        DosDateTime((date << 16) | time)
    }

    /// Converts back to a calendar time, or `None` when the packed fields are out of range.
    pub fn to_datetime(&self) -> Option<DateTime> {
        let v = self.0;
        let year = ((v >> 25) & 0x7f) as i16 + 1980;
        let month = ((v >> 21) & 0x0f).max(1) as i8;
        let day = ((v >> 16) & 0x1f).max(1) as i8;
        let hour = ((v >> 11) & 0x1f) as i8;
        let minute = ((v >> 5) & 0x3f) as i8;
        let second = ((v & 0x1f) << 1) as i8;
        DateTime::new(year, month, day, hour, minute, second, 0).ok()
    }

    /// The high byte of the time word, used as the check byte of traditional encryption.
    pub fn time_high_byte(&self) -> u8 {
        (self.0 >> 8) as u8
    }
}
