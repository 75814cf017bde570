//! Record signatures, fixed sizes and field offsets of the ZIP format.
//!
//! All multi-byte fields are little-endian. Offsets are relative to the start
//! of their record, signature included.

/// Local file header signature, `PK\x03\x04`.
pub const LOCSIG: u32 = 0x04034b50;
/// Data descriptor signature, `PK\x07\x08`.
pub const EXTSIG: u32 = 0x08074b50;
/// Central directory file header signature, `PK\x01\x02`.
pub const CENSIG: u32 = 0x02014b50;
/// End of central directory signature, `PK\x05\x06`.
pub const ENDSIG: u32 = 0x06054b50;
/// Zip64 end of central directory signature, `PK\x06\x06`.
pub const ZIP64ENDSIG: u32 = 0x06064b50;
/// Zip64 end of central directory locator signature, `PK\x06\x07`.
pub const ZIP64LOCSIG: u32 = 0x07064b50;

pub const LOCHDR: usize = 30;
pub const CENHDR: usize = 46;
pub const ENDHDR: usize = 22;
pub const ZIP64ENDHDR: usize = 56;
pub const ZIP64LOCHDR: usize = 20;
/// Signature and size field of the zip64 end record, which its own size field excludes.
pub const ZIP64ENDLEAD: usize = 12;

// Local file header
pub const LOCVER: usize = 4;
pub const LOCFLG: usize = 6;
pub const LOCHOW: usize = 8;
pub const LOCTIM: usize = 10;
pub const LOCCRC: usize = 14;
pub const LOCSIZ: usize = 18;
pub const LOCLEN: usize = 22;
pub const LOCNAM: usize = 26;
pub const LOCEXT: usize = 28;

// Central directory file header
pub const CENVEM: usize = 4;
pub const CENVER: usize = 6;
pub const CENFLG: usize = 8;
pub const CENHOW: usize = 10;
pub const CENTIM: usize = 12;
pub const CENCRC: usize = 16;
pub const CENSIZ: usize = 20;
pub const CENLEN: usize = 24;
pub const CENNAM: usize = 28;
pub const CENEXT: usize = 30;
pub const CENCOM: usize = 32;
pub const CENDSK: usize = 34;
pub const CENATT: usize = 36;
pub const CENATX: usize = 38;
pub const CENOFF: usize = 42;

// End of central directory
pub const ENDDSK: usize = 4;
pub const ENDCDR: usize = 6;
pub const ENDSUB: usize = 8;
pub const ENDTOT: usize = 10;
pub const ENDSIZ: usize = 12;
pub const ENDOFF: usize = 16;
pub const ENDCOM: usize = 20;

// Zip64 end of central directory
pub const ZIP64ENDSIZE: usize = 4;
pub const ZIP64ENDVEM: usize = 12;
pub const ZIP64ENDVER: usize = 14;
pub const ZIP64ENDDSK: usize = 16;
pub const ZIP64ENDDSKDIR: usize = 20;
pub const ZIP64ENDSUB: usize = 24;
pub const ZIP64ENDTOT: usize = 32;
pub const ZIP64ENDSIZ: usize = 40;
pub const ZIP64ENDOFF: usize = 48;
pub const ZIP64EXTRA: usize = 56;

// Zip64 end of central directory locator
pub const ZIP64LOCCDR: usize = 4;
pub const ZIP64LOCOFF: usize = 8;
pub const ZIP64LOCDISKS: usize = 16;

/// Escalation threshold of 8-bit disk numbers in the main header.
pub const ZIP64_OR_8: u64 = 0xFF;
/// Escalation threshold and sentinel of 16-bit count and disk fields.
pub const ZIP64_OR_16: u64 = 0xFFFF;
/// Escalation threshold and sentinel of 32-bit size and offset fields.
pub const ZIP64_OR_32: u64 = 0xFFFF_FFFF;
/// Largest value a 32-bit size or offset field holds directly.
pub const MAX_DIRECT_32: u64 = 0xFFFF_FFFE;
/// Largest value a 16-bit disk field holds directly.
pub const MAX_DIRECT_16: u32 = 0xFFFE;
/// Largest value a zip64 payload may carry.
pub const MAX_SAFE_VALUE: u64 = i64::MAX as u64;

/// Longest archive comment, which also bounds the end record search window.
pub const MAX_COMMENT_SIZE: usize = 0xFFFF;

/// Extra field id of the zip64 extended information block.
pub const ID_ZIP64: u16 = 0x0001;

/// Version needed to extract once any zip64 structure is present.
pub const ZIP64_VERSION: u16 = 45;
