//! Error types shared by every layer of the archive engine.
//!
//! Nothing here is recoverable: a structural problem aborts the read or
//! write pass that found it and is handed straight back to the caller.

use thiserror::Error;

/// A specialized [`Result`](std::result::Result) for archive operations.
pub type Result<T> = std::result::Result<T, ZipError>;

/// Everything that can go wrong while reading or producing an archive.
#[derive(Debug, Error)]
pub enum ZipError {
    /// A record did not start with the signature its position requires.
    #[error("Invalid {record} signature: expected 0x{expected:08x}, got 0x{actual:08x}")]
    InvalidSignature {
        record: &'static str,
        expected: u32,
        actual: u32,
    },

    /// A record or one of its variable-length parts runs past the data that holds it.
    #[error("Truncated {record}")]
    Truncated { record: &'static str },

    /// No end of central directory record could be found.
    #[error("Not a valid ZIP file: end of central directory not found")]
    MissingEndOfCentralDirectory,

    /// A 32-bit field carried the escalation sentinel but the zip64 extra block lacks its value.
    #[error("Missing zip64 value for {field}")]
    MissingZip64Value { field: &'static str },

    /// Decompressed data does not match the CRC-32 stored in the header.
    #[error("Invalid checksum: expected 0x{expected:08x}, got 0x{actual:08x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// The archive uses a feature this engine rejects outright.
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    /// A numeric value exceeds what can be represented safely.
    #[error("Value too large to represent: {field} = {value}")]
    TooLarge { field: &'static str, value: u64 },

    /// A read or write position lies outside the buffer.
    #[error("Position out of range: {len} bytes at offset {offset} in a buffer of {buffer_len} bytes")]
    OutOfBounds {
        offset: u64,
        len: u64,
        buffer_len: u64,
    },

    /// A variable-length part is too long for the 16-bit length field describing it.
    #[error("{field} is {len} bytes long, which does not fit the record")]
    FieldOverflow { field: &'static str, len: usize },

    /// The data offset of an entry was requested before its local header was read.
    #[error("Local file header has not been read")]
    LocalHeaderNotLoaded,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Returns the `len` bytes at `offset` in `data`, or an [`OutOfBounds`](ZipError::OutOfBounds) error.
pub(crate) fn slice_at(data: &[u8], offset: u64, len: u64) -> Result<&[u8]> {
    let out_of_bounds = || ZipError::OutOfBounds {
        offset,
        len,
        buffer_len: data.len() as u64,
    };
    let start = usize::try_from(offset).map_err(|_| out_of_bounds())?;
    let len = usize::try_from(len).map_err(|_| out_of_bounds())?;
    let end = start.checked_add(len).ok_or_else(out_of_bounds)?;
    data.get(start..end).ok_or_else(out_of_bounds)
}

/// Checks that `data` starts with the little-endian `expected` signature of `record`.
pub(crate) fn check_signature(data: &[u8], expected: u32, record: &'static str) -> Result<()> {
    let actual = data
        .get(..4)
        .map(|sig| u32::from_le_bytes([sig[0], sig[1], sig[2], sig[3]]))
        .ok_or(ZipError::Truncated { record })?;
    if actual != expected {
        return Err(ZipError::InvalidSignature {
            record,
            expected,
            actual,
        });
    }
    Ok(())
}
