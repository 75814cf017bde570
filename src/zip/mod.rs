//! ZIP archive reading, editing and writing.
//!
//! ## Architecture
//!
//! - [`structures`] and [`constants`]: field types, signatures and record layouts
//! - [`extra`]: the extra-field registry and the zip64 extended information block
//! - [`header`] and [`main_header`]: codecs for per-entry headers and the end records
//! - [`entry`]: one entry with its payload
//! - `parser`: the read path over an in-memory buffer
//! - [`directory`]: the editable entry directory
//! - `writer`: serialization back into a single buffer
//! - [`extractor`]: writing entries to the filesystem
//!
//! ## ZIP Format Overview
//!
//! A ZIP file consists of:
//! 1. Local file headers and compressed data for each file
//! 2. Central Directory with metadata for all files
//! 3. Optional zip64 end record and locator
//! 4. End of Central Directory (EOCD) record at the end
//!
//! Sizes, offsets and disk numbers that do not fit their 32-bit or 16-bit
//! fields are stored as sentinels and carried in a zip64 extra field.
//!
//! ## Limitations
//!
//! - No encryption support
//! - No multi-disk archive support
//! - Only STORED and DEFLATE compression methods

pub mod constants;
pub mod directory;
pub mod entry;
pub mod extra;
pub mod extractor;
pub mod header;
pub mod main_header;
mod parser;
pub mod structures;
mod writer;

pub use directory::{ReadOptions, ZipArchive};
pub use entry::ZipEntry;
pub use extra::{ExtraFields, Zip64ExtendedInfo, Zip64Fields};
pub use extractor::{Extracted, ZipExtractor};
pub use header::{CentralDirectoryHeader, LocalFileHeader};
pub use main_header::{MainHeader, Zip64Locator};
pub use parser::ZipParser;
pub use structures::*;
pub use writer::Progress;
