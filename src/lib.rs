//! # rezip
//!
//! An in-memory ZIP archive engine.
//!
//! An archive is read from a single buffer, edited as a directory of
//! entries and written back into a single buffer. Entries read from an
//! archive keep their compressed bytes and are copied out unchanged;
//! new entries are deflated when the archive is saved.
//!
//! ## Features
//!
//! - Reading and writing the ZIP64 format, escalating individual sizes,
//!   offsets and disk numbers only when they overflow
//! - Lazy loading of the central directory
//! - Adding, replacing and deleting entries (directories cascade)
//! - Extraction that never writes outside the target directory
//! - Synchronous and asynchronous serialization
//!
//! ## Example
//!
//! ```
//! use rezip::codec::Deflater;
//! use rezip::zip::{ReadOptions, ZipArchive, ZipEntry};
//!
//! fn main() -> rezip::Result<()> {
//!     let codec = Deflater::default();
//!
//!     let mut archive = ZipArchive::new(ReadOptions::default());
//!     archive.set_entry(ZipEntry::new("docs/"))?;
//!     archive.set_entry(ZipEntry::with_data("docs/readme.txt", b"hello".to_vec()))?;
//!     let bytes = archive.compress_to_buffer(&codec)?;
//!
//!     let mut reopened = ZipArchive::from_buffer(bytes, ReadOptions::default())?;
//!     let entry = reopened.entry("docs/readme.txt")?.expect("entry exists");
//!     assert_eq!(entry.data(&codec)?, b"hello");
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod codec;
pub mod crc;
pub mod error;
pub mod io;
pub mod path;
pub mod zip;

pub use cli::Cli;
pub use error::{Result, ZipError};
pub use io::{ArchiveStore, LocalFile};
pub use zip::{ReadOptions, ZipArchive, ZipEntry, ZipExtractor};
