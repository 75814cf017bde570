mod editing;
mod read_errors;
mod roundtrip;
mod store;
mod zip64;

use rezip::codec::Deflater;
use rezip::{ReadOptions, ZipArchive, ZipEntry};

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Serializes a fresh archive holding `entries`.
pub(crate) fn build(entries: Vec<ZipEntry>) -> Vec<u8> {
    let mut archive = ZipArchive::new(ReadOptions::default());
    for entry in entries {
        archive.set_entry(entry).unwrap();
    }
    archive.compress_to_buffer(&Deflater::default()).unwrap()
}

pub(crate) fn open(bytes: Vec<u8>) -> ZipArchive {
    ZipArchive::from_buffer(bytes, ReadOptions::default()).unwrap()
}

pub(crate) fn names(archive: &mut ZipArchive) -> Vec<String> {
    archive
        .entries()
        .unwrap()
        .iter()
        .map(|entry| entry.name().to_string())
        .collect()
}
