use byteorder::{ByteOrder, LittleEndian};
use rezip::codec::Deflater;
use rezip::zip::constants::{
    CENCRC, CENLEN, ENDDSK, ENDHDR, ENDOFF, ZIP64LOCCDR, ZIP64LOCDISKS, ZIP64LOCHDR, ZIP64LOCOFF,
    ZIP64LOCSIG,
};
use rezip::{ReadOptions, ZipArchive, ZipEntry, ZipError};

use crate::{build, init_logger};

fn central_offset(bytes: &[u8]) -> usize {
    LittleEndian::read_u32(&bytes[bytes.len() - ENDHDR + ENDOFF..]) as usize
}

fn single_file() -> Vec<u8> {
    build(vec![ZipEntry::with_data("file.txt", b"some file content".to_vec())])
}

/// `single_file` with a zip64 locator inserted right before its end record.
fn with_locator(ecd64_disk: u32, ecd64_offset: u64, num_disks: u32) -> Vec<u8> {
    let mut bytes = single_file();
    let mut locator = [0u8; ZIP64LOCHDR];
    LittleEndian::write_u32(&mut locator, ZIP64LOCSIG);
    LittleEndian::write_u32(&mut locator[ZIP64LOCCDR..], ecd64_disk);
    LittleEndian::write_u64(&mut locator[ZIP64LOCOFF..], ecd64_offset);
    LittleEndian::write_u32(&mut locator[ZIP64LOCDISKS..], num_disks);
    let end = bytes.len() - ENDHDR;
    bytes.splice(end..end, locator);
    bytes
}

#[test]
fn test_not_a_zip() {
    init_logger();
    let err = ZipArchive::from_buffer(b"just some text, no archive here".to_vec(), ReadOptions::default())
        .unwrap_err();
    assert!(matches!(err, ZipError::MissingEndOfCentralDirectory));

    let err = ZipArchive::from_buffer(Vec::new(), ReadOptions::default()).unwrap_err();
    assert!(matches!(err, ZipError::MissingEndOfCentralDirectory));
}

#[test]
fn test_corrupt_central_signature_fails_on_first_use() {
    let mut bytes = single_file();
    let cd = central_offset(&bytes);
    bytes[cd] = b'X';

    // Opening only reads the end record; the directory is walked lazily.
    let mut archive = ZipArchive::from_buffer(bytes.clone(), ReadOptions::default()).unwrap();
    assert!(matches!(
        archive.entries(),
        Err(ZipError::InvalidSignature { .. })
    ));

    let eager = ZipArchive::from_buffer(
        bytes,
        ReadOptions {
            read_entries: true,
            ..Default::default()
        },
    );
    assert!(matches!(eager, Err(ZipError::InvalidSignature { .. })));
}

#[test]
fn test_corrupt_local_signature() {
    let mut bytes = single_file();
    bytes[0] = b'X';
    let mut archive = ZipArchive::from_buffer(bytes, ReadOptions::default()).unwrap();
    assert!(matches!(
        archive.entries(),
        Err(ZipError::InvalidSignature { .. })
    ));
}

#[test]
fn test_checksum_mismatch() {
    let mut bytes = single_file();
    let cd = central_offset(&bytes);
    let crc = LittleEndian::read_u32(&bytes[cd + CENCRC..]);
    LittleEndian::write_u32(&mut bytes[cd + CENCRC..], crc ^ 0xFFFF);

    let mut archive = ZipArchive::from_buffer(bytes, ReadOptions::default()).unwrap();
    let entry = archive.entry("file.txt").unwrap().unwrap();
    assert!(matches!(
        entry.data(&Deflater::default()),
        Err(ZipError::ChecksumMismatch { .. })
    ));
}

#[test]
fn test_sentinel_without_zip64_block() {
    let mut bytes = single_file();
    let cd = central_offset(&bytes);
    LittleEndian::write_u32(&mut bytes[cd + CENLEN..], 0xFFFF_FFFF);

    let mut archive = ZipArchive::from_buffer(bytes, ReadOptions::default()).unwrap();
    assert!(matches!(
        archive.entries(),
        Err(ZipError::MissingZip64Value { .. })
    ));
}

#[test]
fn test_truncated_archive() {
    let bytes = single_file();
    let cd = central_offset(&bytes);
    // Keep the end record but cut the data the directory points into.
    let mut cut = bytes[..cd / 2].to_vec();
    cut.extend_from_slice(&bytes[bytes.len() - ENDHDR..]);

    let mut archive = ZipArchive::from_buffer(cut, ReadOptions::default()).unwrap();
    assert!(archive.entries().is_err());
}

#[test]
fn test_inconsistent_zip64_locator_is_ignored() {
    init_logger();
    // No disks at all, then an end record disk outside the disk count.
    for bytes in [with_locator(0, 0, 0), with_locator(3, 0, 1)] {
        let mut archive = ZipArchive::from_buffer(bytes, ReadOptions::default()).unwrap();
        assert!(!archive.main_header().is_zip64());
        let entry = archive.entry("file.txt").unwrap().unwrap();
        assert_eq!(entry.data(&Deflater::default()).unwrap(), b"some file content");
    }
}

#[test]
fn test_zip64_end_record_on_another_disk() {
    let mut bytes = with_locator(0, 0, 2);
    let end = bytes.len() - ENDHDR;
    LittleEndian::write_u16(&mut bytes[end + ENDDSK..], 1);

    let err = ZipArchive::from_buffer(bytes, ReadOptions::default()).unwrap_err();
    assert!(matches!(
        err,
        ZipError::NotImplemented("zip64 end record on another disk")
    ));
}

#[test]
fn test_zip64_locator_pointing_at_wrong_record() {
    // Offset zero holds the local header, not a zip64 end record.
    let err = ZipArchive::from_buffer(with_locator(0, 0, 1), ReadOptions::default()).unwrap_err();
    assert!(matches!(err, ZipError::InvalidSignature { .. }));

    let mut bytes = with_locator(0, 0, 1);
    let end = bytes.len() - ENDHDR;
    LittleEndian::write_u16(&mut bytes[end + ENDDSK..], 0xFFFF);
    let err = ZipArchive::from_buffer(bytes, ReadOptions::default()).unwrap_err();
    assert!(matches!(err, ZipError::InvalidSignature { .. }));
}
