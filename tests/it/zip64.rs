use byteorder::{ByteOrder, LittleEndian};
use rezip::codec::Deflater;
use rezip::zip::constants::{ENDHDR, ENDSUB, ID_ZIP64, ZIP64ENDSIG, ZIP64LOCSIG};
use rezip::zip::{ExtraFields, Zip64ExtendedInfo, Zip64Fields};
use rezip::{ReadOptions, ZipArchive, ZipEntry};
use rstest::rstest;

use crate::{build, init_logger, open};

fn contains_zip64_signatures(data: &[u8]) -> bool {
    let has_eocd = data.windows(4).any(|w| w == ZIP64ENDSIG.to_le_bytes());
    let has_locator = data.windows(4).any(|w| w == ZIP64LOCSIG.to_le_bytes());
    has_eocd && has_locator
}

#[test]
fn test_small_archives_have_no_zip64_records() {
    let bytes = build(vec![
        ZipEntry::new("dir/"),
        ZipEntry::with_data("dir/file.txt", b"contents".repeat(100)),
    ]);
    assert!(!contains_zip64_signatures(&bytes));

    let mut archive = open(bytes);
    assert!(!archive.main_header().is_zip64());
    for entry in archive.entries().unwrap() {
        assert!(!entry.header().zip64());
        assert!(!entry.extra().contains(ID_ZIP64));
        assert_eq!(entry.header().version_needed(), 20);
    }
}

#[test]
fn test_escalated_size_round_trips() {
    init_logger();
    let mut archive = open(build(vec![
        ZipEntry::with_data("big.bin", b"pretend this is large".to_vec()),
        ZipEntry::with_data("small.txt", b"small".to_vec()),
    ]));

    // Only the header changes; the archived bytes are copied through unchanged.
    let claimed = 0x1_0000_0000;
    archive
        .entry_mut("big.bin")
        .unwrap()
        .unwrap()
        .header_mut()
        .set_size(claimed);
    let bytes = archive.compress_to_buffer(&Deflater::default()).unwrap();
    assert!(contains_zip64_signatures(&bytes));
    assert!(archive.main_header().is_zip64());

    let mut reopened = open(bytes.clone());
    assert!(reopened.main_header().zip64_format);
    assert_eq!(reopened.main_header().total_entries, 2);

    let big = reopened.entry("big.bin").unwrap().unwrap();
    assert_eq!(big.header().size(), claimed);
    assert!(big.header().zip64());
    assert_eq!(big.header().version_needed(), 45);
    assert_eq!(
        big.extra()
            .zip64(big.header().sentinels())
            .unwrap()
            .and_then(|info| info.size),
        Some(claimed)
    );
    let local = big.header().local_header().unwrap();
    assert_eq!(local.version, 45);
    assert!(!local.flags.data_descriptor());

    let small = reopened.entry("small.txt").unwrap().unwrap();
    assert!(!small.header().zip64());
    assert_eq!(small.data(&Deflater::default()).unwrap(), b"small");

    // Escalated fields stay escalated, so the archive is written back as it was read.
    let mut again = ZipArchive::from_buffer(
        bytes.clone(),
        ReadOptions {
            no_sort: true,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(again.compress_to_buffer(&Deflater::default()).unwrap(), bytes);
}

#[test]
fn test_escalation_threshold() {
    let mut entry = ZipEntry::new("edge");
    entry.header_mut().set_size(0xFFFF_FFFE);
    assert!(!entry.header().zip64());
    entry.header_mut().set_size(0xFFFF_FFFF);
    assert!(entry.header().zip64());
    assert_eq!(
        entry.header().sentinels(),
        Zip64Fields {
            size: true,
            ..Default::default()
        }
    );

    entry.header_mut().set_size(1);
    entry.header_mut().set_disk_num_start(0xFFFF);
    assert_eq!(
        entry.header().zip64_info(),
        Zip64ExtendedInfo {
            disk_num_start: Some(0xFFFF),
            ..Default::default()
        }
    );
}

#[test]
fn test_unrelated_extra_fields_keep_their_position() {
    let mut extra = ExtraFields::new();
    extra.insert(0x5455, vec![1, 2, 3, 4, 5]).unwrap();
    extra.insert(0x7875, vec![1, 4, 0, 0, 0, 0]).unwrap();

    let mut entry = ZipEntry::with_data("f", b"f".to_vec());
    *entry.extra_mut() = extra;
    let mut archive = open(build(vec![entry]));
    let entry = archive.entry("f").unwrap().unwrap();
    assert_eq!(entry.extra().count(), 2);
    assert_eq!(entry.extra().get(0x5455), Some(&[1u8, 2, 3, 4, 5][..]));
    assert_eq!(entry.extra().get(0x7875), Some(&[1u8, 4, 0, 0, 0, 0][..]));
}

#[rstest]
#[case(65534, false)]
#[case(65535, true)]
fn test_zip64_threshold_entries(#[case] count: usize, #[case] zip64: bool) {
    let entries = (0..count).map(|i| ZipEntry::new(&format!("file_{i:05}.txt"))).collect();
    let bytes = build(entries);
    assert_eq!(contains_zip64_signatures(&bytes), zip64);

    // The 32-bit record holds the saturated count; the zip64 record the real one.
    let end = bytes.len() - ENDHDR;
    assert_eq!(LittleEndian::read_u16(&bytes[end + ENDSUB..]) as usize, count.min(0xFFFF));

    let mut archive = open(bytes);
    assert_eq!(archive.entry_count(), count as u64);
    assert_eq!(archive.main_header().is_zip64(), zip64);
    assert_eq!(archive.entries().unwrap().len(), count);
}
