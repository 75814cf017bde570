use jiff::civil::date;
use quickcheck_macros::quickcheck;
use rezip::codec::Deflater;
use rezip::crc::crc32;
use rezip::zip::{CompressionMethod, ZipParser};
use rezip::{ReadOptions, ZipArchive, ZipEntry};

use crate::{build, init_logger, names, open};

#[test]
fn test_names_data_and_metadata_survive() {
    init_logger();
    let codec = Deflater::default();
    let when = date(2019, 11, 23).at(14, 30, 12, 0);
    let text = b"The quick brown fox jumps over the lazy dog. ".repeat(40);

    let mut readme = ZipEntry::with_data("docs/readme.txt", text.clone());
    readme.set_time(when);
    readme.set_comment("read me first");
    let mut tool = ZipEntry::with_data("bin/tool", b"\x7fELF".to_vec());
    tool.set_unix_mode(0o755);

    let bytes = build(vec![
        ZipEntry::new("docs/"),
        readme,
        ZipEntry::new("bin/"),
        tool,
        ZipEntry::with_data("empty.txt", Vec::new()),
    ]);
    let mut archive = open(bytes);

    assert_eq!(archive.entry_count(), 5);
    assert_eq!(
        names(&mut archive),
        ["bin/", "bin/tool", "docs/", "docs/readme.txt", "empty.txt"]
    );

    let readme = archive.entry("docs/readme.txt").unwrap().unwrap();
    assert_eq!(readme.data(&codec).unwrap(), text);
    assert_eq!(readme.header().crc, crc32(&text));
    assert_eq!(readme.header().size(), text.len() as u64);
    assert!(readme.header().compressed_size() < text.len() as u64);
    assert_eq!(readme.header().method(), CompressionMethod::Deflated);
    assert_eq!(readme.time(), Some(when));
    assert_eq!(readme.comment(), "read me first");
    assert!(readme.header().flags.utf8());

    let tool = archive.entry("bin/tool").unwrap().unwrap();
    assert_eq!(tool.unix_mode(), Some(0o755));
    assert_eq!(tool.data(&codec).unwrap(), b"\x7fELF");

    let dir = archive.entry("docs/").unwrap().unwrap();
    assert!(dir.is_directory());
    assert_eq!(dir.header().method(), CompressionMethod::Stored);
    assert_eq!(dir.header().compressed_size(), 0);

    let empty = archive.entry("empty.txt").unwrap().unwrap();
    assert_eq!(empty.header().method(), CompressionMethod::Stored);
    assert!(empty.data(&codec).unwrap().is_empty());
}

#[test]
fn test_archive_comment_round_trip() {
    let mut archive = ZipArchive::new(ReadOptions::default());
    archive.set_entry(ZipEntry::with_data("a", b"a".to_vec())).unwrap();
    archive.set_comment("built by the nightly job");
    let bytes = archive.compress_to_buffer(&Deflater::default()).unwrap();

    let reopened = open(bytes);
    assert_eq!(reopened.comment(), "built by the nightly job");
    assert_eq!(reopened.main_header().comment_length, 24);
}

#[test]
fn test_rewrite_without_changes_is_byte_identical() {
    init_logger();
    let options = ReadOptions {
        no_sort: true,
        ..Default::default()
    };
    let first = build(vec![
        ZipEntry::new("a/"),
        ZipEntry::with_data("a/one.txt", b"one one one one".to_vec()),
        ZipEntry::with_data("b.bin", (0..=255u8).collect()),
    ]);

    let mut archive = ZipArchive::from_buffer(first.clone(), options).unwrap();
    let second = archive.compress_to_buffer(&Deflater::default()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_non_utf8_names_are_written_back_unchanged() {
    init_logger();
    let mut bytes = build(vec![ZipEntry::with_data("x.txt", b"xxxx".to_vec())]);
    let mut renamed = 0;
    for start in 0..bytes.len() - 4 {
        if &bytes[start..start + 5] == b"x.txt" {
            bytes[start] = 0x81;
            renamed += 1;
        }
    }
    assert_eq!(renamed, 2);

    let options = ReadOptions {
        no_sort: true,
        ..Default::default()
    };
    let mut archive = ZipArchive::from_buffer(bytes.clone(), options).unwrap();
    let entry = archive.entry("\u{FFFD}.txt").unwrap().unwrap();
    assert_eq!(entry.raw_name(), b"\x81.txt");
    assert_eq!(entry.data(&Deflater::default()).unwrap(), b"xxxx");

    let rewritten = archive.compress_to_buffer(&Deflater::default()).unwrap();
    assert_eq!(rewritten, bytes);
}

#[test]
fn test_archived_entries_are_copied_not_recompressed() {
    let codec = Deflater::default();
    let bytes = build(vec![ZipEntry::with_data("keep.txt", b"keep keep keep".to_vec())]);
    let mut archive = open(bytes);
    let before = archive.entry("keep.txt").unwrap().unwrap().header().clone();

    archive.set_entry(ZipEntry::with_data("new.txt", b"new".to_vec())).unwrap();
    let mut reopened = open(archive.compress_to_buffer(&codec).unwrap());

    let kept = reopened.entry("keep.txt").unwrap().unwrap();
    assert_eq!(kept.header().crc, before.crc);
    assert_eq!(kept.header().compressed_size(), before.compressed_size());
    assert_eq!(kept.header().time, before.time);
    assert_eq!(kept.data(&codec).unwrap(), b"keep keep keep");
    assert_eq!(names(&mut reopened), ["keep.txt", "new.txt"]);
}

#[test]
fn test_lazy_directory_read() {
    let bytes = build(vec![
        ZipEntry::with_data("x", b"x".to_vec()),
        ZipEntry::with_data("y", b"y".to_vec()),
    ]);

    // The entry count comes from the end record before the directory is walked.
    let mut lazy = ZipArchive::from_buffer(bytes.clone(), ReadOptions::default()).unwrap();
    assert_eq!(lazy.entry_count(), 2);
    assert_eq!(lazy.entries().unwrap().len(), 2);

    let eager = ZipArchive::from_buffer(
        bytes,
        ReadOptions {
            read_entries: true,
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(eager.entry_count(), 2);
}

#[test]
fn test_parser_tolerates_trailing_data() {
    let mut bytes = build(vec![ZipEntry::with_data("f.txt", b"data".to_vec())]);
    let len = bytes.len();
    bytes.extend_from_slice(b"trailing garbage that is not a comment");

    let parser = ZipParser::new(bytes);
    assert_eq!(parser.find_eocd(false).unwrap(), (len - 22) as u64);
    let (main, _) = parser.read_main_header(false).unwrap();
    let entries = parser.read_entries(&main).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name(), "f.txt");
}

#[quickcheck]
fn test_read_what_we_write(data: Vec<u8>) -> bool {
    let codec = Deflater::default();
    let mut archive = open(build(vec![ZipEntry::with_data("file.bin", data.clone())]));
    let entry = archive.entry("file.bin").unwrap().unwrap();
    entry.header().size() == data.len() as u64 && entry.data(&codec).unwrap() == data
}
