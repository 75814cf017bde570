use rezip::codec::Deflater;
use rezip::{ReadOptions, ZipArchive, ZipEntry};

use crate::{build, names, open};

fn sample() -> ZipArchive {
    open(build(vec![
        ZipEntry::new("dir/"),
        ZipEntry::with_data("dir/a.txt", b"a".to_vec()),
        ZipEntry::new("dir/sub/"),
        ZipEntry::with_data("dir/sub/b.txt", b"b".to_vec()),
        ZipEntry::with_data("dir2/x.txt", b"x".to_vec()),
        ZipEntry::with_data("top.txt", b"top".to_vec()),
    ]))
}

#[test]
fn test_cascading_delete_survives_save() {
    let mut archive = sample();
    assert!(archive.delete_entry("dir/").unwrap());
    assert_eq!(names(&mut archive), ["dir2/x.txt", "top.txt"]);

    let bytes = archive.compress_to_buffer(&Deflater::default()).unwrap();
    let mut reopened = open(bytes);
    assert_eq!(reopened.main_header().total_entries, 2);
    assert_eq!(names(&mut reopened), ["dir2/x.txt", "top.txt"]);
    assert_eq!(
        reopened.entry("dir2/x.txt").unwrap().unwrap().data(&Deflater::default()).unwrap(),
        b"x"
    );
}

#[test]
fn test_delete_nested_directory_only() {
    let mut archive = sample();
    assert!(archive.delete_entry("dir/sub/").unwrap());
    assert_eq!(names(&mut archive), ["dir/", "dir/a.txt", "dir2/x.txt", "top.txt"]);
    assert!(!archive.delete_entry("dir/sub/").unwrap());
}

#[test]
fn test_children_of_loaded_archive() {
    let mut archive = sample();
    let children: Vec<String> = archive
        .entry_children("dir/")
        .unwrap()
        .into_iter()
        .map(|entry| entry.name().to_string())
        .collect();
    assert_eq!(children, ["dir/", "dir/a.txt", "dir/sub/", "dir/sub/b.txt"]);
}

#[test]
fn test_replace_entry_data() {
    let codec = Deflater::default();
    let mut archive = sample();
    archive
        .entry_mut("top.txt")
        .unwrap()
        .unwrap()
        .set_data(b"replaced content".to_vec());

    let mut reopened = open(archive.compress_to_buffer(&codec).unwrap());
    let top = reopened.entry("top.txt").unwrap().unwrap();
    assert_eq!(top.data(&codec).unwrap(), b"replaced content");
    assert_eq!(top.header().size(), 16);
}

#[test]
fn test_no_sort_keeps_insertion_order() {
    let codec = Deflater::default();
    let mut archive = ZipArchive::new(ReadOptions {
        no_sort: true,
        ..Default::default()
    });
    for name in ["zeta", "Alpha", "mid"] {
        archive.set_entry(ZipEntry::with_data(name, name.as_bytes().to_vec())).unwrap();
    }
    let bytes = archive.compress_to_buffer(&codec).unwrap();
    assert_eq!(names(&mut open(bytes.clone())), ["zeta", "Alpha", "mid"]);

    let mut sorted = ZipArchive::from_buffer(bytes, ReadOptions::default()).unwrap();
    let resorted = sorted.compress_to_buffer(&codec).unwrap();
    assert_eq!(names(&mut open(resorted)), ["Alpha", "mid", "zeta"]);
}

#[test]
fn test_added_names_are_normalized() {
    let mut archive = open(build(vec![
        ZipEntry::with_data("..\\..\\windows\\style.txt", b"w".to_vec()),
        ZipEntry::with_data("/absolute/path.txt", b"p".to_vec()),
    ]));
    assert_eq!(names(&mut archive), ["absolute/path.txt", "windows/style.txt"]);
}
