use rezip::codec::Deflater;
use rezip::zip::{Extracted, Progress};
use rezip::{ArchiveStore, LocalFile, ReadOptions, ZipArchive, ZipEntry, ZipExtractor};

use crate::init_logger;

#[derive(Default)]
struct Counter {
    started: usize,
    finished: usize,
}

impl Progress for Counter {
    fn item_start(&mut self, _name: &str) {
        assert_eq!(self.started, self.finished, "entries must be compressed one at a time");
        self.started += 1;
    }

    fn item_end(&mut self, _name: &str) {
        self.finished += 1;
    }
}

#[tokio::test]
async fn test_save_load_and_extract() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let store = LocalFile::new(dir.path().join("out/archive.zip"));

    let mut archive = ZipArchive::new(ReadOptions::default());
    archive.set_entry(ZipEntry::new("site/")).unwrap();
    archive
        .set_entry(ZipEntry::with_data("site/index.html", b"<h1>hi</h1>".repeat(20)))
        .unwrap();
    archive
        .set_entry(ZipEntry::with_data("site/css/main.css", b"body {}".to_vec()))
        .unwrap();

    let mut counter = Counter::default();
    let bytes = archive
        .compress_to_buffer_async(&Deflater::default(), &mut counter)
        .await
        .unwrap();
    assert_eq!((counter.started, counter.finished), (3, 3));
    store.save(&bytes).await.unwrap();

    let mut loaded = ZipArchive::from_buffer(store.load().await.unwrap(), ReadOptions::default()).unwrap();
    let target = dir.path().join("extracted");
    let extractor = ZipExtractor::new(&target, Deflater::default());
    let results = extractor.extract_all(&mut loaded).await.unwrap();

    assert_eq!(results.len(), 3);
    assert!(results.iter().any(|r| matches!(r, Extracted::Directory(_))));
    assert_eq!(
        std::fs::read(target.join("site/index.html")).unwrap(),
        b"<h1>hi</h1>".repeat(20)
    );
    assert_eq!(std::fs::read(target.join("site/css/main.css")).unwrap(), b"body {}");
}

#[tokio::test]
async fn test_async_write_errors_propagate() {
    let mut archive = ZipArchive::new(ReadOptions::default());
    archive.set_entry(ZipEntry::with_data("a", b"a".to_vec())).unwrap();
    archive.set_comment(&"c".repeat(0x1_0000));

    let result = archive.compress_to_buffer_async(&Deflater::default(), &mut ()).await;
    assert!(matches!(result, Err(rezip::ZipError::FieldOverflow { .. })));
}
