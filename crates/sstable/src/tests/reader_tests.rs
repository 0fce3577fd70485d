use crate::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn reader_loads_entries_in_order() {
    let dir = tempdir().unwrap();
    let entries: Vec<(Vec<u8>, Vec<u8>)> = (0..100)
        .map(|i| (format!("key{i:03}").into_bytes(), format!("v{i}").into_bytes()))
        .collect();
    let path = SSTableWriter::write(dir.path(), 2, &entries).unwrap();

    let reader = SSTableReader::open(&path).unwrap();
    assert_eq!(reader.len(), 100);
    assert_eq!(reader.generation(), Some(2));
    assert_eq!(reader.entries()[0].key, "key000");
    assert_eq!(reader.entries()[99].key, "key099");
}

#[test]
fn reader_get_hits_and_misses() {
    let dir = tempdir().unwrap();
    let entries = vec![
        (b"hello".to_vec(), b"world".to_vec()),
        (b"hello1".to_vec(), b"world1".to_vec()),
    ];
    let path = SSTableWriter::write(dir.path(), 0, &entries).unwrap();

    let reader = SSTableReader::open(path).unwrap();
    assert_eq!(reader.get("hello"), Some("world"));
    assert_eq!(reader.get("hello1"), Some("world1"));
    assert_eq!(reader.get("hello2"), None);
}

#[test]
fn reader_preserves_separator_in_values() {
    let dir = tempdir().unwrap();
    let entries = vec![(b"k".to_vec(), b"a|b\n\"c\"".to_vec())];
    let path = SSTableWriter::write(dir.path(), 0, &entries).unwrap();
    let reader = SSTableReader::open(path).unwrap();
    assert_eq!(reader.get("k"), Some("a|b\n\"c\""));
}

#[test]
fn reader_rejects_malformed_document() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("0.sst");
    fs::write(&path, b"{\"not\": \"an array\"}").unwrap();
    assert!(matches!(
        SSTableReader::open(&path).unwrap_err(),
        SstError::Json(_)
    ));
}

#[test]
fn reader_missing_file_is_io_error() {
    let dir = tempdir().unwrap();
    assert!(matches!(
        SSTableReader::open(dir.path().join("42.sst")).unwrap_err(),
        SstError::Io(_)
    ));
}
