#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Integration tests for writing packs to disk and reading them back
//!
//! Covers round trips through the mode-switching handle, packs left behind by
//! a writer that stopped early, corruption detection, and chunked transfer of
//! entries above the configured threshold.

use pretty_assertions::assert_eq;
use sfpack::header::{ENTRY_COUNT_OFFSET, GLOBAL_HEADER_SIZE, MAGIC};
use sfpack::{PackConfig, PackError, PackFile, PackMode, PackReader, PackWriter};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn scratch() -> (TempDir, PathBuf) {
    init_tracing();
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("p.dat");
    (dir, path)
}

fn write_pack(path: &Path, entries: &[(&str, &[u8])]) {
    let mut pack = PackFile::new();
    pack.create(path).expect("create");
    for (name, data) in entries {
        pack.add_entry(data, name).expect("add entry");
    }
    pack.close();
}

fn sample(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

// --- Example scenario ---

#[test]
fn pack_two_text_entries() {
    let (_dir, path) = scratch();
    write_pack(&path, &[("a.txt", b"hello"), ("b.txt", b"world!")]);

    let mut pack = PackFile::new();
    pack.open(&path).expect("open");
    assert_eq!(pack.entry_count().expect("count"), 2);
    assert_eq!(
        pack.list_entries().expect("list"),
        vec![b"a.txt".as_slice(), b"b.txt".as_slice()]
    );

    let mut out = Vec::new();
    pack.get_entry_stream("b.txt")
        .expect("stream")
        .read_to_end(&mut out)
        .expect("read");
    assert_eq!(out, b"world!");
}

#[test]
fn pack_file_layout_is_stable() {
    let (_dir, path) = scratch();
    write_pack(&path, &[("a.txt", b"hello")]);

    let mut expected = Vec::new();
    expected.extend_from_slice(b"SFPv");
    expected.extend_from_slice(&1i32.to_le_bytes());
    expected.extend_from_slice(&1i32.to_le_bytes());
    expected.extend_from_slice(&0i32.to_le_bytes());
    expected.extend_from_slice(b"SFPv");
    expected.extend_from_slice(&5i32.to_le_bytes());
    expected.extend_from_slice(&0i32.to_le_bytes());
    expected.extend_from_slice(&5i32.to_le_bytes());
    expected.extend_from_slice(b"a.txt");
    expected.extend_from_slice(b"hello");

    assert_eq!(std::fs::read(&path).expect("read pack"), expected);
}

// --- Round trips ---

#[test]
fn pack_round_trip_from_disk_sources() {
    let (dir, path) = scratch();
    let sources: Vec<(String, Vec<u8>)> = (0..5u8)
        .map(|i| (format!("assets/file{i}.bin"), sample(usize::from(i) * 97, i)))
        .collect();

    let mut pack = PackFile::new();
    pack.create(&path).expect("create");
    for (name, data) in &sources {
        let source = dir.path().join(name.replace('/', "_"));
        std::fs::write(&source, data).expect("write source");
        pack.add_entry_from_path(&source, name).expect("add entry");
    }

    pack.open(&path).expect("open");
    let names: Vec<String> = pack
        .entries()
        .expect("entries")
        .iter()
        .map(|entry| entry.name_lossy().into_owned())
        .collect();
    let expected: Vec<String> = sources.iter().map(|(name, _)| name.clone()).collect();
    assert_eq!(names, expected);

    for (name, data) in &sources {
        let out = dir.path().join("extracted.bin");
        let written = pack.extract_entry(name, &out).expect("extract");
        assert_eq!(written, data.len() as u64);
        assert_eq!(&std::fs::read(&out).expect("read back"), data);
    }
}

#[test]
fn pack_binary_names_are_opaque() {
    let (_dir, path) = scratch();
    let raw_name: &[u8] = b"\x00\xffmusic/level1.ogg";

    let mut writer = PackWriter::create(&path, PackConfig::default()).expect("create");
    writer.add_entry(b"ogg", raw_name).expect("add");
    drop(writer);

    let mut reader = PackReader::open(&path, PackConfig::default()).expect("open");
    assert_eq!(reader.list_entries(), vec![raw_name]);
    assert!(reader.entry_exists(raw_name));
    assert!(!reader.entry_exists("music/level1.ogg"));
    assert_eq!(reader.read_entry(raw_name).expect("read"), b"ogg");
}

#[test]
fn pack_streams_are_independent_views() {
    let (_dir, path) = scratch();
    write_pack(&path, &[("first", b"0123456789"), ("second", b"abcdef")]);

    let mut reader = PackReader::open(&path, PackConfig::default()).expect("open");
    {
        let mut stream = reader.get_entry_stream("first").expect("stream");
        assert_eq!(stream.len(), 10);
        stream.seek(SeekFrom::Start(8)).expect("seek");
        let mut tail = Vec::new();
        stream.read_to_end(&mut tail).expect("read");
        assert_eq!(tail, b"89");
    }

    let mut second = String::new();
    reader
        .get_entry_stream("second")
        .expect("stream")
        .read_to_string(&mut second)
        .expect("read");
    assert_eq!(second, "abcdef");
}

#[test]
fn pack_reopen_replaces_index() {
    let (dir, path) = scratch();
    let other = dir.path().join("other.dat");
    write_pack(&path, &[("a", b"1"), ("b", b"2")]);
    write_pack(&other, &[("z", b"26")]);

    let mut pack = PackFile::new();
    pack.open(&path).expect("open");
    assert_eq!(pack.entry_count().expect("count"), 2);

    pack.open(&other).expect("reopen");
    assert_eq!(pack.list_entries().expect("list"), vec![b"z".as_slice()]);
}

// --- Early termination ---

#[test]
fn pack_readable_without_close() {
    let (_dir, path) = scratch();
    let mut writer = PackWriter::create(&path, PackConfig::default()).expect("create");
    writer.add_entry(b"one", "1").expect("add");
    writer.add_entry(b"two", "2").expect("add");

    // Read while the writer still holds the file open
    let reader = PackReader::open(&path, PackConfig::default()).expect("open");
    assert_eq!(reader.entry_count(), 2);
    drop(writer);
}

#[test]
fn pack_with_partial_trailing_entry_exposes_complete_entries() {
    let (_dir, path) = scratch();
    write_pack(&path, &[("a", b"alpha"), ("b", b"beta"), ("c", b"gamma")]);

    // A writer that died mid-payload leaves a header and part of the payload
    // behind without bumping the count
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .open(&path)
        .expect("reopen for append");
    file.write_all(&MAGIC).expect("write magic");
    file.write_all(&1i32.to_le_bytes()).expect("write name length");
    file.write_all(&0i32.to_le_bytes()).expect("write reserved");
    file.write_all(&1000i32.to_le_bytes()).expect("write payload length");
    file.write_all(b"dpartial").expect("write partial");
    drop(file);

    let mut pack = PackFile::new();
    pack.open(&path).expect("open");
    assert_eq!(pack.entry_count().expect("count"), 3);
    assert!(!pack.entry_exists("d").expect("exists"));
    assert_eq!(pack.read_entry("c").expect("read"), b"gamma");
}

// --- Corruption detection ---

#[test]
fn pack_any_global_magic_byte_flip_is_rejected() {
    let (_dir, path) = scratch();
    write_pack(&path, &[("a.txt", b"hello")]);
    let original = std::fs::read(&path).expect("read pack");

    for at in 0..MAGIC.len() {
        let mut corrupt = original.clone();
        corrupt[at] ^= 0x20;
        std::fs::write(&path, &corrupt).expect("write corrupt pack");

        let mut pack = PackFile::new();
        match pack.open(&path) {
            Err(PackError::InvalidHeader { actual, .. }) => {
                assert_eq!(&actual[..], &corrupt[..4]);
            }
            Err(other) => panic!("byte {at}: unexpected error {other}"),
            Ok(()) => panic!("byte {at}: corrupt pack opened"),
        }
        assert_eq!(pack.mode(), PackMode::Closed);
        assert!(pack.entries().is_err());
    }
}

#[test]
fn pack_entry_magic_corruption_is_distinct() {
    let (_dir, path) = scratch();
    write_pack(&path, &[("a", b"1"), ("b", b"22"), ("c", b"333")]);

    let last_header = {
        let reader = PackReader::open(&path, PackConfig::default()).expect("open");
        reader.entries()[1].end_offset()
    };

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .open(&path)
        .expect("reopen");
    file.seek(SeekFrom::Start(last_header)).expect("seek");
    file.write_all(b"XFPv").expect("corrupt");
    drop(file);

    let err = PackReader::open(&path, PackConfig::default())
        .err()
        .expect("should fail");
    assert!(err.is_format_error());
    match err {
        PackError::TruncatedEntry { index, offset } => {
            assert_eq!(index, 2);
            assert_eq!(offset, last_header);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn pack_count_patch_is_only_header_change() {
    let (_dir, path) = scratch();
    let mut writer = PackWriter::create(&path, PackConfig::default()).expect("create");
    let empty = std::fs::read(&path).expect("read empty pack");
    writer.add_entry(b"x", "a").expect("add");
    let one = std::fs::read(&path).expect("read pack");
    drop(writer);

    let at = ENTRY_COUNT_OFFSET as usize;
    assert_eq!(&empty[..at], &one[..at]);
    let end = GLOBAL_HEADER_SIZE as usize;
    assert_eq!(&empty[at + 4..end], &one[at + 4..end]);
    assert_eq!(&one[at..at + 4], &1i32.to_le_bytes());
}

// --- Chunked transfer ---

#[test]
fn pack_large_entry_round_trip_chunked() {
    let (dir, path) = scratch();
    let config = PackConfig::new()
        .with_chunk_size(4 * 1024)
        .with_chunk_threshold(16 * 1024);
    let big = sample(100_000, 7);
    let source = dir.path().join("big.src");
    std::fs::write(&source, &big).expect("write source");

    let mut pack = PackFile::with_config(config);
    pack.create(&path).expect("create");
    pack.add_entry(b"before", "small").expect("add");
    pack.add_entry_from_path(&source, "big").expect("add big");
    pack.add_entry(b"after", "tail").expect("add");

    pack.open(&path).expect("open");
    let out = dir.path().join("big.out");
    assert_eq!(pack.extract_entry("big", &out).expect("extract"), 100_000);
    assert_eq!(std::fs::read(&out).expect("read back"), big);
    assert_eq!(pack.read_entry("tail").expect("read"), b"after");
}

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;
    use proptest::test_runner::TestCaseError;

    fn entry() -> impl Strategy<Value = (Vec<u8>, Vec<u8>)> {
        (
            prop::collection::vec(any::<u8>(), 0..24),
            prop::collection::vec(any::<u8>(), 0..600),
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Names come back in add order and every payload is byte-identical
        #[test]
        fn round_trip_preserves_order_and_payloads(
            entries in prop::collection::vec(entry(), 0..12),
            threshold in 0u64..700,
        ) {
            let dir = tempfile::tempdir().map_err(|e| TestCaseError::fail(e.to_string()))?;
            let path = dir.path().join("prop.dat");
            let config = PackConfig::new().with_chunk_size(64).with_chunk_threshold(threshold);

            let mut writer = PackWriter::create(&path, config.clone())
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            for (name, data) in &entries {
                writer.add_entry(data, name).map_err(|e| TestCaseError::fail(e.to_string()))?;
            }
            drop(writer);

            let mut reader = PackReader::open(&path, config)
                .map_err(|e| TestCaseError::fail(e.to_string()))?;
            prop_assert_eq!(reader.entry_count(), entries.len());
            let names: Vec<Vec<u8>> = reader.list_entries().iter().map(|n| n.to_vec()).collect();
            let expected: Vec<Vec<u8>> = entries.iter().map(|(n, _)| n.clone()).collect();
            prop_assert_eq!(names, expected);

            for (index, (name, data)) in entries.iter().enumerate() {
                prop_assert_eq!(reader.entries()[index].content_length(), data.len() as u64);

                // Lookups return the first entry with a name, so only those are streamed
                if entries.iter().position(|(n, _)| n == name) != Some(index) {
                    continue;
                }
                let mut stream = reader
                    .get_entry_stream(name)
                    .map_err(|e| TestCaseError::fail(e.to_string()))?;
                prop_assert_eq!(stream.len(), data.len() as u64);
                let mut out = Vec::new();
                stream.read_to_end(&mut out).map_err(|e| TestCaseError::fail(e.to_string()))?;
                prop_assert_eq!(&out, data);
            }

            if let Some((name, data)) = entries.first() {
                let out = dir.path().join("first.out");
                reader.extract_entry(name, &out).map_err(|e| TestCaseError::fail(e.to_string()))?;
                let extracted = std::fs::read(&out).map_err(|e| TestCaseError::fail(e.to_string()))?;
                prop_assert_eq!(&extracted, data);
            }
        }
    }
}
