//! Tests for the Metadata Log
//!
//! These tests verify:
//! - Record line format
//! - Append / scan / find
//! - Removal keeps other records verbatim and in order
//! - Persistence across reopen
//! - Duplicate names in existing logs
//! - Corruption detection
//! - Name validation

use std::fs;
use std::path::PathBuf;

use shardstore::config::LogSyncStrategy;
use shardstore::metadata::{FileRecord, Location, LogReader, MetadataLog};
use shardstore::StoreError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_log() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("storage.txt");
    (temp_dir, log_path)
}

fn record(name: &str, total_size: u64, shards: usize) -> FileRecord {
    let locations = (1..=shards)
        .map(|i| {
            Location::new(
                format!("/srv/node{}/{}.part{}", i, name, i),
                format!("10.0.0.{}:600{}", i, i),
            )
        })
        .collect();
    FileRecord::new(name, total_size, locations)
}

// =============================================================================
// Format Tests
// =============================================================================

#[test]
fn test_record_lines() {
    let r = record("a.txt", 10, 2);

    assert_eq!(r.header_line(), "a.txt;10;2");
    assert_eq!(
        r.to_lines(),
        "a.txt;10;2\n/srv/node1/a.txt.part1\t10.0.0.1:6001\n/srv/node2/a.txt.part2\t10.0.0.2:6002\n"
    );
    assert_eq!(r.shard_count(), 2);
}

#[test]
fn test_parse_round_trip_of_several_records() {
    let records = vec![record("a.txt", 10, 3), record("b.bin", 0, 1), record("c", 7, 2)];
    let text: String = records.iter().map(|r| r.to_lines()).collect();

    let parsed = LogReader::parse(&text).unwrap();

    assert_eq!(parsed, records);
}

#[test]
fn test_parse_skips_blank_lines() {
    let text = "a;1;1\n/p/a.part1\th:1\n\n\nb;2;1\n/p/b.part1\th:1\n";

    let parsed = LogReader::parse(text).unwrap();

    assert_eq!(parsed.len(), 2);
    assert_eq!(parsed[1].name, "b");
}

// =============================================================================
// Append / Read Tests
// =============================================================================

#[test]
fn test_open_creates_empty_log() {
    let (_temp, path) = setup_temp_log();

    let log = MetadataLog::open(&path, LogSyncStrategy::EveryWrite).unwrap();

    assert!(path.exists());
    assert!(log.is_empty());
    assert!(log.scan().is_empty());
}

#[test]
fn test_append_and_find() {
    let (_temp, path) = setup_temp_log();
    let log = MetadataLog::open(&path, LogSyncStrategy::EveryWrite).unwrap();

    log.append(record("a.txt", 10, 3)).unwrap();

    let found = log.find("a.txt").unwrap();
    assert_eq!(found.total_size, 10);
    assert_eq!(found.shard_count(), 3);

    let locations = log.find_locations("a.txt").unwrap();
    assert_eq!(locations.len(), 3);
    assert_eq!(locations[0].path, "/srv/node1/a.txt.part1");
    assert_eq!(locations[2].node, "10.0.0.3:6003");
}

#[test]
fn test_append_writes_file_format() {
    let (_temp, path) = setup_temp_log();
    let log = MetadataLog::open(&path, LogSyncStrategy::EveryWrite).unwrap();

    log.append(record("a.txt", 10, 1)).unwrap();
    log.append(record("b.txt", 5, 1)).unwrap();

    let contents = fs::read_to_string(&path).unwrap();
    assert_eq!(
        contents,
        "a.txt;10;1\n/srv/node1/a.txt.part1\t10.0.0.1:6001\nb.txt;5;1\n/srv/node1/b.txt.part1\t10.0.0.1:6001\n"
    );
}

#[test]
fn test_find_unknown_name() {
    let (_temp, path) = setup_temp_log();
    let log = MetadataLog::open(&path, LogSyncStrategy::EveryWrite).unwrap();

    assert!(matches!(log.find_locations("missing"), Err(StoreError::NotFound(_))));
    assert!(!log.contains("missing"));
}

#[test]
fn test_name_prefix_does_not_match() {
    let (_temp, path) = setup_temp_log();
    let log = MetadataLog::open(&path, LogSyncStrategy::EveryWrite).unwrap();
    log.append(record("report.txt", 3, 1)).unwrap();

    assert!(matches!(log.find("report"), Err(StoreError::NotFound(_))));
}

#[test]
fn test_scan_returns_names_in_upload_order() {
    let (_temp, path) = setup_temp_log();
    let log = MetadataLog::open(&path, LogSyncStrategy::OsBuffered).unwrap();

    for name in ["zeta", "alpha", "mid"] {
        log.append(record(name, 1, 1)).unwrap();
    }

    assert_eq!(log.scan(), vec!["zeta", "alpha", "mid"]);
    assert_eq!(log.scan(), log.scan());
}

// =============================================================================
// Removal Tests
// =============================================================================

#[test]
fn test_find_and_remove_returns_record() {
    let (_temp, path) = setup_temp_log();
    let log = MetadataLog::open(&path, LogSyncStrategy::EveryWrite).unwrap();
    log.append(record("a.txt", 10, 3)).unwrap();

    let removed = log.find_and_remove("a.txt").unwrap();

    assert_eq!(removed, record("a.txt", 10, 3));
    assert!(log.is_empty());
    assert_eq!(fs::read_to_string(&path).unwrap(), "");
}

#[test]
fn test_find_and_remove_keeps_other_records_in_order() {
    let (_temp, path) = setup_temp_log();
    let log = MetadataLog::open(&path, LogSyncStrategy::EveryWrite).unwrap();
    log.append(record("first", 1, 2)).unwrap();
    log.append(record("victim", 2, 3)).unwrap();
    log.append(record("last", 3, 1)).unwrap();

    log.find_and_remove("victim").unwrap();

    let expected = format!("{}{}", record("first", 1, 2).to_lines(), record("last", 3, 1).to_lines());
    assert_eq!(fs::read_to_string(&path).unwrap(), expected);
    assert_eq!(log.scan(), vec!["first", "last"]);
    assert!(!path.with_file_name("storage.txt.tmp").exists());
}

#[test]
fn test_find_and_remove_unknown_name_leaves_log_untouched() {
    let (_temp, path) = setup_temp_log();
    let log = MetadataLog::open(&path, LogSyncStrategy::EveryWrite).unwrap();
    log.append(record("a.txt", 10, 1)).unwrap();
    let before = fs::read_to_string(&path).unwrap();

    let result = log.find_and_remove("b.txt");

    assert!(matches!(result, Err(StoreError::NotFound(_))));
    assert_eq!(fs::read_to_string(&path).unwrap(), before);
}

#[test]
fn test_append_after_remove_goes_to_new_file() {
    let (_temp, path) = setup_temp_log();
    let log = MetadataLog::open(&path, LogSyncStrategy::EveryWrite).unwrap();
    log.append(record("a", 1, 1)).unwrap();
    log.find_and_remove("a").unwrap();

    log.append(record("b", 2, 1)).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), record("b", 2, 1).to_lines());
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_reopen_restores_records() {
    let (_temp, path) = setup_temp_log();
    {
        let log = MetadataLog::open(&path, LogSyncStrategy::EveryWrite).unwrap();
        log.append(record("a.txt", 10, 3)).unwrap();
        log.append(record("b.txt", 4, 3)).unwrap();
        log.find_and_remove("a.txt").unwrap();
        log.append(record("c.txt", 8, 2)).unwrap();
    }

    let log = MetadataLog::open(&path, LogSyncStrategy::EveryWrite).unwrap();

    assert_eq!(log.scan(), vec!["b.txt", "c.txt"]);
    assert_eq!(log.find("c.txt").unwrap(), record("c.txt", 8, 2));
}

#[test]
fn test_duplicate_names_in_existing_log() {
    let (_temp, path) = setup_temp_log();
    let text = format!("{}{}", record("dup", 1, 1).to_lines(), record("dup", 2, 2).to_lines());
    fs::write(&path, text).unwrap();

    let log = MetadataLog::open(&path, LogSyncStrategy::EveryWrite).unwrap();

    // Listing is not deduplicated; lookups use the first record
    assert_eq!(log.scan(), vec!["dup", "dup"]);
    assert_eq!(log.find("dup").unwrap().total_size, 1);

    // Removing takes the first; the second becomes visible
    log.find_and_remove("dup").unwrap();
    assert_eq!(log.scan(), vec!["dup"]);
    assert_eq!(log.find("dup").unwrap().total_size, 2);
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_bad_header_is_corruption() {
    let (_temp, path) = setup_temp_log();
    fs::write(&path, "a.txt;ten;1\n/p\th:1\n").unwrap();

    let result = MetadataLog::open(&path, LogSyncStrategy::EveryWrite);

    match result {
        Err(StoreError::LogCorruption { line, .. }) => assert_eq!(line, 1),
        other => panic!("Expected LogCorruption, got {:?}", other.err()),
    }
}

#[test]
fn test_missing_location_lines_is_corruption() {
    let text = "a.txt;10;3\n/p/a.txt.part1\th:1\n";

    let result = LogReader::parse(text);

    assert!(matches!(result, Err(StoreError::LogCorruption { line: 1, .. })));
}

#[test]
fn test_location_without_node_is_corruption() {
    let text = "a.txt;10;1\n/p/a.txt.part1\n";

    let result = LogReader::parse(text);

    assert!(matches!(result, Err(StoreError::LogCorruption { line: 2, .. })));
}

#[test]
fn test_stray_line_is_corruption() {
    let text = "a;1;1\n/p/a.part1\th:1\nnot a header\n";

    let result = LogReader::parse(text);

    assert!(matches!(result, Err(StoreError::LogCorruption { line: 3, .. })));
}

// =============================================================================
// Name Validation Tests
// =============================================================================

#[test]
fn test_validate_name_accepts_plain_names() {
    for name in ["a.txt", "report 2024.pdf", "data.tar.gz", "ünïcode"] {
        FileRecord::validate_name(name).unwrap();
    }
}

#[test]
fn test_validate_name_rejects_reserved_characters() {
    for name in ["", ".", "..", "a;b", "dir/file", "dir\\file", "a\nb", "a\tb"] {
        assert!(
            matches!(FileRecord::validate_name(name), Err(StoreError::InvalidName(_))),
            "{:?} should be rejected",
            name
        );
    }
}
