//! Tests for WAL writer, reader and recovery
//!
//! These tests verify:
//! - Writer produces header + records readable by the reader
//! - Replay rebuilds the set and rejects records that cannot apply
//! - Torn trailing records: format error by default, truncation on request

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use resumefile::wal::{WalHeader, WalReader, WalRecord, WalRecovery, WalWriter, HEADER_SIZE, RECORD_SIZE};
use resumefile::{Interval, ResumeError};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_wal() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let wal_path = temp_dir.path().join("test.rf");
    (temp_dir, wal_path)
}

fn write_wal(path: &PathBuf, size: u64, records: &[WalRecord]) {
    let mut writer = WalWriter::create(path, &WalHeader::new(&[], size)).unwrap();
    for record in records {
        writer.append(record).unwrap();
    }
}

// =============================================================================
// Writer / Reader Tests
// =============================================================================

#[test]
fn test_create_writes_header_only() {
    let (_temp, wal_path) = setup_temp_wal();
    write_wal(&wal_path, 100, &[]);

    assert_eq!(std::fs::metadata(&wal_path).unwrap().len(), HEADER_SIZE as u64);
    let reader = WalReader::open(&wal_path).unwrap();
    assert_eq!(reader.header().size, 100);
    assert!(reader.records().unwrap().is_empty());
}

#[test]
fn test_create_refuses_existing() {
    let (_temp, wal_path) = setup_temp_wal();
    write_wal(&wal_path, 100, &[]);

    let result = WalWriter::create(&wal_path, &WalHeader::new(&[], 100));
    assert!(matches!(result, Err(ResumeError::AlreadyExists(_))));
}

#[test]
fn test_append_then_reopen_appends() {
    let (_temp, wal_path) = setup_temp_wal();
    write_wal(&wal_path, 100, &[WalRecord::put(Interval::new(0, 10))]);

    let mut writer = WalWriter::open(&wal_path).unwrap();
    writer.append(&WalRecord::put(Interval::new(20, 30))).unwrap();
    assert_eq!(writer.records_written(), 1);

    let records = WalReader::open(&wal_path).unwrap().records().unwrap();
    assert_eq!(
        records,
        vec![WalRecord::put(Interval::new(0, 10)), WalRecord::put(Interval::new(20, 30))]
    );
}

#[test]
fn test_open_missing() {
    let (_temp, wal_path) = setup_temp_wal();
    assert!(matches!(WalReader::open(&wal_path), Err(ResumeError::WalNotFound(_))));
    assert!(matches!(WalWriter::open(&wal_path), Err(ResumeError::WalNotFound(_))));
}

// =============================================================================
// Replay Tests
// =============================================================================

#[test]
fn test_replay_merge_sequence() {
    let records = [
        WalRecord::put(Interval::new(0, 10)),
        WalRecord::put(Interval::new(20, 30)),
        WalRecord::remove(Interval::new(20, 30)),
        WalRecord::remove(Interval::new(0, 10)),
        WalRecord::put(Interval::new(0, 30)),
    ];

    let (coverage, stats) = WalRecovery::replay(&records, 30).unwrap();

    assert_eq!(coverage.iter().collect::<Vec<_>>(), vec![Interval::new(0, 30)]);
    assert_eq!(stats.records_replayed, 5);
    assert_eq!(stats.puts, 3);
    assert_eq!(stats.removes, 2);
}

#[test]
fn test_replay_rejects_conflicting_put() {
    let records = [WalRecord::put(Interval::new(0, 10)), WalRecord::put(Interval::new(10, 20))];
    let result = WalRecovery::replay(&records, 100);
    assert!(matches!(result, Err(ResumeError::WalCorruption(_))));
}

#[test]
fn test_replay_rejects_unknown_remove() {
    let records = [WalRecord::put(Interval::new(0, 10)), WalRecord::remove(Interval::new(0, 5))];
    let result = WalRecovery::replay(&records, 100);
    assert!(matches!(result, Err(ResumeError::WalCorruption(_))));
}

#[test]
fn test_replay_rejects_out_of_size() {
    let records = [WalRecord::put(Interval::new(50, 150))];
    let result = WalRecovery::replay(&records, 100);
    assert!(matches!(result, Err(ResumeError::WalCorruption(_))));
}

// =============================================================================
// Torn Tail Tests
// =============================================================================

fn append_garbage(path: &PathBuf, n: usize) {
    let mut file = OpenOptions::new().append(true).open(path).unwrap();
    file.write_all(&vec![0xFFu8; n]).unwrap();
}

#[test]
fn test_torn_tail_is_format_error_by_default() {
    let (_temp, wal_path) = setup_temp_wal();
    write_wal(&wal_path, 100, &[WalRecord::put(Interval::new(0, 10))]);
    append_garbage(&wal_path, 7);

    let result = WalRecovery::recover(&wal_path, false);
    assert!(matches!(result, Err(ResumeError::Format(_))));
}

#[test]
fn test_torn_tail_repaired() {
    let (_temp, wal_path) = setup_temp_wal();
    write_wal(&wal_path, 100, &[WalRecord::put(Interval::new(0, 10))]);
    append_garbage(&wal_path, 7);

    let (header, coverage, stats) = WalRecovery::recover(&wal_path, true).unwrap();

    assert_eq!(header.size, 100);
    assert_eq!(coverage.iter().collect::<Vec<_>>(), vec![Interval::new(0, 10)]);
    assert_eq!(stats.torn_bytes, 7);
    assert!(stats.was_truncated);
    assert_eq!(
        std::fs::metadata(&wal_path).unwrap().len(),
        (HEADER_SIZE + RECORD_SIZE) as u64
    );
}

#[test]
fn test_verify_does_not_modify() {
    let (_temp, wal_path) = setup_temp_wal();
    write_wal(&wal_path, 100, &[WalRecord::put(Interval::new(0, 10))]);
    append_garbage(&wal_path, 3);
    let before = std::fs::metadata(&wal_path).unwrap().len();

    let stats = WalRecovery::verify(&wal_path).unwrap();

    assert_eq!(stats.records_replayed, 1);
    assert_eq!(stats.torn_bytes, 3);
    assert_eq!(std::fs::metadata(&wal_path).unwrap().len(), before);
}

// =============================================================================
// Append Failure Tests
// =============================================================================

#[cfg(target_os = "linux")]
#[test]
fn test_append_to_full_device_is_wal_error_and_poisons() {
    let dev_full = std::path::Path::new("/dev/full");
    if !dev_full.exists() {
        return;
    }

    let mut writer = WalWriter::open(dev_full).unwrap();

    let first = writer.append(&WalRecord::put(Interval::new(0, 10)));
    match first {
        Err(e @ ResumeError::Wal { .. }) => assert!(e.payload_durable()),
        other => panic!("expected a WAL error, got {:?}", other),
    }
    // The device cannot be truncated, so the writer refuses further appends
    assert!(writer.is_poisoned());
    assert!(matches!(
        writer.append(&WalRecord::put(Interval::new(20, 30))),
        Err(ResumeError::Wal { .. })
    ));
    assert_eq!(writer.records_written(), 0);
}
