//! Tests for ResumeFile lifecycle
//!
//! These tests verify:
//! - Create: allocation, header, refusal of zero size and existing paths
//! - Close / Remove / Complete
//! - Lacking-range queries and their cap

use resumefile::wal::{WalReader, HEADER_SIZE};
use resumefile::{Config, Interval, Preallocation, ResumeError, ResumeFile};

use crate::common::{setup_temp_config, setup_temp_file};

// =============================================================================
// Create Tests
// =============================================================================

#[test]
fn test_create_allocates_and_writes_header() {
    let (_temp, config) = setup_temp_config();

    let file = ResumeFile::create(config.clone(), &[1u8; 16], 1000).unwrap();

    assert_eq!(std::fs::metadata(&config.path).unwrap().len(), 1000);
    assert_eq!(std::fs::metadata(config.wal_path()).unwrap().len(), HEADER_SIZE as u64);
    assert!(config.wal_exists());
    assert_eq!(file.size(), 1000);
    assert_eq!(file.expected_digest(), Some([1u8; 16]));
    assert!(file.ranges().is_empty());

    let header = *WalReader::open(&config.wal_path()).unwrap().header();
    assert_eq!(header.size, 1000);
}

#[test]
fn test_create_zero_fill() {
    let (_temp, config) = setup_temp_config();
    let config = Config { preallocation: Preallocation::ZeroFill, ..config };

    let _file = ResumeFile::create(config.clone(), &[], 3 * 1024 * 1024 + 7).unwrap();

    let content = std::fs::read(&config.path).unwrap();
    assert_eq!(content.len(), 3 * 1024 * 1024 + 7);
    assert!(content.iter().all(|&b| b == 0));
}

#[test]
fn test_create_zero_size() {
    let (_temp, config) = setup_temp_config();

    let result = ResumeFile::create(config.clone(), &[], 0);

    assert!(matches!(result, Err(ResumeError::ZeroSize)));
    assert!(!config.path.exists());
    assert!(!config.wal_exists());
}

#[test]
fn test_create_existing_data_file() {
    let (_temp, config) = setup_temp_config();
    std::fs::write(&config.path, b"already here").unwrap();

    let result = ResumeFile::create(config.clone(), &[], 100);

    assert!(matches!(result, Err(ResumeError::AlreadyExists(_))));
    assert_eq!(std::fs::read(&config.path).unwrap(), b"already here");
    assert!(!config.wal_exists());
}

#[test]
fn test_create_twice() {
    let (_temp, config) = setup_temp_config();
    let _first = ResumeFile::create(config.clone(), &[], 100).unwrap();

    let result = ResumeFile::create(config, &[], 100);
    assert!(matches!(result, Err(ResumeError::AlreadyExists(_))));
}

#[test]
fn test_custom_wal_suffix() {
    let (temp, _) = setup_temp_config();
    let config = Config::builder()
        .path(temp.path().join("movie.mkv"))
        .wal_suffix(".part")
        .build();

    let _file = ResumeFile::create(config, &[], 10).unwrap();

    assert!(temp.path().join("movie.mkv.part").exists());
}

// =============================================================================
// Lacking Tests
// =============================================================================

#[test]
fn test_lacking_no_coverage() {
    let (_temp, file) = setup_temp_file(100);
    assert_eq!(file.lacking(), vec![Interval::new(0, 100)]);
}

#[test]
fn test_lacking_gaps_in_order() {
    let (_temp, file) = setup_temp_file(100);
    file.put(Interval::new(50, 60), &[0u8; 10]).unwrap();
    file.put(Interval::new(10, 20), &[0u8; 10]).unwrap();

    assert_eq!(
        file.lacking(),
        vec![Interval::new(0, 10), Interval::new(20, 50), Interval::new(60, 100)]
    );
}

#[test]
fn test_lacking_configured_limit() {
    let (_temp, config) = setup_temp_config();
    let config = Config { lacking_limit: Some(2), ..config };
    let file = ResumeFile::create(config, &[], 100).unwrap();
    file.put(Interval::new(10, 20), &[0u8; 10]).unwrap();
    file.put(Interval::new(50, 60), &[0u8; 10]).unwrap();

    assert_eq!(file.lacking(), vec![Interval::new(0, 10), Interval::new(20, 50)]);
    assert_eq!(file.lacking_limited(None).len(), 3);
}

// =============================================================================
// Close / Remove / Complete Tests
// =============================================================================

#[test]
fn test_remove_deletes_both_files() {
    let (_temp, config) = setup_temp_config();
    let file = ResumeFile::create(config.clone(), &[], 100).unwrap();
    file.put(Interval::new(0, 10), &[0u8; 10]).unwrap();

    file.remove().unwrap();

    assert!(!config.path.exists());
    assert!(!config.wal_exists());
}

#[test]
fn test_complete_keeps_data_drops_wal() {
    let (_temp, config) = setup_temp_config();
    let file = ResumeFile::create(config.clone(), &[], 4).unwrap();
    file.put(Interval::new(0, 4), b"done").unwrap();

    let path = file.complete().unwrap();

    assert_eq!(path, config.path);
    assert_eq!(std::fs::read(&path).unwrap(), b"done");
    assert!(!config.wal_exists());
}

#[test]
fn test_complete_refuses_partial_file() {
    let (_temp, config) = setup_temp_config();
    let file = ResumeFile::create(config.clone(), &[], 100).unwrap();
    file.put(Interval::new(0, 40), &[0u8; 40]).unwrap();

    let result = file.complete();

    assert!(matches!(result, Err(ResumeError::Incomplete { lacking: 60 })));
}

#[test]
fn test_close_keeps_files() {
    let (_temp, config) = setup_temp_config();
    let file = ResumeFile::create(config.clone(), &[], 100).unwrap();

    file.close().unwrap();

    assert!(config.path.exists());
    assert!(config.wal_exists());
}

#[test]
fn test_mod_time_available() {
    let (_temp, file) = setup_temp_file(10);
    assert!(file.mod_time().is_ok());
}
