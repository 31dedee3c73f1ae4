//! Shared fixtures

use resumefile::{Config, ResumeFile};
use tempfile::TempDir;

pub fn setup_temp_config() -> (TempDir, Config) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::for_path(temp_dir.path().join("data.bin"));
    (temp_dir, config)
}

pub fn setup_temp_file(size: u64) -> (TempDir, ResumeFile) {
    let (temp_dir, config) = setup_temp_config();
    let file = ResumeFile::create(config, &[], size).unwrap();
    (temp_dir, file)
}

/// Deterministic test content
pub fn pattern(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i * 31 % 251) as u8).collect()
}
