//! Configuration for resumefile
//!
//! Centralized configuration with sensible defaults.

use std::ffi::OsString;
use std::path::PathBuf;

/// Default suffix appended to the data file path to form the WAL path
pub const DEFAULT_WAL_SUFFIX: &str = ".rf";

/// Configuration for one resumable file
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Paths
    // -------------------------------------------------------------------------
    /// Path of the data file. The WAL lives next to it:
    ///   {path}        (data, exactly `size` bytes)
    ///   {path}{suffix} (write-ahead log)
    pub path: PathBuf,

    /// Suffix appended to `path` for the WAL file
    pub wal_suffix: String,

    // -------------------------------------------------------------------------
    // Allocation
    // -------------------------------------------------------------------------
    /// How the data file is sized at creation
    pub preallocation: Preallocation,

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------
    /// Maximum number of gaps returned by a lacking-range query (None = all)
    pub lacking_limit: Option<usize>,

    // -------------------------------------------------------------------------
    // Recovery
    // -------------------------------------------------------------------------
    /// Truncate a partially written trailing WAL record instead of failing
    pub repair_torn_tail: bool,
}

/// Data file allocation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preallocation {
    /// Extend with `set_len` (sparse where the filesystem supports it)
    Sparse,

    /// Write zeros over the whole length
    ZeroFill,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./download.part"),
            wal_suffix: DEFAULT_WAL_SUFFIX.to_string(),
            preallocation: Preallocation::Sparse,
            lacking_limit: None,
            repair_torn_tail: false,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Default config for the given data file path
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self::builder().path(path).build()
    }

    /// Path of the WAL file (`path` + `wal_suffix`)
    pub fn wal_path(&self) -> PathBuf {
        let mut name: OsString = self.path.clone().into_os_string();
        name.push(&self.wal_suffix);
        PathBuf::from(name)
    }

    /// Whether a WAL exists for this path, i.e. whether `resume` can be used
    pub fn wal_exists(&self) -> bool {
        self.wal_path().exists()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the WAL suffix
    pub fn wal_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.wal_suffix = suffix.into();
        self
    }

    /// Set the allocation strategy
    pub fn preallocation(mut self, preallocation: Preallocation) -> Self {
        self.config.preallocation = preallocation;
        self
    }

    /// Cap the number of gaps reported per lacking-range query
    pub fn lacking_limit(mut self, limit: usize) -> Self {
        self.config.lacking_limit = Some(limit);
        self
    }

    /// Enable truncation of a torn trailing WAL record on resume
    pub fn repair_torn_tail(mut self, repair: bool) -> Self {
        self.config.repair_torn_tail = repair;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
