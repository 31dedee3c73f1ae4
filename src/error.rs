//! Error types for resumefile
//!
//! Provides a unified error type for all operations. Every variant that
//! stems from a write carries the interval it was about, so callers can
//! log and decide without extra bookkeeping.

use std::path::PathBuf;

use thiserror::Error;

use crate::range::Interval;

/// Result type alias using ResumeError
pub type Result<T> = std::result::Result<T, ResumeError>;

/// Unified error type for resumefile operations
#[derive(Debug, Error)]
pub enum ResumeError {
    // -------------------------------------------------------------------------
    // Validation Errors
    // -------------------------------------------------------------------------
    #[error("range {range} exceeds file size {size}")]
    OutOfRange { range: Interval, size: u64 },

    #[error("range {range} is empty or reversed")]
    InvalidRange { range: Interval },

    #[error("payload of {actual} bytes does not fit range {range}")]
    PayloadLength { range: Interval, actual: usize },

    #[error("file size must be greater than zero")]
    ZeroSize,

    #[error("file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    // -------------------------------------------------------------------------
    // Data File Errors
    // -------------------------------------------------------------------------
    #[error("seek to {range} failed: {source}")]
    Seek {
        range: Interval,
        #[source]
        source: std::io::Error,
    },

    #[error("write of {range} failed: {source}")]
    Write {
        range: Interval,
        #[source]
        source: std::io::Error,
    },

    #[error("sync after {range} failed: {source}")]
    Sync {
        range: Interval,
        #[source]
        source: std::io::Error,
    },

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL write failed ({context}): {source}")]
    Wal {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("WAL format error: {0}")]
    Format(String),

    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    #[error("WAL not found: {}", .0.display())]
    WalNotFound(PathBuf),

    // -------------------------------------------------------------------------
    // Integrity Errors
    // -------------------------------------------------------------------------
    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("file is not complete: {lacking} bytes missing")]
    Incomplete { lacking: u64 },

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResumeError {
    /// Whether the payload of the failed call already reached the data file's
    /// durability barrier.
    ///
    /// True for WAL failures (only the metadata is in doubt) and for digest
    /// mismatches (the write succeeded, the content is wrong).
    pub fn payload_durable(&self) -> bool {
        matches!(self, ResumeError::Wal { .. } | ResumeError::DigestMismatch { .. })
    }
}
