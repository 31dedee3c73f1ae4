//! # resumefile
//!
//! A fixed-size file filled incrementally by arbitrary, possibly
//! overlapping byte ranges (parallel chunked downloads or uploads), with:
//! - Exact tracking of durably written ranges, merged into a minimal set
//! - Completion detection gated on an optional MD5 digest
//! - A write-ahead log (WAL) that rebuilds coverage after a crash without
//!   re-reading the data
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Transfer orchestrator                        │
//! │             (many chunk writers, one file)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ put(range, payload)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     ResumeFile                               │
//! │                 (one lock per put)                           │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┼─────────────────────┐
//!          │            │                     │
//!          ▼            ▼                     ▼
//!   ┌─────────────┐ ┌─────────────┐   ┌─────────────┐
//!   │  Data file  │ │     WAL     │   │ CoverageSet │
//!   │ (pwrite +   │ │  (append +  │   │  (BTreeMap) │
//!   │   fsync)    │ │    fsync)   │   │             │
//!   └─────────────┘ └─────────────┘   └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod range;
pub mod coverage;
pub mod digest;
pub mod wal;
pub mod resume_file;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ResumeError, Result};
pub use config::{Config, Preallocation};
pub use range::Interval;
pub use coverage::CoverageSet;
pub use resume_file::{Outcome, ResumeFile};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of resumefile
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
