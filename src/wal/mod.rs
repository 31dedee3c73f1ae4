//! Write-Ahead Log (WAL) Module
//!
//! Records every coverage-set mutation so the set can be rebuilt after a
//! crash without re-reading the data file.
//!
//! ## Responsibilities
//! - Write the header once, right after creation
//! - Append one fixed-width record per set mutation, synced before return
//! - Decode header and records, detect a torn trailing record
//! - Replay records in file order into an empty coverage set
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ Header (24 bytes, written once)         │
//! │ ┌───────────────────┬─────────────────┐ │
//! │ │ Digest (16)       │ Size (8, BE)    │ │
//! │ └───────────────────┴─────────────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Record 1 (20 bytes)                     │
//! │ ┌─────────┬──────────────┬────────────┐ │
//! │ │ Op (4)  │ Start (8)    │ End (8)    │ │
//! │ └─────────┴──────────────┴────────────┘ │
//! ├─────────────────────────────────────────┤
//! │ Record 2 ...                            │
//! └─────────────────────────────────────────┘
//! ```
//!
//! All integers are big-endian. Op codes: Put = 10, Remove = 20.

mod entry;
mod writer;
mod reader;
mod recovery;

pub use entry::{decode_records, Operation, WalHeader, WalRecord, HEADER_SIZE, RECORD_SIZE};
pub use writer::WalWriter;
pub use reader::WalReader;
pub use recovery::{RecoveryResult, WalRecovery};
