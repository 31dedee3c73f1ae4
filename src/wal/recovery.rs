//! WAL Recovery
//!
//! Rebuilds the coverage set by replaying the WAL in file order.

use std::fs::OpenOptions;
use std::path::Path;

use crate::coverage::CoverageSet;
use crate::error::{ResumeError, Result};

use super::{Operation, WalHeader, WalReader, WalRecord};

/// Handles WAL recovery after a crash or a clean close
pub struct WalRecovery;

/// Result of a recovery operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of records replayed
    pub records_replayed: u64,

    /// Of which Put records
    pub puts: u64,

    /// Of which Remove records
    pub removes: u64,

    /// Bytes of a partial trailing record that were found
    pub torn_bytes: u64,

    /// Whether the WAL was truncated (partial record removed)
    pub was_truncated: bool,
}

impl WalRecovery {
    /// Recover header and coverage from the WAL at `path`.
    ///
    /// A partial trailing record is a format error unless `repair_torn_tail`
    /// is set, in which case the file is truncated to the last complete
    /// record before replay.
    pub fn recover(
        path: &Path,
        repair_torn_tail: bool,
    ) -> Result<(WalHeader, CoverageSet, RecoveryResult)> {
        let reader = WalReader::open(path)?;
        let header = *reader.header();
        let torn = reader.torn_bytes();

        let records = if torn > 0 && repair_torn_tail {
            tracing::warn!(
                path = %path.display(),
                torn_bytes = torn,
                "truncating partial trailing WAL record"
            );
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(reader.valid_len())?;
            file.sync_all()?;
            reader.complete_records()?
        } else {
            reader.records()?
        };

        let (coverage, mut result) = Self::replay(&records, header.size)?;
        result.torn_bytes = torn as u64;
        result.was_truncated = torn > 0 && repair_torn_tail;

        Ok((header, coverage, result))
    }

    /// Apply `records` in order to an empty coverage set.
    ///
    /// Every record must apply cleanly: a Put may not conflict with a stored
    /// interval and a Remove must name a stored interval exactly.
    pub fn replay(records: &[WalRecord], size: u64) -> Result<(CoverageSet, RecoveryResult)> {
        let mut coverage = CoverageSet::new();
        let mut result = RecoveryResult::default();

        for (index, record) in records.iter().enumerate() {
            let range = record.range;
            if range.start >= range.end || range.end > size {
                return Err(ResumeError::WalCorruption(format!(
                    "record {} ({}) outside [0, {})",
                    index, record, size
                )));
            }

            let applied = match record.op {
                Operation::Put => {
                    result.puts += 1;
                    coverage.insert(range)
                }
                Operation::Remove => {
                    result.removes += 1;
                    coverage.remove(&range)
                }
            };

            if !applied {
                return Err(ResumeError::WalCorruption(format!(
                    "record {} ({}) does not apply to the replayed set",
                    index, record
                )));
            }
            result.records_replayed += 1;
        }

        Ok((coverage, result))
    }

    /// Recover without modifying the file, returning statistics only
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let reader = WalReader::open(path)?;
        let (_, mut result) = Self::replay(&reader.complete_records()?, reader.header().size)?;
        result.torn_bytes = reader.torn_bytes() as u64;
        Ok(result)
    }
}
