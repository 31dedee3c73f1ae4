//! WAL Writer
//!
//! Handles appending records to the WAL file. Every append is followed by
//! a data sync, so a record that was acknowledged survives a crash.
//!
//! A failed append is rolled back by truncating the file to the end of the
//! last acknowledged record, so the log never holds a record the caller was
//! told failed. If the rollback itself fails the writer is poisoned and
//! refuses further appends until the WAL is reopened through recovery.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{ResumeError, Result};

use super::{WalHeader, WalRecord, HEADER_SIZE, RECORD_SIZE};

/// Appends records to the WAL file
#[derive(Debug)]
pub struct WalWriter {
    path: PathBuf,
    file: File,
    /// File length up to the end of the last acknowledged record
    len: u64,
    /// Set when a failed append could not be rolled back
    poisoned: bool,
    /// Records appended through this writer
    records_written: u64,

    #[cfg(test)]
    pub(crate) fail_next_sync: bool,
    #[cfg(test)]
    pub(crate) fail_next_rollback: bool,
}

impl WalWriter {
    /// Create a new WAL and durably write its header.
    ///
    /// Fails with `AlreadyExists` if a file is already at `path`.
    pub fn create(path: &Path, header: &WalHeader) -> Result<Self> {
        let mut file = OpenOptions::new()
            .append(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => ResumeError::AlreadyExists(path.to_path_buf()),
                _ => ResumeError::Wal {
                    context: format!("create {}", path.display()),
                    source: e,
                },
            })?;

        file.write_all(&header.encode())
            .and_then(|_| file.sync_all())
            .map_err(|e| ResumeError::Wal {
                context: "write header".to_string(),
                source: e,
            })?;

        Ok(Self::with_file(path, file, HEADER_SIZE as u64))
    }

    /// Open an existing WAL for further appends
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new().append(true).open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ResumeError::WalNotFound(path.to_path_buf()),
            _ => ResumeError::Io(e),
        })?;
        let len = file.metadata()?.len();

        Ok(Self::with_file(path, file, len))
    }

    fn with_file(path: &Path, file: File, len: u64) -> Self {
        Self {
            path: path.to_path_buf(),
            file,
            len,
            poisoned: false,
            records_written: 0,
            #[cfg(test)]
            fail_next_sync: false,
            #[cfg(test)]
            fail_next_rollback: false,
        }
    }

    /// Append a record and sync it to disk.
    ///
    /// On failure the record is truncated away again; the error is always
    /// `ResumeError::Wal`.
    pub fn append(&mut self, record: &WalRecord) -> Result<()> {
        if self.poisoned {
            return Err(ResumeError::Wal {
                context: format!("append {}", record),
                source: io::Error::new(
                    io::ErrorKind::Other,
                    "writer poisoned by an unrecoverable earlier failure; resume to continue",
                ),
            });
        }

        if let Err(e) = self.write_record(record) {
            tracing::error!(record = %record, error = %e, "WAL append failed");
            self.rollback();
            return Err(ResumeError::Wal {
                context: format!("append {}", record),
                source: e,
            });
        }

        self.len += RECORD_SIZE as u64;
        self.records_written += 1;
        Ok(())
    }

    fn write_record(&mut self, record: &WalRecord) -> io::Result<()> {
        self.file.write_all(&record.encode())?;
        #[cfg(test)]
        {
            if std::mem::take(&mut self.fail_next_sync) {
                return Err(io::Error::new(io::ErrorKind::Other, "injected sync failure"));
            }
        }
        self.file.sync_data()
    }

    /// Truncate back to the last acknowledged record, poisoning on failure
    fn rollback(&mut self) {
        if let Err(e) = self.truncate_to_len() {
            tracing::error!(
                path = %self.path.display(),
                len = self.len,
                error = %e,
                "WAL rollback failed, writer poisoned"
            );
            self.poisoned = true;
        }
    }

    fn truncate_to_len(&mut self) -> io::Result<()> {
        #[cfg(test)]
        {
            if std::mem::take(&mut self.fail_next_rollback) {
                return Err(io::Error::new(io::ErrorKind::Other, "injected rollback failure"));
            }
        }
        self.file.set_len(self.len)?;
        self.file.sync_data()
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all().map_err(|e| ResumeError::Wal {
            context: "sync".to_string(),
            source: e,
        })
    }

    /// Whether a failed rollback left the file in an unknown state
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Number of records appended by this writer
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
