//! WAL Reader
//!
//! Loads a WAL file and splits it into header and record area.

use std::fs;
use std::io;
use std::path::Path;

use bytes::Bytes;

use crate::error::{ResumeError, Result};

use super::{decode_records, WalHeader, WalRecord, HEADER_SIZE, RECORD_SIZE};

/// Reads a whole WAL file into memory
#[derive(Debug)]
pub struct WalReader {
    header: WalHeader,
    /// Everything after the header
    body: Bytes,
}

impl WalReader {
    /// Read and parse the WAL at `path`
    pub fn open(path: &Path) -> Result<Self> {
        let raw = fs::read(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ResumeError::WalNotFound(path.to_path_buf()),
            _ => ResumeError::Io(e),
        })?;
        Self::from_bytes(Bytes::from(raw))
    }

    /// Parse an in-memory WAL image
    pub fn from_bytes(raw: Bytes) -> Result<Self> {
        let header = WalHeader::decode(&raw)?;
        let body = raw.slice(HEADER_SIZE..);
        Ok(Self { header, body })
    }

    pub fn header(&self) -> &WalHeader {
        &self.header
    }

    /// Decode every record. Fails if the record area is not a whole number
    /// of records.
    pub fn records(&self) -> Result<Vec<WalRecord>> {
        decode_records(&self.body)
    }

    /// Decode the complete records, ignoring a partial trailing one
    pub fn complete_records(&self) -> Result<Vec<WalRecord>> {
        decode_records(&self.body[..self.complete_len()])
    }

    /// Bytes of a partially written trailing record (0 if none)
    pub fn torn_bytes(&self) -> usize {
        self.body.len() % RECORD_SIZE
    }

    /// Length of the file up to the end of the last complete record
    pub fn valid_len(&self) -> u64 {
        (HEADER_SIZE + self.complete_len()) as u64
    }

    fn complete_len(&self) -> usize {
        self.body.len() - self.torn_bytes()
    }
}
