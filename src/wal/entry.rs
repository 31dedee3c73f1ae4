//! WAL record and header definitions
//!
//! Fixed-width binary encoding; every record has the same length so the
//! log needs no framing.

use std::fmt;

use bytes::{Buf, BufMut};

use crate::digest::{Digest, DIGEST_SIZE};
use crate::error::{ResumeError, Result};
use crate::range::Interval;

/// Encoded size of a record: op (4) + start (8) + end (8)
pub const RECORD_SIZE: usize = 20;

/// Encoded size of the header: digest (16) + size (8)
pub const HEADER_SIZE: usize = DIGEST_SIZE + 8;

/// Coverage-set mutation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Operation {
    /// Interval inserted into the set
    Put = 10,

    /// Interval evicted from the set by a merge
    Remove = 20,
}

impl Operation {
    pub fn code(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for Operation {
    type Error = ResumeError;

    fn try_from(code: u32) -> Result<Self> {
        match code {
            10 => Ok(Operation::Put),
            20 => Ok(Operation::Remove),
            other => Err(ResumeError::WalCorruption(format!(
                "unknown operation code {}",
                other
            ))),
        }
    }
}

/// A single entry in the WAL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalRecord {
    pub op: Operation,
    pub range: Interval,
}

impl WalRecord {
    pub fn put(range: Interval) -> Self {
        Self { op: Operation::Put, range }
    }

    pub fn remove(range: Interval) -> Self {
        Self { op: Operation::Remove, range }
    }

    /// Encode to exactly [`RECORD_SIZE`] bytes
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        let mut buf = &mut out[..];
        buf.put_u32(self.op.code());
        buf.put_u64(self.range.start);
        buf.put_u64(self.range.end);
        out
    }

    /// Decode one record from exactly [`RECORD_SIZE`] bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != RECORD_SIZE {
            return Err(ResumeError::Format(format!(
                "record must be {} bytes, got {}",
                RECORD_SIZE,
                bytes.len()
            )));
        }

        let mut buf = bytes;
        let op = Operation::try_from(buf.get_u32())?;
        let start = buf.get_u64();
        let end = buf.get_u64();

        Ok(Self { op, range: Interval { start, end } })
    }
}

impl fmt::Display for WalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op {
            Operation::Put => write!(f, "put {}", self.range),
            Operation::Remove => write!(f, "remove {}", self.range),
        }
    }
}

/// Decode a buffer of back-to-back records, in file order.
///
/// Fails with a format error unless the length is a multiple of
/// [`RECORD_SIZE`].
pub fn decode_records(bytes: &[u8]) -> Result<Vec<WalRecord>> {
    if bytes.len() % RECORD_SIZE != 0 {
        return Err(ResumeError::Format(format!(
            "record area of {} bytes is not a multiple of {}",
            bytes.len(),
            RECORD_SIZE
        )));
    }

    bytes.chunks_exact(RECORD_SIZE).map(WalRecord::decode).collect()
}

/// File-level metadata written once at the head of the WAL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalHeader {
    /// Expected content digest; `None` disables verification
    pub digest: Option<Digest>,

    /// Declared size of the data file
    pub size: u64,
}

impl WalHeader {
    /// Build a header from a caller-supplied digest.
    ///
    /// An empty slice means "do not verify". Shorter digests are zero-padded
    /// and longer ones truncated to 16 bytes.
    pub fn new(digest: &[u8], size: u64) -> Self {
        let digest = if digest.is_empty() {
            None
        } else {
            let mut fixed = [0u8; DIGEST_SIZE];
            let n = digest.len().min(DIGEST_SIZE);
            fixed[..n].copy_from_slice(&digest[..n]);
            Some(fixed)
        };
        Self { digest, size }
    }

    /// Encode to exactly [`HEADER_SIZE`] bytes. A missing digest is written
    /// as 16 zero bytes.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        let mut buf = &mut out[..];
        buf.put_slice(&self.digest.unwrap_or([0u8; DIGEST_SIZE]));
        buf.put_u64(self.size);
        out
    }

    /// Decode from the first [`HEADER_SIZE`] bytes of `bytes`
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(ResumeError::Format(format!(
                "header needs {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let mut buf = &bytes[..HEADER_SIZE];
        let mut digest = [0u8; DIGEST_SIZE];
        buf.copy_to_slice(&mut digest);
        let size = buf.get_u64();

        let digest = if digest == [0u8; DIGEST_SIZE] { None } else { Some(digest) };
        Ok(Self { digest, size })
    }
}
