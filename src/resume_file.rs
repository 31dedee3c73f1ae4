//! Resume File Module
//!
//! The aggregate root coupling the data file, the WAL and the coverage set.
//!
//! ## Responsibilities
//! - Allocate the data file and write the WAL header on creation
//! - Rebuild coverage from the WAL on resume, without reading the data
//! - Positioned write + durability barrier + logged merge for every put
//! - Detect completion and gate it on the expected digest
//!
//! ## Ordering within a put
//! ```text
//! seek ─► write ─► sync data ─► [append Remove, evict]* ─► append Put, insert
//! ```
//! A record is appended (and synced) before the in-memory set is touched,
//! and a failed append is truncated away by the WAL writer, so after any
//! failure the live set equals what a replay of the WAL produces and the
//! same put can simply be retried. If the writer cannot undo a failed
//! append it is poisoned: every later put fails with `Wal` until the file
//! is resumed, which rebuilds the set from whatever the log holds.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use parking_lot::Mutex;

use crate::config::{Config, Preallocation};
use crate::coverage::CoverageSet;
use crate::digest::{self, Digest};
use crate::error::{ResumeError, Result};
use crate::range::Interval;
use crate::wal::{RecoveryResult, WalHeader, WalRecord, WalRecovery, WalWriter};

/// Classification of a successful put
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The range conflicted with nothing and was stored as-is
    Inserted,

    /// The range absorbed at least one stored interval
    Merged,

    /// The file is now fully covered (and matches the digest, if any)
    Completed,
}

impl Outcome {
    pub fn is_completed(self) -> bool {
        self == Outcome::Completed
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Outcome::Inserted => "inserted",
            Outcome::Merged => "merged",
            Outcome::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Mutable state, guarded as one unit
struct State {
    data: File,
    wal: WalWriter,
    coverage: CoverageSet,
}

/// A fixed-size file filled by arbitrary byte ranges, resumable after a crash
///
/// ## Concurrency Model
///
/// All mutable state sits behind one mutex that is held for the entire
/// put (write, sync, merge loop, WAL appends). Concurrent writers are
/// therefore safe but serialized. Queries take the same lock briefly.
///
/// ## Future Optimization:
/// - Narrow the lock to the coverage/WAL mutation and let positioned data
///   writes run in parallel
pub struct ResumeFile {
    config: Config,
    wal_path: PathBuf,

    /// Declared size, fixed at creation
    size: u64,

    /// Expected content digest (None = do not verify)
    digest: Option<Digest>,

    state: Mutex<State>,
}

impl ResumeFile {
    /// Create a fresh resumable file.
    ///
    /// `digest` may be empty to skip verification. Fails if `size` is zero
    /// or if the data file or its WAL already exists.
    pub fn create(config: Config, digest: &[u8], size: u64) -> Result<Self> {
        if size == 0 {
            return Err(ResumeError::ZeroSize);
        }

        let wal_path = config.wal_path();
        if wal_path.exists() {
            return Err(ResumeError::AlreadyExists(wal_path));
        }

        let data = Self::allocate(&config.path, size, config.preallocation)?;

        let header = WalHeader::new(digest, size);
        let wal = match WalWriter::create(&wal_path, &header) {
            Ok(wal) => wal,
            Err(e) => {
                // Leave nothing behind so the caller can retry with the same path
                drop(data);
                let _ = fs::remove_file(&config.path);
                return Err(e);
            }
        };

        tracing::info!(
            path = %config.path.display(),
            size,
            verify = header.digest.is_some(),
            "created resumable file"
        );

        Ok(Self {
            wal_path,
            size,
            digest: header.digest,
            state: Mutex::new(State {
                data,
                wal,
                coverage: CoverageSet::new(),
            }),
            config,
        })
    }

    /// Create with default settings at `path`
    pub fn create_path(path: impl Into<PathBuf>, digest: &[u8], size: u64) -> Result<Self> {
        Self::create(Config::for_path(path), digest, size)
    }

    /// Rehydrate from the WAL, reopening the data file in place.
    ///
    /// The data file is never read; coverage comes from replay alone.
    pub fn resume(config: Config) -> Result<Self> {
        let (file, _) = Self::resume_with_stats(config)?;
        Ok(file)
    }

    /// Like [`resume`](Self::resume), also returning replay statistics
    pub fn resume_with_stats(config: Config) -> Result<(Self, RecoveryResult)> {
        let wal_path = config.wal_path();
        if !wal_path.exists() {
            return Err(ResumeError::WalNotFound(wal_path));
        }

        let (header, coverage, stats) = WalRecovery::recover(&wal_path, config.repair_torn_tail)?;
        if header.size == 0 {
            return Err(ResumeError::WalCorruption("header declares size 0".to_string()));
        }

        let data = OpenOptions::new().read(true).write(true).open(&config.path)?;
        let actual = data.metadata()?.len();
        if actual != header.size {
            return Err(ResumeError::WalCorruption(format!(
                "data file is {} bytes, WAL header declares {}",
                actual, header.size
            )));
        }

        let wal = WalWriter::open(&wal_path)?;

        tracing::info!(
            path = %config.path.display(),
            size = header.size,
            records = stats.records_replayed,
            intervals = coverage.len(),
            covered = coverage.covered_bytes(),
            "resumed from WAL"
        );

        let file = Self {
            wal_path,
            size: header.size,
            digest: header.digest,
            state: Mutex::new(State { data, wal, coverage }),
            config,
        };
        Ok((file, stats))
    }

    /// Resume if a WAL exists, otherwise create.
    ///
    /// On resume the declared `size` must match the one recorded in the WAL.
    pub fn open(config: Config, digest: &[u8], size: u64) -> Result<Self> {
        if !config.wal_exists() {
            return Self::create(config, digest, size);
        }

        let file = Self::resume(config)?;
        if file.size != size {
            return Err(ResumeError::WalCorruption(format!(
                "WAL declares size {}, caller expects {}",
                file.size, size
            )));
        }
        Ok(file)
    }

    /// Write `payload` at `range.start` and record the range as covered.
    ///
    /// Steps: validate, seek, write, sync the data file, then merge every
    /// conflicting stored interval into the range (logging each eviction)
    /// and log the final insert. Returns `Completed` once a single interval
    /// spans the whole file and, if a digest is configured, the content
    /// matches it.
    pub fn put(&self, range: Interval, payload: &[u8]) -> Result<Outcome> {
        if range.start >= range.end {
            return Err(ResumeError::InvalidRange { range });
        }
        if range.end > self.size {
            return Err(ResumeError::OutOfRange { range, size: self.size });
        }
        if payload.len() as u64 != range.len() {
            return Err(ResumeError::PayloadLength { range, actual: payload.len() });
        }

        let mut guard = self.state.lock();
        let state = &mut *guard;

        state
            .data
            .seek(SeekFrom::Start(range.start))
            .map_err(|source| ResumeError::Seek { range, source })?;
        state
            .data
            .write_all(payload)
            .map_err(|source| ResumeError::Write { range, source })?;
        state
            .data
            .sync_data()
            .map_err(|source| ResumeError::Sync { range, source })?;

        let mut outcome = Outcome::Inserted;
        let mut working = range;
        while let Some(evicted) = state.coverage.find_conflicting(&working) {
            state.wal.append(&WalRecord::remove(evicted))?;
            state.coverage.remove(&evicted);
            tracing::trace!(evicted = %evicted, into = %working, "merging interval");
            working.merge(&evicted);
            outcome = Outcome::Merged;
        }

        state.wal.append(&WalRecord::put(working))?;
        state.coverage.insert(working);

        if state.coverage.is_complete(self.size) {
            if let Some(expected) = self.digest {
                let actual = Self::digest_data(&mut state.data)?;
                if actual != expected {
                    tracing::warn!(
                        path = %self.config.path.display(),
                        expected = %digest::to_hex(&expected),
                        actual = %digest::to_hex(&actual),
                        "file complete but digest does not match"
                    );
                    return Err(ResumeError::DigestMismatch {
                        expected: digest::to_hex(&expected),
                        actual: digest::to_hex(&actual),
                    });
                }
            }
            tracing::info!(path = %self.config.path.display(), size = self.size, "file complete");
            outcome = Outcome::Completed;
        }

        tracing::debug!(range = %range, merged_to = %working, outcome = %outcome, "put");
        Ok(outcome)
    }

    /// Uncovered ranges, left to right, capped by the configured limit
    pub fn lacking(&self) -> Vec<Interval> {
        self.lacking_limited(self.config.lacking_limit)
    }

    /// Uncovered ranges with an explicit cap (None = all)
    pub fn lacking_limited(&self, limit: Option<usize>) -> Vec<Interval> {
        self.state.lock().coverage.lacking(self.size, limit)
    }

    /// Recompute the digest of the data file and compare with the expected one.
    ///
    /// Without a configured digest there is nothing to contradict and the
    /// result is `true`.
    pub fn verify_digest(&self) -> Result<bool> {
        let Some(expected) = self.digest else {
            tracing::debug!(path = %self.config.path.display(), "no digest configured");
            return Ok(true);
        };
        Ok(self.current_digest()? == expected)
    }

    /// Like [`verify_digest`](Self::verify_digest), but a mismatch is an error
    pub fn ensure_digest(&self) -> Result<()> {
        let Some(expected) = self.digest else {
            return Ok(());
        };
        let actual = self.current_digest()?;
        if actual == expected {
            return Ok(());
        }
        Err(ResumeError::DigestMismatch {
            expected: digest::to_hex(&expected),
            actual: digest::to_hex(&actual),
        })
    }

    /// Digest of the data file as it is now
    pub fn current_digest(&self) -> Result<Digest> {
        let mut state = self.state.lock();
        Ok(Self::digest_data(&mut state.data)?)
    }

    /// Last modification time of the data file
    pub fn mod_time(&self) -> Result<SystemTime> {
        let state = self.state.lock();
        Ok(state.data.metadata()?.modified()?)
    }

    /// Sync and release both files
    pub fn close(self) -> Result<()> {
        let path = self.config.path;
        let mut state = self.state.into_inner();
        state.data.sync_all()?;
        state.wal.sync()?;
        tracing::info!(path = %path.display(), "closed resumable file");
        Ok(())
    }

    /// Close and delete both the data file and the WAL
    pub fn remove(self) -> Result<()> {
        let path = self.config.path.clone();
        let wal_path = self.wal_path.clone();
        drop(self.state.into_inner());

        for target in [&wal_path, &path] {
            match fs::remove_file(target) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        tracing::info!(path = %path.display(), "removed resumable file");
        Ok(())
    }

    /// Finish a fully covered file: close it and delete the WAL, keeping the
    /// data. Returns the data file path.
    ///
    /// The digest, if configured, is checked again first; on mismatch both
    /// files are kept.
    pub fn complete(self) -> Result<PathBuf> {
        let covered = self.covered_bytes();
        if !self.is_complete() {
            return Err(ResumeError::Incomplete { lacking: self.size - covered });
        }
        self.ensure_digest()?;

        let path = self.config.path.clone();
        let wal_path = self.wal_path.clone();
        self.close()?;
        fs::remove_file(&wal_path)?;
        tracing::info!(path = %path.display(), "finalized, WAL removed");
        Ok(path)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Declared size of the file
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Data file path
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// WAL file path
    pub fn wal_path(&self) -> &Path {
        &self.wal_path
    }

    /// Expected digest, if verification is enabled
    pub fn expected_digest(&self) -> Option<Digest> {
        self.digest
    }

    /// Snapshot of the covered intervals in ascending order
    pub fn ranges(&self) -> Vec<Interval> {
        self.state.lock().coverage.iter().collect()
    }

    /// Snapshot of the whole coverage set
    pub fn coverage(&self) -> CoverageSet {
        self.state.lock().coverage.clone()
    }

    pub fn covered_bytes(&self) -> u64 {
        self.state.lock().coverage.covered_bytes()
    }

    /// Whether one interval spans the whole file
    pub fn is_complete(&self) -> bool {
        self.state.lock().coverage.is_complete(self.size)
    }

    /// WAL records appended since this instance was created or resumed
    pub fn records_written(&self) -> u64 {
        self.state.lock().wal.records_written()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Create the data file and size it to exactly `size` bytes
    fn allocate(path: &Path, size: u64, preallocation: Preallocation) -> Result<File> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => ResumeError::AlreadyExists(path.to_path_buf()),
                _ => ResumeError::Io(e),
            })?;

        let sized = Self::fill(&mut file, size, preallocation).and_then(|_| {
            let actual = file.metadata()?.len();
            if actual == size {
                Ok(())
            } else {
                Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("allocated {} bytes, wanted {}", actual, size),
                ))
            }
        });

        if let Err(e) = sized {
            drop(file);
            let _ = fs::remove_file(path);
            return Err(e.into());
        }
        Ok(file)
    }

    fn fill(file: &mut File, size: u64, preallocation: Preallocation) -> io::Result<()> {
        match preallocation {
            Preallocation::Sparse => file.set_len(size)?,
            Preallocation::ZeroFill => {
                const CHUNK: u64 = 1024 * 1024;
                let zeros = vec![0u8; CHUNK.min(size) as usize];
                let mut remaining = size;
                while remaining > 0 {
                    let n = remaining.min(CHUNK) as usize;
                    file.write_all(&zeros[..n])?;
                    remaining -= n as u64;
                }
            }
        }
        file.sync_all()
    }

    fn digest_data(data: &mut File) -> io::Result<Digest> {
        data.seek(SeekFrom::Start(0))?;
        digest::digest_reader(data)
    }
}

impl fmt::Debug for ResumeFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResumeFile")
            .field("path", &self.config.path)
            .field("size", &self.size)
            .field("verify", &self.digest.is_some())
            .finish_non_exhaustive()
    }
}
