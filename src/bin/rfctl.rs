//! rfctl
//!
//! Inspect, verify and fill resumable files from the command line.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use crossbeam::channel;
use resumefile::config::DEFAULT_WAL_SUFFIX;
use resumefile::digest;
use resumefile::wal::{WalReader, WalRecovery};
use resumefile::{Config, Interval, Outcome, ResumeError, ResumeFile};
use tracing_subscriber::{fmt, EnvFilter};

/// rfctl
#[derive(Parser, Debug)]
#[command(name = "rfctl")]
#[command(about = "Tools for resumable, randomly filled files")]
#[command(version)]
struct Args {
    /// Suffix of the WAL file next to the data file
    #[arg(long, default_value = DEFAULT_WAL_SUFFIX)]
    wal_suffix: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show header, coverage and gaps recorded in the WAL
    Inspect {
        /// Data file path
        path: PathBuf,
    },

    /// Resume the file and check its content digest
    Verify {
        /// Data file path
        path: PathBuf,
    },

    /// Copy a file in out-of-order chunks through a resumable file
    Fill {
        /// Source file
        source: PathBuf,

        /// Destination data file
        dest: PathBuf,

        /// Bytes per chunk
        #[arg(short, long, default_value = "65536")]
        chunk_size: u64,

        /// Concurrent writers
        #[arg(short, long, default_value = "4")]
        workers: usize,

        /// Skip digest verification on completion
        #[arg(long)]
        no_verify: bool,

        /// Keep the WAL after completion
        #[arg(long)]
        keep_wal: bool,
    },
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,resumefile=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    let result = match args.command {
        Commands::Inspect { path } => inspect(&config(&path, &args.wal_suffix)),
        Commands::Verify { path } => verify(config(&path, &args.wal_suffix)),
        Commands::Fill {
            source,
            dest,
            chunk_size,
            workers,
            no_verify,
            keep_wal,
        } => fill(
            &source,
            config(&dest, &args.wal_suffix),
            chunk_size.max(1),
            workers.max(1),
            !no_verify,
            keep_wal,
        ),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        process::exit(1);
    }
}

fn config(path: &Path, suffix: &str) -> Config {
    Config::builder().path(path).wal_suffix(suffix).build()
}

fn inspect(config: &Config) -> resumefile::Result<()> {
    let wal_path = config.wal_path();
    let reader = WalReader::open(&wal_path)?;
    let header = *reader.header();
    let (coverage, stats) = WalRecovery::replay(&reader.complete_records()?, header.size)?;

    println!("wal:        {}", wal_path.display());
    println!("size:       {}", header.size);
    match header.digest {
        Some(d) => println!("digest:     {}", digest::to_hex(&d)),
        None => println!("digest:     (none)"),
    }
    println!(
        "records:    {} ({} put, {} remove)",
        stats.records_replayed, stats.puts, stats.removes
    );
    if reader.torn_bytes() > 0 {
        println!("torn tail:  {} bytes", reader.torn_bytes());
    }
    println!("covered:    {} / {} bytes", coverage.covered_bytes(), header.size);
    for interval in coverage.iter() {
        println!("  have {}", interval);
    }
    for gap in coverage.lacking(header.size, config.lacking_limit) {
        println!("  need {}", gap);
    }
    Ok(())
}

fn verify(config: Config) -> resumefile::Result<()> {
    let file = ResumeFile::resume(config)?;
    if !file.is_complete() {
        let lacking = file.size() - file.covered_bytes();
        file.close()?;
        return Err(ResumeError::Incomplete { lacking });
    }

    let ok = file.verify_digest()?;
    let actual = file.current_digest()?;
    let expected = file.expected_digest();
    file.close()?;

    match expected {
        Some(expected) if !ok => Err(ResumeError::DigestMismatch {
            expected: digest::to_hex(&expected),
            actual: digest::to_hex(&actual),
        }),
        _ => {
            println!("ok {}", digest::to_hex(&actual));
            Ok(())
        }
    }
}

fn fill(
    source: &Path,
    config: Config,
    chunk_size: u64,
    workers: usize,
    verify: bool,
    keep_wal: bool,
) -> resumefile::Result<()> {
    let size = source.metadata()?.len();
    let expected = if verify { digest::digest_file(source)?.to_vec() } else { Vec::new() };

    let file = ResumeFile::open(config, &expected, size)?;
    let chunks = plan_chunks(&file.lacking_limited(None), chunk_size);
    tracing::info!(chunks = chunks.len(), workers, "filling");

    let (tx, rx) = channel::bounded::<Interval>(workers * 2);
    let completed = crossbeam::thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let rx = rx.clone();
            let file = &file;
            handles.push(scope.spawn(move |_| -> resumefile::Result<bool> {
                let mut src = File::open(source)?;
                let mut buf = Vec::new();
                let mut completed = false;
                for chunk in rx.iter() {
                    buf.resize(chunk.len() as usize, 0);
                    src.seek(SeekFrom::Start(chunk.start))?;
                    src.read_exact(&mut buf)?;
                    completed |= file.put(chunk, &buf)? == Outcome::Completed;
                }
                Ok(completed)
            }));
        }
        drop(rx);

        for chunk in chunks {
            if tx.send(chunk).is_err() {
                break;
            }
        }
        drop(tx);

        let mut completed = false;
        let mut first_error = None;
        for handle in handles {
            match handle.join() {
                Ok(Ok(done)) => completed |= done,
                Ok(Err(e)) => {
                    first_error.get_or_insert(e);
                }
                Err(_) => {
                    first_error.get_or_insert(ResumeError::Io(std::io::Error::new(
                        std::io::ErrorKind::Other,
                        "writer thread panicked",
                    )));
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(completed),
        }
    })
    .map_err(|_| {
        ResumeError::Io(std::io::Error::new(std::io::ErrorKind::Other, "writer scope panicked"))
    })??;

    if !completed && !file.is_complete() {
        let lacking = file.size() - file.covered_bytes();
        file.close()?;
        return Err(ResumeError::Incomplete { lacking });
    }

    // Coverage alone proves nothing when no put in this run completed the file
    if verify && !completed {
        let actual = file.current_digest()?;
        if actual.as_slice() != expected.as_slice() {
            file.close()?;
            return Err(ResumeError::DigestMismatch {
                expected: hex::encode(&expected),
                actual: digest::to_hex(&actual),
            });
        }
    }

    if keep_wal {
        file.close()?;
        println!("complete");
    } else {
        let path = file.complete()?;
        println!("complete {}", path.display());
    }
    Ok(())
}

/// Split gaps into chunks, interleaving front and back so that writes land
/// out of order and exercise merging
fn plan_chunks(gaps: &[Interval], chunk_size: u64) -> Vec<Interval> {
    let mut pieces = Vec::new();
    for gap in gaps {
        let mut start = gap.start;
        while start < gap.end {
            let end = (start + chunk_size).min(gap.end);
            pieces.push(Interval::new(start, end));
            start = end;
        }
    }

    let mut ordered = Vec::with_capacity(pieces.len());
    let (mut lo, mut hi) = (0usize, pieces.len());
    while lo < hi {
        hi -= 1;
        ordered.push(pieces[hi]);
        if lo < hi {
            ordered.push(pieces[lo]);
            lo += 1;
        }
    }
    ordered
}
