//! Content digest
//!
//! Streaming MD5 over the data file.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use md5::{Digest as _, Md5};

/// Size of a content digest in bytes
pub const DIGEST_SIZE: usize = 16;

/// A 16-byte MD5 digest
pub type Digest = [u8; DIGEST_SIZE];

/// Digest everything readable from `reader`
pub fn digest_reader<R: Read>(mut reader: R) -> io::Result<Digest> {
    let mut hasher = Md5::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(to_digest(&hasher.finalize()))
}

/// Digest the whole file at `path`, from offset 0
pub fn digest_file(path: &Path) -> io::Result<Digest> {
    digest_reader(File::open(path)?)
}

/// Digest an in-memory buffer
pub fn digest_bytes(data: &[u8]) -> Digest {
    to_digest(&Md5::digest(data))
}

fn to_digest(output: &[u8]) -> Digest {
    let mut digest = [0u8; DIGEST_SIZE];
    digest.copy_from_slice(output);
    digest
}

/// Lowercase hex rendering
pub fn to_hex(digest: &Digest) -> String {
    hex::encode(digest)
}
