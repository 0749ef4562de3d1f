//! Content comparison for sync operations.
//!
//! Two files are the same content when their sizes match and a digest over
//! their full bytes matches. Nothing is cached between calls.

use md5::{Digest, Md5};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::str::FromStr;

const CHUNK_SIZE: usize = 64 * 1024;

/// Hash algorithm type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashType {
    /// MD5 (default).
    #[default]
    Md5,
    /// BLAKE3 - faster on large trees.
    Blake3,
}

impl HashType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Blake3 => "blake3",
        }
    }
}

impl FromStr for HashType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "blake3" => Ok(Self::Blake3),
            other => Err(format!("unsupported hash algorithm: {other}")),
        }
    }
}

/// Size and digest of a file's bytes at the time it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub size: u64,
    pub digest: Vec<u8>,
}

enum DigestState {
    Md5(Md5),
    Blake3(Box<blake3::Hasher>),
}

impl DigestState {
    fn new(hash: HashType) -> Self {
        match hash {
            HashType::Md5 => Self::Md5(Md5::new()),
            HashType::Blake3 => Self::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Md5(h) => h.update(data),
            Self::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finalize(self) -> Vec<u8> {
        match self {
            Self::Md5(h) => h.finalize().to_vec(),
            Self::Blake3(h) => h.finalize().as_bytes().to_vec(),
        }
    }
}

/// Stream a file through the digest in fixed-size chunks.
pub fn digest_file(path: &Path, hash: HashType) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut state = DigestState::new(hash);
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        state.update(&buffer[..bytes_read]);
    }

    Ok(state.finalize())
}

/// Compute the fingerprint of a file.
pub fn fingerprint(path: &Path, hash: HashType) -> io::Result<Fingerprint> {
    let size = std::fs::metadata(path)?.len();
    let digest = digest_file(path, hash)?;
    Ok(Fingerprint { size, digest })
}

/// Whether two files hold identical bytes.
///
/// A size mismatch returns `false` without reading either file. A file that
/// changes while it is being read may produce a false mismatch; the next
/// full pass corrects it.
pub fn same_content(a: &Path, b: &Path, hash: HashType) -> io::Result<bool> {
    let size_a = std::fs::metadata(a)?.len();
    let size_b = std::fs::metadata(b)?.len();
    if size_a != size_b {
        return Ok(false);
    }

    Ok(fingerprint(a, hash)? == fingerprint(b, hash)?)
}
