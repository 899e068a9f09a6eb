//! Content hashing of original images.
//!
//! The hash is recorded next to each embedding so a later audit can tell
//! which exact file was watermarked. Files are streamed in fixed-size chunks
//! rather than read whole.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sha3::{Digest, Sha3_256};

use crate::error::{ProvmarkError, Result};

const CHUNK_SIZE: usize = 8192;

/// Digest used for the content hash column of the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HashAlgorithm {
    /// SHA-256, the format existing ledgers carry.
    #[default]
    Sha256,
    Sha3_256,
    /// MD5, accepted for ledgers written by older tooling.
    Md5,
}

impl HashAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha3_256 => "sha3-256",
            Self::Md5 => "md5",
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = ProvmarkError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha3-256" | "sha3_256" | "sha3" => Ok(Self::Sha3_256),
            "md5" => Ok(Self::Md5),
            other => Err(ProvmarkError::Config(format!(
                "Unknown hash algorithm: {other}"
            ))),
        }
    }
}

/// Hex-encoded digest of an original image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentHash {
    pub algorithm: HashAlgorithm,
    pub hex: String,
}

impl ContentHash {
    /// Hash an in-memory buffer.
    pub fn of_bytes(data: &[u8], algorithm: HashAlgorithm) -> Self {
        let hex = match algorithm {
            HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
            HashAlgorithm::Sha3_256 => hex::encode(Sha3_256::digest(data)),
            HashAlgorithm::Md5 => hex::encode(Md5::digest(data)),
        };
        Self { algorithm, hex }
    }

    /// Hash a file on disk, reading it in 8 KiB chunks.
    pub fn of_file(path: &Path, algorithm: HashAlgorithm) -> Result<Self> {
        let mut file = File::open(path)?;
        let hex = match algorithm {
            HashAlgorithm::Sha256 => stream_digest::<Sha256>(&mut file)?,
            HashAlgorithm::Sha3_256 => stream_digest::<Sha3_256>(&mut file)?,
            HashAlgorithm::Md5 => stream_digest::<Md5>(&mut file)?,
        };
        Ok(Self { algorithm, hex })
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.hex)
    }
}

fn stream_digest<D: Digest>(reader: &mut impl Read) -> Result<String> {
    let mut hasher = D::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
