//! File hashing for build products.
//!
//! Products record two digests of their contents: a narrow SHA-1 and a wide
//! SHA-256. Both are computed in a single pass over the file.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use serde::{Serialize, Serializer};
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// A 160-bit SHA-1 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sha1Hash(pub [u8; 20]);

/// A 256-bit SHA-256 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Sha256Hash(pub [u8; 32]);

impl Sha1Hash {
  pub fn to_hex(&self) -> String {
    hex::encode(self.0)
  }
}

impl Sha256Hash {
  pub fn to_hex(&self) -> String {
    hex::encode(self.0)
  }
}

impl std::fmt::Display for Sha1Hash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.to_hex())
  }
}

impl std::fmt::Display for Sha256Hash {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.to_hex())
  }
}

impl Serialize for Sha1Hash {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.to_hex())
  }
}

impl Serialize for Sha256Hash {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.to_hex())
  }
}

/// Both digests of a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHashes {
  pub sha1: Sha1Hash,
  pub sha256: Sha256Hash,
}

/// Hash a file's contents with SHA-1 and SHA-256 at once.
pub fn hash_file(path: &Path) -> io::Result<FileHashes> {
  let mut file = fs::File::open(path)?;

  let mut sha1 = Sha1::new();
  let mut sha256 = Sha256::new();
  let mut buffer = [0u8; 8192];

  loop {
    let bytes_read = file.read(&mut buffer)?;
    if bytes_read == 0 {
      break;
    }
    sha1.update(&buffer[..bytes_read]);
    sha256.update(&buffer[..bytes_read]);
  }

  let mut sha1_bytes = [0u8; 20];
  sha1_bytes.copy_from_slice(&sha1.finalize());
  let mut sha256_bytes = [0u8; 32];
  sha256_bytes.copy_from_slice(&sha256.finalize());

  Ok(FileHashes {
    sha1: Sha1Hash(sha1_bytes),
    sha256: Sha256Hash(sha256_bytes),
  })
}
