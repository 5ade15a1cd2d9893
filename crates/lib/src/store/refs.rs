//! Reference discovery.
//!
//! A store path references another when the other's hash part occurs anywhere
//! in its serialised form: file contents, symlink targets or entry names.

use std::collections::{BTreeSet, HashSet};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use walkdir::WalkDir;

use crate::consts::{STORE_HASH_ALPHABET, STORE_HASH_LEN};

const SCAN_CHUNK: usize = 8192;

/// Collect the members of `candidates` whose hash part occurs under `path`.
pub fn scan_references(path: &Path, candidates: &HashSet<String>) -> io::Result<BTreeSet<String>> {
  let mut found = BTreeSet::new();
  if candidates.is_empty() {
    return Ok(found);
  }

  for entry in WalkDir::new(path).follow_links(false).sort_by_file_name() {
    let entry = entry.map_err(io::Error::other)?;
    let entry_path = entry.path();

    // The root's own name is not part of its serialisation.
    if entry.depth() > 0 {
      scan_bytes(entry.file_name().as_encoded_bytes(), candidates, &mut found);
    }

    let file_type = entry.file_type();
    if file_type.is_symlink() {
      let target = fs::read_link(entry_path)?;
      scan_bytes(target.as_os_str().as_encoded_bytes(), candidates, &mut found);
    } else if file_type.is_file() {
      scan_reader(File::open(entry_path)?, candidates, &mut found)?;
    }
  }

  Ok(found)
}

/// Scan a stream in fixed-size chunks. The last `STORE_HASH_LEN - 1` bytes
/// of each chunk are carried into the next so a hash straddling a chunk
/// boundary is still seen.
fn scan_reader<R: Read>(mut reader: R, candidates: &HashSet<String>, found: &mut BTreeSet<String>) -> io::Result<()> {
  let mut buffer = [0u8; SCAN_CHUNK];
  let mut window = Vec::with_capacity(SCAN_CHUNK + STORE_HASH_LEN);
  loop {
    let n = match reader.read(&mut buffer) {
      Ok(0) => break,
      Ok(n) => n,
      Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
      Err(e) => return Err(e),
    };
    window.extend_from_slice(&buffer[..n]);
    scan_bytes(&window, candidates, found);
    let carry = window.len().min(STORE_HASH_LEN - 1);
    window.drain(..window.len() - carry);
  }
  Ok(())
}

/// Slide a hash-sized window over `data`, skipping past any byte outside the
/// hash alphabet since no match can span it.
fn scan_bytes(data: &[u8], candidates: &HashSet<String>, found: &mut BTreeSet<String>) {
  let mut i = 0;
  while i + STORE_HASH_LEN <= data.len() {
    let window = &data[i..i + STORE_HASH_LEN];
    match window.iter().rposition(|c| !STORE_HASH_ALPHABET.contains(c)) {
      Some(bad) => i += bad + 1,
      None => {
        // The window is pure ASCII here.
        if let Ok(hash) = std::str::from_utf8(window)
          && candidates.contains(hash)
        {
          found.insert(hash.to_string());
        }
        i += 1;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  const DEP: &str = "0123456789abcdfghijklmnpqrsvwxyz";
  const OTHER: &str = "zyxwvsrqpnmlkjihgfdcba9876543210";

  fn candidates() -> HashSet<String> {
    [DEP.to_string(), OTHER.to_string()].into_iter().collect()
  }

  #[test]
  fn finds_hash_in_file_contents() {
    let temp = tempdir().unwrap();
    fs::write(
      temp.path().join("script"),
      format!("#!/bin/sh\nexec /nix/store/{DEP}-dep/bin/dep \"$@\"\n"),
    )
    .unwrap();

    let found = scan_references(temp.path(), &candidates()).unwrap();
    assert_eq!(found.into_iter().collect::<Vec<_>>(), vec![DEP.to_string()]);
  }

  #[cfg(unix)]
  #[test]
  fn finds_hash_in_symlink_target() {
    let temp = tempdir().unwrap();
    std::os::unix::fs::symlink(format!("/nix/store/{OTHER}-other/lib"), temp.path().join("lib")).unwrap();

    let found = scan_references(temp.path(), &candidates()).unwrap();
    assert!(found.contains(OTHER));
    assert!(!found.contains(DEP));
  }

  #[test]
  fn ignores_partial_matches() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("file"), &DEP[..STORE_HASH_LEN - 1]).unwrap();

    let found = scan_references(temp.path(), &candidates()).unwrap();
    assert!(found.is_empty());
  }

  #[test]
  fn finds_hash_across_chunk_boundary() {
    let temp = tempdir().unwrap();
    let mut contents = vec![b'!'; SCAN_CHUNK - 10];
    contents.extend_from_slice(format!("/nix/store/{DEP}-dep").as_bytes());
    contents.extend_from_slice(&[b'!'; SCAN_CHUNK]);
    let start = SCAN_CHUNK - 10 + "/nix/store/".len();
    assert!(start < SCAN_CHUNK && start + STORE_HASH_LEN > SCAN_CHUNK);
    fs::write(temp.path().join("blob"), &contents).unwrap();

    let found = scan_references(temp.path(), &candidates()).unwrap();
    assert_eq!(found.into_iter().collect::<Vec<_>>(), vec![DEP.to_string()]);
  }

  #[test]
  fn finds_hash_split_across_short_reads() {
    // A reader that hands out a few bytes at a time.
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
      fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.0.len().min(buf.len()).min(5);
        buf[..n].copy_from_slice(&self.0[..n]);
        self.0 = &self.0[n..];
        Ok(n)
      }
    }

    let data = format!("ref {OTHER} end");
    let mut found = BTreeSet::new();
    scan_reader(Trickle(data.as_bytes()), &candidates(), &mut found).unwrap();
    assert!(found.contains(OTHER));
  }

  #[test]
  fn match_after_non_alphabet_bytes() {
    let mut found = BTreeSet::new();
    let data = format!("e-E-!{DEP}!");
    scan_bytes(data.as_bytes(), &candidates(), &mut found);
    assert!(found.contains(DEP));
  }
}
