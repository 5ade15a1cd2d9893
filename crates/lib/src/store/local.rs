//! A store backed directly by a directory on the local filesystem.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::nar::nar_size;
use super::refs::scan_references;
use super::{PathInfo, Store, StoreError, split_store_name};
use crate::consts::{DEFAULT_STORE_DIR, STORE_DIR_ENV};

#[derive(Debug, Clone)]
pub struct LocalStore {
  dir: PathBuf,
}

impl LocalStore {
  /// Open the store rooted at `dir`.
  ///
  /// The root is canonicalised so that confinement checks against resolved
  /// paths work even when the store directory is reached through a symlink.
  pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
    let dir = dir.as_ref();
    let canonical = dunce::canonicalize(dir).map_err(|source| StoreError::Open {
      path: dir.to_path_buf(),
      source,
    })?;
    if !canonical.is_dir() {
      return Err(StoreError::Open {
        path: dir.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
      });
    }
    debug!(store = %canonical.display(), "opened local store");
    Ok(Self { dir: canonical })
  }

  /// Open the store named by the environment, falling back to the default location.
  pub fn from_env() -> Result<Self, StoreError> {
    Self::open(Self::configured_dir())
  }

  pub fn configured_dir() -> PathBuf {
    if let Ok(path) = std::env::var(STORE_DIR_ENV) {
      return PathBuf::from(path);
    }

    PathBuf::from(DEFAULT_STORE_DIR)
  }

  fn check_valid(&self, path: &Path) -> Result<(), StoreError> {
    let valid = path.parent() == Some(self.dir.as_path())
      && path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(split_store_name)
        .is_some()
      && fs::symlink_metadata(path).is_ok();
    if valid {
      Ok(())
    } else {
      Err(StoreError::InvalidPath(path.to_path_buf()))
    }
  }

  /// Hash parts of every valid store path currently in the store, mapped back
  /// to their paths.
  fn valid_paths(&self) -> Result<Vec<(String, PathBuf)>, StoreError> {
    let entries = fs::read_dir(&self.dir).map_err(|source| StoreError::Io {
      path: self.dir.clone(),
      source,
    })?;

    let mut paths = Vec::new();
    for entry in entries.flatten() {
      let name = entry.file_name();
      let Some(name) = name.to_str() else {
        continue;
      };
      if let Some((hash, _)) = split_store_name(name) {
        paths.push((hash.to_string(), entry.path()));
      }
    }
    Ok(paths)
  }
}

impl Store for LocalStore {
  fn store_dir(&self) -> &Path {
    &self.dir
  }

  fn query_path_info(&self, path: &Path) -> Result<PathInfo, StoreError> {
    self.check_valid(path)?;

    let io_err = |source: std::io::Error| StoreError::Io {
      path: path.to_path_buf(),
      source,
    };

    let nar_size = nar_size(path).map_err(io_err)?;

    let valid = self.valid_paths()?;
    let candidates: HashSet<String> = valid.iter().map(|(hash, _)| hash.clone()).collect();
    let found = scan_references(path, &candidates).map_err(io_err)?;
    let references: BTreeSet<PathBuf> = valid
      .into_iter()
      .filter(|(hash, _)| found.contains(hash))
      .map(|(_, p)| p)
      .collect();

    debug!(path = %path.display(), nar_size, references = references.len(), "queried path info");

    Ok(PathInfo {
      path: path.to_path_buf(),
      nar_size,
      references,
    })
  }
}
