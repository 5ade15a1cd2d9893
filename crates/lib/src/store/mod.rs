//! The content-addressed store that build outputs live in.
//!
//! Extraction only needs a narrow view of the store: path confinement, path
//! metadata and reference closures. That view is the [`Store`] trait;
//! [`LocalStore`] implements it directly over a store directory.
//!
//! # Layout
//!
//! ```text
//! <store>/
//! ├── <hash>-<name>/          # a store path (directory, file or symlink)
//! └── <hash>-<name>
//! ```

pub mod local;
pub mod nar;
pub mod refs;

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::consts::{STORE_HASH_ALPHABET, STORE_HASH_LEN};

pub use local::LocalStore;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("store directory {path} is not usable: {source}")]
  Open {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("path '{0}' is not in the store")]
  NotInStore(PathBuf),

  #[error("path '{0}' is not a valid store path")]
  InvalidPath(PathBuf),

  #[error("failed to read store path {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Metadata the store keeps about one store path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathInfo {
  pub path: PathBuf,
  /// Size of the path's NAR serialisation in bytes.
  pub nar_size: u64,
  /// Store paths referenced from this path, possibly including itself.
  pub references: BTreeSet<PathBuf>,
}

pub trait Store {
  /// Canonical store root.
  fn store_dir(&self) -> &Path;

  /// Whether `path` lies below the store root. The root itself is not in the store.
  fn is_in_store(&self, path: &Path) -> bool {
    path != self.store_dir() && path.starts_with(self.store_dir())
  }

  /// The top-level store path containing `path`.
  fn to_store_path(&self, path: &Path) -> Result<PathBuf, StoreError> {
    if !self.is_in_store(path) {
      return Err(StoreError::NotInStore(path.to_path_buf()));
    }
    let rest = path
      .strip_prefix(self.store_dir())
      .map_err(|_| StoreError::NotInStore(path.to_path_buf()))?;
    match rest.components().next() {
      Some(Component::Normal(first)) => Ok(self.store_dir().join(first)),
      _ => Err(StoreError::InvalidPath(path.to_path_buf())),
    }
  }

  fn query_path_info(&self, path: &Path) -> Result<PathInfo, StoreError>;

  /// Add `path` and everything it transitively references to `closure`,
  /// keyed by store path. Each path not yet in `closure` is queried once.
  fn query_closure(&self, path: &Path, closure: &mut BTreeMap<PathBuf, PathInfo>) -> Result<(), StoreError> {
    let mut pending = vec![self.to_store_path(path)?];
    while let Some(next) = pending.pop() {
      if closure.contains_key(&next) {
        continue;
      }
      let info = self.query_path_info(&next)?;
      pending.extend(info.references.iter().filter(|r| !closure.contains_key(*r)).cloned());
      closure.insert(next, info);
    }
    Ok(())
  }

  /// Add `path` and everything it transitively references to `closure`.
  fn compute_fs_closure(&self, path: &Path, closure: &mut BTreeSet<PathBuf>) -> Result<(), StoreError> {
    let mut infos = BTreeMap::new();
    self.query_closure(path, &mut infos)?;
    closure.extend(infos.into_keys());
    Ok(())
  }
}

/// Whether `s` is a syntactically valid store hash part.
pub fn is_hash_part(s: &[u8]) -> bool {
  s.len() == STORE_HASH_LEN && s.iter().all(|c| STORE_HASH_ALPHABET.contains(c))
}

/// Split a store path base name into its hash part and symbolic name.
///
/// Returns `None` unless the base name has the form `<hash>-<name>`.
pub fn split_store_name(base_name: &str) -> Option<(&str, &str)> {
  let (hash, name) = base_name.split_once('-')?;
  if is_hash_part(hash.as_bytes()) && !name.is_empty() {
    Some((hash, name))
  } else {
    None
  }
}

/// The symbolic name component of a store path, e.g. `hello-2.12` for
/// `/nix/store/<hash>-hello-2.12`.
///
/// Falls back to the whole base name when it carries no hash part.
pub fn store_path_to_name(path: &Path) -> String {
  let base = path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_default();
  match split_store_name(&base) {
    Some((_, name)) => name.to_string(),
    None => base,
  }
}
