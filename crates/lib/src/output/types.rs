use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;
use crate::util::hash::{Sha1Hash, Sha256Hash};

/// Fatal extraction failures. Anything recoverable (missing marker files,
/// malformed lines, paths outside the store) is skipped instead.
#[derive(Debug, Error)]
pub enum OutputError {
  #[error("getting status of '{path}': {source}")]
  Stat {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("hashing '{path}': {source}")]
  Hash {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error(transparent)]
  Store(#[from] StoreError),
}

/// A file or directory a build declares as one of its deliverables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildProduct {
  #[serde(rename = "type")]
  pub product_type: String,
  pub subtype: String,
  /// Canonical path inside the store.
  pub path: PathBuf,
  /// Entry point within the product, if one was declared.
  pub default_path: Option<String>,
  /// Base name of `path`, or empty when the product is the output itself.
  pub name: String,
  pub is_regular: bool,
  /// Set only for regular files.
  pub file_size: Option<u64>,
  pub sha1: Option<Sha1Hash>,
  pub sha256: Option<Sha256Hash>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildMetric {
  pub name: String,
  pub value: f64,
  pub unit: String,
}

/// Everything extracted from the outputs of one finished build.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildOutput {
  /// Total NAR size of the closure of all outputs.
  pub closure_size: u64,
  /// NAR size of the outputs themselves.
  pub size: u64,
  pub failed: bool,
  pub products: Vec<BuildProduct>,
  pub release_name: Option<String>,
  pub metrics: BTreeMap<String, BuildMetric>,
}
