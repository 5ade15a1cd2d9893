//! The outputs of a derivation, as handed over after a build finishes.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DerivationError {
  #[error("failed to read derivation {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse derivation: {0}")]
  Parse(#[from] serde_json::Error),

  #[error("expected exactly one derivation, found {0}")]
  Ambiguous(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivationOutput {
  pub path: PathBuf,
}

/// Output name to output path, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Derivation {
  pub outputs: BTreeMap<String, DerivationOutput>,
}

/// `nix derivation show` keys each derivation by its `.drv` path.
#[derive(Deserialize)]
#[serde(untagged)]
enum DerivationJson {
  Bare(Derivation),
  Keyed(BTreeMap<String, Derivation>),
}

impl Derivation {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_output(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
    self.outputs.insert(name.to_string(), DerivationOutput { path: path.into() });
    self
  }

  pub fn from_json_str(json: &str) -> Result<Self, DerivationError> {
    match serde_json::from_str::<DerivationJson>(json)? {
      DerivationJson::Bare(drv) => Ok(drv),
      DerivationJson::Keyed(map) => {
        let count = map.len();
        match map.into_values().next() {
          Some(drv) if count == 1 => Ok(drv),
          _ => Err(DerivationError::Ambiguous(count)),
        }
      }
    }
  }

  pub fn load(path: &Path) -> Result<Self, DerivationError> {
    let json = std::fs::read_to_string(path).map_err(|source| DerivationError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_json_str(&json)
  }

  /// Distinct output paths, sorted. Several outputs may share a path.
  pub fn output_paths(&self) -> BTreeSet<PathBuf> {
    self.outputs.values().map(|o| o.path.clone()).collect()
  }
}
