//! Build output metadata extraction.
//!
//! After a build finishes, its outputs are scanned for the marker files under
//! `nix-support/` that a build may leave behind:
//!
//! - `failed` flags the build as failed
//! - `hydra-build-products` declares downloadable products
//! - `hydra-release-name` names the release
//! - `hydra-metrics` reports numeric metrics
//!
//! Closure sizes come from the store. Everything a build wrote is treated as
//! untrusted: every path it names is resolved and confined to the store before
//! being touched.

mod metrics;
mod products;
mod types;


pub use metrics::{parse_leading_f64, parse_metric_line};
pub use products::{ProductLine, parse_product_line};
pub use types::*;

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::consts::{
  BUILD_PRODUCTS_FILE, FAILED_MARKER, FALLBACK_PRODUCT_TYPE, METRICS_FILE, RELEASE_NAME_FILE,
};
use crate::derivation::Derivation;
use crate::store::{Store, store_path_to_name};
use crate::util::hash::hash_file;
use crate::util::secure::secure_read;

/// Extract the metadata of a finished build from its outputs.
///
/// Either returns a complete [`BuildOutput`] or fails as a whole; a stat or
/// hash failure on a path that already passed validation aborts extraction.
pub fn get_build_output<S: Store + ?Sized>(store: &S, drv: &Derivation) -> Result<BuildOutput, OutputError> {
  let outputs = drv.output_paths();
  let mut res = BuildOutput::default();

  compute_sizes(store, &outputs, &mut res)?;

  let mut explicit_products = false;
  for output in &outputs {
    if fs::symlink_metadata(output.join(FAILED_MARKER)).is_ok() {
      res.failed = true;
    }

    let Some(contents) = secure_read(store, &output.join(BUILD_PRODUCTS_FILE)) else {
      continue;
    };
    explicit_products = true;

    for line in contents.split('\n').filter(|l| !l.is_empty()) {
      let Some(parsed) = parse_product_line(line) else {
        debug!(output = %output.display(), line, "skipping malformed product line");
        continue;
      };
      if let Some(product) = resolve_product(store, output, &parsed)? {
        res.products.push(product);
      }
    }
  }

  if !explicit_products {
    add_fallback_products(drv, &mut res)?;
  }

  for output in &outputs {
    if let Some(name) = secure_read(store, &output.join(RELEASE_NAME_FILE)) {
      res.release_name = Some(name.trim().to_string());
    }
  }

  for output in &outputs {
    let Some(contents) = secure_read(store, &output.join(METRICS_FILE)) else {
      continue;
    };
    for line in contents.split('\n').filter(|l| !l.is_empty()) {
      match parse_metric_line(line) {
        Some(metric) => {
          res.metrics.insert(metric.name.clone(), metric);
        }
        None => debug!(output = %output.display(), line, "skipping malformed metric line"),
      }
    }
  }

  info!(
    outputs = outputs.len(),
    products = res.products.len(),
    metrics = res.metrics.len(),
    closure_size = res.closure_size,
    size = res.size,
    failed = res.failed,
    "extracted build output"
  );

  Ok(res)
}

/// Sum NAR sizes over the union of all output closures, and over the outputs
/// themselves.
fn compute_sizes<S: Store + ?Sized>(
  store: &S,
  outputs: &BTreeSet<PathBuf>,
  res: &mut BuildOutput,
) -> Result<(), OutputError> {
  let mut closure = BTreeMap::new();
  for output in outputs {
    store.query_closure(output, &mut closure)?;
  }

  for (path, info) in &closure {
    res.closure_size += info.nar_size;
    if outputs.contains(path) {
      res.size += info.nar_size;
    }
  }

  Ok(())
}

/// Validate a declared product and gather its file metadata.
///
/// Returns `Ok(None)` for declarations that must be ignored: relative paths,
/// unresolvable paths and paths resolving outside the store.
fn resolve_product<S: Store + ?Sized>(
  store: &S,
  output: &Path,
  line: &ProductLine<'_>,
) -> Result<Option<BuildProduct>, OutputError> {
  if !line.path.starts_with('/') {
    debug!(path = line.path, "ignoring product with relative path");
    return Ok(None);
  }

  let path = match dunce::canonicalize(line.path) {
    Ok(p) => p,
    Err(e) => {
      debug!(path = line.path, error = %e, "ignoring unresolvable product path");
      return Ok(None);
    }
  };

  if !store.is_in_store(&path) || fs::symlink_metadata(&path).is_err() {
    debug!(path = line.path, resolved = %path.display(), "ignoring product outside the store");
    return Ok(None);
  }

  let name = if path == output {
    String::new()
  } else {
    path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default()
  };

  let meta = fs::metadata(&path).map_err(|source| OutputError::Stat {
    path: path.clone(),
    source,
  })?;

  let mut product = BuildProduct {
    product_type: line.product_type.to_string(),
    subtype: line.subtype.to_string(),
    path,
    default_path: line.default_path.map(str::to_string),
    name,
    is_regular: false,
    file_size: None,
    sha1: None,
    sha256: None,
  };

  if meta.is_file() {
    let hashes = hash_file(&product.path).map_err(|source| OutputError::Hash {
      path: product.path.clone(),
      source,
    })?;
    product.is_regular = true;
    product.file_size = Some(meta.len());
    product.sha1 = Some(hashes.sha1);
    product.sha256 = Some(hashes.sha256);
  }

  Ok(Some(product))
}

/// Without declared products, every directory output becomes a `nix-build`
/// product of its own.
fn add_fallback_products(drv: &Derivation, res: &mut BuildOutput) -> Result<(), OutputError> {
  for (output_name, output) in &drv.outputs {
    let meta = fs::metadata(&output.path).map_err(|source| OutputError::Stat {
      path: output.path.clone(),
      source,
    })?;
    if !meta.is_dir() {
      continue;
    }

    debug!(output = output_name, path = %output.path.display(), "no build products declared, using output");
    res.products.push(BuildProduct {
      product_type: FALLBACK_PRODUCT_TYPE.to_string(),
      subtype: if output_name == "out" {
        String::new()
      } else {
        output_name.clone()
      },
      path: output.path.clone(),
      default_path: None,
      name: store_path_to_name(&output.path),
      is_regular: false,
      file_size: None,
      sha1: None,
      sha256: None,
    });
  }
  Ok(())
}
