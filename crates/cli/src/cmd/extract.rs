//! Implementation of the `buildmeta extract` command.
//!
//! Reads a derivation's outputs from the store and prints the extracted
//! build metadata.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::debug;

use buildmeta_lib::output::BuildOutput;
use buildmeta_lib::{Derivation, Store, get_build_output};

use super::open_store;
use crate::output::{OutputFormat, format_bytes, print_info, print_json, print_stat, print_success, print_warning};

/// Execute the extract command.
///
/// Outputs come from `--drv`, from `--path NAME=PATH` pairs, or both; pairs
/// override same-named outputs of the derivation file.
pub fn cmd_extract(store: Option<&Path>, drv: Option<&Path>, paths: &[String], output: OutputFormat) -> Result<()> {
  let mut derivation = match drv {
    Some(file) => Derivation::load(file).with_context(|| format!("Failed to load derivation: {}", file.display()))?,
    None => Derivation::new(),
  };

  for spec in paths {
    let (name, path) = parse_output_spec(spec)?;
    derivation = derivation.with_output(name, path);
  }

  if derivation.outputs.is_empty() {
    bail!("No outputs given; pass --drv FILE or --path NAME=PATH");
  }

  let store = open_store(store)?;
  debug!(store = %store.store_dir().display(), outputs = derivation.outputs.len(), "extracting build output");
  let result = get_build_output(&store, &derivation).context("Failed to extract build output")?;

  if output.is_json() {
    print_json(&result)?;
  } else {
    print_text(&result);
  }

  Ok(())
}

fn parse_output_spec(spec: &str) -> Result<(&str, &str)> {
  match spec.split_once('=') {
    Some((name, path)) if !name.is_empty() && !path.is_empty() => Ok((name, path)),
    _ => bail!("Invalid output '{}': expected NAME=PATH", spec),
  }
}

fn print_text(result: &BuildOutput) {
  if result.failed {
    print_warning("Build reported failure");
  } else {
    print_success("Build output extracted");
  }

  if let Some(name) = &result.release_name {
    print_stat("Release", name);
  }
  print_stat("Size", &format_bytes(result.size));
  print_stat("Closure size", &format_bytes(result.closure_size));

  println!();
  if result.products.is_empty() {
    print_info("No products");
  } else {
    println!("Products:");
    for product in &result.products {
      let kind = if product.subtype.is_empty() {
        product.product_type.clone()
      } else {
        format!("{}/{}", product.product_type, product.subtype)
      };
      println!("  {} {} {}", crate::output::symbols::INFO, kind, product.path.display());
      if let Some(default_path) = &product.default_path {
        print_stat("    entry point", default_path);
      }
      if let (Some(size), Some(sha256)) = (product.file_size, &product.sha256) {
        print_stat("    size", &format_bytes(size));
        print_stat("    sha256", &sha256.to_hex());
      }
    }
  }

  if !result.metrics.is_empty() {
    println!();
    println!("Metrics:");
    for metric in result.metrics.values() {
      if metric.unit.is_empty() {
        print_stat(&format!("  {}", metric.name), &metric.value.to_string());
      } else {
        print_stat(&format!("  {}", metric.name), &format!("{} {}", metric.value, metric.unit));
      }
    }
  }
}
