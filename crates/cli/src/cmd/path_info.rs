//! Implementation of the `buildmeta path-info` command.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use buildmeta_lib::Store;

use super::open_store;
use crate::output::{OutputFormat, format_bytes, print_json, print_stat, print_success, symbols};

#[derive(Serialize)]
struct PathInfoReport {
  path: String,
  nar_size: u64,
  references: Vec<String>,
  closure_size: u64,
  closure_paths: usize,
}

pub fn cmd_path_info(store: Option<&Path>, path: &Path, output: OutputFormat) -> Result<()> {
  let store = open_store(store)?;

  let resolved = std::path::absolute(path).with_context(|| format!("Invalid path: {}", path.display()))?;
  let store_path = store
    .to_store_path(&resolved)
    .with_context(|| format!("Not a store path: {}", path.display()))?;

  let mut closure = BTreeMap::new();
  store
    .query_closure(&store_path, &mut closure)
    .with_context(|| format!("Failed to query {}", store_path.display()))?;
  let closure_size = closure.values().map(|member| member.nar_size).sum();
  let info = closure
    .get(&store_path)
    .with_context(|| format!("No path info for {}", store_path.display()))?;

  let report = PathInfoReport {
    path: store_path.display().to_string(),
    nar_size: info.nar_size,
    references: info.references.iter().map(|r| r.display().to_string()).collect(),
    closure_size,
    closure_paths: closure.len(),
  };

  if output.is_json() {
    print_json(&report)?;
  } else {
    print_success(&report.path);
    print_stat("NAR size", &format_bytes(report.nar_size));
    print_stat("Closure size", &format_bytes(report.closure_size));
    print_stat("Closure paths", &report.closure_paths.to_string());
    if !report.references.is_empty() {
      println!();
      println!("References:");
      for reference in &report.references {
        println!("  {} {}", symbols::ARROW, reference);
      }
    }
  }

  Ok(())
}
