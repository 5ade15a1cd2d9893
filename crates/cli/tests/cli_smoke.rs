//! CLI smoke tests for buildmeta.
//!
//! These tests run the binary against throwaway stores and check exit codes
//! and the shape of what gets printed.

use std::path::PathBuf;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the buildmeta binary.
fn buildmeta_cmd() -> Command {
  cargo_bin_cmd!("buildmeta")
}

/// Isolated store under a temporary directory.
struct TestStore {
  _temp: TempDir,
  dir: PathBuf,
}

impl TestStore {
  fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("store");
    std::fs::create_dir(&dir).unwrap();
    let dir = std::fs::canonicalize(&dir).unwrap();
    Self { _temp: temp, dir }
  }

  /// Create the directory store path `<hash>-<name>` with `c` as the hash.
  fn output(&self, c: char, name: &str) -> PathBuf {
    let path = self.dir.join(format!("{}-{}", c.to_string().repeat(32), name));
    std::fs::create_dir_all(&path).unwrap();
    path
  }

  fn write(&self, path: PathBuf, content: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
  }

  fn cmd(&self) -> Command {
    let mut cmd = buildmeta_cmd();
    cmd.env("BUILDMETA_STORE_DIR", &self.dir);
    cmd.env_remove("RUST_LOG");
    cmd
  }
}

// =============================================================================
// Help & Version
// =============================================================================

#[test]
fn help_flag_works() {
  buildmeta_cmd()
    .arg("--help")
    .assert()
    .success()
    .stdout(predicate::str::contains("Usage"));
}

#[test]
fn version_flag_works() {
  buildmeta_cmd()
    .arg("--version")
    .assert()
    .success()
    .stdout(predicate::str::contains("buildmeta"));
}

#[test]
fn subcommand_help_works() {
  for cmd in &["extract", "path-info"] {
    buildmeta_cmd()
      .arg(cmd)
      .arg("--help")
      .assert()
      .success()
      .stdout(predicate::str::contains("Usage"));
  }
}

// =============================================================================
// extract
// =============================================================================

#[test]
fn extract_falls_back_to_nix_build_product() {
  let store = TestStore::new();
  let out = store.output('1', "hello-2.12");

  store
    .cmd()
    .arg("extract")
    .arg("--path")
    .arg(format!("out={}", out.display()))
    .args(["-o", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"type\": \"nix-build\""))
    .stdout(predicate::str::contains("\"name\": \"hello-2.12\""))
    .stdout(predicate::str::contains("\"closure_size\""));
}

#[test]
fn extract_reads_declared_products_and_metrics() {
  let store = TestStore::new();
  let out = store.output('1', "pkg");
  store.write(out.join("README"), "hello world");
  store.write(
    out.join("nix-support/hydra-build-products"),
    &format!("doc readme \"{}/README\" /index.html\n", out.display()),
  );
  store.write(out.join("nix-support/hydra-metrics"), "latency 12.5 ms\n");
  store.write(out.join("nix-support/hydra-release-name"), "pkg-1.0\n");

  store
    .cmd()
    .arg("extract")
    .arg("--path")
    .arg(format!("out={}", out.display()))
    .assert()
    .success()
    .stdout(predicate::str::contains("Products:"))
    .stdout(predicate::str::contains("doc/readme"))
    .stdout(predicate::str::contains("/index.html"))
    .stdout(predicate::str::contains(
      "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9",
    ))
    .stdout(predicate::str::contains("12.5 ms"))
    .stdout(predicate::str::contains("pkg-1.0"));
}

#[test]
fn extract_reads_derivation_file() {
  let store = TestStore::new();
  let out = store.output('1', "pkg");
  store.write(out.join("nix-support/failed"), "");
  let drv = store.dir.parent().unwrap().join("drv.json");
  std::fs::write(
    &drv,
    format!(
      r#"{{ "/nix/store/x-pkg.drv": {{ "outputs": {{ "out": {{ "path": "{}" }} }} }} }}"#,
      out.display()
    ),
  )
  .unwrap();

  store
    .cmd()
    .arg("extract")
    .arg("--drv")
    .arg(&drv)
    .args(["-o", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"failed\": true"));
}

#[test]
fn extract_without_outputs_fails() {
  let store = TestStore::new();

  store
    .cmd()
    .arg("extract")
    .assert()
    .failure()
    .stderr(predicate::str::contains("No outputs given"));
}

#[test]
fn extract_rejects_malformed_output_spec() {
  let store = TestStore::new();

  store
    .cmd()
    .arg("extract")
    .args(["--path", "out"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("expected NAME=PATH"));
}

#[test]
fn extract_missing_output_fails() {
  let store = TestStore::new();
  let missing = store.dir.join(format!("{}-gone", "1".repeat(32)));

  store
    .cmd()
    .arg("extract")
    .arg("--path")
    .arg(format!("out={}", missing.display()))
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to extract build output"));
}

#[test]
fn store_flag_overrides_environment() {
  let store = TestStore::new();
  let out = store.output('1', "pkg");

  buildmeta_cmd()
    .env("BUILDMETA_STORE_DIR", "/nonexistent/store")
    .arg("--store")
    .arg(&store.dir)
    .arg("extract")
    .arg("--path")
    .arg(format!("out={}", out.display()))
    .assert()
    .success();
}

#[test]
fn missing_store_fails() {
  buildmeta_cmd()
    .env("BUILDMETA_STORE_DIR", "/nonexistent/store")
    .arg("extract")
    .args(["--path", "out=/nonexistent/store/x"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("Failed to open store"));
}

// =============================================================================
// path-info
// =============================================================================

#[test]
fn path_info_reports_references() {
  let store = TestStore::new();
  let dep = store.output('2', "dep");
  store.write(dep.join("lib/libdep.so"), "library");
  let app = store.output('1', "app");
  store.write(app.join("bin/app"), &format!("{}/lib/libdep.so", dep.display()));

  store
    .cmd()
    .arg("path-info")
    .arg(app.join("bin/app"))
    .args(["-o", "json"])
    .assert()
    .success()
    .stdout(predicate::str::contains("\"nar_size\""))
    .stdout(predicate::str::contains("\"closure_paths\": 2"))
    .stdout(predicate::str::contains(dep.display().to_string()));
}

#[test]
fn path_info_outside_store_fails() {
  let store = TestStore::new();

  store
    .cmd()
    .arg("path-info")
    .arg("/")
    .assert()
    .failure()
    .stderr(predicate::str::contains("Not a store path"));
}
