mod extract;
mod path_info;

pub use extract::cmd_extract;
pub use path_info::cmd_path_info;

use std::path::Path;

use anyhow::{Context, Result};
use buildmeta_lib::LocalStore;

/// Open the store named on the command line, or the configured one.
fn open_store(dir: Option<&Path>) -> Result<LocalStore> {
  let dir = dir.map(Path::to_path_buf).unwrap_or_else(LocalStore::configured_dir);
  LocalStore::open(&dir).with_context(|| format!("Failed to open store: {}", dir.display()))
}
