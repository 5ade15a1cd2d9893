//! Reading build-author-controlled files without leaving the store.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::store::Store;

/// Read `path` only if it resolves to a file inside the store.
///
/// Symlinks are resolved fully before the confinement check, so a link that
/// points outside the store is refused even though it exists. Absence,
/// confinement violations and I/O errors all yield `None`.
pub fn secure_read<S: Store + ?Sized>(store: &S, path: &Path) -> Option<String> {
  if fs::symlink_metadata(path).is_err() {
    return None;
  }

  let canonical = match dunce::canonicalize(path) {
    Ok(p) => p,
    Err(e) => {
      debug!(path = %path.display(), error = %e, "could not resolve file");
      return None;
    }
  };

  if !store.is_in_store(&canonical) {
    debug!(path = %path.display(), resolved = %canonical.display(), "refusing to read file outside the store");
    return None;
  }

  match fs::read(&canonical) {
    Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
    Err(e) => {
      debug!(path = %canonical.display(), error = %e, "could not read file");
      None
    }
  }
}
