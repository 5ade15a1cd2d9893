//! NAR (Nix ARchive) size accounting.
//!
//! The store reports each path's size as the length of its NAR serialisation.
//! The archive is never produced here; only its length is summed.

use std::fs;
use std::io;
use std::path::Path;

const NAR_MAGIC: &str = "nix-archive-1";

/// Serialised length of a NAR string of `len` bytes: a 64-bit length prefix
/// followed by the bytes, zero-padded to a multiple of eight.
fn str_size(len: u64) -> u64 {
  8 + len.div_ceil(8) * 8
}

fn token(s: &str) -> u64 {
  str_size(s.len() as u64)
}

/// Size of the NAR serialisation of the tree rooted at `path`.
///
/// Symlinks are archived as links, never followed.
pub fn nar_size(path: &Path) -> io::Result<u64> {
  Ok(token(NAR_MAGIC) + node_size(path)?)
}

fn node_size(path: &Path) -> io::Result<u64> {
  let meta = fs::symlink_metadata(path)?;
  let file_type = meta.file_type();

  let mut size = token("(") + token("type");

  if file_type.is_symlink() {
    let target = fs::read_link(path)?;
    size += token("symlink") + token("target") + str_size(target.as_os_str().len() as u64);
  } else if file_type.is_dir() {
    size += token("directory");

    let mut entries = fs::read_dir(path)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
      size += token("entry") + token("(") + token("name");
      size += str_size(entry.file_name().len() as u64);
      size += token("node") + node_size(&entry.path())?;
      size += token(")");
    }
  } else if file_type.is_file() {
    size += token("regular");
    if is_executable(&meta) {
      size += token("executable") + token("");
    }
    size += token("contents") + str_size(meta.len());
  } else {
    return Err(io::Error::new(
      io::ErrorKind::Unsupported,
      format!("unsupported file type at {}", path.display()),
    ));
  }

  Ok(size + token(")"))
}

#[cfg(unix)]
fn is_executable(meta: &fs::Metadata) -> bool {
  use std::os::unix::fs::PermissionsExt;
  meta.permissions().mode() & 0o100 != 0
}

#[cfg(not(unix))]
fn is_executable(_meta: &fs::Metadata) -> bool {
  false
}
