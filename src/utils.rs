//! Filesystem helpers shared by the artifact reader and the proof store.

use crate::error::{Error, Result};
use std::fs::{File, OpenOptions};
use std::io::Read;
use std::path::Path;

fn reject_symlink(path: &Path, allow_symlinks: bool) -> Result<()> {
    if allow_symlinks {
        return Ok(());
    }

    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => Err(Error::Validation(format!(
            "Refusing to follow symlink: {}",
            path.display()
        ))),
        Ok(_) => Ok(()),
        // Missing paths are reported by the open call itself
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Open an existing file for reading.
///
/// Unless `allow_symlinks` is set, a symlink at `path` is rejected with
/// [`Error::Validation`].
pub fn safe_open_file(path: &Path, allow_symlinks: bool) -> Result<File> {
    reject_symlink(path, allow_symlinks)?;
    Ok(File::open(path)?)
}

/// Create (or truncate) a file for writing.
///
/// Unless `allow_symlinks` is set, an existing symlink at `path` is rejected
/// rather than written through.
pub fn safe_create_file(path: &Path, allow_symlinks: bool) -> Result<File> {
    reject_symlink(path, allow_symlinks)?;
    Ok(OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)?)
}

/// Read a whole file into memory.
pub fn read_file_bytes(path: &Path) -> Result<Vec<u8>> {
    let mut file = safe_open_file(path, false)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}
