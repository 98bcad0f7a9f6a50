//! Common filesystem utilities

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::core::error::ProvisionError;

/// Ensure a file's parent directory exists.
pub fn ensure_parent_dir(path: &Path) -> Result<(), ProvisionError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        std::fs::create_dir_all(parent).map_err(|e| ProvisionError::io(parent, e))?;
    }
    Ok(())
}

/// Append a suffix to the final component of a path
/// (`/a/b.tar.gz` + `.bad` -> `/a/b.tar.gz.bad`).
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

/// Move/rename a file.
pub fn move_file(src: &Path, dest: &Path) -> Result<(), ProvisionError> {
    std::fs::rename(src, dest).map_err(|e| ProvisionError::io(src, e))
}
