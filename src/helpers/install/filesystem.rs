//! Install tree and symlink operations

use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::core::error::ProvisionError;
use crate::helpers::internal::fs_utils::{ensure_parent_dir, with_suffix};

/// Mode of a freshly prepared install directory.
pub const INSTALL_DIR_MODE: u32 = 0o750;

/// Create `path` (and parents) if missing, then apply `mode` to it.
///
/// Returns whether the directory had to be created.
pub fn ensure_dir(path: &Path, mode: u32) -> Result<bool, ProvisionError> {
    let created = !path.is_dir();
    if created {
        std::fs::create_dir_all(path).map_err(|e| ProvisionError::io(path, e))?;
    }
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .map_err(|e| ProvisionError::io(path, e))?;
    Ok(created)
}

/// Numeric owner of `path`, without following a final symlink.
pub fn owner_uid(path: &Path) -> Result<u32, ProvisionError> {
    std::fs::symlink_metadata(path)
        .map(|md| md.uid())
        .map_err(|e| ProvisionError::io(path, e))
}

/// Change the owner of `path` only.
pub fn chown(path: &Path, uid: u32, gid: u32) -> Result<(), ProvisionError> {
    std::os::unix::fs::lchown(path, Some(uid), Some(gid)).map_err(|e| ProvisionError::io(path, e))
}

/// Change the owner of everything under `root`, including `root`.
///
/// Symlinks are re-owned themselves and never followed.
pub fn chown_recursive(root: &Path, uid: u32, gid: u32) -> Result<usize, ProvisionError> {
    let mut count = 0;
    for entry in WalkDir::new(root).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
            ProvisionError::io(path, source)
        })?;
        chown(entry.path(), uid, gid)?;
        count += 1;
    }
    Ok(count)
}

/// Point `link` at `target`.
///
/// The link is staged next to its final location and renamed into place, so
/// readers never observe a missing link. Returns `false` when `link` already
/// points at `target`. A non-symlink at `link` is left alone and reported.
pub fn publish_symlink(link: &Path, target: &Path) -> Result<bool, ProvisionError> {
    match std::fs::symlink_metadata(link) {
        Ok(md) if md.file_type().is_symlink() => {
            let current = std::fs::read_link(link).map_err(|e| ProvisionError::io(link, e))?;
            if current == target {
                return Ok(false);
            }
        }
        Ok(_) => {
            return Err(ProvisionError::io(
                link,
                std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    "exists and is not a symlink",
                ),
            ));
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(ProvisionError::io(link, e)),
    }

    ensure_parent_dir(link)?;
    let staged: PathBuf = with_suffix(link, ".tmp");
    if std::fs::symlink_metadata(&staged).is_ok() {
        std::fs::remove_file(&staged).map_err(|e| ProvisionError::io(&staged, e))?;
    }
    std::os::unix::fs::symlink(target, &staged).map_err(|e| ProvisionError::io(&staged, e))?;
    std::fs::rename(&staged, link).map_err(|e| ProvisionError::io(link, e))?;
    Ok(true)
}
