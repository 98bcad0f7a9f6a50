//! OS-level collaborators of the provisioner.
//!
//! Everything that touches the account databases or re-owns files goes
//! through [`Host`], so a run can be exercised without root.

use std::path::Path;

use crate::core::error::ProvisionError;
use crate::helpers::install::{filesystem, identity};

/// Account and ownership operations needed to provision an instance.
///
/// The `ensure_*` methods are create-if-absent and return whether anything
/// was created.
pub trait Host {
    fn ensure_group(&self, group: &str) -> Result<bool, ProvisionError>;

    /// Create `user` as a system account with no login shell and `group` as
    /// its primary group.
    fn ensure_user(&self, user: &str, group: &str) -> Result<bool, ProvisionError>;

    /// Create `path` with mode `0750`, owned by `user:group`.
    fn ensure_install_dir(&self, path: &Path, user: &str, group: &str)
    -> Result<bool, ProvisionError>;

    /// Login name of the owner of `path`, or `None` if the path does not
    /// exist or the owner has no passwd entry.
    fn owner_name(&self, path: &Path) -> Result<Option<String>, ProvisionError>;

    /// Re-own everything under `path` to `user:group`.
    fn chown_recursive(&self, path: &Path, user: &str, group: &str) -> Result<(), ProvisionError>;
}

/// The real host: libc lookups, `groupadd`/`useradd`, and chown syscalls.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl SystemHost {
    fn ids(&self, user: &str, group: &str) -> Result<(u32, u32), ProvisionError> {
        let uid = identity::uid_of(user).ok_or_else(|| ProvisionError::UnknownAccount {
            kind: "user",
            name: user.to_string(),
        })?;
        let gid = identity::gid_of(group).ok_or_else(|| ProvisionError::UnknownAccount {
            kind: "group",
            name: group.to_string(),
        })?;
        Ok((uid, gid))
    }
}

impl Host for SystemHost {
    fn ensure_group(&self, group: &str) -> Result<bool, ProvisionError> {
        if identity::gid_of(group).is_some() {
            return Ok(false);
        }
        identity::create_group(group)?;
        Ok(true)
    }

    fn ensure_user(&self, user: &str, group: &str) -> Result<bool, ProvisionError> {
        if identity::uid_of(user).is_some() {
            return Ok(false);
        }
        identity::create_user(user, group)?;
        Ok(true)
    }

    fn ensure_install_dir(
        &self,
        path: &Path,
        user: &str,
        group: &str,
    ) -> Result<bool, ProvisionError> {
        let (uid, gid) = self.ids(user, group)?;
        let created = filesystem::ensure_dir(path, filesystem::INSTALL_DIR_MODE)?;
        filesystem::chown(path, uid, gid)?;
        Ok(created)
    }

    fn owner_name(&self, path: &Path) -> Result<Option<String>, ProvisionError> {
        match filesystem::owner_uid(path) {
            Ok(uid) => Ok(identity::user_name(uid)),
            Err(ProvisionError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn chown_recursive(&self, path: &Path, user: &str, group: &str) -> Result<(), ProvisionError> {
        let (uid, gid) = self.ids(user, group)?;
        filesystem::chown_recursive(path, uid, gid)?;
        Ok(())
    }
}
