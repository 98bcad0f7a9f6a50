//! In-memory [`Host`] that records what the provisioner asked for.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tomcat_provision::helpers::install::{INSTALL_DIR_MODE, ensure_dir};
use tomcat_provision::{Host, ProvisionError};

/// Accounts live in memory, directories are created for real, and
/// ownership is tracked per chowned root instead of calling chown.
#[derive(Default)]
pub struct RecordingHost {
    calls: Mutex<Vec<String>>,
    groups: Mutex<BTreeSet<String>>,
    users: Mutex<BTreeSet<String>>,
    owners: Mutex<BTreeMap<PathBuf, String>>,
}

impl RecordingHost {
    /// Calls made so far, as `"<method> <args>"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn has_user(&self, user: &str) -> bool {
        self.users.lock().unwrap().contains(user)
    }

    pub fn has_group(&self, group: &str) -> bool {
        self.groups.lock().unwrap().contains(group)
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Host for RecordingHost {
    fn ensure_group(&self, group: &str) -> Result<bool, ProvisionError> {
        self.record(format!("ensure_group {}", group));
        Ok(self.groups.lock().unwrap().insert(group.to_string()))
    }

    fn ensure_user(&self, user: &str, group: &str) -> Result<bool, ProvisionError> {
        self.record(format!("ensure_user {} {}", user, group));
        if !self.has_group(group) {
            return Err(ProvisionError::UnknownAccount {
                kind: "group",
                name: group.to_string(),
            });
        }
        Ok(self.users.lock().unwrap().insert(user.to_string()))
    }

    fn ensure_install_dir(
        &self,
        path: &Path,
        user: &str,
        group: &str,
    ) -> Result<bool, ProvisionError> {
        self.record(format!("ensure_install_dir {} {}:{}", path.display(), user, group));
        ensure_dir(path, INSTALL_DIR_MODE)
    }

    fn owner_name(&self, path: &Path) -> Result<Option<String>, ProvisionError> {
        if !path.exists() {
            return Ok(None);
        }
        let owners = self.owners.lock().unwrap();
        Ok(owners
            .iter()
            .find(|(root, _)| path.starts_with(root))
            .map(|(_, user)| user.clone()))
    }

    fn chown_recursive(&self, path: &Path, user: &str, group: &str) -> Result<(), ProvisionError> {
        self.record(format!("chown_recursive {} {}:{}", path.display(), user, group));
        self.owners
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), user.to_string());
        Ok(())
    }
}
