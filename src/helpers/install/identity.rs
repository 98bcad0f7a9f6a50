//! System account lookups and creation
//!
//! Lookups go through the passwd/group databases via libc, so NSS sources
//! are honored. Creation shells out to `groupadd`/`useradd`.

use std::ffi::{CStr, CString};
use std::process::Command;

use crate::core::error::ProvisionError;

/// Login shell for service accounts.
pub const NOLOGIN_SHELL: &str = "/bin/nologin";

/// Numeric id of a user, if it exists.
pub fn uid_of(name: &str) -> Option<u32> {
    let cname = CString::new(name).ok()?;
    // SAFETY: cname is a valid NUL-terminated string; the returned record is
    // read before any other passwd call.
    unsafe {
        let pw = libc::getpwnam(cname.as_ptr());
        if pw.is_null() {
            None
        } else {
            Some((*pw).pw_uid)
        }
    }
}

/// Numeric id of a group, if it exists.
pub fn gid_of(name: &str) -> Option<u32> {
    let cname = CString::new(name).ok()?;
    // SAFETY: as in uid_of, for the group database.
    unsafe {
        let gr = libc::getgrnam(cname.as_ptr());
        if gr.is_null() {
            None
        } else {
            Some((*gr).gr_gid)
        }
    }
}

/// Login name for a numeric user id.
pub fn user_name(uid: u32) -> Option<String> {
    // SAFETY: the record's pw_name is copied out before returning.
    unsafe {
        let pw = libc::getpwuid(uid);
        if pw.is_null() || (*pw).pw_name.is_null() {
            None
        } else {
            Some(CStr::from_ptr((*pw).pw_name).to_string_lossy().into_owned())
        }
    }
}

/// Arguments for creating a system group.
pub fn groupadd_args(group: &str) -> Vec<String> {
    vec!["--system".to_string(), group.to_string()]
}

/// Arguments for creating a system user with no home directory and no login
/// shell, whose primary group is `group`.
pub fn useradd_args(user: &str, group: &str) -> Vec<String> {
    vec![
        "--system".to_string(),
        "--gid".to_string(),
        group.to_string(),
        "--shell".to_string(),
        NOLOGIN_SHELL.to_string(),
        "--no-create-home".to_string(),
        user.to_string(),
    ]
}

/// Create a system group.
pub fn create_group(group: &str) -> Result<(), ProvisionError> {
    run("groupadd", &groupadd_args(group))
}

/// Create a system user in `group`.
pub fn create_user(user: &str, group: &str) -> Result<(), ProvisionError> {
    run("useradd", &useradd_args(user, group))
}

fn run(program: &str, args: &[String]) -> Result<(), ProvisionError> {
    let cmd = format!("{} {}", program, args.join(" "));
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| ProvisionError::CommandFailed {
            cmd: cmd.clone(),
            stderr: e.to_string(),
        })?;

    if output.status.success() {
        Ok(())
    } else {
        Err(ProvisionError::CommandFailed {
            cmd,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}
