//! Provisioning error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while provisioning a Tomcat instance.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("the version must be in X.Y.Z format, got: {version}")]
    InvalidVersionFormat { version: String },

    #[error("fetching checksum at {uri} failed{}: {reason}", status_suffix(.status))]
    ChecksumFetch {
        uri: String,
        status: Option<u16>,
        reason: String,
    },

    #[error(
        "checksum of {} ({actual}) does not match the mirror checksum ({expected}), moved to {}",
        path.display(),
        quarantined.display()
    )]
    ChecksumMismatch {
        path: PathBuf,
        quarantined: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("download of {uri} failed: {reason}")]
    Download { uri: String, reason: String },

    #[error("extracting {} failed: {reason}", archive.display())]
    Extract { archive: PathBuf, reason: String },

    #[error("command failed: {cmd}\nstderr: {stderr}")]
    CommandFailed { cmd: String, stderr: String },

    #[error("unknown {kind}: {name}")]
    UnknownAccount { kind: &'static str, name: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ProvisionError {
    /// Wrap an IO error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!(" with HTTP {}", code),
        None => String::new(),
    }
}
