//! Artifact verification
//!
//! A downloaded tarball is only trusted once its MD5 digest matches the
//! checksum document published by the mirror. A file that fails the check is
//! quarantined as `<file>.bad` so the next run downloads a fresh copy instead
//! of tripping over the same corrupt cache entry.

use std::path::Path;

use crate::core::error::ProvisionError;
use crate::helpers::internal::{fs_utils, hash};

use super::checksum::ChecksumFetcher;

/// Suffix given to quarantined artifacts.
pub const QUARANTINE_SUFFIX: &str = ".bad";

/// Checks local artifacts against remote checksum documents.
pub struct ArtifactVerifier<'a> {
    fetcher: &'a ChecksumFetcher,
}

impl<'a> ArtifactVerifier<'a> {
    pub fn new(fetcher: &'a ChecksumFetcher) -> Self {
        Self { fetcher }
    }

    /// Fetch the expected checksum from `checksum_uri` and check `path`
    /// against it. Returns the verified digest.
    pub fn verify(&self, path: &Path, checksum_uri: &str) -> Result<String, ProvisionError> {
        let expected = self.fetcher.fetch(checksum_uri)?;
        verify_against(path, &expected)
    }
}

/// Check `path` against an already fetched checksum.
///
/// On mismatch the file is renamed to `<path>.bad` before the error is
/// returned.
pub fn verify_against(path: &Path, expected: &str) -> Result<String, ProvisionError> {
    let actual = hash::md5_file(path)?;

    if hash::digests_match(expected, &actual) {
        return Ok(actual);
    }

    let quarantined = fs_utils::with_suffix(path, QUARANTINE_SUFFIX);
    fs_utils::move_file(path, &quarantined)?;

    Err(ProvisionError::ChecksumMismatch {
        path: path.to_path_buf(),
        quarantined,
        expected: expected.to_string(),
        actual,
    })
}
