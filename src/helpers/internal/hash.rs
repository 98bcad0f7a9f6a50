//! File digest helpers
//!
//! Tomcat mirrors only publish MD5 checksum documents, so that is the one
//! digest computed here. Files are streamed in chunks rather than read whole.

use md5::{Digest, Md5};
use std::io::Read;
use std::path::Path;

use crate::core::error::ProvisionError;

/// Chunk size for reading files during hashing (1MB)
const CHUNK_SIZE: usize = 1024 * 1024;

/// Compute the lowercase hex MD5 digest of a file's full contents.
pub fn md5_file(file: &Path) -> Result<String, ProvisionError> {
    let mut f = std::fs::File::open(file).map_err(|e| ProvisionError::io(file, e))?;
    digest_reader::<Md5>(&mut f).map_err(|e| ProvisionError::io(file, e))
}

/// Digest everything a reader yields.
fn digest_reader<D: Digest>(reader: &mut impl Read) -> Result<String, std::io::Error> {
    let mut hasher = D::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Compare two hex digests, ignoring case.
pub fn digests_match(expected: &str, actual: &str) -> bool {
    expected.eq_ignore_ascii_case(actual)
}
