//! ACQUIRE helpers - getting a trusted tarball onto local disk
//!
//! - **uri**: mirror URI templates for tarballs and checksum documents
//! - **checksum**: fetch and parse remote checksum documents
//! - **download**: stream a tarball to the cache
//! - **verify**: MD5 verification with quarantine on mismatch

pub mod checksum;
pub mod download;
pub mod uri;
pub mod verify;

pub use checksum::{ChecksumFetcher, parse_checksum};
pub use download::download;
pub use uri::{checksum_uri, tarball_uri};
pub use verify::{ArtifactVerifier, verify_against};
