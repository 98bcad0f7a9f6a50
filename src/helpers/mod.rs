//! Provisioning helpers, grouped by the phase that uses them
//!
//! - **acquire**: mirror URIs, checksum documents, download, verification
//! - **build**: extraction plans
//! - **install**: system accounts, ownership, the published symlink
//! - **internal**: hashing, progress bars, small filesystem utilities

pub mod acquire;
pub mod build;
pub mod install;
pub mod internal;
