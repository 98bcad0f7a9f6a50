//! INSTALL helpers - accounts, ownership, and the published symlink
//!
//! - **identity**: user/group lookups and creation
//! - **filesystem**: install directory, recursive chown, atomic symlink

pub mod filesystem;
pub mod identity;

pub use filesystem::{INSTALL_DIR_MODE, chown_recursive, ensure_dir, owner_uid, publish_symlink};
