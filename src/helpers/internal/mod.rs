//! Internal utility modules shared by the acquire, build and install helpers.

pub mod fs_utils;
pub mod hash;
pub mod progress;
