//! Common test utilities for provisioning integration tests.

#![allow(dead_code)]

mod fixtures;
mod host;

pub use fixtures::*;
pub use host::RecordingHost;
