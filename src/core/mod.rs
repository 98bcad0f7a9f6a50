//! Core infrastructure shared by every provisioning step
//!
//! Configuration, error types and terminal output.

pub mod config;
pub mod error;
pub mod output;
