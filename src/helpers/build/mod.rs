//! BUILD helpers - turning a verified tarball into an install tree
//!
//! - **extract**: extraction plans with wrapper stripping and webapp exclusion

pub mod extract;

pub use extract::{ExtractSummary, ExtractionPlan};
