//! Tomcat version handling
//!
//! Tomcat mirrors group releases by major version (`tomcat-9/v9.0.1/...`),
//! so the only structure we need from a version string is its leading
//! component. Validation is deliberately loose: the pattern is matched
//! anywhere in the string and `.` matches any character, which is what
//! existing instance definitions have been validated against.

use std::sync::OnceLock;

use regex::Regex;

use crate::core::error::ProvisionError;

const VERSION_PATTERN: &str = r"\d+.\d+.\d+";

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(VERSION_PATTERN).expect("version pattern is a valid regex"))
}

/// Check that a version string looks like `X.Y.Z`.
///
/// # Example
/// ```
/// use tomcat_provision::version::validate_version;
///
/// assert!(validate_version("9.0.1").is_ok());
/// assert!(validate_version("9.0").is_err());
/// ```
pub fn validate_version(version: &str) -> Result<(), ProvisionError> {
    if version_regex().is_match(version) {
        Ok(())
    } else {
        Err(ProvisionError::InvalidVersionFormat {
            version: version.to_string(),
        })
    }
}

/// The substring before the first `.`.
///
/// Performs no validation; call [`validate_version`] first.
pub fn major_version(version: &str) -> &str {
    version.split('.').next().unwrap_or(version)
}
