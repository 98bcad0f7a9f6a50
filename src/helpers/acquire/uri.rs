//! Mirror URI construction
//!
//! Apache mirrors lay releases out as
//! `<base>/tomcat-<major>/v<version>/bin/apache-tomcat-<version>.tar.gz`, with
//! the MD5 document next to it under the same name plus `.md5`.

use crate::core::config::InstanceSpec;
use crate::version::major_version;

/// Suffix of the checksum document published next to each tarball.
pub const CHECKSUM_SUFFIX: &str = ".md5";

/// Where to download the tarball from.
///
/// An explicit `tarball_uri` is returned unchanged.
pub fn tarball_uri(spec: &InstanceSpec) -> String {
    match &spec.tarball_uri {
        Some(uri) => uri.clone(),
        None => mirror_uri(&spec.tarball_base_path, &spec.version),
    }
}

/// Where to fetch the tarball's checksum document from.
///
/// With an explicit `tarball_uri` this is always `<tarball_uri>.md5`; the
/// base paths are ignored.
pub fn checksum_uri(spec: &InstanceSpec) -> String {
    match &spec.tarball_uri {
        Some(uri) => format!("{}{}", uri, CHECKSUM_SUFFIX),
        None => format!(
            "{}{}",
            mirror_uri(&spec.checksum_base_path, &spec.version),
            CHECKSUM_SUFFIX
        ),
    }
}

/// `<base>/` + the versioned tarball path. The base gets exactly one
/// trailing slash no matter how it was written.
fn mirror_uri(base: &str, version: &str) -> String {
    format!(
        "{}/tomcat-{}/v{}/bin/apache-tomcat-{}.tar.gz",
        base.trim_end_matches('/'),
        major_version(version),
        version,
        version
    )
}
