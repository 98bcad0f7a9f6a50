//! Host-level settings shared by every provisioning run.

use std::path::PathBuf;

use crate::core::config::InstanceSpec;

/// Directory name under the user cache directory.
const CACHE_SUBDIR: &str = "tomcat-provision";

/// Settings that belong to the host running the provisioner rather than to
/// any one instance.
#[derive(Debug, Clone)]
pub struct Context {
    /// Where downloaded tarballs are kept between runs
    pub cache_dir: PathBuf,
    /// If true, print URIs, digests and paths as steps run
    pub verbose: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            verbose: false,
        }
    }
}

impl Context {
    /// Create a new context with the given cache directory.
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Default::default()
        }
    }

    /// Set verbose mode.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Cache location of an instance's tarball.
    pub fn cache_path(&self, spec: &InstanceSpec) -> PathBuf {
        self.cache_dir.join(spec.tarball_file_name())
    }
}

/// `<XDG cache>/tomcat-provision`, or a directory under the system temp dir
/// when no cache directory is known.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(CACHE_SUBDIR)
}
