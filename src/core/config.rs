//! Instance configuration
//!
//! An instance is described once, by [`InstanceSpec`]. Everything else in a
//! provisioning run (URIs, cache path, install tree, symlink) is derived from
//! it. Specs are produced by [`InstanceSpecBuilder::build`], which applies the
//! derived defaults and the legacy `sha1_base_path` alias exactly once.
//!
//! Instances can also be described in TOML:
//!
//! ```toml
//! instance_name = "web"
//! version = "9.0.1"
//! exclude_manager = true
//! tomcat_user = "tomcat"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::error::ProvisionError;

/// Default Tomcat version when none is given.
pub const DEFAULT_VERSION: &str = "8.0.36";

/// Default mirror for both tarballs and checksum documents.
pub const DEFAULT_BASE_PATH: &str = "http://archive.apache.org/dist/tomcat/";

/// Root under which default install trees and symlinks are placed.
const OPT_DIR: &str = "/opt";

/// Which bundled webapps are left out of the install tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exclusions {
    /// `webapps/examples` and `webapps/ROOT`
    pub examples: bool,
    pub docs: bool,
    pub manager: bool,
    pub host_manager: bool,
}

impl Default for Exclusions {
    fn default() -> Self {
        Self {
            examples: true,
            docs: true,
            manager: false,
            host_manager: false,
        }
    }
}

/// Fully resolved description of one Tomcat instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceSpec {
    pub instance_name: String,
    pub version: String,
    pub install_path: PathBuf,
    pub tarball_base_path: String,
    /// Already resolved against the legacy `sha1_base_path` alias.
    pub checksum_base_path: String,
    /// Explicit tarball location; supersedes both base paths.
    pub tarball_uri: Option<String>,
    pub exclusions: Exclusions,
    pub user: String,
    pub group: String,
    /// Stable, version-independent symlink to `install_path`.
    pub link_path: PathBuf,
    /// Skip TLS certificate verification when fetching checksums.
    pub insecure_skip_verify: bool,
}

impl InstanceSpec {
    /// Start describing an instance.
    pub fn builder(instance_name: impl Into<String>) -> InstanceSpecBuilder {
        InstanceSpecBuilder::new(instance_name)
    }

    /// Name of the cached tarball for this version.
    pub fn tarball_file_name(&self) -> String {
        format!("apache-tomcat-{}.tar.gz", self.version)
    }

    /// Location of the extraction sentinel.
    pub fn sentinel_path(&self) -> PathBuf {
        self.install_path.join(SENTINEL_FILE)
    }
}

/// File whose presence marks a completed extraction.
pub const SENTINEL_FILE: &str = "LICENSE";

/// Default install path: `/opt/tomcat_<name>_<version with dots as underscores>`.
pub fn default_install_path(instance_name: &str, version: &str) -> PathBuf {
    Path::new(OPT_DIR).join(format!(
        "tomcat_{}_{}",
        instance_name,
        version.replace('.', "_")
    ))
}

/// Default symlink path: `/opt/tomcat_<name>`.
pub fn default_link_path(instance_name: &str) -> PathBuf {
    Path::new(OPT_DIR).join(default_account_name(instance_name))
}

/// Default user and group name: `tomcat_<name>`.
pub fn default_account_name(instance_name: &str) -> String {
    format!("tomcat_{}", instance_name)
}

/// Builder for [`InstanceSpec`].
///
/// Every field but the instance name is optional; unset fields fall back to
/// their documented defaults in [`build`](Self::build).
#[derive(Debug, Clone, Default)]
pub struct InstanceSpecBuilder {
    instance_name: String,
    version: Option<String>,
    install_path: Option<PathBuf>,
    tarball_base_path: Option<String>,
    checksum_base_path: Option<String>,
    sha1_base_path: Option<String>,
    tarball_uri: Option<String>,
    exclude_examples: Option<bool>,
    exclude_docs: Option<bool>,
    exclude_manager: Option<bool>,
    exclude_host_manager: Option<bool>,
    user: Option<String>,
    group: Option<String>,
    link_path: Option<PathBuf>,
    insecure_skip_verify: Option<bool>,
}

macro_rules! setter {
    ($(#[$doc:meta])* $name:ident: $ty:ty) => {
        $(#[$doc])*
        pub fn $name(mut self, value: impl Into<$ty>) -> Self {
            self.$name = Some(value.into());
            self
        }
    };
}

impl InstanceSpecBuilder {
    pub fn new(instance_name: impl Into<String>) -> Self {
        Self {
            instance_name: instance_name.into(),
            ..Default::default()
        }
    }

    setter!(version: String);
    setter!(install_path: PathBuf);
    setter!(tarball_base_path: String);
    setter!(checksum_base_path: String);
    setter!(
        /// Deprecated alias for `checksum_base_path`. When set it wins.
        sha1_base_path: String
    );
    setter!(tarball_uri: String);
    setter!(exclude_examples: bool);
    setter!(exclude_docs: bool);
    setter!(exclude_manager: bool);
    setter!(exclude_host_manager: bool);
    setter!(user: String);
    setter!(group: String);
    setter!(link_path: PathBuf);
    setter!(insecure_skip_verify: bool);

    /// Layer a parsed TOML file under this builder: values already set on the
    /// builder are kept, unset ones are taken from the file.
    pub fn with_file_defaults(mut self, file: InstanceToml) -> Self {
        if self.instance_name.is_empty()
            && let Some(name) = file.instance_name
        {
            self.instance_name = name;
        }
        self.version = self.version.or(file.version);
        self.install_path = self.install_path.or(file.install_path);
        self.tarball_base_path = self.tarball_base_path.or(file.tarball_base_path);
        self.checksum_base_path = self.checksum_base_path.or(file.checksum_base_path);
        self.sha1_base_path = self.sha1_base_path.or(file.sha1_base_path);
        self.tarball_uri = self.tarball_uri.or(file.tarball_uri);
        self.exclude_examples = self.exclude_examples.or(file.exclude_examples);
        self.exclude_docs = self.exclude_docs.or(file.exclude_docs);
        self.exclude_manager = self.exclude_manager.or(file.exclude_manager);
        self.exclude_host_manager = self.exclude_host_manager.or(file.exclude_hostmanager);
        self.user = self.user.or(file.tomcat_user);
        self.group = self.group.or(file.tomcat_group);
        self.link_path = self.link_path.or(file.link_path);
        self.insecure_skip_verify = self.insecure_skip_verify.or(file.insecure_skip_verify);
        self
    }

    /// Normalize into an [`InstanceSpec`].
    ///
    /// The version is not validated here; that is the first provisioning step.
    pub fn build(self) -> Result<InstanceSpec, ProvisionError> {
        validate_instance_name(&self.instance_name)?;

        let name = self.instance_name;
        let version = self.version.unwrap_or_else(|| DEFAULT_VERSION.to_string());
        let install_path = self
            .install_path
            .unwrap_or_else(|| default_install_path(&name, &version));

        // Deprecation shim: the legacy sha1 name overrides the checksum base
        let checksum_base_path = self
            .sha1_base_path
            .or(self.checksum_base_path)
            .unwrap_or_else(|| DEFAULT_BASE_PATH.to_string());

        let defaults = Exclusions::default();
        let exclusions = Exclusions {
            examples: self.exclude_examples.unwrap_or(defaults.examples),
            docs: self.exclude_docs.unwrap_or(defaults.docs),
            manager: self.exclude_manager.unwrap_or(defaults.manager),
            host_manager: self.exclude_host_manager.unwrap_or(defaults.host_manager),
        };

        let user = self.user.unwrap_or_else(|| default_account_name(&name));
        let group = self.group.unwrap_or_else(|| default_account_name(&name));
        let link_path = self.link_path.unwrap_or_else(|| default_link_path(&name));

        Ok(InstanceSpec {
            version,
            install_path,
            tarball_base_path: self
                .tarball_base_path
                .unwrap_or_else(|| DEFAULT_BASE_PATH.to_string()),
            checksum_base_path,
            tarball_uri: self.tarball_uri,
            exclusions,
            user,
            group,
            link_path,
            insecure_skip_verify: self.insecure_skip_verify.unwrap_or(true),
            instance_name: name,
        })
    }
}

/// Instance names end up in paths and account names.
fn validate_instance_name(name: &str) -> Result<(), ProvisionError> {
    if name.is_empty() {
        return Err(ProvisionError::InvalidConfig(
            "instance name cannot be empty".to_string(),
        ));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ProvisionError::InvalidConfig(format!(
            "invalid instance name '{}': only alphanumeric characters, underscores, and hyphens are allowed",
            name
        )));
    }

    Ok(())
}

/// On-disk instance definition. All keys are optional so a file can be
/// combined with command-line flags.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceToml {
    pub instance_name: Option<String>,
    pub version: Option<String>,
    pub install_path: Option<PathBuf>,
    pub tarball_base_path: Option<String>,
    pub checksum_base_path: Option<String>,
    pub sha1_base_path: Option<String>,
    pub tarball_uri: Option<String>,
    pub exclude_examples: Option<bool>,
    pub exclude_docs: Option<bool>,
    pub exclude_manager: Option<bool>,
    pub exclude_hostmanager: Option<bool>,
    pub tomcat_user: Option<String>,
    pub tomcat_group: Option<String>,
    pub link_path: Option<PathBuf>,
    pub insecure_skip_verify: Option<bool>,
}

impl InstanceToml {
    /// Parse an instance definition from TOML text.
    pub fn parse(text: &str) -> Result<Self, ProvisionError> {
        toml::from_str(text).map_err(|e| ProvisionError::InvalidConfig(e.to_string()))
    }

    /// Read and parse an instance definition file.
    pub fn load(path: &Path) -> Result<Self, ProvisionError> {
        let text = std::fs::read_to_string(path).map_err(|e| ProvisionError::io(path, e))?;
        toml::from_str(&text).map_err(|e| {
            ProvisionError::InvalidConfig(format!("invalid TOML in {}: {}", path.display(), e))
        })
    }
}
