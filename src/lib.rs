//! Provision isolated Apache Tomcat instances.
//!
//! An instance is described by an [`InstanceSpec`]. The [`Provisioner`]
//! resolves the mirror URIs for its version, fetches the published MD5
//! checksum, downloads and verifies the tarball, extracts it (minus the
//! bundled webapps the instance excludes), creates the instance's system
//! user and group, hands the tree over to them and finally points a stable
//! symlink at it.
//!
//! # Example
//!
//! ```no_run
//! use tomcat_provision::{Context, InstanceSpec, Provisioner};
//!
//! let spec = InstanceSpec::builder("web")
//!     .version("9.0.1")
//!     .exclude_manager(true)
//!     .build()?;
//!
//! let report = Provisioner::system(Context::default()).run(&spec)?;
//! assert_eq!(report.instance_name, "web");
//! # Ok::<(), tomcat_provision::ProvisionError>(())
//! ```
//!
//! # Layout
//!
//! With the defaults above the instance ends up as:
//!
//! - `http://archive.apache.org/dist/tomcat/tomcat-9/v9.0.1/bin/apache-tomcat-9.0.1.tar.gz`
//!   downloaded to `<cache>/apache-tomcat-9.0.1.tar.gz`
//! - extracted to `/opt/tomcat_web_9_0_1`, owned by `tomcat_web:tomcat_web`
//! - linked from `/opt/tomcat_web`
//!
//! Every step is idempotent; re-running against a provisioned instance
//! changes nothing.

pub mod core;
pub mod executor;
pub mod helpers;
pub mod version;

pub use crate::core::config::{Exclusions, InstanceSpec, InstanceSpecBuilder, InstanceToml};
pub use crate::core::error::ProvisionError;
pub use crate::core::output;
pub use executor::{
    Context, Host, ProvisionReport, Provisioner, Step, StepOutcome, SystemHost,
};
