//! Provisioner - sequences the steps that turn an [`InstanceSpec`] into a
//! running-ready Tomcat install tree.
//!
//! Steps run strictly in order. The first failure is logged and returned
//! unchanged; nothing is rolled back. Every step is safe to repeat, so a
//! second run against a provisioned instance reports all steps as skipped.

mod context;
mod host;

pub use context::{Context, default_cache_dir};
pub use host::{Host, SystemHost};

use std::fmt;

use crate::core::config::InstanceSpec;
use crate::core::error::ProvisionError;
use crate::core::output;
use crate::helpers::acquire::{self, ChecksumFetcher};
use crate::helpers::build::ExtractionPlan;
use crate::helpers::install::publish_symlink;
use crate::version;

/// One provisioning step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    ValidateVersion,
    EnsureGroup,
    EnsureUser,
    EnsureInstallDirectory,
    DownloadArtifact,
    Extract,
    FixOwnership,
    PublishSymlink,
}

impl Step {
    /// Every step, in the order they run.
    pub const ALL: [Step; 8] = [
        Step::ValidateVersion,
        Step::EnsureGroup,
        Step::EnsureUser,
        Step::EnsureInstallDirectory,
        Step::DownloadArtifact,
        Step::Extract,
        Step::FixOwnership,
        Step::PublishSymlink,
    ];
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Step::ValidateVersion => "validate version",
            Step::EnsureGroup => "ensure group",
            Step::EnsureUser => "ensure user",
            Step::EnsureInstallDirectory => "ensure install directory",
            Step::DownloadArtifact => "download artifact",
            Step::Extract => "extract",
            Step::FixOwnership => "fix ownership",
            Step::PublishSymlink => "publish symlink",
        };
        f.write_str(name)
    }
}

/// What a step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step changed something on the host.
    Done(String),
    /// A check ran and passed without changing anything.
    Checked(String),
    /// Nothing needed doing.
    Skipped(String),
}

impl StepOutcome {
    pub fn is_skipped(&self) -> bool {
        matches!(self, StepOutcome::Skipped(_))
    }

    /// Whether the step modified the host.
    pub fn changed_host(&self) -> bool {
        matches!(self, StepOutcome::Done(_))
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub instance_name: String,
    pub steps: Vec<(Step, StepOutcome)>,
}

impl ProvisionReport {
    /// Outcome recorded for `step`.
    pub fn outcome(&self, step: Step) -> Option<&StepOutcome> {
        self.steps.iter().find(|(s, _)| *s == step).map(|(_, o)| o)
    }

    /// Whether any step changed the host.
    pub fn changed(&self) -> bool {
        self.steps.iter().any(|(_, o)| o.changed_host())
    }
}

/// Runs provisioning steps against a [`Host`].
pub struct Provisioner<H: Host = SystemHost> {
    ctx: Context,
    host: H,
}

impl Provisioner<SystemHost> {
    /// Provisioner for the local system.
    pub fn system(ctx: Context) -> Self {
        Self::new(ctx, SystemHost)
    }
}

impl<H: Host> Provisioner<H> {
    pub fn new(ctx: Context, host: H) -> Self {
        Self { ctx, host }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Provision `spec`, stopping at the first failing step.
    pub fn run(&self, spec: &InstanceSpec) -> Result<ProvisionReport, ProvisionError> {
        output::action(&format!(
            "Provisioning tomcat {} instance '{}'",
            spec.version, spec.instance_name
        ));

        let mut report = ProvisionReport {
            instance_name: spec.instance_name.clone(),
            steps: Vec::with_capacity(Step::ALL.len()),
        };

        for (i, step) in Step::ALL.iter().copied().enumerate() {
            output::step_numbered(i + 1, Step::ALL.len(), &step.to_string());

            match self.run_step(step, spec) {
                Ok(outcome) => {
                    match &outcome {
                        StepOutcome::Done(msg) | StepOutcome::Checked(msg) => {
                            output::sub_action(msg)
                        }
                        StepOutcome::Skipped(msg) => output::skip(msg),
                    }
                    report.steps.push((step, outcome));
                }
                Err(e) => {
                    output::error(&format!("{} failed: {}", step, e));
                    return Err(e);
                }
            }
        }

        if report.changed() {
            output::success(&format!(
                "Provisioned '{}' at {}",
                spec.instance_name,
                spec.link_path.display()
            ));
        } else {
            output::success(&format!("'{}' already provisioned", spec.instance_name));
        }

        Ok(report)
    }

    fn run_step(&self, step: Step, spec: &InstanceSpec) -> Result<StepOutcome, ProvisionError> {
        match step {
            Step::ValidateVersion => {
                version::validate_version(&spec.version)?;
                Ok(StepOutcome::Checked(format!(
                    "version {} ok (major {})",
                    spec.version,
                    version::major_version(&spec.version)
                )))
            }
            Step::EnsureGroup => Ok(changed_or_present(
                self.host.ensure_group(&spec.group)?,
                format!("group {}", spec.group),
            )),
            Step::EnsureUser => Ok(changed_or_present(
                self.host.ensure_user(&spec.user, &spec.group)?,
                format!("user {}", spec.user),
            )),
            Step::EnsureInstallDirectory => Ok(changed_or_present(
                self.host
                    .ensure_install_dir(&spec.install_path, &spec.user, &spec.group)?,
                format!("directory {}", spec.install_path.display()),
            )),
            Step::DownloadArtifact => self.download_artifact(spec),
            Step::Extract => self.extract(spec),
            Step::FixOwnership => self.fix_ownership(spec),
            Step::PublishSymlink => {
                let msg = format!(
                    "{} -> {}",
                    spec.link_path.display(),
                    spec.install_path.display()
                );
                if publish_symlink(&spec.link_path, &spec.install_path)? {
                    Ok(StepOutcome::Done(format!("linked {}", msg)))
                } else {
                    Ok(StepOutcome::Skipped(format!("{} already in place", msg)))
                }
            }
        }
    }

    fn download_artifact(&self, spec: &InstanceSpec) -> Result<StepOutcome, ProvisionError> {
        let tarball_uri = acquire::tarball_uri(spec);
        let checksum_uri = acquire::checksum_uri(spec);
        let cached = self.ctx.cache_path(spec);

        // The checksum comes first; without it nothing gets downloaded
        self.detail(&format!("checksum {}", checksum_uri));
        let fetcher = ChecksumFetcher::new(spec.insecure_skip_verify)?;
        let expected = fetcher.fetch(&checksum_uri)?;
        self.detail(&format!("expected md5 {}", expected));

        if cached.is_file() {
            let digest = acquire::verify_against(&cached, &expected)?;
            self.detail(&format!("cached md5 {}", digest));
            return Ok(StepOutcome::Skipped(format!(
                "{} already cached and verified",
                cached.display()
            )));
        }

        self.detail(&format!("tarball {}", tarball_uri));
        let bytes = acquire::download(&tarball_uri, &cached)?;
        let digest = acquire::verify_against(&cached, &expected)?;
        self.detail(&format!("md5 {}", digest));

        Ok(StepOutcome::Done(format!(
            "downloaded {} ({} bytes) to {}",
            spec.tarball_file_name(),
            bytes,
            cached.display()
        )))
    }

    fn extract(&self, spec: &InstanceSpec) -> Result<StepOutcome, ProvisionError> {
        let sentinel = spec.sentinel_path();
        if sentinel.exists() {
            return Ok(StepOutcome::Skipped(format!(
                "{} present",
                sentinel.display()
            )));
        }

        let plan = ExtractionPlan::for_instance(spec, self.ctx.cache_path(spec));
        self.detail(&plan.command_line());
        let summary = plan.execute()?;

        Ok(StepOutcome::Done(format!(
            "extracted {} entries into {} ({} excluded)",
            summary.extracted,
            spec.install_path.display(),
            summary.excluded
        )))
    }

    fn fix_ownership(&self, spec: &InstanceSpec) -> Result<StepOutcome, ProvisionError> {
        let sentinel = spec.sentinel_path();
        if self.host.owner_name(&sentinel)?.as_deref() == Some(spec.user.as_str()) {
            return Ok(StepOutcome::Skipped(format!(
                "{} already owned by {}",
                sentinel.display(),
                spec.user
            )));
        }

        self.host
            .chown_recursive(&spec.install_path, &spec.user, &spec.group)?;
        Ok(StepOutcome::Done(format!(
            "{} owned by {}:{}",
            spec.install_path.display(),
            spec.user,
            spec.group
        )))
    }

    fn detail(&self, message: &str) {
        if self.ctx.verbose {
            output::detail(message);
        }
    }
}

fn changed_or_present(created: bool, what: String) -> StepOutcome {
    if created {
        StepOutcome::Done(format!("created {}", what))
    } else {
        StepOutcome::Skipped(format!("{} exists", what))
    }
}
