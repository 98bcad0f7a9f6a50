//! tomcat-provision - set up isolated Tomcat instances
//!
//! Usage:
//!   tomcat-provision install [instance]            Provision an instance
//!   tomcat-provision plan [instance]               Show what install would do
//!   tomcat-provision verify <file> --checksum-uri  Check a tarball against a mirror checksum

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use tomcat_provision::executor::default_cache_dir;
use tomcat_provision::helpers::acquire::{self, ArtifactVerifier, ChecksumFetcher};
use tomcat_provision::helpers::build::ExtractionPlan;
use tomcat_provision::{output, Context, InstanceSpec, InstanceToml, Provisioner};

#[derive(Parser)]
#[command(name = "tomcat-provision")]
#[command(about = "Provision isolated Apache Tomcat instances from verified mirror tarballs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory for downloaded tarballs
    #[arg(long, global = true, env = "TOMCAT_PROVISION_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Print URIs, digests and commands as steps run
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision an instance
    Install {
        #[command(flatten)]
        instance: InstanceArgs,
    },

    /// Show the resolved instance without changing anything
    Plan {
        #[command(flatten)]
        instance: InstanceArgs,
    },

    /// Verify a local tarball against a remote checksum document
    Verify {
        /// File to verify (renamed to <file>.bad on mismatch)
        file: PathBuf,

        /// URI of the checksum document
        #[arg(long)]
        checksum_uri: String,

        /// Verify TLS certificates when fetching the checksum
        #[arg(long)]
        strict_tls: bool,
    },
}

/// Per-instance settings. Flags win over values from `--config`.
#[derive(Args)]
struct InstanceArgs {
    /// Instance name (may instead come from the config file)
    instance: Option<String>,

    /// Instance definition file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Tomcat version, X.Y.Z
    #[arg(long)]
    version_string: Option<String>,

    #[arg(long)]
    install_path: Option<PathBuf>,

    #[arg(long)]
    tarball_base_path: Option<String>,

    #[arg(long)]
    checksum_base_path: Option<String>,

    /// Deprecated alias for --checksum-base-path
    #[arg(long, hide = true)]
    sha1_base_path: Option<String>,

    /// Explicit tarball URI; the checksum is expected at <uri>.md5
    #[arg(long)]
    tarball_uri: Option<String>,

    #[arg(long)]
    user: Option<String>,

    #[arg(long)]
    group: Option<String>,

    /// Stable symlink pointing at the install path
    #[arg(long)]
    link_path: Option<PathBuf>,

    #[arg(long, value_name = "BOOL")]
    exclude_examples: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    exclude_docs: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    exclude_manager: Option<bool>,

    #[arg(long, value_name = "BOOL")]
    exclude_hostmanager: Option<bool>,

    /// Verify TLS certificates when fetching checksums
    #[arg(long)]
    strict_tls: bool,
}

impl InstanceArgs {
    /// Resolve flags and the optional config file into a spec.
    fn resolve(self) -> Result<InstanceSpec> {
        let file = match &self.config {
            Some(path) => InstanceToml::load(path)
                .with_context(|| format!("Failed to load instance file {}", path.display()))?,
            None => InstanceToml::default(),
        };

        let flags = InstanceToml {
            instance_name: self.instance,
            version: self.version_string,
            install_path: self.install_path,
            tarball_base_path: self.tarball_base_path,
            checksum_base_path: self.checksum_base_path,
            sha1_base_path: self.sha1_base_path,
            tarball_uri: self.tarball_uri,
            exclude_examples: self.exclude_examples,
            exclude_docs: self.exclude_docs,
            exclude_manager: self.exclude_manager,
            exclude_hostmanager: self.exclude_hostmanager,
            tomcat_user: self.user,
            tomcat_group: self.group,
            link_path: self.link_path,
            insecure_skip_verify: self.strict_tls.then_some(false),
        };

        // Flags are layered first so they take precedence over the file
        let spec = InstanceSpec::builder("")
            .with_file_defaults(flags)
            .with_file_defaults(file)
            .build()?;
        Ok(spec)
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            output::error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let ctx = Context::with_cache_dir(cli.cache_dir.unwrap_or_else(default_cache_dir))
        .verbose(cli.verbose);

    match cli.command {
        Commands::Install { instance } => {
            let spec = instance.resolve()?;
            // The provisioner has already reported the failing step
            if Provisioner::system(ctx).run(&spec).is_err() {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Plan { instance } => {
            let spec = instance.resolve()?;
            let cache_path = ctx.cache_path(&spec);
            let plan = ExtractionPlan::for_instance(&spec, &cache_path);

            output::action(&format!("Instance '{}'", spec.instance_name));
            output::field("version", &spec.version);
            output::field("tarball", &acquire::tarball_uri(&spec));
            output::field("checksum", &acquire::checksum_uri(&spec));
            output::field("cache", &cache_path.display().to_string());
            output::field("install", &spec.install_path.display().to_string());
            output::field("link", &spec.link_path.display().to_string());
            output::field("user", &spec.user);
            output::field("group", &spec.group);
            output::field(
                "tls",
                if spec.insecure_skip_verify {
                    "checksum certificates not verified"
                } else {
                    "strict"
                },
            );
            output::field("extract", &plan.command_line());
        }

        Commands::Verify {
            file,
            checksum_uri,
            strict_tls,
        } => {
            let fetcher = ChecksumFetcher::new(!strict_tls)?;
            match ArtifactVerifier::new(&fetcher).verify(&file, &checksum_uri) {
                Ok(digest) => output::success(&format!("{} md5 {}", file.display(), digest)),
                Err(e) => {
                    output::error(&e.to_string());
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}
