//! Tarball extraction
//!
//! An [`ExtractionPlan`] describes how a Tomcat tarball lands in an install
//! tree: the `apache-tomcat-<version>/` wrapper directory is stripped and the
//! bundled webapps selected by [`Exclusions`] are skipped. Plans execute
//! natively through the `tar` and `flate2` crates; [`ExtractionPlan::command_line`]
//! renders the equivalent `tar` invocation for display.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};

use crate::core::config::{Exclusions, InstanceSpec};
use crate::core::error::ProvisionError;
use crate::helpers::internal::progress::{self, ProgressGuard};

/// Globs dropped by `exclude_examples`. The default ROOT webapp goes with the
/// examples.
pub const EXAMPLES_GLOBS: &[&str] = &["*webapps/examples*", "*webapps/ROOT*"];
pub const DOCS_GLOBS: &[&str] = &["*webapps/docs*"];
pub const MANAGER_GLOBS: &[&str] = &["*webapps/manager*"];
pub const HOST_MANAGER_GLOBS: &[&str] = &["*webapps/host-manager*"];

/// How to unpack one tarball into one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionPlan {
    pub archive: PathBuf,
    pub dest: PathBuf,
    /// Leading path components removed from every entry.
    pub strip_components: usize,
    /// Globs matched against full entry paths (before stripping).
    pub excludes: Vec<String>,
}

/// Counts from an executed plan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractSummary {
    pub extracted: usize,
    pub excluded: usize,
}

impl ExtractionPlan {
    /// Plan for unpacking `archive` into `dest`, skipping what `exclusions`
    /// selects.
    pub fn new(archive: impl Into<PathBuf>, dest: impl Into<PathBuf>, exclusions: &Exclusions) -> Self {
        let mut excludes = Vec::new();
        let groups = [
            (exclusions.examples, EXAMPLES_GLOBS),
            (exclusions.docs, DOCS_GLOBS),
            (exclusions.manager, MANAGER_GLOBS),
            (exclusions.host_manager, HOST_MANAGER_GLOBS),
        ];
        for (enabled, globs) in groups {
            if enabled {
                excludes.extend(globs.iter().map(|g| g.to_string()));
            }
        }

        Self {
            archive: archive.into(),
            dest: dest.into(),
            strip_components: 1,
            excludes,
        }
    }

    /// Plan for an instance's cached tarball and install path.
    pub fn for_instance(spec: &InstanceSpec, archive: impl Into<PathBuf>) -> Self {
        Self::new(archive, spec.install_path.clone(), &spec.exclusions)
    }

    /// The equivalent GNU tar command line.
    pub fn command_line(&self) -> String {
        let mut cmd = format!(
            "tar -xzf {} -C {} --strip-components={}",
            self.archive.display(),
            self.dest.display(),
            self.strip_components
        );
        for glob in &self.excludes {
            cmd.push_str(&format!(" --exclude='{}'", glob));
        }
        cmd
    }

    /// Unpack the archive according to the plan.
    pub fn execute(&self) -> Result<ExtractSummary, ProvisionError> {
        let patterns = self
            .excludes
            .iter()
            .map(|g| glob::Pattern::new(g))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| self.error(format!("invalid exclude pattern: {}", e)))?;

        std::fs::create_dir_all(&self.dest).map_err(|e| ProvisionError::io(&self.dest, e))?;

        let filename = self
            .archive
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "archive".to_string());
        let pb = progress::create_spinner(&format!("extracting {}", filename));
        let _guard = ProgressGuard::new(&pb);

        let file = File::open(&self.archive).map_err(|e| ProvisionError::io(&self.archive, e))?;
        let decoder = flate2::read::GzDecoder::new(BufReader::new(file));
        self.unpack(decoder, &patterns)
            .map_err(|reason| self.error(reason))
    }

    fn error(&self, reason: String) -> ProvisionError {
        ProvisionError::Extract {
            archive: self.archive.clone(),
            reason,
        }
    }

    fn unpack<R: Read>(
        &self,
        reader: R,
        patterns: &[glob::Pattern],
    ) -> Result<ExtractSummary, String> {
        let dest = self.dest.as_path();
        let mut archive = tar::Archive::new(reader);
        let mut summary = ExtractSummary::default();

        for entry in archive
            .entries()
            .map_err(|e| format!("tar read error: {}", e))?
        {
            let mut entry = entry.map_err(|e| format!("tar entry error: {}", e))?;
            let path = entry
                .path()
                .map_err(|e| format!("tar path error: {}", e))?
                .into_owned();

            // Reject paths that could escape the destination
            if path.is_absolute() || path.components().any(|c| c == Component::ParentDir) {
                return Err(format!("tar contains unsafe path: {}", path.display()));
            }

            let path_str = path.to_string_lossy();
            if patterns.iter().any(|p| p.matches(&path_str)) {
                summary.excluded += 1;
                continue;
            }

            // The wrapper directory itself strips to nothing
            let Some(rel) = strip_components(&path, self.strip_components) else {
                continue;
            };

            let full_path = dest.join(&rel);
            ensure_no_symlink_components(dest, &full_path)?;

            if let Some(parent) = full_path.parent() {
                if parent.starts_with(dest) {
                    ensure_no_symlink_components(dest, parent)?;
                }
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("cannot create directory {}: {}", parent.display(), e))?;
            }

            let entry_type = entry.header().entry_type();
            if entry_type == tar::EntryType::Symlink {
                let link_name = entry
                    .link_name()
                    .map_err(|e| format!("tar link_name error: {}", e))?
                    .ok_or_else(|| format!("tar contains symlink without target: {}", path.display()))?;
                let link_parent = full_path.parent().unwrap_or(dest);
                ensure_link_target_within_dest(dest, link_parent, &link_name)?;
            } else if entry_type == tar::EntryType::Link {
                // Hard link targets are archive paths and need the same stripping
                let link_name = entry
                    .link_name()
                    .map_err(|e| format!("tar link_name error: {}", e))?
                    .ok_or_else(|| format!("tar contains hardlink without target: {}", path.display()))?
                    .into_owned();
                if link_name.is_absolute() || link_name.components().any(|c| c == Component::ParentDir) {
                    return Err(format!(
                        "tar contains unsafe link target (escapes dest): {}",
                        link_name.display()
                    ));
                }
                let target = strip_components(&link_name, self.strip_components)
                    .map(|t| dest.join(t))
                    .ok_or_else(|| format!("tar contains unsafe link target: {}", link_name.display()))?;
                std::fs::hard_link(&target, &full_path)
                    .map_err(|e| format!("cannot link {}: {}", full_path.display(), e))?;
                summary.extracted += 1;
                continue;
            }

            entry
                .unpack(&full_path)
                .map_err(|e| format!("unpack error for {}: {}", path.display(), e))?;
            summary.extracted += 1;
        }

        Ok(summary)
    }
}

/// Drop the first `n` normal components; `None` when nothing is left.
fn strip_components(path: &Path, n: usize) -> Option<PathBuf> {
    let rel: PathBuf = path
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .skip(n)
        .collect();
    if rel.as_os_str().is_empty() {
        None
    } else {
        Some(rel)
    }
}

fn normalize_lexical(path: &Path) -> PathBuf {
    // Lexical normalization only; link targets are validated without
    // following symlinks.
    let mut out = PathBuf::new();
    let mut has_root = false;

    for c in path.components() {
        match c {
            Component::Prefix(p) => {
                out.clear();
                out.push(p.as_os_str());
                has_root = true;
            }
            Component::RootDir => {
                out.push(Component::RootDir.as_os_str());
                has_root = true;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = out
                    .components()
                    .next_back()
                    .is_some_and(|last| matches!(last, Component::Normal(_)));
                if popped {
                    out.pop();
                } else if !has_root {
                    out.push("..");
                }
            }
            Component::Normal(seg) => out.push(seg),
        }
    }

    out
}

fn ensure_no_symlink_components(dest: &Path, full_path: &Path) -> Result<(), String> {
    let rel = full_path
        .strip_prefix(dest)
        .map_err(|_| format!("tar contains path outside destination: {}", full_path.display()))?;

    // Writing through an existing symlink could land outside dest
    let mut cur = dest.to_path_buf();
    for comp in rel.components() {
        cur.push(comp);
        if let Ok(md) = std::fs::symlink_metadata(&cur)
            && md.file_type().is_symlink()
        {
            return Err(format!(
                "tar extraction blocked: symlink in path component: {}",
                cur.display()
            ));
        }
    }

    Ok(())
}

fn ensure_link_target_within_dest(
    dest: &Path,
    link_parent: &Path,
    link_name: &Path,
) -> Result<(), String> {
    if link_name.is_absolute()
        || link_name
            .components()
            .any(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
    {
        return Err(format!(
            "tar contains unsafe link target (absolute): {}",
            link_name.display()
        ));
    }

    let candidate = normalize_lexical(&link_parent.join(link_name));
    if candidate.strip_prefix(normalize_lexical(dest)).is_err() {
        return Err(format!(
            "tar contains unsafe link target (escapes dest): {} -> {}",
            link_parent.display(),
            link_name.display()
        ));
    }

    Ok(())
}
