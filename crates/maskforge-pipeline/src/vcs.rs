//! Version-control collaborator
//!
//! The pipeline needs exactly two things from version control: whether the
//! working copy is behind, and registering files the build produced.

use crate::build::{locate_binary, BuildOutcome};
use crate::config::{ForgeConfig, VcsBackend};
use maskforge_core::{ForgeError, Result};
use maskforge_meta::paths::{self, PREVIEW_EXTENSIONS};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

pub trait VersionControl: Send + Sync {
    /// Whether the working copy has incoming changes. Callers throttle this.
    fn needs_update(&self) -> Result<bool>;

    /// Put a file under version control. Already-tracked files are fine.
    fn add_file(&self, path: &Path) -> Result<()>;
}

/// For projects that are not under version control
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVcs;

impl VersionControl for NoVcs {
    fn needs_update(&self) -> Result<bool> {
        Ok(false)
    }

    fn add_file(&self, _path: &Path) -> Result<()> {
        Ok(())
    }
}

/// Subversion through the `svn` command line client
#[derive(Debug, Clone)]
pub struct SvnClient {
    binary: PathBuf,
    working_copy: PathBuf,
}

impl SvnClient {
    pub fn new(binary: impl Into<PathBuf>, working_copy: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            working_copy: working_copy.into(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn is_available(&self) -> bool {
        locate_binary(&self.binary).is_some()
    }

    fn svn(&self, args: &[&std::ffi::OsStr]) -> Result<String> {
        let output = Command::new(&self.binary)
            .args(args)
            .current_dir(&self.working_copy)
            .output()
            .map_err(|e| ForgeError::Vcs(format!("failed to run {}: {}", self.binary.display(), e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ForgeError::Vcs(format!(
                "svn {} failed: {}",
                args.first().map(|a| a.to_string_lossy()).unwrap_or_default(),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// True when any `svn status -u` line carries the out-of-date marker
/// (`*` in the ninth column).
fn status_has_incoming(status: &str) -> bool {
    status
        .lines()
        .any(|line| line.as_bytes().get(8) == Some(&b'*'))
}

impl VersionControl for SvnClient {
    fn needs_update(&self) -> Result<bool> {
        let status = self.svn(&["status".as_ref(), "-u".as_ref(), "-q".as_ref()])?;
        Ok(status_has_incoming(&status))
    }

    fn add_file(&self, path: &Path) -> Result<()> {
        self.svn(&[
            "add".as_ref(),
            "--parents".as_ref(),
            "--force".as_ref(),
            "-q".as_ref(),
            path.as_os_str(),
        ])?;
        tracing::debug!(path = %path.display(), "added to svn");
        Ok(())
    }
}

/// Version control selected by configuration
pub fn from_config(config: &ForgeConfig, root: &Path) -> Arc<dyn VersionControl> {
    match config.vcs.backend {
        VcsBackend::Svn => Arc::new(SvnClient::new(&config.vcs.binary, root)),
        VcsBackend::None => Arc::new(NoVcs),
    }
}

/// Files to register after a successful build: the source, the artifact,
/// any previews and every dependency that was found.
pub fn build_outputs(outcome: &BuildOutcome) -> Vec<PathBuf> {
    let asset = &outcome.asset;
    let mut files = vec![asset.clone(), paths::sidecar_path(asset)];
    let artifact = paths::artifact_path(asset);
    if artifact != *asset {
        files.push(artifact);
    }
    files.extend(
        PREVIEW_EXTENSIONS
            .iter()
            .map(|ext| paths::preview_path(asset, ext)),
    );
    files.extend(outcome.deps.present.iter().cloned());
    files.retain(|f| f.is_file());
    files
}

/// Register a build's outputs. Failures are logged, never propagated.
pub fn track_build_outputs(vcs: &dyn VersionControl, outcome: &BuildOutcome) {
    for file in build_outputs(outcome) {
        if let Err(e) = vcs.add_file(&file) {
            tracing::warn!(path = %file.display(), error = %e, "could not add file to version control");
        }
    }
}
