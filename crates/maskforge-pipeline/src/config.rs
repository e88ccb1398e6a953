//! Layered configuration system
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `MASKFORGE_TOOL`, `MASKFORGE_WORKERS`,
//!    `MASKFORGE_TIMEOUT_SECS`, `MASKFORGE_VCS`
//! 2. Project-local: `<root>/.maskforge/config.toml`
//! 3. Global: `~/.maskforge/config.toml`

use crate::build::BuildSettings;
use maskforge_core::{ForgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_TOOL: &str = "maskmaker";
const DEFAULT_WORKERS: usize = 4;
const DEFAULT_TIMEOUT_SECS: u64 = 300;
const DEFAULT_SVN: &str = "svn";
const DEFAULT_MANIFEST: &str = "release/manifest.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsBackend {
    Svn,
    #[default]
    None,
}

impl VcsBackend {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svn" => Some(VcsBackend::Svn),
            "none" | "" => Some(VcsBackend::None),
            _ => None,
        }
    }
}

/// `[build]` section as written in a config file; unset keys fall through
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildSection {
    #[serde(default)]
    pub tool: Option<PathBuf>,
    #[serde(default)]
    pub extra_args: Option<Vec<String>>,
    #[serde(default)]
    pub workers: Option<usize>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VcsSection {
    #[serde(default)]
    pub backend: Option<VcsBackend>,
    #[serde(default)]
    pub binary: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReleaseSection {
    #[serde(default)]
    pub manifest: Option<PathBuf>,
    #[serde(default)]
    pub stage_dir: Option<PathBuf>,
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForgeConfigFile {
    #[serde(default)]
    pub build: BuildSection,
    #[serde(default)]
    pub vcs: VcsSection,
    #[serde(default)]
    pub release: ReleaseSection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    pub tool: PathBuf,
    pub extra_args: Vec<String>,
    pub workers: usize,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VcsConfig {
    pub backend: VcsBackend,
    pub binary: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseConfig {
    /// Relative paths are resolved against the project root
    pub manifest: PathBuf,
    pub stage_dir: Option<PathBuf>,
}

/// Resolved configuration with environment variable overrides applied
#[derive(Debug, Clone, PartialEq)]
pub struct ForgeConfig {
    pub build: BuildConfig,
    pub vcs: VcsConfig,
    pub release: ReleaseConfig,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self::resolve(ForgeConfigFile::default())
    }
}

impl ForgeConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load(root: &Path) -> Result<Self> {
        let mut config = ForgeConfigFile::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                Self::merge_into(&mut config, global);
            }
        }

        let local_path = Self::project_config_path(root);
        if local_path.exists() {
            let local = Self::load_file(&local_path)?;
            Self::merge_into(&mut config, local);
        }

        Self::apply_env_with(&mut config, |key| std::env::var(key).ok())?;
        Ok(Self::resolve(config))
    }

    /// Load config from a specific file path only (for testing)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        Self::apply_env_with(&mut config, |key| std::env::var(key).ok())?;
        Ok(Self::resolve(config))
    }

    pub fn project_config_path(root: &Path) -> PathBuf {
        root.join(".maskforge").join("config.toml")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.build.timeout_secs)
    }

    pub fn build_settings(&self) -> BuildSettings {
        BuildSettings {
            tool: self.build.tool.clone(),
            extra_args: self.build.extra_args.clone(),
            timeout: self.timeout(),
        }
    }

    /// Where the manifest is written for a project
    pub fn manifest_path(&self, root: &Path) -> PathBuf {
        root.join(&self.release.manifest)
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".maskforge").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<ForgeConfigFile> {
        let content = std::fs::read_to_string(path).map_err(|e| ForgeError::persistence(path, e))?;
        let config: ForgeConfigFile = toml::from_str(&content).map_err(|e| {
            ForgeError::Config(format!("Failed to parse config {}: {}", path.display(), e))
        })?;
        Ok(config)
    }

    fn merge_into(base: &mut ForgeConfigFile, overlay: ForgeConfigFile) {
        let ForgeConfigFile {
            build,
            vcs,
            release,
        } = overlay;

        if build.tool.is_some() {
            base.build.tool = build.tool;
        }
        if build.extra_args.is_some() {
            base.build.extra_args = build.extra_args;
        }
        if build.workers.is_some() {
            base.build.workers = build.workers;
        }
        if build.timeout_secs.is_some() {
            base.build.timeout_secs = build.timeout_secs;
        }
        if vcs.backend.is_some() {
            base.vcs.backend = vcs.backend;
        }
        if vcs.binary.is_some() {
            base.vcs.binary = vcs.binary;
        }
        if release.manifest.is_some() {
            base.release.manifest = release.manifest;
        }
        if release.stage_dir.is_some() {
            base.release.stage_dir = release.stage_dir;
        }
    }

    fn apply_env_with<F>(config: &mut ForgeConfigFile, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(tool) = lookup("MASKFORGE_TOOL") {
            config.build.tool = Some(PathBuf::from(tool));
        }
        if let Some(workers) = lookup("MASKFORGE_WORKERS") {
            let n = workers.trim().parse::<usize>().map_err(|_| {
                ForgeError::Config(format!("MASKFORGE_WORKERS must be a number, got {:?}", workers))
            })?;
            config.build.workers = Some(n);
        }
        if let Some(secs) = lookup("MASKFORGE_TIMEOUT_SECS") {
            let n = secs.trim().parse::<u64>().map_err(|_| {
                ForgeError::Config(format!("MASKFORGE_TIMEOUT_SECS must be a number, got {:?}", secs))
            })?;
            config.build.timeout_secs = Some(n);
        }
        if let Some(backend) = lookup("MASKFORGE_VCS") {
            let parsed = VcsBackend::parse(&backend).ok_or_else(|| {
                ForgeError::Config(format!("MASKFORGE_VCS must be svn or none, got {:?}", backend))
            })?;
            config.vcs.backend = Some(parsed);
        }
        Ok(())
    }

    fn resolve(file: ForgeConfigFile) -> Self {
        Self {
            build: BuildConfig {
                tool: file.build.tool.unwrap_or_else(|| PathBuf::from(DEFAULT_TOOL)),
                extra_args: file.build.extra_args.unwrap_or_default(),
                workers: file.build.workers.unwrap_or(DEFAULT_WORKERS).max(1),
                timeout_secs: file.build.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            },
            vcs: VcsConfig {
                backend: file.vcs.backend.unwrap_or_default(),
                binary: file.vcs.binary.unwrap_or_else(|| PathBuf::from(DEFAULT_SVN)),
            },
            release: ReleaseConfig {
                manifest: file
                    .release
                    .manifest
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST)),
                stage_dir: file.release.stage_dir,
            },
        }
    }
}
