//! CLI command implementations

pub mod addition;
pub mod build;
pub mod check;
pub mod combo;
pub mod meta;
pub mod release;
pub mod status;

use anyhow::{Context, Result};
use maskforge_meta::{MetadataStore, Project};
use maskforge_pipeline::ForgeConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything a command needs to know about the project it runs in
pub struct Workspace {
    pub project: Project,
    /// Shared with batch runs so sidecar writes use the same per-path locks
    pub store: Arc<MetadataStore>,
    pub config: ForgeConfig,
}

impl Workspace {
    pub fn open(root: &Path) -> Result<Self> {
        let config = ForgeConfig::load(root)
            .with_context(|| format!("loading configuration for {}", root.display()))?;
        Ok(Self {
            project: Project::new(root),
            store: Arc::new(MetadataStore::new()),
            config,
        })
    }

    /// Resolve an asset argument, failing early if it is neither kind
    pub fn asset(&self, arg: &str) -> Result<PathBuf> {
        Ok(self.project.asset_path(arg)?)
    }

    /// Project-relative display form of a path
    pub fn display(&self, path: &Path) -> String {
        self.project.reference_for(path)
    }
}
