//! Dependency resolution
//!
//! Missing files are data, not errors: the resolver never fails, it reports
//! what it could not find by a name the user recognizes.

use maskforge_meta::{paths, AssetKind, AssetMetadata, Project};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencySet {
    /// Resolved paths that exist on disk
    pub present: BTreeSet<PathBuf>,
    /// Logical names (addition names, child references) that could not be found
    pub missing: BTreeSet<String>,
}

impl DependencySet {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Input files an asset's build reads, resolved to paths.
///
/// Each entry pairs a path with the logical name reported when it is absent.
pub(crate) fn declared_inputs(
    project: &Project,
    asset: &Path,
    metadata: &AssetMetadata,
) -> Vec<(PathBuf, String)> {
    match metadata.kind {
        AssetKind::Mask => {
            let base = asset.parent().unwrap_or_else(|| Path::new(""));
            metadata
                .additions
                .iter()
                .flat_map(|addition| {
                    let files = addition.referenced_files();
                    let single = files.len() == 1;
                    files.into_iter().map(move |file| {
                        let logical = if addition.name.trim().is_empty() {
                            file.clone()
                        } else if single {
                            addition.name.clone()
                        } else {
                            format!("{} ({})", addition.name, file)
                        };
                        (base.join(file.replace('\\', "/")), logical)
                    })
                })
                .collect()
        }
        AssetKind::Combo => metadata
            .masks
            .iter()
            .map(|reference| {
                let child = project.resolve_reference(reference);
                (paths::artifact_path(&child), reference.clone())
            })
            .collect(),
    }
}

/// Enumerate the files `asset` depends on and test each for existence.
pub fn resolve_dependencies(
    project: &Project,
    asset: &Path,
    metadata: &AssetMetadata,
) -> DependencySet {
    let mut deps = DependencySet::default();
    for (path, logical) in declared_inputs(project, asset, metadata) {
        if path.is_file() {
            deps.present.insert(path);
        } else {
            tracing::debug!(asset = %asset.display(), missing = %logical, "dependency not found");
            deps.missing.insert(logical);
        }
    }
    deps
}
