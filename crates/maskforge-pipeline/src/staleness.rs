//! Rebuild decisions from file modification times

use crate::deps::declared_inputs;
use maskforge_meta::{paths, AssetMetadata, MetadataStore, Project};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Why an asset needs rebuilding
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Staleness {
    ArtifactMissing,
    /// An input could not be found; assume stale so the build reports it
    InputMissing(PathBuf),
    InputNewer(PathBuf),
    /// Metadata could not be loaded, so the inputs are unknown
    MetadataUnavailable,
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Staleness::ArtifactMissing => write!(f, "artifact missing"),
            Staleness::InputMissing(p) => write!(f, "input missing: {}", p.display()),
            Staleness::InputNewer(p) => write!(f, "input newer than artifact: {}", p.display()),
            Staleness::MetadataUnavailable => write!(f, "metadata unavailable"),
        }
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Decide whether `asset` must be rebuilt, and why.
///
/// Inputs are the source file and its sidecar, plus every addition file
/// (masks) or every child mask's artifact (combos). An input with the same
/// timestamp as the artifact does not make it stale. When `metadata` is
/// `None` it is loaded from the sidecar.
pub fn staleness(
    project: &Project,
    asset: &Path,
    metadata: Option<&AssetMetadata>,
) -> Option<Staleness> {
    let loaded;
    let metadata = match metadata {
        Some(meta) => meta,
        None => match MetadataStore::new().load(asset) {
            Ok(meta) => {
                loaded = meta;
                &loaded
            }
            Err(_) => return Some(Staleness::MetadataUnavailable),
        },
    };

    let artifact = paths::artifact_path(asset);
    let Some(built) = modified(&artifact) else {
        return Some(Staleness::ArtifactMissing);
    };

    let mut inputs = vec![paths::sidecar_path(asset)];
    // A combo is its own artifact; comparing it with itself is meaningless.
    if artifact != asset {
        inputs.insert(0, asset.to_path_buf());
    }
    inputs.extend(
        declared_inputs(project, asset, metadata)
            .into_iter()
            .map(|(path, _)| path),
    );

    for input in inputs {
        match modified(&input) {
            None => return Some(Staleness::InputMissing(input)),
            Some(time) if time > built => return Some(Staleness::InputNewer(input)),
            Some(_) => {}
        }
    }
    None
}

pub fn needs_rebuild(project: &Project, asset: &Path, metadata: Option<&AssetMetadata>) -> bool {
    staleness(project, asset, metadata).is_some()
}
