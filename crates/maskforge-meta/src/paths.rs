//! On-disk naming conventions
//!
//! - mask source `fox.fbx`, sidecar `fox.fbx.meta.toml`, artifact `fox.json`
//! - combo `duo.json`, sidecar `duo.json.meta.toml`, artifact `duo.json`
//! - previews are siblings with `.png`, `.gif` and `.mp4` extensions

use crate::types::AssetKind;
use std::path::{Path, PathBuf};

pub const SIDECAR_SUFFIX: &str = ".meta.toml";

/// Preview extensions produced by the build tool, in upload order
pub const PREVIEW_EXTENSIONS: [&str; 3] = ["png", "gif", "mp4"];

/// Kind implied by a source path's extension
pub fn asset_kind(path: &Path) -> Option<AssetKind> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "fbx" => Some(AssetKind::Mask),
        "json" => Some(AssetKind::Combo),
        _ => None,
    }
}

/// Sidecar path for an asset: the file name with `.meta.toml` appended
pub fn sidecar_path(asset: &Path) -> PathBuf {
    let mut name = asset
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(SIDECAR_SUFFIX);
    asset.with_file_name(name)
}

/// Asset path for a sidecar, if the name carries the sidecar suffix
pub fn asset_for_sidecar(sidecar: &Path) -> Option<PathBuf> {
    let name = sidecar.file_name()?.to_str()?;
    let stem = name.strip_suffix(SIDECAR_SUFFIX)?;
    if stem.is_empty() {
        return None;
    }
    Some(sidecar.with_file_name(stem))
}

/// Primary build artifact. A combo file is its own artifact.
pub fn artifact_path(asset: &Path) -> PathBuf {
    match asset_kind(asset) {
        Some(AssetKind::Combo) => asset.to_path_buf(),
        _ => asset.with_extension("json"),
    }
}

/// Sibling preview file with the given extension
pub fn preview_path(asset: &Path, ext: &str) -> PathBuf {
    asset.with_extension(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(asset_kind(Path::new("m/fox.FBX")), Some(AssetKind::Mask));
        assert_eq!(asset_kind(Path::new("duo.json")), Some(AssetKind::Combo));
        assert_eq!(asset_kind(Path::new("fur.png")), None);
    }

    #[test]
    fn test_sidecar_roundtrip() {
        let sidecar = sidecar_path(Path::new("masks/fox.fbx"));
        assert_eq!(sidecar, PathBuf::from("masks/fox.fbx.meta.toml"));
        assert_eq!(asset_for_sidecar(&sidecar), Some(PathBuf::from("masks/fox.fbx")));
        assert_eq!(asset_for_sidecar(Path::new("masks/fox.fbx")), None);
    }

    #[test]
    fn test_artifacts() {
        assert_eq!(artifact_path(Path::new("masks/fox.fbx")), PathBuf::from("masks/fox.json"));
        assert_eq!(artifact_path(Path::new("combos/duo.json")), PathBuf::from("combos/duo.json"));
        assert_eq!(preview_path(Path::new("masks/fox.fbx"), "gif"), PathBuf::from("masks/fox.gif"));
    }
}
