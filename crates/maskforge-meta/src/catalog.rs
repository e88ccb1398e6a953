//! Project catalog: where masks and combos live

use crate::paths::{self, SIDECAR_SUFFIX};
use crate::types::AssetKind;
use maskforge_core::{ForgeError, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// A content project rooted at a directory.
///
/// Masks are `*.fbx` files anywhere under the root; combos are `*.json`
/// files that have a metadata sidecar. Hidden directories are skipped.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

#[derive(Default)]
struct Scan {
    masks: Vec<PathBuf>,
    combos: Vec<PathBuf>,
}

impl Project {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All mask source files, sorted by path
    pub fn masks(&self) -> Result<Vec<PathBuf>> {
        Ok(self.scan()?.masks)
    }

    /// All combo files, sorted by path
    pub fn combos(&self) -> Result<Vec<PathBuf>> {
        Ok(self.scan()?.combos)
    }

    /// Masks first, then combos. Stable across runs.
    pub fn assets(&self) -> Result<Vec<PathBuf>> {
        let scan = self.scan()?;
        let mut all = scan.masks;
        all.extend(scan.combos);
        Ok(all)
    }

    /// Assets whose project-relative path contains `filter` (case-insensitive)
    pub fn matching(&self, filter: &str) -> Result<Vec<PathBuf>> {
        let needle = filter.trim().to_lowercase();
        let all = self.assets()?;
        if needle.is_empty() {
            return Ok(all);
        }
        Ok(all
            .into_iter()
            .filter(|p| self.reference_for(p).to_lowercase().contains(&needle))
            .collect())
    }

    /// Turn a stored project-relative reference into a path
    pub fn resolve_reference(&self, reference: &str) -> PathBuf {
        let relative = reference.trim().trim_start_matches("./");
        self.root.join(relative)
    }

    /// Project-relative, `/`-separated reference for a path under the root
    pub fn reference_for(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        relative
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Resolve an asset argument given relative to the root (or absolute)
    pub fn asset_path(&self, arg: &str) -> Result<PathBuf> {
        let path = Path::new(arg);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        if paths::asset_kind(&path).is_none() {
            return Err(ForgeError::invalid_field(
                "path",
                format!("{} is neither a mask (.fbx) nor a combo (.json)", arg),
            ));
        }
        Ok(path)
    }

    fn scan(&self) -> Result<Scan> {
        let mut scan = Scan::default();
        Self::scan_directory(&mut scan, &self.root)?;
        scan.masks.sort();
        scan.combos.sort();
        Ok(scan)
    }

    fn scan_directory(scan: &mut Scan, dir: &Path) -> Result<()> {
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir).map_err(|e| ForgeError::persistence(dir, e))? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();

            if path.is_dir() {
                if !name.starts_with('.') {
                    Self::scan_directory(scan, &path)?;
                }
            } else if paths::asset_kind(&path) == Some(AssetKind::Mask) {
                scan.masks.push(path);
            } else if name.to_ascii_lowercase().ends_with(&format!(".json{}", SIDECAR_SUFFIX)) {
                if let Some(asset) = paths::asset_for_sidecar(&path) {
                    scan.combos.push(asset);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("maskforge_catalog_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_masks_before_combos_sorted() {
        let dir = temp_dir();
        touch(&dir.join("masks/zebra.fbx"));
        touch(&dir.join("masks/ant.fbx"));
        touch(&dir.join("masks/ant.json"));
        touch(&dir.join("combos/duo.json.meta.toml"));
        touch(&dir.join(".svn/pristine/ghost.fbx"));

        let project = Project::new(&dir);
        let refs: Vec<String> = project
            .assets()
            .unwrap()
            .iter()
            .map(|p| project.reference_for(p))
            .collect();
        assert_eq!(refs, vec!["masks/ant.fbx", "masks/zebra.fbx", "combos/duo.json"]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_matching_filter() {
        let dir = temp_dir();
        touch(&dir.join("masks/FoxEars.fbx"));
        touch(&dir.join("masks/cat.fbx"));

        let project = Project::new(&dir);
        let found = project.matching("fox").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(project.matching("").unwrap().len(), 2);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_reference_roundtrip() {
        let project = Project::new("/work/art");
        let path = project.resolve_reference("./masks/fox.fbx");
        assert_eq!(path, PathBuf::from("/work/art/masks/fox.fbx"));
        assert_eq!(project.reference_for(&path), "masks/fox.fbx");
    }

    #[test]
    fn test_asset_path_rejects_other_files() {
        let project = Project::new("/work/art");
        assert!(project.asset_path("masks/fur.png").is_err());
        assert!(project.asset_path("masks/fox.fbx").is_ok());
    }

    #[test]
    fn test_missing_root_is_empty() {
        let project = Project::new(std::env::temp_dir().join("maskforge_does_not_exist_42"));
        assert!(project.assets().unwrap().is_empty());
    }
}
