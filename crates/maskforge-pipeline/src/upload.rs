//! Upload collaborator
//!
//! Every released asset is published under its uuid: the artifact as
//! `<uuid>.json` and the previews as `<uuid>.png`, `<uuid>.gif` and
//! `<uuid>.mp4`.

use crate::release::ReleaseItem;
use maskforge_core::{ForgeError, Result};
use maskforge_meta::paths::{self, PREVIEW_EXTENSIONS};
use std::fs;
use std::path::{Path, PathBuf};

pub trait Uploader: Send + Sync {
    fn upload(&self, local: &Path, remote_key: &str) -> Result<()>;
}

/// Publishes by copying into a local staging directory
#[derive(Debug, Clone)]
pub struct DirectoryUploader {
    target: PathBuf,
}

impl DirectoryUploader {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
        }
    }

    pub fn target(&self) -> &Path {
        &self.target
    }
}

impl Uploader for DirectoryUploader {
    fn upload(&self, local: &Path, remote_key: &str) -> Result<()> {
        if !local.is_file() {
            return Err(ForgeError::Upload(format!(
                "{} does not exist",
                local.display()
            )));
        }
        fs::create_dir_all(&self.target).map_err(|e| ForgeError::persistence(&self.target, e))?;
        let dest = self.target.join(remote_key);
        fs::copy(local, &dest).map_err(|e| {
            ForgeError::Upload(format!("copy {} -> {}: {}", local.display(), dest.display(), e))
        })?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPair {
    pub local: PathBuf,
    pub remote_key: String,
}

/// The four `(local, key)` pairs for each released asset, in release order
pub fn upload_plan(items: &[ReleaseItem]) -> Vec<UploadPair> {
    let mut plan = Vec::with_capacity(items.len() * 4);
    for item in items {
        let uuid = &item.entry.uuid;
        plan.push(UploadPair {
            local: item.artifact.clone(),
            remote_key: format!("{}.json", uuid),
        });
        for ext in PREVIEW_EXTENSIONS {
            plan.push(UploadPair {
                local: paths::preview_path(&item.artifact, ext),
                remote_key: format!("{}.{}", uuid, ext),
            });
        }
    }
    plan
}

#[derive(Debug, Default)]
pub struct UploadReport {
    pub uploaded: Vec<String>,
    pub failed: Vec<(String, String)>,
}

/// Upload every pair, carrying on past individual failures
pub fn upload_release(uploader: &dyn Uploader, plan: &[UploadPair]) -> UploadReport {
    let mut report = UploadReport::default();
    for pair in plan {
        match uploader.upload(&pair.local, &pair.remote_key) {
            Ok(()) => {
                tracing::info!(key = %pair.remote_key, "uploaded");
                report.uploaded.push(pair.remote_key.clone());
            }
            Err(e) => {
                tracing::warn!(key = %pair.remote_key, local = %pair.local.display(), error = %e, "upload failed");
                report.failed.push((pair.remote_key.clone(), e.to_string()));
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::release::ManifestEntry;
    use crate::testutil::temp_dir;

    fn item(dir: &Path, name: &str, uuid: &str) -> ReleaseItem {
        ReleaseItem {
            asset: dir.join(format!("{}.fbx", name)),
            artifact: dir.join(format!("{}.json", name)),
            entry: ManifestEntry {
                name: name.to_string(),
                uuid: uuid.to_string(),
                description: String::new(),
                author: String::new(),
                tags: String::new(),
                category: "eyes".to_string(),
                tier: 1,
                is_vip: false,
                is_intro: false,
                modtime: 0,
            },
        }
    }

    #[test]
    fn test_plan_keys() {
        let dir = Path::new("/art/masks");
        let plan = upload_plan(&[item(dir, "fox", "u-1")]);
        let keys: Vec<&str> = plan.iter().map(|p| p.remote_key.as_str()).collect();
        assert_eq!(keys, vec!["u-1.json", "u-1.png", "u-1.gif", "u-1.mp4"]);
        assert_eq!(plan[0].local, PathBuf::from("/art/masks/fox.json"));
        assert_eq!(plan[3].local, PathBuf::from("/art/masks/fox.mp4"));
    }

    #[test]
    fn test_combo_previews_sit_next_to_combo() {
        let dir = Path::new("/art/combos");
        let mut combo = item(dir, "duo", "u-2");
        combo.asset = combo.artifact.clone();
        let plan = upload_plan(&[combo]);
        assert_eq!(plan[1].local, PathBuf::from("/art/combos/duo.png"));
    }

    #[test]
    fn test_missing_file_does_not_stop_upload() {
        let dir = temp_dir("upload");
        fs::write(dir.join("fox.json"), b"{}").unwrap();
        fs::write(dir.join("fox.gif"), b"gif").unwrap();
        let stage = dir.join("stage");

        let plan = upload_plan(&[item(&dir, "fox", "u-1")]);
        let report = upload_release(&DirectoryUploader::new(&stage), &plan);

        assert_eq!(report.uploaded, vec!["u-1.json", "u-1.gif"]);
        assert_eq!(report.failed.len(), 2);
        assert!(stage.join("u-1.json").is_file());
        assert!(!stage.join("u-1.png").exists());

        fs::remove_dir_all(&dir).ok();
    }
}
