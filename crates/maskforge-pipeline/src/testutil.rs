//! Shared fixtures for pipeline tests

use maskforge_meta::{AssetKind, AssetMetadata, MetadataStore};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

pub fn temp_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("maskforge_{}_{}", prefix, uuid::Uuid::new_v4()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// A fixed point in the past so tests control ordering explicitly
pub fn base_time() -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
}

pub fn at(offset_secs: u64) -> SystemTime {
    base_time() + Duration::from_secs(offset_secs)
}

pub fn set_mtime(path: &Path, time: SystemTime) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(time).unwrap();
}

/// Create (or overwrite) a file and stamp its modification time
pub fn write_at(path: &Path, contents: &str, time: SystemTime) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
    set_mtime(path, time);
}

/// Metadata with every critical and desired field filled in
pub fn good_metadata(kind: AssetKind, name: &str) -> AssetMetadata {
    let mut meta = AssetMetadata::new(kind);
    meta.set_field("name", name).unwrap();
    meta.set_field("description", &format!("{} description", name)).unwrap();
    meta.set_field("author", "Ana").unwrap();
    meta.set_field("tags", "fun").unwrap();
    meta.set_field("tier", "1").unwrap();
    if kind == AssetKind::Mask {
        meta.set_field("category", "Eyes").unwrap();
    }
    meta.set_field("license", "CC-BY").unwrap();
    meta.set_field("website", "https://example.com").unwrap();
    meta
}

/// Save metadata for `asset` and stamp the sidecar's modification time
pub fn save_at(store: &MetadataStore, asset: &Path, meta: &AssetMetadata, time: SystemTime) {
    store.save(asset, meta).unwrap();
    set_mtime(&maskforge_meta::paths::sidecar_path(asset), time);
}

/// Write an executable shell script to act as the build tool
#[cfg(unix)]
pub fn fake_tool(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-maskmaker.sh");
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}
