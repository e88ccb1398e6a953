//! Metadata sidecar store

use crate::paths;
use crate::types::{AssetMetadata, MetadataFile};
use maskforge_core::{ForgeError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Loads, creates and saves `.meta.toml` sidecars.
///
/// Writes to the same sidecar are serialized through a per-path lock, so a
/// store can be shared across concurrent builds and edits. Different assets
/// never share a sidecar and never contend.
#[derive(Debug, Default)]
pub struct MetadataStore {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl MetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, sidecar: &Path) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(sidecar.to_path_buf())
            .or_default()
            .clone()
    }

    /// Load an asset's metadata. Fails with `MetadataNotFound` when the
    /// sidecar does not exist.
    pub fn load(&self, asset: &Path) -> Result<AssetMetadata> {
        let sidecar = paths::sidecar_path(asset);
        match Self::read(asset, &sidecar)? {
            Some(meta) => Ok(meta),
            None => Err(ForgeError::MetadataNotFound(asset.to_path_buf())),
        }
    }

    /// Load an asset's metadata, writing defaulted metadata with a fresh
    /// uuid alongside the source file if none exists yet.
    pub fn create_or_load(&self, asset: &Path) -> Result<AssetMetadata> {
        let sidecar = paths::sidecar_path(asset);
        let lock = self.lock_for(&sidecar);
        let _guard = lock.lock();

        if let Some(mut meta) = Self::read(asset, &sidecar)? {
            if meta.ensure_identity() {
                tracing::info!(asset = %asset.display(), uuid = %meta.uuid(), "assigned missing uuid");
                Self::write(&sidecar, &meta)?;
            }
            return Ok(meta);
        }

        let kind = paths::asset_kind(asset).ok_or_else(|| {
            ForgeError::invalid_field(
                "path",
                format!("{} is neither a mask nor a combo", asset.display()),
            )
        })?;
        let meta = AssetMetadata::new(kind);
        tracing::info!(asset = %asset.display(), uuid = %meta.uuid(), "created metadata");
        Self::write(&sidecar, &meta)?;
        Ok(meta)
    }

    /// Persist `metadata` only when it differs from what is on disk.
    ///
    /// Returns whether a write happened. Saving metadata whose uuid differs
    /// from the one already on disk is rejected with `Identity`.
    pub fn save(&self, asset: &Path, metadata: &AssetMetadata) -> Result<bool> {
        let sidecar = paths::sidecar_path(asset);
        let lock = self.lock_for(&sidecar);
        let _guard = lock.lock();

        if metadata.uuid().is_empty() {
            return Err(ForgeError::Identity(format!(
                "refusing to save {} without a uuid",
                asset.display()
            )));
        }

        if let Some(on_disk) = Self::read(asset, &sidecar)? {
            if !on_disk.uuid().is_empty() && on_disk.uuid() != metadata.uuid() {
                return Err(ForgeError::Identity(format!(
                    "{} has uuid {}, refusing to overwrite with {}",
                    asset.display(),
                    on_disk.uuid(),
                    metadata.uuid()
                )));
            }
            if &on_disk == metadata {
                tracing::debug!(asset = %asset.display(), "metadata unchanged, not saving");
                return Ok(false);
            }
        }

        Self::write(&sidecar, metadata)?;
        tracing::info!(sidecar = %sidecar.display(), "saved metadata");
        Ok(true)
    }

    fn read(asset: &Path, sidecar: &Path) -> Result<Option<AssetMetadata>> {
        let content = match fs::read_to_string(sidecar) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ForgeError::persistence(sidecar, e)),
        };
        let file: MetadataFile = toml::from_str(&content).map_err(|e| {
            ForgeError::TomlParseError(format!("Failed to parse {}: {}", sidecar.display(), e))
        })?;

        let mut meta = file.metadata;
        // The source path decides what the asset is.
        if let Some(kind) = paths::asset_kind(asset) {
            meta.kind = kind;
        }
        Ok(Some(meta))
    }

    fn write(sidecar: &Path, metadata: &AssetMetadata) -> Result<()> {
        #[derive(serde::Serialize)]
        struct Sidecar<'a> {
            metadata: &'a AssetMetadata,
        }

        let content = toml::to_string_pretty(&Sidecar { metadata })?;
        if let Some(parent) = sidecar.parent() {
            fs::create_dir_all(parent).map_err(|e| ForgeError::persistence(parent, e))?;
        }
        fs::write(sidecar, content).map_err(|e| ForgeError::persistence(sidecar, e))
    }
}
