//! Release manifest assembly
//!
//! Only GOOD assets are released. Each one is projected onto a fixed field
//! set, normalized, and stamped with its artifact's modification time.
//! Entry order follows the input order, which callers take from
//! [`Project::assets`] (masks first, then combos, sorted by path).

use crate::aggregate::aggregate;
use crate::classify::classify;
use maskforge_core::{ForgeError, Result};
use maskforge_meta::{paths, AssetMetadata, MetadataStore, Project};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// One released asset as written to the manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub uuid: String,
    pub description: String,
    pub author: String,
    pub tags: String,
    pub category: String,
    pub tier: u8,
    pub is_vip: bool,
    pub is_intro: bool,
    /// Artifact modification time, seconds since the Unix epoch
    pub modtime: i64,
}

/// A manifest entry together with the files it was made from
#[derive(Debug, Clone)]
pub struct ReleaseItem {
    pub asset: PathBuf,
    pub artifact: PathBuf,
    pub entry: ManifestEntry,
}

fn strip_line_breaks(s: &str) -> String {
    s.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}

/// Split on commas, trim each token, drop empty ones, rejoin without spaces
fn tighten_list(s: &str) -> String {
    s.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

fn modtime(path: &Path) -> Option<i64> {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok()?;
    let secs = match modified.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    };
    Some(secs)
}

/// Project metadata onto the manifest field set and normalize it.
///
/// `derived` replaces tags and author (combos use their children's).
pub fn normalize_entry(
    metadata: &AssetMetadata,
    derived: Option<(&str, &str)>,
    modtime: i64,
) -> ManifestEntry {
    let (tags, author) = derived.unwrap_or((metadata.tags.as_str(), metadata.author.as_str()));
    let category = metadata
        .effective_category()
        .map(|c| c.as_str().to_lowercase())
        .unwrap_or_default();

    ManifestEntry {
        name: strip_line_breaks(&metadata.name).trim().to_string(),
        uuid: metadata.uuid().to_string(),
        description: strip_line_breaks(&metadata.description),
        author: tighten_list(&strip_line_breaks(author)),
        tags: tighten_list(&strip_line_breaks(tags).to_lowercase()),
        category,
        tier: metadata.tier.map(|t| t.get()).unwrap_or_default(),
        is_vip: metadata.is_vip,
        is_intro: metadata.is_intro,
        modtime,
    }
}

/// Select GOOD assets and build their manifest entries, in input order.
///
/// An asset whose artifact does not exist cannot be released and is skipped
/// with a warning.
pub fn prepare_release(
    project: &Project,
    store: &MetadataStore,
    assets: &[(PathBuf, AssetMetadata)],
) -> Vec<ReleaseItem> {
    let mut items = Vec::new();
    for (asset, metadata) in assets {
        let classification = classify(metadata);
        if !classification.is_good() {
            tracing::debug!(asset = %asset.display(), state = %classification.state, "not released");
            continue;
        }

        let artifact = paths::artifact_path(asset);
        let Some(modtime) = modtime(&artifact) else {
            tracing::warn!(asset = %asset.display(), artifact = %artifact.display(), "artifact missing, not released");
            continue;
        };

        let entry = if metadata.is_combo() {
            let view = aggregate(project, store, metadata);
            normalize_entry(metadata, Some((view.tags.as_str(), view.author.as_str())), modtime)
        } else {
            normalize_entry(metadata, None, modtime)
        };

        items.push(ReleaseItem {
            asset: asset.clone(),
            artifact,
            entry,
        });
    }
    items
}

pub fn build_manifest(
    project: &Project,
    store: &MetadataStore,
    assets: &[(PathBuf, AssetMetadata)],
) -> Vec<ManifestEntry> {
    prepare_release(project, store, assets)
        .into_iter()
        .map(|item| item.entry)
        .collect()
}

/// Every asset in the project with loadable metadata, in enumeration order
pub fn load_assets(
    project: &Project,
    store: &MetadataStore,
) -> Result<Vec<(PathBuf, AssetMetadata)>> {
    let mut assets = Vec::new();
    for asset in project.assets()? {
        match store.load(&asset) {
            Ok(meta) => assets.push((asset, meta)),
            Err(e) => tracing::debug!(asset = %asset.display(), error = %e, "skipping asset"),
        }
    }
    Ok(assets)
}

/// Write the manifest as a single JSON document
pub fn write_manifest(path: &Path, entries: &[ManifestEntry]) -> Result<()> {
    let content = serde_json::to_string_pretty(entries)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ForgeError::persistence(parent, e))?;
    }
    fs::write(path, content).map_err(|e| ForgeError::persistence(path, e))?;
    tracing::info!(path = %path.display(), entries = entries.len(), "wrote release manifest");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{at, good_metadata, temp_dir, write_at};
    use maskforge_meta::AssetKind;

    #[test]
    fn test_normalization() {
        let mut meta = good_metadata(AssetKind::Mask, "  Fox\r\n ");
        meta.tags = "Foo, Bar, ".to_string();
        meta.author = " Ana, Bo ".to_string();
        meta.description = "line one\nline two".to_string();
        meta.is_vip = true;

        let entry = normalize_entry(&meta, None, 42);
        assert_eq!(entry.tags, "foo,bar");
        assert_eq!(entry.category, "eyes");
        assert_eq!(entry.name, "Fox");
        assert_eq!(entry.author, "Ana,Bo");
        assert_eq!(entry.description, "line oneline two");
        assert_eq!(entry.tier, 1);
        assert!(entry.is_vip);
        assert_eq!(entry.modtime, 42);
        assert_eq!(entry.uuid, meta.uuid().to_string());
    }

    #[test]
    fn test_combo_category() {
        let meta = good_metadata(AssetKind::Combo, "Duo");
        assert_eq!(normalize_entry(&meta, Some(("a,b", "Ana")), 0).category, "combo");
    }

    #[test]
    fn test_field_order_in_json() {
        let entry = normalize_entry(&good_metadata(AssetKind::Mask, "Fox"), None, 7);
        let json = serde_json::to_string(&entry).unwrap();
        let keys = [
            "\"name\"", "\"uuid\"", "\"description\"", "\"author\"", "\"tags\"",
            "\"category\"", "\"tier\"", "\"is_vip\"", "\"is_intro\"", "\"modtime\"",
        ];
        let positions: Vec<usize> = keys.iter().map(|k| json.find(k).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_modtime_from_artifact() {
        let dir = temp_dir("release");
        let project = Project::new(&dir);
        let store = MetadataStore::new();
        let fox = dir.join("fox.fbx");
        write_at(&dir.join("fox.json"), "{}", at(25));

        let assets = vec![(fox, good_metadata(AssetKind::Mask, "Fox"))];
        let entries = build_manifest(&project, &store, &assets);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].modtime, 1_700_000_025);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_missing_artifact_not_released() {
        let dir = temp_dir("release");
        let project = Project::new(&dir);
        let store = MetadataStore::new();
        let assets = vec![(dir.join("fox.fbx"), good_metadata(AssetKind::Mask, "Fox"))];
        assert!(build_manifest(&project, &store, &assets).is_empty());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_end_to_end_manifest() {
        let dir = temp_dir("release");
        let project = Project::new(&dir);
        let store = MetadataStore::new();

        let mut fox = good_metadata(AssetKind::Mask, "Fox");
        fox.tags = "fox, ears".to_string();
        fox.author = "Ana".to_string();
        let mut cat = good_metadata(AssetKind::Mask, "Cat");
        cat.tags = "cat,ears".to_string();
        cat.author = "Bo".to_string();
        let mut owl = good_metadata(AssetKind::Mask, "Owl");
        owl.description.clear();

        for (name, meta) in [("fox", &fox), ("cat", &cat), ("owl", &owl)] {
            let source = dir.join(format!("masks/{}.fbx", name));
            write_at(&source, "fbx", at(0));
            store.save(&source, meta).unwrap();
            write_at(&dir.join(format!("masks/{}.json", name)), "{}", at(10));
        }

        let duo_path = dir.join("combos/duo.json");
        let mut duo = good_metadata(AssetKind::Combo, "Duo");
        duo.tags = "authored,tags".to_string();
        duo.author = "Nobody".to_string();
        duo.add_combo_mask("masks/fox.fbx").unwrap();
        duo.add_combo_mask("masks/cat.fbx").unwrap();
        store.save(&duo_path, &duo).unwrap();
        write_at(&duo_path, "{}", at(20));

        let assets = load_assets(&project, &store).unwrap();
        assert_eq!(assets.len(), 4);
        let items = prepare_release(&project, &store, &assets);
        let names: Vec<&str> = items.iter().map(|i| i.entry.name.as_str()).collect();
        assert_eq!(names, vec!["Cat", "Fox", "Duo"]);

        let combo = &items[2].entry;
        assert_eq!(combo.tags, "fox,ears,cat");
        assert_eq!(combo.author, "Ana,Bo");
        assert_eq!(combo.category, "combo");
        assert_eq!(items[2].artifact, duo_path);

        let manifest = dir.join("release/manifest.json");
        let entries: Vec<ManifestEntry> = items.into_iter().map(|i| i.entry).collect();
        write_manifest(&manifest, &entries).unwrap();
        let read_back: Vec<ManifestEntry> =
            serde_json::from_str(&fs::read_to_string(&manifest).unwrap()).unwrap();
        assert_eq!(read_back, entries);

        fs::remove_dir_all(&dir).ok();
    }
}
