//! Release-readiness classification
//!
//! Pure and deterministic: the same metadata snapshot always yields the same
//! classification, and nothing is read or written while computing it.

use maskforge_meta::schema::{self, Requirement};
use maskforge_meta::{AssetKind, AssetMetadata, MetadataStore, MAX_COMBO_MASKS};
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// Release readiness, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReleaseState {
    Error,
    NoRelease,
    WithPlugin,
    Warning,
    Good,
}

impl fmt::Display for ReleaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReleaseState::Good => "GOOD",
            ReleaseState::Error => "ERROR",
            ReleaseState::Warning => "WARNING",
            ReleaseState::NoRelease => "NORELEASE",
            ReleaseState::WithPlugin => "WITHPLUGIN",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MaskKind {
    /// Metadata could not be loaded
    Unknown,
    Normal,
    Morph,
}

impl fmt::Display for MaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MaskKind::Unknown => "UNKNOWN",
            MaskKind::Normal => "NORMAL",
            MaskKind::Morph => "MORPH",
        };
        f.write_str(s)
    }
}

/// Why an asset is not GOOD. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub field: String,
    pub requirement: IssueLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueLevel {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub state: ReleaseState,
    pub kind: MaskKind,
    pub issues: Vec<ValidationIssue>,
}

impl Classification {
    pub fn is_good(&self) -> bool {
        self.state == ReleaseState::Good
    }

    fn unknown(message: String) -> Self {
        Self {
            state: ReleaseState::Error,
            kind: MaskKind::Unknown,
            issues: vec![ValidationIssue {
                field: "metadata".to_string(),
                requirement: IssueLevel::Error,
                message,
            }],
        }
    }
}

/// Classify a metadata snapshot.
///
/// First match wins: a missing critical field is ERROR, then
/// `do_not_release` is NORELEASE, then `release_with_plugin` is WITHPLUGIN,
/// then a missing desired field is WARNING, otherwise GOOD.
pub fn classify(metadata: &AssetMetadata) -> Classification {
    let mut issues = Vec::new();

    for spec in schema::fields_for(metadata.kind) {
        if !metadata.is_field_empty(spec.name) {
            continue;
        }
        let level = match spec.requirement {
            Requirement::Critical => IssueLevel::Error,
            Requirement::Desired => IssueLevel::Warning,
            Requirement::Optional => continue,
        };
        issues.push(ValidationIssue {
            field: spec.name.to_string(),
            requirement: level,
            message: format!("{} is empty", spec.label),
        });
    }

    if metadata.kind == AssetKind::Combo && metadata.masks.len() > MAX_COMBO_MASKS {
        issues.push(ValidationIssue {
            field: "masks".to_string(),
            requirement: IssueLevel::Error,
            message: format!(
                "combo references {} masks, at most {} allowed",
                metadata.masks.len(),
                MAX_COMBO_MASKS
            ),
        });
    }

    let has_error = issues.iter().any(|i| i.requirement == IssueLevel::Error);
    let has_warning = issues.iter().any(|i| i.requirement == IssueLevel::Warning);

    let state = if has_error {
        ReleaseState::Error
    } else if metadata.do_not_release {
        ReleaseState::NoRelease
    } else if metadata.release_with_plugin {
        ReleaseState::WithPlugin
    } else if has_warning {
        ReleaseState::Warning
    } else {
        ReleaseState::Good
    };

    let kind = match metadata.kind {
        AssetKind::Mask if metadata.is_morph => MaskKind::Morph,
        _ => MaskKind::Normal,
    };

    Classification {
        state,
        kind,
        issues,
    }
}

/// Classify an asset on disk. Unloadable metadata is ERROR with kind UNKNOWN.
pub fn classify_asset(store: &MetadataStore, asset: &Path) -> Classification {
    match store.load(asset) {
        Ok(meta) => classify(&meta),
        Err(e) => Classification::unknown(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{good_metadata, temp_dir};

    const CRITICAL_MASK: [&str; 6] = ["name", "description", "author", "tags", "category", "tier"];

    #[test]
    fn test_fully_populated_is_good() {
        for kind in [AssetKind::Mask, AssetKind::Combo] {
            let result = classify(&good_metadata(kind, "Fox"));
            assert_eq!(result.state, ReleaseState::Good, "{:?}", kind);
            assert!(result.issues.is_empty());
        }
    }

    #[test]
    fn test_any_missing_critical_is_error_regardless_of_flags() {
        for field in CRITICAL_MASK {
            for (dnr, plugin, license) in [
                (false, false, "CC-BY"),
                (true, false, "CC-BY"),
                (false, true, "CC-BY"),
                (true, true, ""),
            ] {
                let mut meta = good_metadata(AssetKind::Mask, "Fox");
                meta.set_field(field, "").unwrap();
                meta.do_not_release = dnr;
                meta.release_with_plugin = plugin;
                meta.license = license.to_string();
                assert_eq!(classify(&meta).state, ReleaseState::Error, "field {}", field);
            }
        }
    }

    #[test]
    fn test_whitespace_only_counts_as_empty() {
        let mut meta = good_metadata(AssetKind::Mask, "Fox");
        meta.author = "   ".to_string();
        assert_eq!(classify(&meta).state, ReleaseState::Error);
    }

    #[test]
    fn test_precedence_after_error() {
        let mut meta = good_metadata(AssetKind::Mask, "Fox");
        meta.website.clear();
        assert_eq!(classify(&meta).state, ReleaseState::Warning);

        meta.release_with_plugin = true;
        assert_eq!(classify(&meta).state, ReleaseState::WithPlugin);

        meta.do_not_release = true;
        assert_eq!(classify(&meta).state, ReleaseState::NoRelease);
    }

    #[test]
    fn test_combo_has_no_category_requirement() {
        let meta = good_metadata(AssetKind::Combo, "Duo");
        assert!(meta.category.is_none());
        assert_eq!(classify(&meta).state, ReleaseState::Good);
    }

    #[test]
    fn test_combo_over_capacity_is_error() {
        let mut meta = good_metadata(AssetKind::Combo, "Crowd");
        meta.masks = (0..11).map(|i| format!("masks/m{}.fbx", i)).collect();
        let result = classify(&meta);
        assert_eq!(result.state, ReleaseState::Error);
        assert!(result.issues.iter().any(|i| i.field == "masks"));
    }

    #[test]
    fn test_kind() {
        let mut meta = good_metadata(AssetKind::Mask, "Fox");
        assert_eq!(classify(&meta).kind, MaskKind::Normal);
        meta.is_morph = true;
        assert_eq!(classify(&meta).kind, MaskKind::Morph);

        let mut combo = good_metadata(AssetKind::Combo, "Duo");
        combo.is_morph = true;
        assert_eq!(classify(&combo).kind, MaskKind::Normal);
    }

    #[test]
    fn test_unloadable_is_unknown() {
        let dir = temp_dir("classify");
        let store = MetadataStore::new();
        let result = classify_asset(&store, &dir.join("ghost.fbx"));
        assert_eq!(result.state, ReleaseState::Error);
        assert_eq!(result.kind, MaskKind::Unknown);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_deterministic() {
        let mut meta = good_metadata(AssetKind::Mask, "Fox");
        meta.tags.clear();
        meta.license.clear();
        assert_eq!(classify(&meta), classify(&meta));
    }
}
