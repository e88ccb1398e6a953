//! Metadata type definitions

use maskforge_core::AssetId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Masks are single models, combos compose up to ten masks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Mask,
    Combo,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetKind::Mask => write!(f, "mask"),
            AssetKind::Combo => write!(f, "combo"),
        }
    }
}

/// The area of the face a mask covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Top,
    Eyes,
    Ears,
    Nose,
    Mouth,
    Neck,
    Full,
    Combo,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Top,
        Category::Eyes,
        Category::Ears,
        Category::Nose,
        Category::Mouth,
        Category::Neck,
        Category::Full,
        Category::Combo,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Top => "Top",
            Category::Eyes => "Eyes",
            Category::Ears => "Ears",
            Category::Nose => "Nose",
            Category::Mouth => "Mouth",
            Category::Neck => "Neck",
            Category::Full => "Full",
            Category::Combo => "Combo",
            Category::Other => "Other",
        }
    }

    /// Case-insensitive lookup by display name
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cost tier, 1 (most expensive) to 3 (least)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Tier(u8);

impl Tier {
    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=3).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!("tier must be 1, 2 or 3, got {}", value))
        }
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> u8 {
        tier.0
    }
}

/// Maximum texture edge length: a power of two in 32..=16384
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct TextureSize(u32);

impl TextureSize {
    pub const MIN: u32 = 32;
    pub const MAX: u32 = 16384;

    pub fn get(&self) -> u32 {
        self.0
    }

    /// Every allowed size, smallest first
    pub fn choices() -> impl Iterator<Item = TextureSize> {
        (5..=14).map(|shift| TextureSize(1 << shift))
    }
}

impl Default for TextureSize {
    fn default() -> Self {
        Self(256)
    }
}

impl TryFrom<u32> for TextureSize {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value.is_power_of_two() && (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!(
                "texture size must be a power of two between {} and {}, got {}",
                Self::MIN,
                Self::MAX,
                value
            ))
        }
    }
}

impl From<TextureSize> for u32 {
    fn from(size: TextureSize) -> u32 {
        size.0
    }
}

/// One ordered build step of a mask (a texture layer, a material, ...).
///
/// Only `type` and `name` are interpreted here; every other key belongs to
/// the addition's own schema and is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Addition {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    #[serde(flatten)]
    pub params: toml::Table,
}

impl Addition {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
            params: toml::Table::new(),
        }
    }

    /// Builder-style parameter setter
    pub fn with_param(mut self, key: &str, value: impl Into<toml::Value>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }

    /// File paths this addition reads, relative to the mask's directory.
    ///
    /// File-bearing parameters are `file`, `files` (array) and any key ending
    /// in `_file`.
    pub fn referenced_files(&self) -> Vec<String> {
        let mut files = Vec::new();
        for (key, value) in &self.params {
            let is_file_key = key == "file" || key == "files" || key.ends_with("_file");
            if !is_file_key {
                continue;
            }
            match value {
                toml::Value::String(s) if !s.trim().is_empty() => files.push(s.clone()),
                toml::Value::Array(items) => {
                    files.extend(
                        items
                            .iter()
                            .filter_map(|v| v.as_str())
                            .filter(|s| !s.trim().is_empty())
                            .map(str::to_string),
                    );
                }
                _ => {}
            }
        }
        files
    }

    /// Label used in listings, e.g. `image : left_eye`
    pub fn label(&self) -> String {
        format!("{} : {}", self.kind, self.name)
    }
}

/// Metadata sidecar for one mask or combo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetMetadata {
    #[serde(default = "unassigned_id")]
    uuid: AssetId,
    pub kind: AssetKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub author: String,
    /// Comma separated tags
    #[serde(default)]
    pub tags: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    #[serde(default)]
    pub depth_head: bool,
    #[serde(default)]
    pub is_morph: bool,
    #[serde(default)]
    pub is_vip: bool,
    #[serde(default)]
    pub is_intro: bool,
    #[serde(default)]
    pub release_with_plugin: bool,
    #[serde(default)]
    pub do_not_release: bool,
    #[serde(default)]
    pub texture_max: TextureSize,
    #[serde(default = "default_intro_fade_time")]
    pub intro_fade_time: f32,
    #[serde(default = "default_intro_duration")]
    pub intro_duration: f32,
    #[serde(default)]
    pub license: String,
    #[serde(default)]
    pub website: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub additions: Vec<Addition>,
    /// Project-relative mask references (combos only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub masks: Vec<String>,
}

fn default_intro_fade_time() -> f32 {
    0.5
}

fn default_intro_duration() -> f32 {
    2.0
}

// Sidecars written without a uuid load with an empty one; the store assigns
// a real id exactly once.
fn unassigned_id() -> AssetId {
    AssetId::from_raw("")
}

impl AssetMetadata {
    /// Defaulted metadata with a freshly generated identity
    pub fn new(kind: AssetKind) -> Self {
        Self {
            uuid: AssetId::generate(),
            kind,
            name: String::new(),
            description: String::new(),
            author: String::new(),
            tags: String::new(),
            category: None,
            tier: None,
            depth_head: false,
            is_morph: false,
            is_vip: false,
            is_intro: false,
            release_with_plugin: false,
            do_not_release: false,
            texture_max: TextureSize::default(),
            intro_fade_time: default_intro_fade_time(),
            intro_duration: default_intro_duration(),
            license: String::new(),
            website: String::new(),
            additions: Vec::new(),
            masks: Vec::new(),
        }
    }

    pub fn uuid(&self) -> &AssetId {
        &self.uuid
    }

    /// Assign an id if (and only if) none was ever written. Returns true when
    /// an id was assigned.
    pub fn ensure_identity(&mut self) -> bool {
        if self.uuid.is_empty() {
            self.uuid = AssetId::generate();
            true
        } else {
            false
        }
    }

    pub fn is_combo(&self) -> bool {
        self.kind == AssetKind::Combo
    }

    /// Category used for release: combos are always `Combo`
    pub fn effective_category(&self) -> Option<Category> {
        match self.kind {
            AssetKind::Combo => Some(Category::Combo),
            AssetKind::Mask => self.category,
        }
    }

    /// Tags split on commas, trimmed, empty tokens dropped
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Tag membership, ignoring case and surrounding whitespace
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag_list()
            .iter()
            .any(|t| t.eq_ignore_ascii_case(tag.trim()))
    }
}

/// TOML sidecar file format
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct MetadataFile {
    pub metadata: AssetMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_serde() {
        let toml_str = r#"
[metadata]
uuid = "0b6f6a3e-2f55-4c1c-9d0e-7f1b8a1f2e3d"
kind = "mask"
name = "Fox Ears"
author = "Ana"
tags = "animal, fox, ears"
category = "Ears"
tier = 2
texture_max = 1024

[[metadata.additions]]
type = "image"
name = "fur"
file = "textures/fur.png"
opacity = 0.8
"#;

        let file: MetadataFile = toml::from_str(toml_str).unwrap();
        let meta = file.metadata;
        assert_eq!(meta.uuid().as_str(), "0b6f6a3e-2f55-4c1c-9d0e-7f1b8a1f2e3d");
        assert_eq!(meta.kind, AssetKind::Mask);
        assert_eq!(meta.category, Some(Category::Ears));
        assert_eq!(meta.tier.map(|t| t.get()), Some(2));
        assert_eq!(meta.texture_max.get(), 1024);
        assert_eq!(meta.intro_fade_time, 0.5);
        assert_eq!(meta.additions.len(), 1);
        assert_eq!(meta.additions[0].kind, "image");
        assert_eq!(
            meta.additions[0].params.get("opacity").and_then(|v| v.as_float()),
            Some(0.8)
        );
    }

    #[test]
    fn test_missing_uuid_loads_empty() {
        let file: MetadataFile = toml::from_str("[metadata]\nkind = \"combo\"\n").unwrap();
        let mut meta = file.metadata;
        assert!(meta.uuid().is_empty());
        assert!(meta.ensure_identity());
        assert!(!meta.uuid().is_empty());
        assert!(!meta.ensure_identity());
    }

    #[test]
    fn test_roundtrip_preserves_addition_order() {
        let mut meta = AssetMetadata::new(AssetKind::Mask);
        meta.additions.push(Addition::new("image", "first").with_param("file", "a.png"));
        meta.additions.push(Addition::new("material", "second"));
        meta.additions.push(Addition::new("image", "third").with_param("file", "c.png"));

        let text = toml::to_string_pretty(&MetadataFile {
            metadata: meta.clone(),
        })
        .unwrap();
        let back: MetadataFile = toml::from_str(&text).unwrap();
        assert_eq!(back.metadata, meta);
    }

    #[test]
    fn test_invalid_tier_rejected() {
        let result: Result<MetadataFile, _> =
            toml::from_str("[metadata]\nkind = \"mask\"\ntier = 7\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_texture_size_choices() {
        let sizes: Vec<u32> = TextureSize::choices().map(|s| s.get()).collect();
        assert_eq!(sizes.first(), Some(&32));
        assert_eq!(sizes.last(), Some(&16384));
        assert_eq!(sizes.len(), 10);
        assert!(TextureSize::try_from(48).is_err());
        assert!(TextureSize::try_from(16).is_err());
    }

    #[test]
    fn test_referenced_files() {
        let addn = Addition::new("image", "eyes")
            .with_param("file", "eyes.png")
            .with_param("normal_file", "eyes_n.png")
            .with_param("files", toml::Value::Array(vec!["a.png".into(), "".into()]))
            .with_param("color", "red");
        let mut files = addn.referenced_files();
        files.sort();
        assert_eq!(files, vec!["a.png", "eyes.png", "eyes_n.png"]);
    }

    #[test]
    fn test_tags() {
        let mut meta = AssetMetadata::new(AssetKind::Mask);
        meta.tags = "Fox, ears ,, cute".to_string();
        assert_eq!(meta.tag_list(), vec!["Fox", "ears", "cute"]);
        assert!(meta.has_tag("fox"));
        assert!(!meta.has_tag("cat"));
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(Category::parse("eyes"), Some(Category::Eyes));
        assert_eq!(Category::parse(" NECK "), Some(Category::Neck));
        assert_eq!(Category::parse("tail"), None);
    }
}
