//! Static metadata field schema
//!
//! One table describes every editable field: its label, type, which asset
//! kinds carry it, and whether leaving it empty is an error or a warning.
//! Classification, field editing and the CLI all read from it.

use crate::types::{AssetKind, AssetMetadata, Category, TextureSize, Tier};
use maskforge_core::{ForgeError, Result};
use std::fmt;

/// Value type of a metadata field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Text,
    Bool,
    Float,
    Tier,
    Category,
    TextureSize,
}

impl FieldType {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::Text => "text",
            FieldType::Bool => "bool",
            FieldType::Float => "float",
            FieldType::Tier => "tier",
            FieldType::Category => "category",
            FieldType::TextureSize => "texture size",
        }
    }
}

/// What an empty value means for release readiness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Empty forces an error
    Critical,
    /// Empty forces a warning
    Desired,
    Optional,
}

/// Schema entry for one field
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub tooltip: Option<&'static str>,
    pub field_type: FieldType,
    pub on_mask: bool,
    pub on_combo: bool,
    pub requirement: Requirement,
}

impl FieldSpec {
    pub fn applies_to(&self, kind: AssetKind) -> bool {
        match kind {
            AssetKind::Mask => self.on_mask,
            AssetKind::Combo => self.on_combo,
        }
    }

    pub fn is_critical_for(&self, kind: AssetKind) -> bool {
        self.applies_to(kind) && self.requirement == Requirement::Critical
    }

    pub fn is_desired_for(&self, kind: AssetKind) -> bool {
        self.applies_to(kind) && self.requirement == Requirement::Desired
    }

    /// Allowed values for enumerated fields
    pub fn choices(&self) -> Vec<String> {
        match self.field_type {
            FieldType::Tier => (1..=3).map(|t| t.to_string()).collect(),
            FieldType::Category => Category::ALL.iter().map(|c| c.to_string()).collect(),
            FieldType::TextureSize => TextureSize::choices().map(|s| s.get().to_string()).collect(),
            FieldType::Bool => vec!["true".to_string(), "false".to_string()],
            _ => Vec::new(),
        }
    }
}

const fn spec(
    name: &'static str,
    label: &'static str,
    tooltip: Option<&'static str>,
    field_type: FieldType,
    on_combo: bool,
    requirement: Requirement,
) -> FieldSpec {
    FieldSpec {
        name,
        label,
        tooltip,
        field_type,
        on_mask: true,
        on_combo,
        requirement,
    }
}

/// Every editable field, in display order. `uuid` is deliberately absent.
pub static FIELDS: &[FieldSpec] = &[
    spec("name", "Pretty Name", None, FieldType::Text, true, Requirement::Critical),
    spec("description", "Description", None, FieldType::Text, true, Requirement::Critical),
    spec("author", "Author", None, FieldType::Text, true, Requirement::Critical),
    spec(
        "tags",
        "Tags",
        Some("Comma separated list of tags."),
        FieldType::Text,
        true,
        Requirement::Critical,
    ),
    spec(
        "category",
        "Category",
        Some("The area of the face the mask covers."),
        FieldType::Category,
        false,
        Requirement::Critical,
    ),
    spec(
        "tier",
        "Tier (1,2 or 3)",
        Some("The tier of the mask.\nTier 1 is most expensive, 3 is least expensive."),
        FieldType::Tier,
        true,
        Requirement::Critical,
    ),
    spec(
        "depth_head",
        "Depth Head",
        Some("Whether this mask needs a depth occlusion head added."),
        FieldType::Bool,
        false,
        Requirement::Optional,
    ),
    spec(
        "is_morph",
        "Morph Mask",
        Some("This FBX is a morph FBX"),
        FieldType::Bool,
        false,
        Requirement::Optional,
    ),
    spec(
        "is_vip",
        "V.I.P. Mask",
        Some("VIP mask for a specific streamer."),
        FieldType::Bool,
        true,
        Requirement::Optional,
    ),
    spec(
        "is_intro",
        "Intro Animation",
        Some("This mask is used as an intro or outro animation."),
        FieldType::Bool,
        true,
        Requirement::Optional,
    ),
    spec(
        "release_with_plugin",
        "Release With Plugin",
        None,
        FieldType::Bool,
        true,
        Requirement::Optional,
    ),
    spec(
        "do_not_release",
        "DO NOT RELEASE",
        Some("Check this box if the public should never see this."),
        FieldType::Bool,
        true,
        Requirement::Optional,
    ),
    spec("texture_max", "Max Texture Size", None, FieldType::TextureSize, true, Requirement::Optional),
    spec("intro_fade_time", "Intro Fade Time", None, FieldType::Float, true, Requirement::Optional),
    spec("intro_duration", "Intro Duration", None, FieldType::Float, true, Requirement::Optional),
    spec("license", "License", None, FieldType::Text, true, Requirement::Desired),
    spec("website", "Website", None, FieldType::Text, true, Requirement::Desired),
];

/// Look up a field's schema entry
pub fn field(name: &str) -> Option<&'static FieldSpec> {
    FIELDS.iter().find(|f| f.name == name)
}

/// Fields carried by the given asset kind, in display order
pub fn fields_for(kind: AssetKind) -> impl Iterator<Item = &'static FieldSpec> {
    FIELDS.iter().filter(move |f| f.applies_to(kind))
}

/// A typed field value read from metadata
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    Float(f32),
    Tier(Option<Tier>),
    Category(Option<Category>),
    TextureSize(TextureSize),
}

impl FieldValue {
    /// Whether the value counts as "not filled in"
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Tier(t) => t.is_none(),
            FieldValue::Category(c) => c.is_none(),
            FieldValue::Bool(_) | FieldValue::Float(_) | FieldValue::TextureSize(_) => false,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Tier(Some(t)) => write!(f, "{}", t.get()),
            FieldValue::Category(Some(c)) => write!(f, "{}", c),
            FieldValue::Tier(None) | FieldValue::Category(None) => Ok(()),
            FieldValue::TextureSize(s) => write!(f, "{}", s.get()),
        }
    }
}

fn parse_bool(field: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ForgeError::invalid_field(
            field,
            format!("expected true or false, got '{}'", other),
        )),
    }
}

fn parse_float(field: &str, raw: &str) -> Result<f32> {
    let value: f32 = raw
        .trim()
        .parse()
        .map_err(|_| ForgeError::invalid_field(field, format!("'{}' is not a number", raw)))?;
    if !value.is_finite() || value < 0.0 {
        return Err(ForgeError::invalid_field(
            field,
            format!("must be a non-negative number, got {}", value),
        ));
    }
    Ok(value)
}

fn parse_optional<T>(raw: &str, parse: impl FnOnce(&str) -> Result<T>) -> Result<Option<T>> {
    if raw.trim().is_empty() {
        Ok(None)
    } else {
        parse(raw).map(Some)
    }
}

impl AssetMetadata {
    /// Read a field by schema name
    pub fn field_value(&self, name: &str) -> Result<FieldValue> {
        let value = match name {
            "name" => FieldValue::Text(self.name.clone()),
            "description" => FieldValue::Text(self.description.clone()),
            "author" => FieldValue::Text(self.author.clone()),
            "tags" => FieldValue::Text(self.tags.clone()),
            "category" => FieldValue::Category(self.category),
            "tier" => FieldValue::Tier(self.tier),
            "depth_head" => FieldValue::Bool(self.depth_head),
            "is_morph" => FieldValue::Bool(self.is_morph),
            "is_vip" => FieldValue::Bool(self.is_vip),
            "is_intro" => FieldValue::Bool(self.is_intro),
            "release_with_plugin" => FieldValue::Bool(self.release_with_plugin),
            "do_not_release" => FieldValue::Bool(self.do_not_release),
            "texture_max" => FieldValue::TextureSize(self.texture_max),
            "intro_fade_time" => FieldValue::Float(self.intro_fade_time),
            "intro_duration" => FieldValue::Float(self.intro_duration),
            "license" => FieldValue::Text(self.license.clone()),
            "website" => FieldValue::Text(self.website.clone()),
            "uuid" => FieldValue::Text(self.uuid().to_string()),
            other => return Err(ForgeError::UnknownField(other.to_string())),
        };
        Ok(value)
    }

    /// Parse `raw` according to the field's schema type and store it.
    ///
    /// Malformed input fails with `InvalidField` and leaves the metadata
    /// untouched. `uuid` can never be set.
    pub fn set_field(&mut self, name: &str, raw: &str) -> Result<()> {
        if name == "uuid" {
            return Err(ForgeError::Identity(format!(
                "uuid {} is assigned once and cannot be changed",
                self.uuid()
            )));
        }
        let spec = field(name).ok_or_else(|| ForgeError::UnknownField(name.to_string()))?;
        if !spec.applies_to(self.kind) {
            return Err(ForgeError::invalid_field(
                name,
                format!("not available on a {}", self.kind),
            ));
        }

        match name {
            "name" => self.name = raw.to_string(),
            "description" => self.description = raw.to_string(),
            "author" => self.author = raw.to_string(),
            "tags" => self.tags = raw.to_string(),
            "license" => self.license = raw.to_string(),
            "website" => self.website = raw.to_string(),
            "category" => {
                self.category = parse_optional(raw, |s| {
                    Category::parse(s).ok_or_else(|| {
                        ForgeError::invalid_field(
                            name,
                            format!("'{}' is not one of {:?}", s.trim(), spec.choices()),
                        )
                    })
                })?
            }
            "tier" => {
                self.tier = parse_optional(raw, |s| {
                    let n: u8 = s.trim().parse().map_err(|_| {
                        ForgeError::invalid_field(name, format!("'{}' is not a tier", s.trim()))
                    })?;
                    Tier::try_from(n).map_err(|e| ForgeError::invalid_field(name, e))
                })?
            }
            "texture_max" => {
                let n: u32 = raw.trim().parse().map_err(|_| {
                    ForgeError::invalid_field(name, format!("'{}' is not a size", raw.trim()))
                })?;
                self.texture_max =
                    TextureSize::try_from(n).map_err(|e| ForgeError::invalid_field(name, e))?;
            }
            "depth_head" => self.depth_head = parse_bool(name, raw)?,
            "is_morph" => self.is_morph = parse_bool(name, raw)?,
            "is_vip" => self.is_vip = parse_bool(name, raw)?,
            "is_intro" => self.is_intro = parse_bool(name, raw)?,
            "release_with_plugin" => self.release_with_plugin = parse_bool(name, raw)?,
            "do_not_release" => self.do_not_release = parse_bool(name, raw)?,
            "intro_fade_time" => self.intro_fade_time = parse_float(name, raw)?,
            "intro_duration" => self.intro_duration = parse_float(name, raw)?,
            other => return Err(ForgeError::UnknownField(other.to_string())),
        }
        Ok(())
    }

    /// Whether a schema field is unfilled on this metadata
    pub fn is_field_empty(&self, name: &str) -> bool {
        self.field_value(name).map(|v| v.is_empty()).unwrap_or(true)
    }
}
