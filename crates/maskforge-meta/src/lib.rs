//! Maskforge Meta - Mask and combo metadata
//!
//! This crate owns the per-asset metadata sidecars: the canonical field set
//! and its schema table, the on-disk path conventions, project enumeration,
//! and the store that loads, creates and conditionally saves sidecars.

mod catalog;
mod edit;
pub mod paths;
pub mod schema;
mod store;
mod types;

pub use catalog::Project;
pub use edit::MAX_COMBO_MASKS;
pub use schema::{FieldSpec, FieldType, FieldValue, Requirement};
pub use store::MetadataStore;
pub use types::{Addition, AssetKind, AssetMetadata, Category, TextureSize, Tier};
