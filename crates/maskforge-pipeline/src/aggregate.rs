//! Derived combo metadata
//!
//! A combo's release tags and author come from the masks it references. The
//! merged view is computed on demand and never written back to the combo.

use maskforge_meta::{AssetMetadata, MetadataStore, Project};
use serde::Serialize;
use std::path::Path;

pub const TAG_SEPARATOR: &str = ",";
pub const AUTHOR_SEPARATOR: &str = ", ";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComboView {
    pub tags: String,
    pub author: String,
}

fn push_unique<F>(list: &mut Vec<String>, value: &str, same: F)
where
    F: Fn(&str, &str) -> bool,
{
    let value = value.trim();
    if !value.is_empty() && !list.iter().any(|v| same(v, value)) {
        list.push(value.to_string());
    }
}

/// Merge child metadata in reference order. Tags are unioned token by
/// token, ignoring case and keeping the first spelling; authors are kept
/// whole and deduplicated by exact match.
pub fn merge_children<'a, I>(children: I) -> ComboView
where
    I: IntoIterator<Item = &'a AssetMetadata>,
{
    let mut tags = Vec::new();
    let mut authors = Vec::new();
    for child in children {
        for tag in child.tag_list() {
            push_unique(&mut tags, tag, |a, b| a.eq_ignore_ascii_case(b));
        }
        push_unique(&mut authors, &child.author, |a, b| a == b);
    }
    ComboView {
        tags: tags.join(TAG_SEPARATOR),
        author: authors.join(AUTHOR_SEPARATOR),
    }
}

/// Aggregate the masks referenced by `combo`. References that cannot be
/// loaded are skipped; the dependency resolver already reports them.
pub fn aggregate(project: &Project, store: &MetadataStore, combo: &AssetMetadata) -> ComboView {
    let children: Vec<AssetMetadata> = combo
        .masks
        .iter()
        .filter_map(|reference| {
            let path = project.resolve_reference(reference);
            match store.load(&path) {
                Ok(meta) => Some(meta),
                Err(e) => {
                    tracing::debug!(reference = %reference, error = %e, "skipping combo child");
                    None
                }
            }
        })
        .collect();
    merge_children(&children)
}

/// Aggregate a combo from its path on disk
pub fn aggregate_path(
    project: &Project,
    store: &MetadataStore,
    combo: &Path,
) -> maskforge_core::Result<ComboView> {
    let meta = store.load(combo)?;
    Ok(aggregate(project, store, &meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{good_metadata, temp_dir};
    use maskforge_meta::AssetKind;
    use std::fs;

    fn child(tags: &str, author: &str) -> AssetMetadata {
        let mut meta = AssetMetadata::new(AssetKind::Mask);
        meta.tags = tags.to_string();
        meta.author = author.to_string();
        meta
    }

    #[test]
    fn test_tags_union_first_appearance() {
        let view = merge_children(&[child("a,b", "Ana"), child("b,c", "Ana")]);
        assert_eq!(view.tags, "a,b,c");
        assert_eq!(view.author, "Ana");
    }

    #[test]
    fn test_authors_whole_strings() {
        let view = merge_children(&[
            child("x", "Ana, Bo"),
            child("x", " Cy "),
            child("x", "Ana, Bo"),
            child("x", ""),
        ]);
        assert_eq!(view.author, "Ana, Bo, Cy");
        assert_eq!(view.tags, "x");
    }

    #[test]
    fn test_tags_dedup_ignores_case() {
        let view = merge_children(&[child("Fox,ears", "Ana"), child("fox,EARS,tail", "ana")]);
        assert_eq!(view.tags, "Fox,ears,tail");
        assert_eq!(view.author, "Ana, ana");
    }

    #[test]
    fn test_tag_whitespace_ignored() {
        let view = merge_children(&[child(" a , b,", "Ana"), child("a,,c ", "Ana")]);
        assert_eq!(view.tags, "a,b,c");
    }

    #[test]
    fn test_unresolvable_children_skipped() {
        let dir = temp_dir("aggregate");
        let project = Project::new(&dir);
        let store = MetadataStore::new();

        let fox = dir.join("masks/fox.fbx");
        let mut fox_meta = good_metadata(AssetKind::Mask, "Fox");
        fox_meta.tags = "fox,ears".to_string();
        store.save(&fox, &fox_meta).unwrap();

        let duo = dir.join("duo.json");
        let mut combo = good_metadata(AssetKind::Combo, "Duo");
        combo.tags = "ignored".to_string();
        combo.add_combo_mask("masks/ghost.fbx").unwrap();
        combo.add_combo_mask("masks/fox.fbx").unwrap();
        store.save(&duo, &combo).unwrap();

        let view = aggregate_path(&project, &store, &duo).unwrap();
        assert_eq!(view.tags, "fox,ears");
        assert_eq!(view.author, "Ana");

        // The combo's own sidecar is untouched.
        assert_eq!(store.load(&duo).unwrap().tags, "ignored");

        fs::remove_dir_all(&dir).ok();
    }
}
