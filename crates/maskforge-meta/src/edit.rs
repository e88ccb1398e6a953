//! Ordered editing of additions and combo references

use crate::types::{Addition, AssetKind, AssetMetadata};
use maskforge_core::{ForgeError, Result};

/// A combo references at most this many masks
pub const MAX_COMBO_MASKS: usize = 10;

impl AssetMetadata {
    fn require_kind(&self, kind: AssetKind, field: &str) -> Result<()> {
        if self.kind == kind {
            Ok(())
        } else {
            Err(ForgeError::invalid_field(
                field,
                format!("not available on a {}", self.kind),
            ))
        }
    }

    fn check_addition_index(&self, index: usize) -> Result<()> {
        if index < self.additions.len() {
            Ok(())
        } else {
            Err(ForgeError::invalid_field(
                "additions",
                format!(
                    "index {} out of range ({} additions)",
                    index,
                    self.additions.len()
                ),
            ))
        }
    }

    /// Append an addition at the end of the build order
    pub fn add_addition(&mut self, addition: Addition) -> Result<()> {
        self.require_kind(AssetKind::Mask, "additions")?;
        self.additions.push(addition);
        Ok(())
    }

    pub fn remove_addition(&mut self, index: usize) -> Result<Addition> {
        self.check_addition_index(index)?;
        Ok(self.additions.remove(index))
    }

    /// Insert a copy of the addition right after it
    pub fn duplicate_addition(&mut self, index: usize) -> Result<()> {
        self.check_addition_index(index)?;
        let copy = self.additions[index].clone();
        self.additions.insert(index + 1, copy);
        Ok(())
    }

    /// Move an addition one step earlier. Returns its new index.
    pub fn move_addition_up(&mut self, index: usize) -> Result<usize> {
        self.check_addition_index(index)?;
        if index == 0 {
            return Ok(0);
        }
        self.additions.swap(index - 1, index);
        Ok(index - 1)
    }

    /// Move an addition one step later. Returns its new index.
    pub fn move_addition_down(&mut self, index: usize) -> Result<usize> {
        self.check_addition_index(index)?;
        if index + 1 == self.additions.len() {
            return Ok(index);
        }
        self.additions.swap(index, index + 1);
        Ok(index + 1)
    }

    /// Snapshot of every addition, for pasting into another mask
    pub fn copy_additions(&self) -> Vec<Addition> {
        self.additions.clone()
    }

    /// Append copies of `clipboard` in order
    pub fn paste_additions(&mut self, clipboard: &[Addition]) -> Result<()> {
        self.require_kind(AssetKind::Mask, "additions")?;
        self.additions.extend(clipboard.iter().cloned());
        Ok(())
    }

    /// Add a project-relative mask reference to a combo
    pub fn add_combo_mask(&mut self, reference: &str) -> Result<()> {
        self.require_kind(AssetKind::Combo, "masks")?;
        let reference = normalize_reference(reference)?;
        if self.masks.len() >= MAX_COMBO_MASKS {
            return Err(ForgeError::ComboCapacity {
                max: MAX_COMBO_MASKS,
            });
        }
        self.masks.push(reference);
        Ok(())
    }

    pub fn remove_combo_mask(&mut self, index: usize) -> Result<String> {
        self.require_kind(AssetKind::Combo, "masks")?;
        if index >= self.masks.len() {
            return Err(ForgeError::invalid_field(
                "masks",
                format!("index {} out of range ({} masks)", index, self.masks.len()),
            ));
        }
        Ok(self.masks.remove(index))
    }

    /// Replace the reference at `index`
    pub fn set_combo_mask(&mut self, index: usize, reference: &str) -> Result<()> {
        self.require_kind(AssetKind::Combo, "masks")?;
        let reference = normalize_reference(reference)?;
        match self.masks.get_mut(index) {
            Some(slot) => {
                *slot = reference;
                Ok(())
            }
            None => Err(ForgeError::invalid_field(
                "masks",
                format!("index {} out of range ({} masks)", index, self.masks.len()),
            )),
        }
    }
}

// Empty and "none" references are never stored; removal is explicit.
fn normalize_reference(reference: &str) -> Result<String> {
    let trimmed = reference.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Err(ForgeError::invalid_field(
            "masks",
            "an empty reference is not a mask; remove the entry instead",
        ));
    }
    Ok(trimmed.replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with(names: &[&str]) -> AssetMetadata {
        let mut meta = AssetMetadata::new(AssetKind::Mask);
        for name in names {
            meta.add_addition(Addition::new("image", *name)).unwrap();
        }
        meta
    }

    fn names(meta: &AssetMetadata) -> Vec<&str> {
        meta.additions.iter().map(|a| a.name.as_str()).collect()
    }

    #[test]
    fn test_duplicate_inserts_after() {
        let mut meta = mask_with(&["a", "b", "c"]);
        meta.duplicate_addition(1).unwrap();
        assert_eq!(names(&meta), vec!["a", "b", "b", "c"]);
    }

    #[test]
    fn test_move_up_and_down() {
        let mut meta = mask_with(&["a", "b", "c"]);
        assert_eq!(meta.move_addition_up(2).unwrap(), 1);
        assert_eq!(names(&meta), vec!["a", "c", "b"]);
        assert_eq!(meta.move_addition_up(0).unwrap(), 0);
        assert_eq!(meta.move_addition_down(0).unwrap(), 1);
        assert_eq!(names(&meta), vec!["c", "a", "b"]);
        assert_eq!(meta.move_addition_down(2).unwrap(), 2);
    }

    #[test]
    fn test_copy_paste_preserves_order() {
        let source = mask_with(&["x", "y"]);
        let mut target = mask_with(&["a"]);
        let clip = source.copy_additions();
        target.paste_additions(&clip).unwrap();
        assert_eq!(names(&target), vec!["a", "x", "y"]);
    }

    #[test]
    fn test_remove_out_of_range() {
        let mut meta = mask_with(&["a"]);
        assert!(meta.remove_addition(3).is_err());
        assert_eq!(meta.remove_addition(0).unwrap().name, "a");
        assert!(meta.additions.is_empty());
    }

    #[test]
    fn test_combo_capacity() {
        let mut combo = AssetMetadata::new(AssetKind::Combo);
        for i in 0..MAX_COMBO_MASKS {
            combo.add_combo_mask(&format!("masks/m{}.fbx", i)).unwrap();
        }
        assert!(matches!(
            combo.add_combo_mask("masks/extra.fbx"),
            Err(ForgeError::ComboCapacity { max: 10 })
        ));
        assert_eq!(combo.remove_combo_mask(0).unwrap(), "masks/m0.fbx");
        combo.add_combo_mask("masks\\extra.fbx").unwrap();
        assert_eq!(combo.masks.last().map(String::as_str), Some("masks/extra.fbx"));
    }

    #[test]
    fn test_combo_rejects_none_reference() {
        let mut combo = AssetMetadata::new(AssetKind::Combo);
        assert!(combo.add_combo_mask(" None ").is_err());
        assert!(combo.add_combo_mask("").is_err());
    }

    #[test]
    fn test_additions_rejected_on_combo() {
        let mut combo = AssetMetadata::new(AssetKind::Combo);
        assert!(combo.add_addition(Addition::new("image", "a")).is_err());
        let mut mask = AssetMetadata::new(AssetKind::Mask);
        assert!(mask.add_combo_mask("masks/a.fbx").is_err());
    }
}
