//! Combo composition commands

use super::Workspace;
use anyhow::{bail, Result};
use clap::Subcommand;
use maskforge_meta::{paths, AssetKind, AssetMetadata};

#[derive(Subcommand)]
pub enum ComboCommands {
    /// Reference another mask (at most 10 per combo)
    Add { combo: String, mask: String },

    /// Drop the reference at an index
    Remove { combo: String, index: usize },

    /// Replace the reference at an index
    Set {
        combo: String,
        index: usize,
        mask: String,
    },
}

pub fn run(ws: &Workspace, cmd: ComboCommands) -> Result<()> {
    match cmd {
        ComboCommands::Add { combo, mask } => {
            let reference = mask_reference(ws, &mask)?;
            edit(ws, &combo, |meta| {
                meta.add_combo_mask(&reference)?;
                Ok(format!("[{}] {}", meta.masks.len() - 1, reference))
            })
        }
        ComboCommands::Remove { combo, index } => edit(ws, &combo, |meta| {
            let removed = meta.remove_combo_mask(index)?;
            Ok(format!("removed {}", removed))
        }),
        ComboCommands::Set { combo, index, mask } => {
            let reference = mask_reference(ws, &mask)?;
            edit(ws, &combo, |meta| {
                meta.set_combo_mask(index, &reference)?;
                Ok(format!("[{}] {}", index, reference))
            })
        }
    }
}

/// Project-relative reference for a mask argument
fn mask_reference(ws: &Workspace, mask: &str) -> Result<String> {
    let path = ws.asset(mask)?;
    if paths::asset_kind(&path) != Some(AssetKind::Mask) {
        bail!("{} is not a mask", mask);
    }
    if !path.exists() {
        tracing::warn!(mask = %mask, "referenced mask does not exist yet");
    }
    Ok(ws.display(&path))
}

fn edit<F>(ws: &Workspace, combo: &str, change: F) -> Result<()>
where
    F: FnOnce(&mut AssetMetadata) -> Result<String>,
{
    let path = ws.asset(combo)?;
    if paths::asset_kind(&path) != Some(AssetKind::Combo) {
        bail!("{} is not a combo", combo);
    }
    let mut metadata = ws.store.create_or_load(&path)?;
    let message = change(&mut metadata)?;
    ws.store.save(&path, &metadata)?;
    println!("{}: {}", ws.display(&path), message);
    Ok(())
}
