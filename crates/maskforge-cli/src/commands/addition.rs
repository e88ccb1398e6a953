//! Addition editing commands

use super::Workspace;
use anyhow::{bail, Context, Result};
use clap::Subcommand;
use maskforge_meta::{Addition, AssetKind, AssetMetadata};
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum AdditionCommands {
    /// List a mask's additions in build order
    List {
        mask: String,

        /// Print every parameter, not just the label
        #[arg(long)]
        verbose: bool,
    },

    /// Append an addition
    Add {
        mask: String,

        /// Addition type, e.g. image, material, sticker
        r#type: String,

        /// Display name
        name: String,

        /// Extra parameter as key=value (repeatable); values are parsed as TOML when possible
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, toml::Value)>,
    },

    /// Remove the addition at an index
    Remove { mask: String, index: usize },

    /// Insert a copy of an addition right after it
    Dup { mask: String, index: usize },

    /// Move an addition one place earlier
    Up { mask: String, index: usize },

    /// Move an addition one place later
    Down { mask: String, index: usize },

    /// Append copies of every addition of one mask to another
    Copy { from: String, to: String },
}

fn parse_param(s: &str) -> Result<(String, toml::Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    let (key, raw) = (key.trim(), raw.trim());
    if key.is_empty() {
        return Err("parameter name is empty".to_string());
    }
    let value = toml::from_str::<toml::Table>(&format!("v = {}", raw))
        .ok()
        .and_then(|mut t| t.remove("v"))
        .unwrap_or_else(|| toml::Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

pub fn run(ws: &Workspace, cmd: AdditionCommands) -> Result<()> {
    match cmd {
        AdditionCommands::List { mask, verbose } => run_list(ws, &mask, verbose),
        AdditionCommands::Add {
            mask,
            r#type,
            name,
            params,
        } => edit(ws, &mask, |meta| {
            let mut addition = Addition::new(r#type, name);
            for (key, value) in params {
                addition = addition.with_param(&key, value);
            }
            let label = addition.label();
            meta.add_addition(addition)?;
            Ok(format!("added [{}] {}", meta.additions.len() - 1, label))
        }),
        AdditionCommands::Remove { mask, index } => edit(ws, &mask, |meta| {
            let removed = meta.remove_addition(index)?;
            Ok(format!("removed {}", removed.label()))
        }),
        AdditionCommands::Dup { mask, index } => edit(ws, &mask, |meta| {
            meta.duplicate_addition(index)?;
            Ok(format!("duplicated [{}] to [{}]", index, index + 1))
        }),
        AdditionCommands::Up { mask, index } => edit(ws, &mask, |meta| {
            let to = meta.move_addition_up(index)?;
            Ok(format!("moved [{}] to [{}]", index, to))
        }),
        AdditionCommands::Down { mask, index } => edit(ws, &mask, |meta| {
            let to = meta.move_addition_down(index)?;
            Ok(format!("moved [{}] to [{}]", index, to))
        }),
        AdditionCommands::Copy { from, to } => run_copy(ws, &from, &to),
    }
}

fn mask_path(ws: &Workspace, arg: &str) -> Result<PathBuf> {
    let path = ws.asset(arg)?;
    if maskforge_meta::paths::asset_kind(&path) != Some(AssetKind::Mask) {
        bail!("{} is not a mask; only masks have additions", arg);
    }
    Ok(path)
}

/// Load, apply `change`, save, and report what happened
fn edit<F>(ws: &Workspace, mask: &str, change: F) -> Result<()>
where
    F: FnOnce(&mut AssetMetadata) -> Result<String>,
{
    let path = mask_path(ws, mask)?;
    let mut metadata = ws.store.load(&path)?;
    let message = change(&mut metadata)?;
    ws.store.save(&path, &metadata)?;
    println!("{}: {}", ws.display(&path), message);
    Ok(())
}

fn run_list(ws: &Workspace, mask: &str, verbose: bool) -> Result<()> {
    let path = mask_path(ws, mask)?;
    let metadata = ws.store.load(&path)?;
    if metadata.additions.is_empty() {
        println!("{} has no additions", ws.display(&path));
        return Ok(());
    }
    for (i, addition) in metadata.additions.iter().enumerate() {
        println!("[{}] {}", i, addition.label());
        if verbose {
            for (key, value) in &addition.params {
                println!("      {} = {}", key, value);
            }
        }
    }
    Ok(())
}

fn run_copy(ws: &Workspace, from: &str, to: &str) -> Result<()> {
    let source = mask_path(ws, from)?;
    let target = mask_path(ws, to)?;
    let clipboard = ws
        .store
        .load(&source)
        .with_context(|| format!("reading additions from {}", from))?
        .copy_additions();

    let mut metadata = ws.store.load(&target)?;
    metadata.paste_additions(&clipboard)?;
    ws.store.save(&target, &metadata)?;
    println!(
        "{}: pasted {} addition(s) from {}",
        ws.display(&target),
        clipboard.len(),
        ws.display(&source)
    );
    Ok(())
}
