//! Metadata commands

use super::Workspace;
use anyhow::{bail, Result};
use clap::Subcommand;
use maskforge_meta::schema;
use maskforge_pipeline::{aggregate, classify};

#[derive(Subcommand)]
pub enum MetaCommands {
    /// Show an asset's metadata and classification
    Show {
        /// Mask (.fbx) or combo (.json), relative to the root
        asset: String,

        /// Output format (text, json or toml)
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Create metadata for an asset, or assign a uuid to legacy metadata
    Init {
        asset: String,
    },

    /// Set a metadata field
    Set {
        asset: String,

        /// Field name, e.g. name, tags, tier, is_morph
        field: String,

        /// New value; an empty string clears tier and category
        value: String,
    },

    /// List the metadata fields and their types
    Fields,
}

pub fn run(ws: &Workspace, cmd: MetaCommands) -> Result<()> {
    match cmd {
        MetaCommands::Show { asset, format } => run_show(ws, &asset, &format),
        MetaCommands::Init { asset } => run_init(ws, &asset),
        MetaCommands::Set {
            asset,
            field,
            value,
        } => run_set(ws, &asset, &field, &value),
        MetaCommands::Fields => run_fields(),
    }
}

fn run_show(ws: &Workspace, asset: &str, format: &str) -> Result<()> {
    let path = ws.asset(asset)?;
    let metadata = ws.store.load(&path)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&metadata)?),
        "toml" => println!("{}", toml::to_string_pretty(&metadata)?),
        "text" => {
            let classification = classify(&metadata);
            println!("Asset: {}", ws.display(&path));
            println!("Kind: {} ({})", metadata.kind, classification.kind);
            println!("State: {}", classification.state);
            println!("UUID: {}", metadata.uuid());
            println!();
            for spec in schema::fields_for(metadata.kind) {
                let value = metadata.field_value(spec.name)?;
                println!("  {:<22} {}", spec.label, value);
            }

            if metadata.is_combo() {
                println!();
                println!("Masks ({}):", metadata.masks.len());
                for (i, reference) in metadata.masks.iter().enumerate() {
                    println!("  [{}] {}", i, reference);
                }
                let view = aggregate(&ws.project, &ws.store, &metadata);
                println!("Derived tags: {}", view.tags);
                println!("Derived author: {}", view.author);
            } else if !metadata.additions.is_empty() {
                println!();
                println!("Additions ({}):", metadata.additions.len());
                for (i, addition) in metadata.additions.iter().enumerate() {
                    println!("  [{}] {}", i, addition.label());
                }
            }

            if !classification.issues.is_empty() {
                println!();
                println!("Issues:");
                for issue in &classification.issues {
                    println!("  [{:?}] {}", issue.requirement, issue.message);
                }
            }
        }
        other => bail!("unknown format '{}'; valid values: text, json, toml", other),
    }
    Ok(())
}

fn run_init(ws: &Workspace, asset: &str) -> Result<()> {
    let path = ws.asset(asset)?;
    let metadata = ws.store.create_or_load(&path)?;
    println!("{} uuid {}", ws.display(&path), metadata.uuid());
    Ok(())
}

fn run_set(ws: &Workspace, asset: &str, field: &str, value: &str) -> Result<()> {
    let path = ws.asset(asset)?;
    let mut metadata = ws.store.create_or_load(&path)?;
    metadata.set_field(field, value)?;

    if ws.store.save(&path, &metadata)? {
        println!("{}: {} = {}", ws.display(&path), field, metadata.field_value(field)?);
    } else {
        println!("{}: {} unchanged", ws.display(&path), field);
    }
    Ok(())
}

fn run_fields() -> Result<()> {
    for spec in schema::FIELDS {
        let applies = match (spec.on_mask, spec.on_combo) {
            (true, true) => "mask, combo",
            (true, false) => "mask",
            (false, true) => "combo",
            (false, false) => "-",
        };
        println!(
            "{:<20} {:<13} {:<10} {:<12} {}",
            spec.name,
            spec.field_type.type_name(),
            format!("{:?}", spec.requirement).to_lowercase(),
            applies,
            spec.tooltip.map(|t| t.replace('\n', " ")).unwrap_or_default()
        );
        let choices = spec.choices();
        if !choices.is_empty() {
            println!("{:<20} one of: {}", "", choices.join(", "));
        }
    }
    Ok(())
}
