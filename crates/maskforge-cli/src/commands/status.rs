//! Project status listing

use super::Workspace;
use anyhow::{bail, Result};
use maskforge_pipeline::{classify_asset, staleness, ReleaseState};
use std::collections::BTreeMap;

pub fn run(ws: &Workspace, filter: Option<&str>, format: &str) -> Result<()> {
    let assets = ws.project.matching(filter.unwrap_or(""))?;

    let mut rows = Vec::new();
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for asset in &assets {
        let classification = classify_asset(&ws.store, asset);
        let stale = staleness(&ws.project, asset, None);
        *counts.entry(classification.state.to_string()).or_default() += 1;
        rows.push((ws.display(asset), classification, stale));
    }

    match format {
        "json" => {
            let json: Vec<serde_json::Value> = rows
                .iter()
                .map(|(path, c, stale)| {
                    serde_json::json!({
                        "path": path,
                        "state": c.state,
                        "kind": c.kind,
                        "stale": stale.as_ref().map(|s| s.to_string()),
                        "issues": c.issues,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        "text" => {
            if rows.is_empty() {
                println!("No masks or combos found in {}", ws.project.root().display());
                return Ok(());
            }
            for (path, c, stale) in &rows {
                let marker = if stale.is_some() { "*" } else { " " };
                println!("{} {:<10} {:<7} {}", marker, c.state.to_string(), c.kind.to_string(), path);
                if c.state != ReleaseState::Good {
                    for issue in &c.issues {
                        println!("      {}", issue.message);
                    }
                }
            }
            println!();
            let summary: Vec<String> = counts.iter().map(|(s, n)| format!("{} {}", n, s)).collect();
            println!("{} asset(s): {}  (* needs rebuild)", rows.len(), summary.join(", "));
        }
        other => bail!("unknown format '{}'; valid values: text, json", other),
    }
    Ok(())
}
