//! Environment checks

use super::Workspace;
use anyhow::{bail, Result};
use maskforge_pipeline::vcs;
use maskforge_pipeline::{BuildOrchestrator, SvnClient, TracingSink, VcsBackend};
use std::sync::Arc;

/// Verify the build tool and, when configured, the svn client are usable
pub fn run(ws: &Workspace) -> Result<()> {
    let mut problems = 0;

    let orchestrator = BuildOrchestrator::new(
        ws.project.clone(),
        ws.config.build_settings(),
        Arc::new(TracingSink),
    );
    match orchestrator.check_tool() {
        Ok(path) => println!("build tool: {}", path.display()),
        Err(e) => {
            println!("build tool: {}", e);
            problems += 1;
        }
    }

    match ws.config.vcs.backend {
        VcsBackend::None => println!("version control: disabled"),
        VcsBackend::Svn => {
            let client = SvnClient::new(&ws.config.vcs.binary, ws.project.root());
            if client.is_available() {
                println!("version control: svn ({})", client.binary().display());
            } else {
                println!(
                    "version control: svn client '{}' not found",
                    client.binary().display()
                );
                problems += 1;
            }
        }
    }

    println!("manifest: {}", ws.config.manifest_path(ws.project.root()).display());

    if problems > 0 {
        bail!("{} problem(s) found", problems);
    }
    Ok(())
}

/// Report whether the working copy is behind the repository
pub fn run_sync(ws: &Workspace) -> Result<()> {
    if ws.config.vcs.backend == VcsBackend::None {
        println!("Version control is disabled; nothing to check.");
        return Ok(());
    }
    let client = vcs::from_config(&ws.config, ws.project.root());
    if client.needs_update()? {
        println!("Working copy is out of date; update before building or releasing.");
    } else {
        println!("Working copy is up to date.");
    }
    Ok(())
}
