//! Build commands: single asset, autobuild and rebuild-all

use super::Workspace;
use anyhow::{bail, Result};
use maskforge_pipeline::vcs::{self, track_build_outputs};
use maskforge_pipeline::{
    resolve_dependencies, BatchMode, BatchOptions, BatchReport, BatchRunner, BuildOrchestrator,
    CancellationToken, TracingSink,
};
use std::sync::Arc;

fn orchestrator(ws: &Workspace) -> BuildOrchestrator {
    BuildOrchestrator::new(
        ws.project.clone(),
        ws.config.build_settings(),
        Arc::new(TracingSink),
    )
}

pub fn run_deps(ws: &Workspace, asset: &str) -> Result<()> {
    let path = ws.asset(asset)?;
    let metadata = ws.store.load(&path)?;
    let deps = resolve_dependencies(&ws.project, &path, &metadata);

    println!("{}", ws.display(&path));
    for present in &deps.present {
        println!("  ok       {}", ws.display(present));
    }
    for missing in &deps.missing {
        println!("  MISSING  {}", missing);
    }
    if deps.present.is_empty() && deps.missing.is_empty() {
        println!("  no dependencies");
    }
    Ok(())
}

pub async fn run_build(ws: &Workspace, asset: &str) -> Result<()> {
    let path = ws.asset(asset)?;
    let metadata = ws.store.create_or_load(&path)?;
    let orchestrator = orchestrator(ws);
    orchestrator.check_tool()?;

    let outcome = orchestrator.build(&path, &metadata).await?;
    for missing in &outcome.deps.missing {
        println!("Missing: {}", missing);
    }
    if !outcome.ok() {
        bail!("{}: build {}", ws.display(&path), outcome.status);
    }

    println!("Built {} in {:.1}s", ws.display(&path), outcome.duration.as_secs_f64());
    let vcs = vcs::from_config(&ws.config, ws.project.root());
    tokio::task::spawn_blocking(move || track_build_outputs(vcs.as_ref(), &outcome)).await?;
    Ok(())
}

pub async fn run_autobuild(ws: &Workspace, workers: Option<usize>) -> Result<()> {
    run_batch(ws, BatchMode::Autobuild, workers).await
}

pub async fn run_rebuild_all(ws: &Workspace, yes: bool, workers: Option<usize>) -> Result<()> {
    if !yes {
        let count = ws.project.assets()?.len();
        bail!(
            "rebuild-all rebuilds all {} asset(s) and may take a long time; pass --yes to proceed",
            count
        );
    }
    run_batch(ws, BatchMode::RebuildAll, workers).await
}

async fn run_batch(ws: &Workspace, mode: BatchMode, workers: Option<usize>) -> Result<()> {
    let runner = BatchRunner::new(
        Arc::new(orchestrator(ws)),
        Arc::clone(&ws.store),
        vcs::from_config(&ws.config, ws.project.root()),
    );
    let options = BatchOptions {
        mode,
        workers: workers.unwrap_or(ws.config.build.workers),
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted; waiting for running builds to finish");
            on_interrupt.cancel();
        }
    });

    let report = runner.run(options, &cancel).await?;
    print_report(ws, &report);
    if !report.failures.is_empty() {
        bail!("{} build(s) failed", report.failures.len());
    }
    Ok(())
}

fn print_report(ws: &Workspace, report: &BatchReport) {
    println!(
        "Built {}, skipped {}, failed {}",
        report.built.len(),
        report.skipped.len(),
        report.failures.len()
    );

    if !report.failures.is_empty() {
        println!();
        println!("Failures:");
        for failure in &report.failures {
            println!("  [{}] {}: {}", failure.phase, ws.display(&failure.asset), failure.reason);
        }
    }

    if !report.missing.is_empty() {
        println!();
        println!("Missing dependencies:");
        for (asset, names) in &report.missing {
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            println!("  {}: {}", ws.display(asset), names.join(", "));
        }
    }

    if report.cancelled {
        println!();
        println!("Batch was cancelled; remaining assets were not built.");
    }
}
