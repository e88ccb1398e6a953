//! Release manifest generation and upload

use super::Workspace;
use anyhow::{bail, Result};
use maskforge_pipeline::{
    load_assets, prepare_release, upload_plan, upload_release, write_manifest, DirectoryUploader,
    ManifestEntry,
};
use std::path::PathBuf;

pub struct ReleaseArgs {
    pub output: Option<PathBuf>,
    pub upload: bool,
    pub stage_dir: Option<PathBuf>,
}

pub fn run(args: ReleaseArgs, ws: &Workspace) -> Result<()> {
    let root = ws.project.root();
    let assets = load_assets(&ws.project, &ws.store)?;
    let items = prepare_release(&ws.project, &ws.store, &assets);
    let entries: Vec<ManifestEntry> = items.iter().map(|item| item.entry.clone()).collect();

    let manifest = args
        .output
        .unwrap_or_else(|| ws.config.manifest_path(root));
    write_manifest(&manifest, &entries)?;
    println!(
        "Released {} of {} asset(s) to {}",
        entries.len(),
        assets.len(),
        manifest.display()
    );

    if !args.upload {
        return Ok(());
    }

    let Some(stage_dir) = args.stage_dir.or_else(|| ws.config.release.stage_dir.clone()) else {
        bail!("--upload needs a target: pass --stage-dir or set [release] stage_dir in the config");
    };
    let uploader = DirectoryUploader::new(root.join(stage_dir));
    let plan = upload_plan(&items);
    let report = upload_release(&uploader, &plan);

    println!(
        "Uploaded {} file(s) to {}",
        report.uploaded.len(),
        uploader.target().display()
    );
    if !report.failed.is_empty() {
        for (key, reason) in &report.failed {
            println!("  FAILED {}: {}", key, reason);
        }
        bail!("{} upload(s) failed", report.failed.len());
    }
    Ok(())
}
