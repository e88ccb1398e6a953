//! Batch builds over a whole project
//!
//! Masks are built first, then combos, each phase with a bounded number of
//! concurrent tool processes. A failing asset is recorded and the batch moves
//! on; only a missing build tool stops the run.

use crate::build::{BuildOrchestrator, BuildOutcome};
use crate::staleness::needs_rebuild;
use crate::vcs::{track_build_outputs, VersionControl};
use maskforge_core::{ForgeError, Result};
use maskforge_meta::{AssetMetadata, MetadataStore};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    /// Only stale assets, plus combos whose masks were rebuilt in this run
    Autobuild,
    /// Every asset
    RebuildAll,
}

#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    pub mode: BatchMode,
    /// Maximum concurrent build processes
    pub workers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPhase {
    Masks,
    Combos,
}

impl fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchPhase::Masks => write!(f, "masks"),
            BatchPhase::Combos => write!(f, "combos"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BuildFailure {
    pub asset: PathBuf,
    pub phase: BatchPhase,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub built: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub failures: Vec<BuildFailure>,
    /// Missing dependency names per asset, across the whole batch
    pub missing: BTreeMap<PathBuf, BTreeSet<String>>,
    /// Set when the run stopped launching builds early
    pub cancelled: bool,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.missing.is_empty() && !self.cancelled
    }

    fn record(&mut self, phase: BatchPhase, asset: PathBuf, result: Result<BuildOutcome>) -> Result<()> {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e @ ForgeError::ToolMissing(_)) => {
                tracing::error!(asset = %asset.display(), %phase, error = %e, "build tool disappeared, aborting batch");
                return Err(e);
            }
            Err(e) => {
                self.failures.push(BuildFailure {
                    asset,
                    phase,
                    reason: e.to_string(),
                });
                return Ok(());
            }
        };

        if !outcome.deps.missing.is_empty() {
            self.missing
                .insert(outcome.asset.clone(), outcome.deps.missing.clone());
        }
        if outcome.ok() {
            self.built.push(outcome.asset);
        } else {
            self.failures.push(BuildFailure {
                asset: outcome.asset,
                phase,
                reason: outcome.status.to_string(),
            });
        }
        Ok(())
    }
}

pub struct BatchRunner {
    orchestrator: Arc<BuildOrchestrator>,
    store: Arc<MetadataStore>,
    vcs: Arc<dyn VersionControl>,
}

impl BatchRunner {
    pub fn new(
        orchestrator: Arc<BuildOrchestrator>,
        store: Arc<MetadataStore>,
        vcs: Arc<dyn VersionControl>,
    ) -> Self {
        Self {
            orchestrator,
            store,
            vcs,
        }
    }

    /// Run a batch. Cancelling `cancel` stops new builds from starting;
    /// builds already running are allowed to finish and are reported.
    pub async fn run(&self, options: BatchOptions, cancel: &CancellationToken) -> Result<BatchReport> {
        let tool = self.orchestrator.check_tool()?;
        let project = self.orchestrator.project();
        tracing::info!(tool = %tool.display(), mode = ?options.mode, workers = options.workers, "starting batch");

        let mut report = BatchReport::default();
        let workers = options.workers.max(1);

        let masks = self.select(project.masks()?, BatchPhase::Masks, &mut report, |asset, meta| {
            options.mode == BatchMode::RebuildAll || needs_rebuild(project, asset, Some(meta))
        });
        let rebuilt = self
            .run_phase(BatchPhase::Masks, masks, workers, cancel, &mut report)
            .await?;

        if report.cancelled {
            tracing::warn!("batch cancelled before combos");
            return Ok(report);
        }

        let combos = self.select(project.combos()?, BatchPhase::Combos, &mut report, |asset, meta| {
            options.mode == BatchMode::RebuildAll
                || needs_rebuild(project, asset, Some(meta))
                || meta
                    .masks
                    .iter()
                    .any(|r| rebuilt.contains(&project.resolve_reference(r)))
        });
        self.run_phase(BatchPhase::Combos, combos, workers, cancel, &mut report)
            .await?;

        report.built.sort();
        tracing::info!(
            built = report.built.len(),
            skipped = report.skipped.len(),
            failed = report.failures.len(),
            "batch finished"
        );
        Ok(report)
    }

    /// Load metadata for each asset and keep the ones `wanted` accepts
    fn select<F>(
        &self,
        assets: Vec<PathBuf>,
        phase: BatchPhase,
        report: &mut BatchReport,
        wanted: F,
    ) -> Vec<(PathBuf, AssetMetadata)>
    where
        F: Fn(&std::path::Path, &AssetMetadata) -> bool,
    {
        let mut selected = Vec::new();
        for asset in assets {
            match self.store.create_or_load(&asset) {
                Ok(meta) if wanted(&asset, &meta) => selected.push((asset, meta)),
                Ok(_) => report.skipped.push(asset),
                Err(e) => {
                    tracing::warn!(asset = %asset.display(), error = %e, "could not load metadata");
                    report.failures.push(BuildFailure {
                        asset,
                        phase,
                        reason: e.to_string(),
                    });
                }
            }
        }
        selected
    }

    /// Build `jobs` with at most `workers` at a time. Returns the assets that
    /// built successfully.
    async fn run_phase(
        &self,
        phase: BatchPhase,
        jobs: Vec<(PathBuf, AssetMetadata)>,
        workers: usize,
        cancel: &CancellationToken,
        report: &mut BatchReport,
    ) -> Result<HashSet<PathBuf>> {
        let permits = Arc::new(Semaphore::new(workers));
        let mut tasks = JoinSet::new();
        let mut in_flight = HashSet::new();

        for (asset, meta) in jobs {
            let permit = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                permit = Arc::clone(&permits).acquire_owned() => permit.ok(),
            };
            let Some(permit) = permit else {
                report.cancelled = true;
                break;
            };

            let orchestrator = Arc::clone(&self.orchestrator);
            let vcs = Arc::clone(&self.vcs);
            in_flight.insert(asset.clone());
            tasks.spawn(async move {
                let _permit = permit;
                let result = orchestrator.build(&asset, &meta).await;
                if let Ok(outcome) = &result {
                    if outcome.ok() {
                        let outcome = outcome.clone();
                        let tracked = tokio::task::spawn_blocking(move || {
                            track_build_outputs(vcs.as_ref(), &outcome)
                        })
                        .await;
                        if let Err(e) = tracked {
                            tracing::warn!(error = %e, "version control tracking task failed");
                        }
                    }
                }
                (asset, result)
            });
        }

        let mut rebuilt = HashSet::new();
        let mut aborted = None;
        while let Some(joined) = tasks.join_next().await {
            let (asset, result) = match joined {
                Ok(done) => done,
                Err(e) => {
                    tracing::error!(%phase, error = %e, "build task did not complete");
                    continue;
                }
            };
            in_flight.remove(&asset);
            if matches!(&result, Ok(outcome) if outcome.ok()) {
                rebuilt.insert(asset.clone());
            }
            if let Err(e) = report.record(phase, asset, result) {
                tasks.abort_all();
                aborted.get_or_insert(e);
            }
        }
        if let Some(e) = aborted {
            return Err(e);
        }

        for asset in in_flight {
            report.failures.push(BuildFailure {
                asset,
                phase,
                reason: "build task panicked".to_string(),
            });
        }
        Ok(rebuilt)
    }
}
