//! Maskforge Pipeline - Release readiness, incremental builds and packaging
//!
//! Classifies asset metadata, decides which assets are stale, resolves the
//! files each build depends on, drives the external mask-building tool
//! (one subprocess per asset, bounded and cancellable), aggregates combo
//! metadata, and assembles the release manifest handed to the uploader.

pub mod aggregate;
pub mod batch;
pub mod build;
pub mod classify;
pub mod config;
pub mod deps;
pub mod release;
pub mod sink;
pub mod staleness;
pub mod upload;
pub mod vcs;

#[cfg(test)]
pub(crate) mod testutil;

pub use aggregate::{aggregate, aggregate_path, ComboView};
pub use batch::{BatchMode, BatchOptions, BatchPhase, BatchReport, BatchRunner, BuildFailure};
pub use build::{BuildOrchestrator, BuildOutcome, BuildSettings, BuildStatus};
pub use classify::{
    classify, classify_asset, Classification, IssueLevel, MaskKind, ReleaseState, ValidationIssue,
};
pub use config::{ForgeConfig, VcsBackend};
pub use deps::{resolve_dependencies, DependencySet};
pub use release::{
    build_manifest, load_assets, prepare_release, write_manifest, ManifestEntry, ReleaseItem,
};
pub use sink::{LogSink, MemorySink, TracingSink};
pub use staleness::{needs_rebuild, staleness, Staleness};
pub use upload::{
    upload_plan, upload_release, DirectoryUploader, UploadPair, UploadReport, Uploader,
};
pub use vcs::{NoVcs, SvnClient, VersionControl};

pub use tokio_util::sync::CancellationToken;
