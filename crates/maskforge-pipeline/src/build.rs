//! Invoking the external mask build tool
//!
//! One subprocess per build. Output is streamed line by line to a
//! [`LogSink`] while the tool runs; the exit status decides success. A failed
//! or timed-out build is a [`BuildStatus`], not an error: only a missing tool
//! binary is reported as `Err`, since it makes every further build pointless.

use crate::deps::{resolve_dependencies, DependencySet};
use crate::sink::LogSink;
use maskforge_core::{ForgeError, Result};
use maskforge_meta::{AssetKind, AssetMetadata, Project};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;

/// How to run the build tool
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub tool: PathBuf,
    /// Appended after the standard arguments
    pub extra_args: Vec<String>,
    pub timeout: Duration,
}

impl BuildSettings {
    pub fn new(tool: impl Into<PathBuf>) -> Self {
        Self {
            tool: tool.into(),
            extra_args: Vec::new(),
            timeout: Duration::from_secs(300),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStatus {
    Succeeded,
    /// Non-zero exit, or killed by a signal (`exit_code` is `None`)
    Failed { exit_code: Option<i32> },
    TimedOut { after: Duration },
    /// The tool exists but could not be started
    SpawnFailed(String),
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildStatus::Succeeded => write!(f, "succeeded"),
            BuildStatus::Failed {
                exit_code: Some(code),
            } => write!(f, "exited with status {}", code),
            BuildStatus::Failed { exit_code: None } => write!(f, "terminated by signal"),
            BuildStatus::TimedOut { after } => write!(f, "timed out after {:?}", after),
            BuildStatus::SpawnFailed(reason) => write!(f, "could not start: {}", reason),
        }
    }
}

/// Result of one build: status plus dependencies resolved after the tool ran
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub asset: PathBuf,
    pub status: BuildStatus,
    pub deps: DependencySet,
    pub duration: Duration,
}

impl BuildOutcome {
    pub fn ok(&self) -> bool {
        self.status == BuildStatus::Succeeded
    }
}

pub struct BuildOrchestrator {
    project: Project,
    settings: BuildSettings,
    sink: Arc<dyn LogSink>,
}

impl BuildOrchestrator {
    pub fn new(project: Project, settings: BuildSettings, sink: Arc<dyn LogSink>) -> Self {
        Self {
            project,
            settings,
            sink,
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn settings(&self) -> &BuildSettings {
        &self.settings
    }

    /// Verify the build tool can be found, either as a path or on `PATH`.
    pub fn check_tool(&self) -> Result<PathBuf> {
        locate_binary(&self.settings.tool)
            .ok_or_else(|| ForgeError::ToolMissing(self.settings.tool.clone()))
    }

    pub async fn build_mask(&self, asset: &Path, metadata: &AssetMetadata) -> Result<BuildOutcome> {
        self.run(asset, metadata, false).await
    }

    pub async fn build_combo(&self, asset: &Path, metadata: &AssetMetadata) -> Result<BuildOutcome> {
        self.run(asset, metadata, true).await
    }

    /// Build either kind, dispatching on the metadata
    pub async fn build(&self, asset: &Path, metadata: &AssetMetadata) -> Result<BuildOutcome> {
        match metadata.kind {
            AssetKind::Mask => self.build_mask(asset, metadata).await,
            AssetKind::Combo => self.build_combo(asset, metadata).await,
        }
    }

    async fn run(&self, asset: &Path, metadata: &AssetMetadata, combo: bool) -> Result<BuildOutcome> {
        let start = Instant::now();
        let payload = serde_json::to_string(metadata)?;

        let mut cmd = Command::new(&self.settings.tool);
        cmd.arg(asset);
        if combo {
            cmd.arg("--combo");
        }
        cmd.arg("--root")
            .arg(self.project.root())
            .arg("--metadata")
            .arg(&payload)
            .args(&self.settings.extra_args)
            .current_dir(self.project.root())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::info!(asset = %asset.display(), combo, "starting build");

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(ForgeError::ToolMissing(self.settings.tool.clone()));
            }
            Err(e) => {
                tracing::warn!(asset = %asset.display(), error = %e, "failed to start build tool");
                return Ok(self.finish(asset, metadata, BuildStatus::SpawnFailed(e.to_string()), start));
            }
        };

        let mut stdout_task = forward_lines(child.stdout.take(), asset, Arc::clone(&self.sink));
        let mut stderr_task = forward_lines(child.stderr.take(), asset, Arc::clone(&self.sink));

        // One deadline for the tool and for draining its output; descendants
        // of the tool can hold the pipes open after it exits.
        let deadline = tokio::time::Instant::now() + self.settings.timeout;
        let wait_result = tokio::time::timeout_at(deadline, child.wait()).await;
        let status = match wait_result {
            Ok(Ok(exit)) => {
                let drained = tokio::time::timeout_at(deadline, async {
                    let _ = (&mut stdout_task).await;
                    let _ = (&mut stderr_task).await;
                })
                .await;
                if drained.is_err() {
                    tracing::warn!(asset = %asset.display(), "tool exited but its output stayed open");
                    stdout_task.abort();
                    stderr_task.abort();
                    BuildStatus::TimedOut {
                        after: self.settings.timeout,
                    }
                } else if exit.success() {
                    BuildStatus::Succeeded
                } else {
                    BuildStatus::Failed {
                        exit_code: exit.code(),
                    }
                }
            }
            Ok(Err(e)) => {
                stdout_task.abort();
                stderr_task.abort();
                BuildStatus::SpawnFailed(e.to_string())
            }
            Err(_elapsed) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(asset = %asset.display(), error = %e, "failed to kill timed out build");
                }
                stdout_task.abort();
                stderr_task.abort();
                BuildStatus::TimedOut {
                    after: self.settings.timeout,
                }
            }
        };

        let outcome = self.finish(asset, metadata, status, start);
        if outcome.ok() {
            tracing::info!(asset = %asset.display(), elapsed = ?outcome.duration, "build succeeded");
        } else {
            tracing::warn!(asset = %asset.display(), status = %outcome.status, "build failed");
        }
        Ok(outcome)
    }

    fn finish(
        &self,
        asset: &Path,
        metadata: &AssetMetadata,
        status: BuildStatus,
        start: Instant,
    ) -> BuildOutcome {
        // The tool may have produced or moved inputs; resolve again.
        let deps = resolve_dependencies(&self.project, asset, metadata);
        BuildOutcome {
            asset: asset.to_path_buf(),
            status,
            deps,
            duration: start.elapsed(),
        }
    }
}

fn forward_lines<R>(stream: Option<R>, asset: &Path, sink: Arc<dyn LogSink>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let asset = asset.to_path_buf();
    tokio::spawn(async move {
        let Some(stream) = stream else { return };
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    // Tool output is not always UTF-8 (Latin-1 file names).
                    let line = String::from_utf8_lossy(&buf);
                    sink.line(&asset, line.trim_end_matches(['\r', '\n']));
                }
                Err(e) => {
                    tracing::debug!(asset = %asset.display(), error = %e, "stopped reading tool output");
                    break;
                }
            }
        }
    })
}

/// Resolve a binary the way a shell would: paths with a separator are
/// checked directly, bare names are searched on `PATH`.
pub(crate) fn locate_binary(binary: &Path) -> Option<PathBuf> {
    if binary.components().count() > 1 || binary.is_absolute() {
        return binary.is_file().then(|| binary.to_path_buf());
    }
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .flat_map(|dir| {
            let candidate = dir.join(binary);
            let exe = candidate.with_extension(std::env::consts::EXE_EXTENSION);
            [candidate, exe]
        })
        .find(|candidate| candidate.is_file())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crate::testutil::{fake_tool, good_metadata, temp_dir};
    use maskforge_meta::Addition;
    use std::fs;

    fn orchestrator(dir: &Path, body: &str, sink: Arc<MemorySink>) -> BuildOrchestrator {
        let tool = fake_tool(dir, body);
        let settings = BuildSettings::new(tool).with_timeout(Duration::from_secs(10));
        BuildOrchestrator::new(Project::new(dir), settings, sink)
    }

    #[tokio::test]
    async fn test_success_streams_output() {
        let dir = temp_dir("build");
        let sink = Arc::new(MemorySink::new());
        let orch = orchestrator(&dir, "echo building \"$1\"\necho oops >&2\nexit 0", Arc::clone(&sink));
        let asset = dir.join("fox.fbx");

        let outcome = orch
            .build_mask(&asset, &good_metadata(AssetKind::Mask, "Fox"))
            .await
            .unwrap();

        assert!(outcome.ok());
        let lines = sink.lines_for(&asset);
        assert!(lines.contains(&format!("building {}", asset.display())));
        assert!(lines.contains(&"oops".to_string()));

        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failure_with_deps() {
        let dir = temp_dir("build");
        let sink = Arc::new(MemorySink::new());
        let orch = orchestrator(&dir, "exit 3", sink);

        let mut meta = good_metadata(AssetKind::Mask, "Fox");
        meta.add_addition(Addition::new("image", "fur").with_param("file", "fur.png"))
            .unwrap();
        let outcome = orch.build_mask(&dir.join("fox.fbx"), &meta).await.unwrap();

        assert_eq!(outcome.status, BuildStatus::Failed { exit_code: Some(3) });
        assert!(outcome.deps.missing.contains("fur"));

        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_deps_resolved_after_tool_runs() {
        let dir = temp_dir("build");
        let sink = Arc::new(MemorySink::new());
        // The tool generates the texture as a side effect.
        let orch = orchestrator(&dir, "echo png > \"$(dirname \"$1\")/fur.png\"", sink);

        let mut meta = good_metadata(AssetKind::Mask, "Fox");
        meta.add_addition(Addition::new("image", "fur").with_param("file", "fur.png"))
            .unwrap();
        let outcome = orch.build_mask(&dir.join("fox.fbx"), &meta).await.unwrap();

        assert!(outcome.ok());
        assert!(outcome.deps.is_complete());
        assert!(outcome.deps.present.contains(&dir.join("fur.png")));

        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_combo_flag_passed() {
        let dir = temp_dir("build");
        let sink = Arc::new(MemorySink::new());
        let orch = orchestrator(&dir, "echo \"$2\"", Arc::clone(&sink));
        let duo = dir.join("duo.json");

        let outcome = orch
            .build(&duo, &good_metadata(AssetKind::Combo, "Duo"))
            .await
            .unwrap();
        assert!(outcome.ok());
        assert_eq!(sink.lines_for(&duo), vec!["--combo"]);

        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_timeout_is_recorded_not_hung() {
        let dir = temp_dir("build");
        let sink = Arc::new(MemorySink::new());
        let tool = fake_tool(&dir, "exec sleep 30");
        let settings = BuildSettings::new(tool).with_timeout(Duration::from_millis(200));
        let orch = BuildOrchestrator::new(Project::new(&dir), settings, sink);

        let outcome = orch
            .build_mask(&dir.join("fox.fbx"), &good_metadata(AssetKind::Mask, "Fox"))
            .await
            .unwrap();
        assert!(matches!(outcome.status, BuildStatus::TimedOut { .. }));
        assert!(outcome.duration < Duration::from_secs(10));

        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_output_held_open_by_descendant_times_out() {
        let dir = temp_dir("build");
        let sink = Arc::new(MemorySink::new());
        let tool = fake_tool(&dir, "sleep 30 &\necho done\nexit 0");
        let settings = BuildSettings::new(tool).with_timeout(Duration::from_millis(500));
        let orch = BuildOrchestrator::new(Project::new(&dir), settings, Arc::clone(&sink) as Arc<dyn LogSink>);
        let asset = dir.join("fox.fbx");

        let outcome = orch
            .build_mask(&asset, &good_metadata(AssetKind::Mask, "Fox"))
            .await
            .unwrap();
        assert!(matches!(outcome.status, BuildStatus::TimedOut { .. }));
        assert!(outcome.duration < Duration::from_secs(5));
        assert_eq!(sink.lines_for(&asset), vec!["done"]);

        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_non_utf8_output_keeps_streaming() {
        let dir = temp_dir("build");
        let sink = Arc::new(MemorySink::new());
        let orch = orchestrator(&dir, "printf 'before\\ncaf\\351\\r\\nafter\\n'", Arc::clone(&sink));
        let asset = dir.join("fox.fbx");

        let outcome = orch
            .build_mask(&asset, &good_metadata(AssetKind::Mask, "Fox"))
            .await
            .unwrap();
        assert!(outcome.ok());
        assert_eq!(sink.lines_for(&asset), vec!["before", "caf\u{fffd}", "after"]);

        fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_missing_tool_is_error() {
        let dir = temp_dir("build");
        let settings = BuildSettings::new(dir.join("no-such-tool"));
        let orch = BuildOrchestrator::new(Project::new(&dir), settings, Arc::new(MemorySink::new()));

        assert!(matches!(orch.check_tool(), Err(ForgeError::ToolMissing(_))));
        let result = orch
            .build_mask(&dir.join("fox.fbx"), &good_metadata(AssetKind::Mask, "Fox"))
            .await;
        assert!(matches!(result, Err(ForgeError::ToolMissing(_))));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_locate_binary_on_path() {
        assert!(locate_binary(Path::new("sh")).is_some());
        assert!(locate_binary(Path::new("maskforge-definitely-not-installed")).is_none());
    }
}
