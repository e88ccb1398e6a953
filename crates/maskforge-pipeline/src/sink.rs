//! Destinations for build tool output

use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// Receives build tool output one line at a time, as it arrives
pub trait LogSink: Send + Sync {
    fn line(&self, asset: &Path, line: &str);
}

/// Forwards each line as a tracing event under `maskforge::tool`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn line(&self, asset: &Path, line: &str) {
        tracing::info!(target: "maskforge::tool", asset = %asset.display(), "{}", line);
    }
}

/// Keeps every line in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(PathBuf, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(PathBuf, String)> {
        self.lines.lock().clone()
    }

    /// Lines logged for one asset, in arrival order
    pub fn lines_for(&self, asset: &Path) -> Vec<String> {
        self.lines
            .lock()
            .iter()
            .filter(|(p, _)| p == asset)
            .map(|(_, l)| l.clone())
            .collect()
    }
}

impl LogSink for MemorySink {
    fn line(&self, asset: &Path, line: &str) {
        self.lines.lock().push((asset.to_path_buf(), line.to_string()));
    }
}
