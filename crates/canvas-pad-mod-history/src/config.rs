/// Configuration and utility functions for the history system.
use std::path::{Path, PathBuf};
use std::time::Duration;

use canvas_pad_config::AppConfig;

use crate::debounce::MAX_DELAY;

/// Quiet period before a burst of document changes is snapshotted.
const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Maximum number of snapshots kept per document.
/// Oldest snapshots are evicted when this limit is exceeded.
const DEFAULT_MAX_HISTORY_DEPTH: usize = 500;

/// Configuration for the history system.
#[derive(Debug, Clone)]
pub struct HistoryConfig {
    /// Debounce window in milliseconds.
    pub debounce_ms: u64,
    /// Max snapshots in the log.
    pub max_history_depth: usize,
    /// Snapshot the initial document when no history exists.
    pub baseline_snapshot: bool,
    /// Root directory for the persistence database.
    pub data_dir: PathBuf,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            max_history_depth: DEFAULT_MAX_HISTORY_DEPTH,
            baseline_snapshot: false,
            data_dir: resolve_data_dir(None),
        }
    }
}

impl HistoryConfig {
    /// Builds the history settings from the application config.
    pub fn from_app_config(app: &AppConfig) -> Self {
        Self {
            debounce_ms: app.debounce_ms,
            max_history_depth: app.max_history_depth.max(1),
            baseline_snapshot: app.baseline_snapshot,
            data_dir: resolve_data_dir(app.data_dir_override().as_deref()),
        }
    }

    /// The debounce window, capped at [`MAX_DELAY`].
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms).min(MAX_DELAY)
    }
}

/// Resolves the data directory path.
///
/// Resolution order:
/// 1. `CANVAS_PAD_DATA_DIR` environment variable
/// 2. `configured` (the `data_dir` config entry)
/// 3. the platform data directory + `canvas-pad`
/// 4. `.data/` directory next to the executable
pub fn resolve_data_dir(configured: Option<&Path>) -> PathBuf {
    if let Ok(dir) = std::env::var("CANVAS_PAD_DATA_DIR") {
        return PathBuf::from(dir);
    }
    if let Some(dir) = configured {
        return dir.to_path_buf();
    }
    if let Some(dir) = dirs::data_dir() {
        return dir.join("canvas-pad");
    }
    let exe = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("."));
    exe.parent().unwrap_or(Path::new(".")).join(".data")
}

/// Normalizes a user-supplied document name into a store-safe id.
///
/// Keeps ASCII alphanumerics, `-`, `_` and `.`; everything else becomes `_`
/// so ids never contain the `:` key separator.
pub fn doc_id_for_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return "default".to_string();
    }
    trimmed
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
