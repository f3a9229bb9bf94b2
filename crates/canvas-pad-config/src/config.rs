/// Application configuration: load, save, and sanitize.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::color::HexColor;

/// Smallest canvas edge, in pixels.
const MIN_CANVAS_EDGE: u32 = 16;

/// Largest canvas edge, in pixels.
const MAX_CANVAS_EDGE: u32 = 16_384;

/// Top-level application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Background color of a fresh canvas.
    pub background: HexColor,
    /// Quiet period in milliseconds before a burst of edits is snapshotted.
    pub debounce_ms: u64,
    /// Max snapshots kept per document. Oldest are evicted first.
    pub max_history_depth: usize,
    /// Snapshot the blank canvas when a document starts without history,
    /// so the very first edit can be undone.
    pub baseline_snapshot: bool,
    /// Directory holding the history database. Empty = platform default.
    pub data_dir: String,
    /// Document used when none is given on the command line.
    pub default_document: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            canvas_width: 1200,
            canvas_height: 800,
            background: HexColor::WHITE,
            debounce_ms: 300,
            max_history_depth: 500,
            baseline_snapshot: false,
            data_dir: String::new(),
            default_document: "default".to_string(),
        }
    }
}

impl AppConfig {
    /// Returns the config file path: exe directory + `canvas-pad.json`.
    pub fn config_path() -> PathBuf {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|d| d.join("canvas-pad.json")))
            .unwrap_or_else(|| PathBuf::from("canvas-pad.json"))
    }

    /// Loads config from `path`, creating a default file if it doesn't exist.
    /// Returns defaults on any error (missing file, parse error, etc.).
    pub fn load_or_create(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(contents) => match serde_json::from_str::<AppConfig>(&contents) {
                    Ok(mut config) => {
                        config.sanitize();
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {}: {e}", path.display());
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {}: {e}", path.display());
                }
            }
            // Broken files are left alone so the user can fix them.
            Self::default()
        } else {
            let config = Self::default();
            if let Err(e) = config.save(path) {
                tracing::warn!("Failed to create default config at {}: {e}", path.display());
            }
            config
        }
    }

    /// Saves config to `path` as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Returns the configured data directory, if one was set.
    pub fn data_dir_override(&self) -> Option<PathBuf> {
        let trimmed = self.data_dir.trim();
        (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
    }

    /// Clamps values to valid ranges and resets invalid fields.
    pub fn sanitize(&mut self) {
        self.canvas_width = self.canvas_width.clamp(MIN_CANVAS_EDGE, MAX_CANVAS_EDGE);
        self.canvas_height = self.canvas_height.clamp(MIN_CANVAS_EDGE, MAX_CANVAS_EDGE);
        self.debounce_ms = self.debounce_ms.min(10_000);
        self.max_history_depth = self.max_history_depth.max(1);
        if self.default_document.trim().is_empty() {
            self.default_document = "default".to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.canvas_width, 1200);
        assert_eq!(config.canvas_height, 800);
        assert_eq!(config.background, HexColor::WHITE);
        assert_eq!(config.debounce_ms, 300);
        assert_eq!(config.max_history_depth, 500);
        assert!(!config.baseline_snapshot);
        assert!(config.data_dir_override().is_none());
    }

    #[test]
    fn test_sanitize_clamps_canvas_size() {
        let mut config = AppConfig::default();
        config.canvas_width = 0;
        config.canvas_height = 100_000;
        config.sanitize();
        assert_eq!(config.canvas_width, MIN_CANVAS_EDGE);
        assert_eq!(config.canvas_height, MAX_CANVAS_EDGE);
    }

    #[test]
    fn test_sanitize_history_depth_minimum() {
        let mut config = AppConfig::default();
        config.max_history_depth = 0;
        config.sanitize();
        assert_eq!(config.max_history_depth, 1);
    }

    #[test]
    fn test_sanitize_caps_debounce() {
        let mut config = AppConfig::default();
        config.debounce_ms = 60_000;
        config.sanitize();
        assert_eq!(config.debounce_ms, 10_000);

        config.debounce_ms = 0;
        config.sanitize();
        assert_eq!(config.debounce_ms, 0);
    }

    #[test]
    fn test_sanitize_resets_blank_document_name() {
        let mut config = AppConfig::default();
        config.default_document = "   ".to_string();
        config.sanitize();
        assert_eq!(config.default_document, "default");
    }

    #[test]
    fn test_data_dir_override_trims() {
        let mut config = AppConfig::default();
        config.data_dir = "  /tmp/canvas  ".to_string();
        assert_eq!(config.data_dir_override(), Some(PathBuf::from("/tmp/canvas")));
    }

    #[test]
    fn test_serde_round_trip() {
        let mut config = AppConfig::default();
        config.background = HexColor::rgb(0x7B, 0x68, 0xEE);
        config.baseline_snapshot = true;
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_fields_get_defaults() {
        let json = r#"{"debounce_ms": 50}"#;
        let parsed: AppConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.debounce_ms, 50);
        assert_eq!(parsed.canvas_width, 1200);
        assert_eq!(parsed.default_document, "default");
    }
}
