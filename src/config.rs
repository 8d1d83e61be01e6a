//! Application Configuration
//! Presentation constants, optionally overridden from a JSON file.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "LITEPLOTS_CONFIG";
/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "liteplots.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Rows sampled by the CSV reader to infer column types.
    pub infer_schema_length: usize,
    /// Gap between histogram bars, as a fraction of the bin width.
    pub histogram_bar_gap: f64,
    /// Fixed number of histogram bins; `None` picks one from the data.
    pub histogram_bins: Option<usize>,
    /// Distinct-value count above which the pie chart carries an advisory.
    pub pie_advisory_cardinality: usize,
    /// Rows shown by the uploaded-file preview.
    pub preview_rows: usize,
    pub export_width: u32,
    pub export_height: u32,
    pub window_width: f32,
    pub window_height: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            infer_schema_length: 10000,
            histogram_bar_gap: 0.05,
            histogram_bins: None,
            pie_advisory_cardinality: 50,
            preview_rows: 200,
            export_width: 1200,
            export_height: 800,
            window_width: 1400.0,
            window_height: 800.0,
        }
    }
}

impl AppConfig {
    /// Parse a config file. Missing fields fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Resolve the config from `LITEPLOTS_CONFIG`, then `./liteplots.json`,
    /// then built-in defaults. Unreadable files are logged and skipped.
    pub fn load() -> Self {
        let candidate = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(|| {
                let local = PathBuf::from(DEFAULT_CONFIG_FILE);
                local.exists().then_some(local)
            });

        match candidate {
            Some(path) => match Self::from_file(&path) {
                Ok(config) => {
                    log::info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("{}; using default configuration", e);
                    Self::default()
                }
            },
            None => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "pie_advisory_cardinality": 12, "histogram_bins": 30 }}"#).unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.pie_advisory_cardinality, 12);
        assert_eq!(config.histogram_bins, Some(30));
        assert_eq!(config.histogram_bar_gap, 0.05);
        assert_eq!(config.preview_rows, 200);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let result = AppConfig::from_file(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = AppConfig::from_file(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
