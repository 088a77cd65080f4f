//! Dashboard configuration.
//!
//! Every field has a default, so a config file only needs the keys it
//! overrides:
//!
//! ```json
//! { "data_dir": "data", "tender": { "filter_exclude": ["Sl.No", "GST"] } }
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "TENDER_DASH_CONFIG";

/// Config file picked up from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "dashboard.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory holding the default data files.
    pub data_dir: PathBuf,
    pub tender: TenderConfig,
    pub estimate: EstimateConfig,
    pub filters: FilterLimits,
    /// Per-group tiles laid out per row.
    pub tiles_per_row: usize,
}

/// Restoration tender sheet: header on the first row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TenderConfig {
    pub file_name: String,
    /// Columns never offered as filters.
    pub filter_exclude: BTreeSet<String>,
    pub group_key: String,
    pub contractor: String,
    pub contractor_keyword: String,
}

/// Estimate sheet: a title row, then the header.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EstimateConfig {
    /// Tried in order; the first existing file is the default source.
    pub file_names: Vec<String>,
    pub default_title: String,
    pub amount: String,
    pub items: String,
    pub items_keyword: String,
    /// Item label left out of totals when the user asks for it.
    pub excluded_total_label: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FilterLimits {
    /// Text columns with more distinct values than this get no filter.
    pub max_categorical_values: usize,
    /// Share of rows that must parse before a text column turns numeric.
    pub numeric_coercion_threshold: f64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            tender: TenderConfig::default(),
            estimate: EstimateConfig::default(),
            filters: FilterLimits::default(),
            tiles_per_row: 6,
        }
    }
}

impl Default for TenderConfig {
    fn default() -> Self {
        Self {
            file_name: "restoration tender.csv".to_string(),
            filter_exclude: ["Sl.No", "EW", "BT", "BT Percentage", "GST", "Contingencies", "CV"]
                .into_iter()
                .map(String::from)
                .collect(),
            group_key: "TN No".to_string(),
            contractor: "Contractor".to_string(),
            contractor_keyword: "contractor".to_string(),
        }
    }
}

impl Default for EstimateConfig {
    fn default() -> Self {
        Self {
            file_names: vec![
                "KU_Estimate Details.csv".to_string(),
                "ku_estimate details.csv".to_string(),
            ],
            default_title: "KU Estimate Details".to_string(),
            amount: "Total Amt".to_string(),
            items: "Items".to_string(),
            items_keyword: "item".to_string(),
            excluded_total_label: "Lumpsum".to_string(),
        }
    }
}

impl Default for FilterLimits {
    fn default() -> Self {
        Self {
            max_categorical_values: 100,
            numeric_coercion_threshold: 0.5,
        }
    }
}

impl DashboardConfig {
    /// Load from `$TENDER_DASH_CONFIG`, else `./dashboard.json`, else defaults.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_path(Path::new(&path));
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::from_path(local);
        }
        log::warn!("No {DEFAULT_CONFIG_FILE} found, using built-in defaults");
        Ok(Self::default())
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn tender_path(&self) -> PathBuf {
        self.data_dir.join(&self.tender.file_name)
    }

    pub fn estimate_paths(&self) -> Vec<PathBuf> {
        self.estimate
            .file_names
            .iter()
            .map(|name| self.data_dir.join(name))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "data_dir": "data", "filters": {{ "max_categorical_values": 20 }} }}"#)
            .unwrap();

        let config = DashboardConfig::from_path(file.path()).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.filters.max_categorical_values, 20);
        assert_eq!(config.filters.numeric_coercion_threshold, 0.5);
        assert!(config.tender.filter_exclude.contains("BT Percentage"));
        assert_eq!(config.tender_path(), PathBuf::from("data/restoration tender.csv"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            DashboardConfig::from_path(file.path()),
            Err(ConfigError::Json { .. })
        ));
    }
}
