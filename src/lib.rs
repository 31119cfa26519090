//! Washington D.C. bike-sharing dashboard
//!
//! Loads the hourly rental dataset, computes the exploratory statistics shown
//! in the terminal dashboard, and serves predictions from a trained linear
//! model through a fixed one-hot feature encoding.

pub mod app;
pub mod data;
pub mod encoder;
pub mod model;
pub mod ui;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

pub use encoder::{encode, EncodeError, FeatureVector, RawSelection};

/// Application-wide errors
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Model file error: {0}")]
    ModelFile(#[from] bincode::Error),

    #[error("Model does not match feature schema: {0}")]
    Schema(String),

    #[error("Invalid date range: {start} is after {end}")]
    DateRange { start: NaiveDate, end: NaiveDate },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dataset {0} has no rows")]
    EmptyDataset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DashboardError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub model: ModelConfig,
    pub filter: FilterConfig,
    pub analysis: AnalysisConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub raw_path: PathBuf,
    pub cleaned_path: PathBuf,
    pub scores_path: PathBuf,
    pub importances_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Rows further than this many standard deviations from the mean count are outliers
    pub outlier_sigma: f64,
    pub head_rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                raw_path: PathBuf::from("data/bike-sharing_hourly.csv"),
                cleaned_path: PathBuf::from("data/bike-sharing_hourly_cleaned.csv"),
                scores_path: PathBuf::from("data/rmsle_frame.csv"),
                importances_path: PathBuf::from("data/feat_importances.csv"),
            },
            model: ModelConfig {
                path: PathBuf::from("models/model.bin"),
            },
            filter: FilterConfig {
                start_date: NaiveDate::from_ymd_opt(2011, 1, 1).unwrap_or_default(),
                end_date: NaiveDate::from_ymd_opt(2012, 12, 31).unwrap_or_default(),
            },
            analysis: AnalysisConfig {
                outlier_sigma: 2.5,
                head_rows: 5,
            },
            logging: LoggingConfig {
                file: PathBuf::from("bikeshare.log"),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DashboardError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| DashboardError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| DashboardError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if std::path::Path::new(path).exists() {
            Config::load(path)
        } else {
            log::debug!("No config at {}, using defaults", path);
            Ok(Config::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.filter.start_date > self.filter.end_date {
            return Err(DashboardError::DateRange {
                start: self.filter.start_date,
                end: self.filter.end_date,
            });
        }
        if !(self.analysis.outlier_sigma.is_finite() && self.analysis.outlier_sigma > 0.0) {
            return Err(DashboardError::Config(format!(
                "outlier_sigma must be positive, got {}",
                self.analysis.outlier_sigma
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_toml_round_trip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("start_date = \"2011-01-01\""));
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_config_rejects_inverted_range() {
        let mut config = Config::default();
        config.filter.start_date = NaiveDate::from_ymd_opt(2013, 1, 1).unwrap();
        assert!(matches!(config.validate(), Err(DashboardError::DateRange { .. })));
    }

    #[test]
    fn test_config_rejects_bad_sigma() {
        let mut config = Config::default();
        config.analysis.outlier_sigma = 0.0;
        assert!(matches!(config.validate(), Err(DashboardError::Config(_))));
    }

    #[test]
    fn test_missing_config_falls_back_to_default() {
        let config = Config::load_or_default("does/not/exist.toml").unwrap();
        assert_eq!(config, Config::default());
    }
}
