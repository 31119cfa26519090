//! Serialized regression model for hourly rentals

use crate::encoder::{FeatureVector, FEATURE_COLUMNS, FEATURE_COUNT, FEATURE_SCHEMA_VERSION};
use crate::{DashboardError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Scale the linear score lives in
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Score is the rental count
    Count,
    /// Score is `ln(1 + count)`
    Log1p,
}

/// Linear model over the encoded feature vector.
///
/// `columns` is stored with the weights so a file fit against another
/// feature layout is refused at load time instead of mispredicting.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub schema_version: u32,
    pub columns: Vec<String>,
    pub target: Target,
    pub intercept: f64,
    pub weights: Vec<f64>,
}

impl LinearModel {
    pub fn new(target: Target, intercept: f64, weights: Vec<f64>) -> Self {
        LinearModel {
            schema_version: FEATURE_SCHEMA_VERSION,
            columns: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            target,
            intercept,
            weights,
        }
    }

    /// Linear score before undoing the target transform
    pub fn score(&self, features: &FeatureVector) -> f64 {
        self.intercept
            + self
                .weights
                .iter()
                .zip(features.as_slice())
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }

    /// Predicted rentals for the given features
    pub fn predict(&self, features: &FeatureVector) -> f64 {
        let score = self.score(features);
        match self.target {
            Target::Count => score,
            Target::Log1p => score.exp_m1(),
        }
    }

    pub fn check_schema(&self) -> Result<()> {
        if self.schema_version != FEATURE_SCHEMA_VERSION {
            return Err(DashboardError::Schema(format!(
                "schema version {} (expected {})",
                self.schema_version, FEATURE_SCHEMA_VERSION
            )));
        }
        if self.weights.len() != FEATURE_COUNT {
            return Err(DashboardError::Schema(format!(
                "{} weights (expected {})",
                self.weights.len(),
                FEATURE_COUNT
            )));
        }
        if let Some((idx, (found, expected))) = self
            .columns
            .iter()
            .zip(FEATURE_COLUMNS.iter())
            .enumerate()
            .find(|(_, (found, expected))| found.as_str() != **expected)
        {
            return Err(DashboardError::Schema(format!(
                "column {} is {} (expected {})",
                idx, found, expected
            )));
        }
        if self.columns.len() != FEATURE_COUNT {
            return Err(DashboardError::Schema(format!(
                "{} columns (expected {})",
                self.columns.len(),
                FEATURE_COUNT
            )));
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let model: LinearModel = bincode::deserialize_from(reader)?;
        model.check_schema()?;
        log::info!(
            "Loaded {:?} model from {} (schema v{})",
            model.target,
            path.display(),
            model.schema_version
        );
        Ok(model)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.check_schema()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, self)?;
        Ok(())
    }
}

/// Displayed rental count: never negative, whole bikes
pub fn rentals(prediction: f64) -> f64 {
    prediction.max(0.0).round()
}
