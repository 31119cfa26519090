//! Training reports shared between the trainer and the dashboard

use crate::{DashboardError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io;
use std::path::Path;

/// Holdout error of one candidate model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelScore {
    pub model: String,
    pub rmsle: f64,
}

/// Relative weight of one feature column in the trained model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

fn read_rows<T, R>(name: &str, reader: R) -> Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
    R: io::Read,
{
    let mut rdr = csv::Reader::from_reader(reader);
    rdr.deserialize()
        .map(|row| {
            row.map_err(|source| DashboardError::Csv {
                path: name.to_string(),
                source,
            })
        })
        .collect()
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let name = path.display().to_string();
    let csv_err = |source: csv::Error| DashboardError::Csv {
        path: name.clone(),
        source,
    };
    let mut wtr = csv::Writer::from_path(path).map_err(csv_err)?;
    for row in rows {
        wtr.serialize(row).map_err(csv_err)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Scores sorted best (lowest RMSLE) first
pub fn read_scores<R: io::Read>(name: &str, reader: R) -> Result<Vec<ModelScore>> {
    let mut scores: Vec<ModelScore> = read_rows(name, reader)?;
    scores.sort_by(|a, b| a.rmsle.total_cmp(&b.rmsle));
    Ok(scores)
}

/// The `limit` most important features, largest first
pub fn read_importances<R: io::Read>(
    name: &str,
    reader: R,
    limit: usize,
) -> Result<Vec<FeatureImportance>> {
    let mut importances: Vec<FeatureImportance> = read_rows(name, reader)?;
    importances.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    importances.truncate(limit);
    Ok(importances)
}

pub fn load_scores(path: &Path) -> Result<Vec<ModelScore>> {
    read_scores(&path.display().to_string(), File::open(path)?)
}

pub fn load_importances(path: &Path, limit: usize) -> Result<Vec<FeatureImportance>> {
    read_importances(&path.display().to_string(), File::open(path)?, limit)
}

pub fn write_scores(path: &Path, scores: &[ModelScore]) -> Result<()> {
    write_rows(path, scores)
}

pub fn write_importances(path: &Path, importances: &[FeatureImportance]) -> Result<()> {
    write_rows(path, importances)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scores_sorted_ascending() {
        let csv = "model,rmsle\nridge,0.61\nmean,1.42\nforest,0.35\n";
        let scores = read_scores("scores", csv.as_bytes()).unwrap();
        let names: Vec<&str> = scores.iter().map(|s| s.model.as_str()).collect();
        assert_eq!(names, vec!["forest", "ridge", "mean"]);
    }

    #[test]
    fn test_importances_top_n() {
        let csv = "feature,importance\nhr,0.5\ntemp,0.2\nyr,0.1\nhum,0.15\n";
        let top = read_importances("imp", csv.as_bytes(), 2).unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].feature, "hr");
        assert_eq!(top[1].feature, "temp");
    }

    #[test]
    fn test_bad_report_row() {
        let csv = "model,rmsle\nridge,abc\n";
        assert!(matches!(
            read_scores("scores", csv.as_bytes()),
            Err(DashboardError::Csv { .. })
        ));
    }
}
