//! Dataset loading, filtering and column statistics

pub mod record;
pub mod reports;
pub mod stats;

pub use record::{Column, HourlyRecord};
pub use reports::{FeatureImportance, ModelScore};
pub use stats::{BoxStats, Summary};

use crate::{DashboardError, Result};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::Path;

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(DashboardError::DateRange { start, end });
        }
        Ok(DateRange { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Pairwise Pearson correlations between a fixed set of columns
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub columns: Vec<Column>,
    /// Row-major, `None` where a pair has no variance
    pub values: Vec<Vec<Option<f64>>>,
}

/// Box statistics of the count for one value of a grouping column
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBox {
    pub key: f64,
    pub stats: BoxStats,
}

/// An in-memory snapshot of the hourly dataset
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    name: String,
    records: Vec<HourlyRecord>,
}

impl Dataset {
    pub fn new(name: impl Into<String>, records: Vec<HourlyRecord>) -> Self {
        Dataset {
            name: name.into(),
            records,
        }
    }

    /// Read a CSV file with a header row
    pub fn load(path: &Path) -> Result<Self> {
        let name = path.display().to_string();
        let file = File::open(path)?;
        let dataset = Self::from_reader(&name, file)?;
        log::info!("Loaded {} rows from {}", dataset.len(), name);
        Ok(dataset)
    }

    pub fn from_reader<R: io::Read>(name: &str, reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut records = Vec::new();
        for result in rdr.deserialize() {
            let record: HourlyRecord = result.map_err(|source| DashboardError::Csv {
                path: name.to_string(),
                source,
            })?;
            records.push(record);
        }
        if records.is_empty() {
            return Err(DashboardError::EmptyDataset(name.to_string()));
        }
        Ok(Dataset::new(name, records))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn records(&self) -> &[HourlyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn head(&self, n: usize) -> &[HourlyRecord] {
        &self.records[..n.min(self.records.len())]
    }

    /// First and last date present
    pub fn date_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.iter().map(|r| r.dteday).min()?;
        let last = self.records.iter().map(|r| r.dteday).max()?;
        Some((first, last))
    }

    fn retain(&self, keep: impl Fn(&HourlyRecord) -> bool) -> Dataset {
        Dataset {
            name: self.name.clone(),
            records: self.records.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }

    pub fn filter_dates(&self, range: &DateRange) -> Dataset {
        self.retain(|r| range.contains(r.dteday))
    }

    /// Values of a column, skipping rows that lack it
    pub fn column(&self, column: Column) -> Vec<f64> {
        self.records.iter().filter_map(|r| r.value(column)).collect()
    }

    pub fn summary(&self, column: Column) -> Option<Summary> {
        stats::summarize(&self.column(column))
    }

    /// Summaries for each column that has at least one value
    pub fn describe(&self, columns: &[Column]) -> Vec<(Column, Summary)> {
        columns
            .iter()
            .filter_map(|c| self.summary(*c).map(|s| (*c, s)))
            .collect()
    }

    pub fn correlation(&self, columns: &[Column]) -> CorrelationMatrix {
        let values = columns
            .iter()
            .map(|a| {
                columns
                    .iter()
                    .map(|b| {
                        let (xs, ys): (Vec<f64>, Vec<f64>) = self
                            .records
                            .iter()
                            .filter_map(|r| Some((r.value(*a)?, r.value(*b)?)))
                            .unzip();
                        stats::pearson(&xs, &ys)
                    })
                    .collect()
            })
            .collect();

        CorrelationMatrix {
            columns: columns.to_vec(),
            values,
        }
    }

    /// Mean and sample std of the count, if defined
    fn count_moments(&self) -> Option<(f64, f64)> {
        let counts = self.column(Column::Count);
        let mean = stats::mean(&counts)?;
        let std = stats::std_dev(&counts)?;
        std.is_finite().then_some((mean, std))
    }

    /// Rows whose count lies at least `sigma` standard deviations from the mean
    pub fn outliers(&self, sigma: f64) -> Dataset {
        match self.count_moments() {
            Some((mean, std)) => self.retain(|r| (r.cnt - mean).abs() >= sigma * std),
            None => self.retain(|_| false),
        }
    }

    /// Rows within `sigma` standard deviations of the mean count
    pub fn without_outliers(&self, sigma: f64) -> Dataset {
        match self.count_moments() {
            Some((mean, std)) => self.retain(|r| (r.cnt - mean).abs() <= sigma * std),
            None => self.clone(),
        }
    }

    /// Count box statistics per distinct value of `group`, ascending by value
    pub fn box_by(&self, group: Column) -> Vec<GroupBox> {
        let mut pairs: Vec<(f64, f64)> = self
            .records
            .iter()
            .filter_map(|r| Some((r.value(group)?, r.cnt)))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut groups = Vec::new();
        for chunk in pairs.chunk_by(|a, b| a.0 == b.0) {
            let counts: Vec<f64> = chunk.iter().map(|(_, cnt)| *cnt).collect();
            if let Some(stats) = stats::box_stats(&counts) {
                groups.push(GroupBox {
                    key: chunk[0].0,
                    stats,
                });
            }
        }
        groups
    }

    /// Total rentals per calendar day
    pub fn daily_totals(&self) -> Vec<(NaiveDate, f64)> {
        let mut days: BTreeMap<NaiveDate, f64> = BTreeMap::new();
        for r in &self.records {
            *days.entry(r.dteday).or_insert(0.0) += r.cnt;
        }
        days.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "instant,dteday,season,yr,mnth,hr,holiday,weekday,workingday,weathersit,temp,atemp,hum,windspeed,casual,registered,cnt";

    fn csv_fixture() -> String {
        let rows = [
            "1,2011-01-01,4,0,1,0,0,6,0,1,0.24,0.2879,0.81,0,3,13,16",
            "2,2011-01-01,4,0,1,1,0,6,0,1,0.22,0.2727,0.8,0,8,32,40",
            "3,2011-01-02,4,0,1,2,0,0,0,2,0.22,0.2727,0.8,0.1,5,27,32",
            "4,2011-06-15,2,0,6,8,0,3,1,1,0.7,0.65,0.5,0.2,40,300,340",
            "5,2011-06-15,2,0,6,9,0,3,1,1,0.72,0.66,0.45,0.2,30,200,230",
            "6,2012-12-31,4,1,12,23,0,1,1,3,0.2,0.2,0.6,0.3,1,9,10",
        ];
        format!("{}\n{}\n", HEADER, rows.join("\n"))
    }

    fn dataset() -> Dataset {
        Dataset::from_reader("fixture", csv_fixture().as_bytes()).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_load_from_reader() {
        let ds = dataset();
        assert_eq!(ds.len(), 6);
        assert_eq!(ds.head(2).len(), 2);
        assert_eq!(ds.head(100).len(), 6);
        assert_eq!(ds.records()[3].cnt, 340.0);
        assert_eq!(ds.date_span(), Some((date("2011-01-01"), date("2012-12-31"))));
    }

    #[test]
    fn test_load_cleaned_snapshot_without_optional_columns() {
        let csv = "dteday,season,yr,mnth,hr,holiday,weekday,workingday,weathersit,temp,hum,windspeed,cnt,daylight_hrs,extra\n\
                   2011-03-01,1,0,3,7,0,2,1,1,0.3,0.5,0.1,120,11.98,x\n";
        let ds = Dataset::from_reader("cleaned", csv.as_bytes()).unwrap();
        let r = &ds.records()[0];
        assert_eq!(r.instant, None);
        assert_eq!(r.atemp, None);
        assert_eq!(r.value(Column::DaylightHours), Some(11.98));
    }

    #[test]
    fn test_empty_and_malformed_csv() {
        let empty = format!("{}\n", HEADER);
        assert!(matches!(
            Dataset::from_reader("empty", empty.as_bytes()),
            Err(DashboardError::EmptyDataset(_))
        ));

        let bad = format!("{}\n1,not-a-date,4,0,1,0,0,6,0,1,0.24,0.28,0.81,0,3,13,16\n", HEADER);
        assert!(matches!(
            Dataset::from_reader("bad", bad.as_bytes()),
            Err(DashboardError::Csv { .. })
        ));
    }

    #[test]
    fn test_date_filter_is_inclusive() {
        let ds = dataset();
        let range = DateRange::new(date("2011-01-01"), date("2011-06-15")).unwrap();
        assert_eq!(ds.filter_dates(&range).len(), 5);

        let single = DateRange::new(date("2011-01-02"), date("2011-01-02")).unwrap();
        assert_eq!(ds.filter_dates(&single).len(), 1);

        assert!(DateRange::new(date("2012-01-01"), date("2011-01-01")).is_err());
    }

    #[test]
    fn test_describe_skips_missing_columns() {
        let ds = dataset();
        let described = ds.describe(&[Column::Count, Column::DaylightHours]);
        assert_eq!(described.len(), 2);
        let (col, cnt) = described[0];
        assert_eq!(col, Column::Count);
        assert_eq!(cnt.count, 6);
        assert_eq!(cnt.max, 340.0);

        let cleaned = Dataset::new("none", vec![]);
        assert!(cleaned.describe(&Column::RAW).is_empty());
    }

    #[test]
    fn test_correlation_diagonal_and_symmetry() {
        let ds = dataset();
        let m = ds.correlation(&Column::CORRELATED);
        for i in 0..m.columns.len() {
            assert!((m.values[i][i].unwrap() - 1.0).abs() < 1e-9);
            for j in 0..m.columns.len() {
                assert_eq!(m.values[i][j], m.values[j][i]);
            }
        }
        let registered = Column::CORRELATED.iter().position(|c| *c == Column::Registered).unwrap();
        let count = Column::CORRELATED.iter().position(|c| *c == Column::Count).unwrap();
        assert!(m.values[registered][count].unwrap() > 0.9);
    }

    #[test]
    fn test_outlier_split() {
        let mut records = Vec::new();
        let base = dataset().records()[0].clone();
        for cnt in [10.0, 11.0, 9.0, 10.0, 12.0, 8.0, 10.0, 11.0, 9.0, 10.0, 500.0] {
            records.push(HourlyRecord { cnt, ..base.clone() });
        }
        let ds = Dataset::new("synthetic", records);

        let outliers = ds.outliers(2.5);
        assert_eq!(outliers.len(), 1);
        assert_eq!(outliers.records()[0].cnt, 500.0);
        assert_eq!(ds.without_outliers(2.5).len(), 10);
    }

    #[test]
    fn test_box_by_groups_ascending() {
        let ds = dataset();
        let groups = ds.box_by(Column::Season);
        let keys: Vec<f64> = groups.iter().map(|g| g.key).collect();
        assert_eq!(keys, vec![2.0, 4.0]);
        assert_eq!(groups[0].stats.count, 2);
        assert_eq!(groups[1].stats.count, 4);
        assert_eq!(groups[0].stats.median, 285.0);
    }

    #[test]
    fn test_daily_totals() {
        let totals = dataset().daily_totals();
        assert_eq!(totals.len(), 4);
        assert_eq!(totals[0], (date("2011-01-01"), 56.0));
        assert_eq!(totals[2], (date("2011-06-15"), 570.0));
    }
}
