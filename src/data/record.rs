//! One hourly observation of the rental dataset

use crate::encoder::{self, EncodeError, RawSelection, Year};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A CSV row. Columns marked optional may be dropped from the cleaned snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyRecord {
    #[serde(default)]
    pub instant: Option<u32>,
    pub dteday: NaiveDate,
    pub season: u8,
    pub yr: u8,
    pub mnth: u8,
    pub hr: u8,
    pub holiday: u8,
    pub weekday: u8,
    pub workingday: u8,
    pub weathersit: u8,
    pub temp: f64,
    #[serde(default)]
    pub atemp: Option<f64>,
    pub hum: f64,
    pub windspeed: f64,
    #[serde(default)]
    pub casual: Option<f64>,
    #[serde(default)]
    pub registered: Option<f64>,
    pub cnt: f64,
    #[serde(default)]
    pub daylight_hrs: Option<f64>,
}

/// Numeric columns available for statistics and grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Instant,
    Season,
    Year,
    Month,
    Hour,
    Holiday,
    Weekday,
    WorkingDay,
    Weather,
    Temp,
    ATemp,
    Humidity,
    Windspeed,
    Casual,
    Registered,
    Count,
    DaylightHours,
}

impl Column {
    /// Every numeric column of the raw file, in file order
    pub const RAW: [Column; 16] = [
        Column::Instant,
        Column::Season,
        Column::Year,
        Column::Month,
        Column::Hour,
        Column::Holiday,
        Column::Weekday,
        Column::WorkingDay,
        Column::Weather,
        Column::Temp,
        Column::ATemp,
        Column::Humidity,
        Column::Windspeed,
        Column::Casual,
        Column::Registered,
        Column::Count,
    ];

    /// Columns that make up the correlation heatmap
    pub const CORRELATED: [Column; 7] = [
        Column::Temp,
        Column::ATemp,
        Column::Humidity,
        Column::Windspeed,
        Column::Casual,
        Column::Registered,
        Column::Count,
    ];

    /// Dataset header name
    pub fn name(&self) -> &'static str {
        match self {
            Column::Instant => "instant",
            Column::Season => "season",
            Column::Year => "yr",
            Column::Month => "mnth",
            Column::Hour => "hr",
            Column::Holiday => "holiday",
            Column::Weekday => "weekday",
            Column::WorkingDay => "workingday",
            Column::Weather => "weathersit",
            Column::Temp => "temp",
            Column::ATemp => "atemp",
            Column::Humidity => "hum",
            Column::Windspeed => "windspeed",
            Column::Casual => "casual",
            Column::Registered => "registered",
            Column::Count => "cnt",
            Column::DaylightHours => "daylight_hrs",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl HourlyRecord {
    /// Numeric value of a column, `None` when the snapshot lacks it.
    ///
    /// Daylight hours fall back to the month lookup when the file does not carry them.
    pub fn value(&self, column: Column) -> Option<f64> {
        match column {
            Column::Instant => self.instant.map(f64::from),
            Column::Season => Some(f64::from(self.season)),
            Column::Year => Some(f64::from(self.yr)),
            Column::Month => Some(f64::from(self.mnth)),
            Column::Hour => Some(f64::from(self.hr)),
            Column::Holiday => Some(f64::from(self.holiday)),
            Column::Weekday => Some(f64::from(self.weekday)),
            Column::WorkingDay => Some(f64::from(self.workingday)),
            Column::Weather => Some(f64::from(self.weathersit)),
            Column::Temp => Some(self.temp),
            Column::ATemp => self.atemp,
            Column::Humidity => Some(self.hum),
            Column::Windspeed => Some(self.windspeed),
            Column::Casual => self.casual,
            Column::Registered => self.registered,
            Column::Count => Some(self.cnt),
            Column::DaylightHours => self
                .daylight_hrs
                .or_else(|| encoder::daylight_hours(self.mnth).ok()),
        }
    }

    /// The row's features as a selection, for training and replay.
    pub fn selection(&self) -> Result<RawSelection, EncodeError> {
        let year = Year::from_code(self.yr).ok_or_else(|| EncodeError::InvalidSelection {
            field: "yr",
            value: self.yr.to_string(),
            expected: "0 or 1",
        })?;
        let selection = RawSelection {
            year,
            month: self.mnth,
            hour: self.hr,
            holiday: self.holiday != 0,
            working_day: self.workingday != 0,
            weekday: self.weekday,
            weather_situation: self.weathersit,
            temperature: self.temp,
            humidity: self.hum,
            windspeed: self.windspeed,
        };
        selection.validate()?;
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, mnth: u8, hr: u8, cnt: f64) -> HourlyRecord {
        HourlyRecord {
            instant: Some(1),
            dteday: date.parse().unwrap(),
            season: 4,
            yr: 0,
            mnth,
            hr,
            holiday: 0,
            weekday: 6,
            workingday: 0,
            weathersit: 1,
            temp: 0.24,
            atemp: Some(0.2879),
            hum: 0.81,
            windspeed: 0.0,
            casual: Some(3.0),
            registered: Some(13.0),
            cnt,
            daylight_hrs: None,
        }
    }

    #[test]
    fn test_daylight_falls_back_to_lookup() {
        let mut r = record("2011-01-01", 1, 0, 16.0);
        assert_eq!(r.value(Column::DaylightHours), Some(9.8));
        r.daylight_hrs = Some(10.0);
        assert_eq!(r.value(Column::DaylightHours), Some(10.0));
    }

    #[test]
    fn test_optional_columns() {
        let mut r = record("2011-01-01", 1, 0, 16.0);
        r.atemp = None;
        assert_eq!(r.value(Column::ATemp), None);
        assert_eq!(r.value(Column::Count), Some(16.0));
    }

    #[test]
    fn test_selection_from_row() {
        let r = record("2011-01-01", 1, 5, 16.0);
        let selection = r.selection().unwrap();
        assert_eq!(selection.year, Year::Y2011);
        assert_eq!(selection.hour, 5);
        assert!(!selection.working_day);

        let bad = HourlyRecord { weathersit: 9, ..r };
        assert!(bad.selection().is_err());
    }
}
