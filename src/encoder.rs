//! Feature encoding for the hourly rental model
//!
//! Turns a raw selection into the fixed-order vector the regressor was fit on:
//! eight scalars followed by the season, weather, weekday and month one-hot
//! groups. The column list below is the contract with the model artifact.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Bumped whenever `FEATURE_COLUMNS` changes shape or order.
pub const FEATURE_SCHEMA_VERSION: u32 = 1;

pub const FEATURE_COUNT: usize = 35;

/// Column order of the encoded vector, as the model was trained.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "yr",
    "hr",
    "holiday",
    "workingday",
    "temp",
    "hum",
    "windspeed",
    "daylight_hrs",
    "season_1",
    "season_2",
    "season_3",
    "season_4",
    "weathersit_1",
    "weathersit_2",
    "weathersit_3",
    "weathersit_4",
    "weekday_0",
    "weekday_1",
    "weekday_2",
    "weekday_3",
    "weekday_4",
    "weekday_5",
    "weekday_6",
    "mnth_1",
    "mnth_2",
    "mnth_3",
    "mnth_4",
    "mnth_5",
    "mnth_6",
    "mnth_7",
    "mnth_8",
    "mnth_9",
    "mnth_10",
    "mnth_11",
    "mnth_12",
];

const SCALAR_LEN: usize = 8;
const SEASON_OFFSET: usize = 8;
const WEATHER_OFFSET: usize = 12;
const WEEKDAY_OFFSET: usize = 16;
const MONTH_OFFSET: usize = 23;

/// Average daylight hours in Washington D.C., January first.
pub const DAYLIGHT_HOURS: [f64; 12] = [
    9.8, 10.82, 11.98, 13.26, 14.34, 14.93, 14.68, 13.75, 12.5, 11.25, 10.12, 9.5,
];

/// Encoding failures. Nothing is returned when any field is rejected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("invalid selection: {field} = {value} (expected {expected})")]
    InvalidSelection {
        field: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("inconsistent {field}: supplied {supplied} but month {month} implies {derived}")]
    InconsistentDerivedField {
        field: &'static str,
        supplied: String,
        derived: String,
        month: u8,
    },
}

fn invalid(field: &'static str, value: impl fmt::Display, expected: &'static str) -> EncodeError {
    EncodeError::InvalidSelection {
        field,
        value: value.to_string(),
        expected,
    }
}

fn check_range(
    field: &'static str,
    value: u8,
    min: u8,
    max: u8,
    expected: &'static str,
) -> Result<u8, EncodeError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(invalid(field, value, expected))
    }
}

fn check_finite(field: &'static str, value: f64) -> Result<f64, EncodeError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid(field, value, "a finite number"))
    }
}

/// Dataset year. The data covers 2011 (code 0) and 2012 (code 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Year {
    Y2011,
    Y2012,
}

impl Year {
    pub fn code(&self) -> u8 {
        match self {
            Year::Y2011 => 0,
            Year::Y2012 => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Year::Y2011),
            1 => Some(Year::Y2012),
            _ => None,
        }
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Year::Y2011 => write!(f, "2011"),
            Year::Y2012 => write!(f, "2012"),
        }
    }
}

/// Meteorological season as coded in the dataset (1 = spring .. 4 = winter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub fn from_month(month: u8) -> Result<Self, EncodeError> {
        match month {
            3..=5 => Ok(Season::Spring),
            6..=8 => Ok(Season::Summer),
            9..=11 => Ok(Season::Fall),
            12 | 1 | 2 => Ok(Season::Winter),
            other => Err(invalid("month", other, "1..=12")),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Season::Spring => 1,
            Season::Summer => 2,
            Season::Fall => 3,
            Season::Winter => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Season::Spring),
            2 => Some(Season::Summer),
            3 => Some(Season::Fall),
            4 => Some(Season::Winter),
            _ => None,
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Season::Spring => write!(f, "Spring"),
            Season::Summer => write!(f, "Summer"),
            Season::Fall => write!(f, "Fall"),
            Season::Winter => write!(f, "Winter"),
        }
    }
}

/// Daylight hours for a calendar month (1-based).
pub fn daylight_hours(month: u8) -> Result<f64, EncodeError> {
    let month = check_range("month", month, 1, 12, "1..=12")?;
    Ok(DAYLIGHT_HOURS[usize::from(month - 1)])
}

/// The user-facing feature choices. Season and daylight hours are not
/// fields: they always follow from `month`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSelection {
    pub year: Year,
    pub month: u8,
    pub hour: u8,
    pub holiday: bool,
    pub working_day: bool,
    pub weekday: u8,
    pub weather_situation: u8,
    pub temperature: f64,
    pub humidity: f64,
    pub windspeed: f64,
}

impl Default for RawSelection {
    fn default() -> Self {
        RawSelection {
            year: Year::Y2012,
            month: 6,
            hour: 8,
            holiday: false,
            working_day: true,
            weekday: 2,
            weather_situation: 1,
            temperature: 0.5,
            humidity: 0.5,
            windspeed: 0.5,
        }
    }
}

impl RawSelection {
    pub fn season(&self) -> Result<Season, EncodeError> {
        Season::from_month(self.month)
    }

    pub fn daylight_hours(&self) -> Result<f64, EncodeError> {
        daylight_hours(self.month)
    }

    /// Check every field against its documented domain.
    pub fn validate(&self) -> Result<(), EncodeError> {
        check_range("month", self.month, 1, 12, "1..=12")?;
        check_range("hour", self.hour, 0, 23, "0..=23")?;
        check_range("weekday", self.weekday, 0, 6, "0..=6")?;
        check_range("weathersit", self.weather_situation, 1, 4, "1..=4")?;
        check_finite("temp", self.temperature)?;
        check_finite("hum", self.humidity)?;
        check_finite("windspeed", self.windspeed)?;
        Ok(())
    }
}

/// Wire form of a selection, keyed by dataset column names.
///
/// `season` and `daylight_hrs` are accepted only so that callers echoing a
/// dataset row can be checked; they must agree with `mnth`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionPayload {
    pub yr: u8,
    pub mnth: u8,
    pub hr: u8,
    pub holiday: u8,
    pub workingday: u8,
    pub weekday: u8,
    pub weathersit: u8,
    pub temp: f64,
    pub hum: f64,
    pub windspeed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daylight_hrs: Option<f64>,
}

fn flag(field: &'static str, value: u8) -> Result<bool, EncodeError> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(invalid(field, other, "0 or 1")),
    }
}

impl TryFrom<SelectionPayload> for RawSelection {
    type Error = EncodeError;

    fn try_from(payload: SelectionPayload) -> Result<Self, Self::Error> {
        let year = Year::from_code(payload.yr).ok_or_else(|| invalid("yr", payload.yr, "0 or 1"))?;
        let selection = RawSelection {
            year,
            month: payload.mnth,
            hour: payload.hr,
            holiday: flag("holiday", payload.holiday)?,
            working_day: flag("workingday", payload.workingday)?,
            weekday: payload.weekday,
            weather_situation: payload.weathersit,
            temperature: payload.temp,
            humidity: payload.hum,
            windspeed: payload.windspeed,
        };
        selection.validate()?;

        if let Some(season) = payload.season {
            let derived = selection.season()?;
            if season != derived.code() {
                return Err(EncodeError::InconsistentDerivedField {
                    field: "season",
                    supplied: season.to_string(),
                    derived: derived.code().to_string(),
                    month: selection.month,
                });
            }
        }
        if let Some(hours) = payload.daylight_hrs {
            let derived = selection.daylight_hours()?;
            if hours != derived {
                return Err(EncodeError::InconsistentDerivedField {
                    field: "daylight_hrs",
                    supplied: hours.to_string(),
                    derived: derived.to_string(),
                    month: selection.month,
                });
            }
        }

        Ok(selection)
    }
}

impl From<&RawSelection> for SelectionPayload {
    fn from(selection: &RawSelection) -> Self {
        SelectionPayload {
            yr: selection.year.code(),
            mnth: selection.month,
            hr: selection.hour,
            holiday: u8::from(selection.holiday),
            workingday: u8::from(selection.working_day),
            weekday: selection.weekday,
            weathersit: selection.weather_situation,
            temp: selection.temperature,
            hum: selection.humidity,
            windspeed: selection.windspeed,
            season: None,
            daylight_hrs: None,
        }
    }
}

/// Model-ready input, laid out as `FEATURE_COLUMNS`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        FEATURE_COUNT
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Value of a named column
    pub fn get(&self, column: &str) -> Option<f64> {
        FEATURE_COLUMNS
            .iter()
            .position(|name| *name == column)
            .map(|idx| self.values[idx])
    }

    /// `(column, value)` pairs in model order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FEATURE_COLUMNS.iter().copied().zip(self.values.iter().copied())
    }

    pub fn scalars(&self) -> &[f64] {
        &self.values[..SCALAR_LEN]
    }

    pub fn season_block(&self) -> &[f64] {
        &self.values[SEASON_OFFSET..WEATHER_OFFSET]
    }

    pub fn weather_block(&self) -> &[f64] {
        &self.values[WEATHER_OFFSET..WEEKDAY_OFFSET]
    }

    pub fn weekday_block(&self) -> &[f64] {
        &self.values[WEEKDAY_OFFSET..MONTH_OFFSET]
    }

    pub fn month_block(&self) -> &[f64] {
        &self.values[MONTH_OFFSET..]
    }
}

/// Encode a selection into the model's feature vector.
///
/// Scalars pass through unscaled. Each one-hot group gets exactly one 1.
pub fn encode(raw: &RawSelection) -> Result<FeatureVector, EncodeError> {
    raw.validate()?;
    let season = raw.season()?;

    let mut values = [0.0; FEATURE_COUNT];
    values[0] = f64::from(raw.year.code());
    values[1] = f64::from(raw.hour);
    values[2] = if raw.holiday { 1.0 } else { 0.0 };
    values[3] = if raw.working_day { 1.0 } else { 0.0 };
    values[4] = raw.temperature;
    values[5] = raw.humidity;
    values[6] = raw.windspeed;
    values[7] = raw.daylight_hours()?;

    // All indices below are in range after validate().
    values[SEASON_OFFSET + usize::from(season.code() - 1)] = 1.0;
    values[WEATHER_OFFSET + usize::from(raw.weather_situation - 1)] = 1.0;
    values[WEEKDAY_OFFSET + usize::from(raw.weekday)] = 1.0;
    values[MONTH_OFFSET + usize::from(raw.month - 1)] = 1.0;

    Ok(FeatureVector { values })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sum(block: &[f64]) -> f64 {
        block.iter().sum()
    }

    fn scenario() -> RawSelection {
        RawSelection {
            year: Year::Y2012,
            month: 6,
            hour: 8,
            holiday: false,
            working_day: true,
            weekday: 2,
            weather_situation: 1,
            temperature: 0.5,
            humidity: 0.5,
            windspeed: 0.5,
        }
    }

    #[test]
    fn test_column_layout() {
        assert_eq!(FEATURE_COLUMNS[SEASON_OFFSET], "season_1");
        assert_eq!(FEATURE_COLUMNS[WEATHER_OFFSET], "weathersit_1");
        assert_eq!(FEATURE_COLUMNS[WEEKDAY_OFFSET], "weekday_0");
        assert_eq!(FEATURE_COLUMNS[MONTH_OFFSET], "mnth_1");
        assert_eq!(FEATURE_COLUMNS[FEATURE_COUNT - 1], "mnth_12");
    }

    #[test]
    fn test_scenario_june_weekday() {
        let v = encode(&scenario()).unwrap();

        assert_eq!(v.scalars(), &[1.0, 8.0, 0.0, 1.0, 0.5, 0.5, 0.5, 14.93]);
        assert_eq!(v.get("season_2"), Some(1.0));
        assert_eq!(v.get("weathersit_1"), Some(1.0));
        assert_eq!(v.get("weekday_2"), Some(1.0));
        assert_eq!(v.get("mnth_6"), Some(1.0));

        let hot: Vec<&str> = v
            .iter()
            .skip(SCALAR_LEN)
            .filter(|(_, value)| *value == 1.0)
            .map(|(name, _)| name)
            .collect();
        assert_eq!(hot, vec!["season_2", "weathersit_1", "weekday_2", "mnth_6"]);
        assert_eq!(sum(&v.as_slice()[SCALAR_LEN..]), 4.0);
    }

    #[test]
    fn test_season_block_every_month() {
        let expected = [4, 4, 1, 1, 1, 2, 2, 2, 3, 3, 3, 4];
        for month in 1..=12u8 {
            let raw = RawSelection { month, ..scenario() };
            let v = encode(&raw).unwrap();
            let season = expected[usize::from(month - 1)];

            assert_eq!(sum(v.season_block()), 1.0, "month {}", month);
            assert_eq!(v.get(&format!("season_{}", season)), Some(1.0), "month {}", month);
            assert_eq!(raw.season().unwrap().code(), season);
        }
    }

    #[test]
    fn test_daylight_every_month() {
        for month in 1..=12u8 {
            let v = encode(&RawSelection { month, ..scenario() }).unwrap();
            assert_eq!(v.get("daylight_hrs"), Some(DAYLIGHT_HOURS[usize::from(month - 1)]));
        }
        assert_eq!(daylight_hours(1).unwrap(), 9.8);
        assert_eq!(daylight_hours(12).unwrap(), 9.5);
    }

    #[test]
    fn test_month_block_independent_of_season() {
        for month in 1..=12u8 {
            let v = encode(&RawSelection { month, ..scenario() }).unwrap();
            assert_eq!(sum(v.month_block()), 1.0);
            assert_eq!(v.month_block()[usize::from(month - 1)], 1.0);
        }
    }

    #[test]
    fn test_weather_and_weekday_blocks() {
        for weather_situation in 1..=4u8 {
            let v = encode(&RawSelection { weather_situation, ..scenario() }).unwrap();
            assert_eq!(sum(v.weather_block()), 1.0);
            assert_eq!(v.weather_block()[usize::from(weather_situation - 1)], 1.0);
        }
        for weekday in 0..=6u8 {
            let v = encode(&RawSelection { weekday, ..scenario() }).unwrap();
            assert_eq!(sum(v.weekday_block()), 1.0);
            assert_eq!(v.weekday_block()[usize::from(weekday)], 1.0);
        }
    }

    #[test]
    fn test_encode_is_deterministic() {
        let raw = RawSelection { temperature: 0.123456789, ..scenario() };
        let a = encode(&raw).unwrap();
        let b = encode(&raw).unwrap();
        let bits_a: Vec<u64> = a.as_slice().iter().map(|x| x.to_bits()).collect();
        let bits_b: Vec<u64> = b.as_slice().iter().map(|x| x.to_bits()).collect();
        assert_eq!(bits_a, bits_b);
    }

    #[test]
    fn test_out_of_range_rejected() {
        for month in [0u8, 13] {
            let err = encode(&RawSelection { month, ..scenario() }).unwrap_err();
            assert!(matches!(err, EncodeError::InvalidSelection { field: "month", .. }));
        }
        assert!(encode(&RawSelection { weekday: 7, ..scenario() }).is_err());
        assert!(encode(&RawSelection { weather_situation: 0, ..scenario() }).is_err());
        assert!(encode(&RawSelection { weather_situation: 5, ..scenario() }).is_err());
        assert!(encode(&RawSelection { hour: 24, ..scenario() }).is_err());
        assert!(encode(&RawSelection { humidity: f64::NAN, ..scenario() }).is_err());
    }

    #[test]
    fn test_scalars_pass_through_unscaled() {
        let raw = RawSelection { temperature: 3.5, windspeed: -1.0, ..scenario() };
        let v = encode(&raw).unwrap();
        assert_eq!(v.get("temp"), Some(3.5));
        assert_eq!(v.get("windspeed"), Some(-1.0));
    }

    fn payload() -> SelectionPayload {
        SelectionPayload::from(&scenario())
    }

    #[test]
    fn test_payload_round_trip() {
        let raw = RawSelection::try_from(payload()).unwrap();
        assert_eq!(raw, scenario());
    }

    #[test]
    fn test_payload_derived_fields_must_agree() {
        let consistent = SelectionPayload {
            season: Some(2),
            daylight_hrs: Some(14.93),
            ..payload()
        };
        assert!(RawSelection::try_from(consistent).is_ok());

        let bad_season = SelectionPayload { season: Some(3), ..payload() };
        assert!(matches!(
            RawSelection::try_from(bad_season),
            Err(EncodeError::InconsistentDerivedField { field: "season", .. })
        ));

        let bad_daylight = SelectionPayload { daylight_hrs: Some(9.8), ..payload() };
        assert!(matches!(
            RawSelection::try_from(bad_daylight),
            Err(EncodeError::InconsistentDerivedField { field: "daylight_hrs", .. })
        ));
    }

    #[test]
    fn test_payload_flags_and_year_validated() {
        assert!(RawSelection::try_from(SelectionPayload { holiday: 2, ..payload() }).is_err());
        assert!(RawSelection::try_from(SelectionPayload { yr: 2, ..payload() }).is_err());
        assert!(RawSelection::try_from(SelectionPayload { mnth: 13, ..payload() }).is_err());
    }

    #[test]
    fn test_payload_from_json() {
        let json = r#"{"yr":1,"mnth":6,"hr":8,"holiday":0,"workingday":1,"weekday":2,
            "weathersit":1,"temp":0.5,"hum":0.5,"windspeed":0.5,"season":2}"#;
        let payload: SelectionPayload = serde_json::from_str(json).unwrap();
        assert_eq!(RawSelection::try_from(payload).unwrap(), scenario());
    }
}
