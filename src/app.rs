//! Dashboard state and key handling

use crate::data::{
    reports, BoxStats, Column, CorrelationMatrix, Dataset, DateRange, FeatureImportance,
    GroupBox, HourlyRecord, ModelScore, Summary,
};
use crate::encoder::{encode, EncodeError, FeatureVector, RawSelection, Year};
use crate::model::{self, LinearModel};
use crate::{Config, Result};
use chrono::NaiveDate;
use crossterm::event::KeyCode;

const TOP_FEATURES: usize = 10;
const SLIDER_STEP: f64 = 0.01;

/// Dashboard sections, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Overview,
    Correlation,
    Outliers,
    Explore,
    Cleaned,
    Model,
    Predict,
}

impl Tab {
    pub const ALL: [Tab; 7] = [
        Tab::Overview,
        Tab::Correlation,
        Tab::Outliers,
        Tab::Explore,
        Tab::Cleaned,
        Tab::Model,
        Tab::Predict,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Overview => "1 Raw Data",
            Tab::Correlation => "2 Correlation",
            Tab::Outliers => "3 Outliers",
            Tab::Explore => "4 Explore",
            Tab::Cleaned => "5 Cleaned",
            Tab::Model => "6 Model",
            Tab::Predict => "7 Predict",
        }
    }

    pub fn index(&self) -> usize {
        Tab::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    fn next(&self) -> Tab {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    fn prev(&self) -> Tab {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

/// Prediction form controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Year,
    Month,
    Hour,
    Holiday,
    WorkingDay,
    Weekday,
    Weather,
    Temperature,
    Humidity,
    Windspeed,
}

impl FormField {
    pub const ALL: [FormField; 10] = [
        FormField::Year,
        FormField::Month,
        FormField::Hour,
        FormField::Holiday,
        FormField::WorkingDay,
        FormField::Weekday,
        FormField::Weather,
        FormField::Temperature,
        FormField::Humidity,
        FormField::Windspeed,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormField::Year => "Year",
            FormField::Month => "Month",
            FormField::Hour => "Hour",
            FormField::Holiday => "Holiday",
            FormField::WorkingDay => "Working Day",
            FormField::Weekday => "Weekday",
            FormField::Weather => "Weather Situation",
            FormField::Temperature => "Temperature",
            FormField::Humidity => "Humidity",
            FormField::Windspeed => "Windspeed",
        }
    }

    /// Continuous fields edited as sliders, the rest are selectors
    pub fn is_slider(&self) -> bool {
        matches!(
            self,
            FormField::Temperature | FormField::Humidity | FormField::Windspeed
        )
    }

    pub fn value_text(&self, selection: &RawSelection) -> String {
        match self {
            FormField::Year => format!("{} ({})", selection.year.code(), selection.year),
            FormField::Month => selection.month.to_string(),
            FormField::Hour => selection.hour.to_string(),
            FormField::Holiday => u8::from(selection.holiday).to_string(),
            FormField::WorkingDay => u8::from(selection.working_day).to_string(),
            FormField::Weekday => selection.weekday.to_string(),
            FormField::Weather => selection.weather_situation.to_string(),
            FormField::Temperature => format!("{:.2}", selection.temperature),
            FormField::Humidity => format!("{:.2}", selection.humidity),
            FormField::Windspeed => format!("{:.2}", selection.windspeed),
        }
    }

    fn slider_mut<'a>(&self, selection: &'a mut RawSelection) -> Option<&'a mut f64> {
        match self {
            FormField::Temperature => Some(&mut selection.temperature),
            FormField::Humidity => Some(&mut selection.humidity),
            FormField::Windspeed => Some(&mut selection.windspeed),
            _ => None,
        }
    }
}

/// Grouping columns offered in the explore section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExploreColumn {
    DaylightHours,
    Holiday,
    Hour,
    Season,
    Temperature,
    Year,
    Weather,
    WorkingDay,
}

impl ExploreColumn {
    pub const ALL: [ExploreColumn; 8] = [
        ExploreColumn::DaylightHours,
        ExploreColumn::Holiday,
        ExploreColumn::Hour,
        ExploreColumn::Season,
        ExploreColumn::Temperature,
        ExploreColumn::Year,
        ExploreColumn::Weather,
        ExploreColumn::WorkingDay,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ExploreColumn::DaylightHours => "Daylight Hours",
            ExploreColumn::Holiday => "Holiday",
            ExploreColumn::Hour => "Hour",
            ExploreColumn::Season => "Season",
            ExploreColumn::Temperature => "Temperature",
            ExploreColumn::Year => "Year",
            ExploreColumn::Weather => "Weather",
            ExploreColumn::WorkingDay => "Working Day",
        }
    }

    pub fn column(&self) -> Column {
        match self {
            ExploreColumn::DaylightHours => Column::DaylightHours,
            ExploreColumn::Holiday => Column::Holiday,
            ExploreColumn::Hour => Column::Hour,
            ExploreColumn::Season => Column::Season,
            ExploreColumn::Temperature => Column::Temp,
            ExploreColumn::Year => Column::Year,
            ExploreColumn::Weather => Column::Weather,
            ExploreColumn::WorkingDay => Column::WorkingDay,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ExploreColumn::DaylightHours => {
                "Longer days go with more rentals: the median climbs from the \
                 short winter months towards the June and July peak."
            }
            ExploreColumn::Holiday => {
                "Holidays have a lower median than regular days; commuting \
                 trips disappear and only leisure use remains."
            }
            ExploreColumn::Hour => {
                "Two commuter peaks dominate: 7-8 am and 5-6 pm. Night hours \
                 between 1 and 5 am are nearly empty."
            }
            ExploreColumn::Season => {
                "Summer and fall carry the highest demand, spring (coded 1, \
                 covering the cold start of the year in this dataset) the lowest."
            }
            ExploreColumn::Temperature => {
                "Demand rises with normalised temperature up to the hottest \
                 readings, where it flattens again."
            }
            ExploreColumn::Year => {
                "2012 (coded 1) shows clearly higher counts than 2011: the \
                 system grew during the period covered."
            }
            ExploreColumn::Weather => {
                "Clear weather (1) has the most rentals; heavy rain or snow \
                 (4) is rare and nearly empties the system."
            }
            ExploreColumn::WorkingDay => {
                "Working days have a higher median, driven by the commuter \
                 peaks; weekends spread demand across the afternoon."
            }
        }
    }
}

/// What a keystroke is currently typing into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Field(FormField),
    StartDate,
    EndDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing(EditTarget),
}

/// Everything the dashboard reads from disk
#[derive(Debug, Clone)]
pub struct Sources {
    pub raw: Dataset,
    pub cleaned: Dataset,
    pub model: Option<LinearModel>,
    pub scores: Vec<ModelScore>,
    pub importances: Vec<FeatureImportance>,
}

impl Sources {
    /// Datasets are required; the model and its reports are optional.
    pub fn load(config: &Config) -> Result<Self> {
        let raw = Dataset::load(&config.data.raw_path)?;
        let cleaned = Dataset::load(&config.data.cleaned_path)?;

        let model = LinearModel::load(&config.model.path)
            .map_err(|e| log::warn!("No model loaded from {}: {}", config.model.path.display(), e))
            .ok();
        let scores = reports::load_scores(&config.data.scores_path)
            .map_err(|e| log::warn!("No model scores: {}", e))
            .unwrap_or_default();
        let importances = reports::load_importances(&config.data.importances_path, TOP_FEATURES)
            .map_err(|e| log::warn!("No feature importances: {}", e))
            .unwrap_or_default();

        Ok(Sources {
            raw,
            cleaned,
            model,
            scores,
            importances,
        })
    }
}

/// Statistics over the unfiltered raw snapshot
#[derive(Debug, Clone)]
pub struct RawAnalysis {
    pub head: Vec<HourlyRecord>,
    pub summary: Vec<(Column, Summary)>,
    pub correlation: CorrelationMatrix,
    pub count_box: Option<BoxStats>,
    pub outlier_rows: usize,
    pub outliers_by_season: Vec<GroupBox>,
    pub by_season: Vec<GroupBox>,
}

impl RawAnalysis {
    pub fn compute(raw: &Dataset, sigma: f64, head_rows: usize) -> Self {
        let outliers = raw.outliers(sigma);
        RawAnalysis {
            head: raw.head(head_rows).to_vec(),
            summary: raw.describe(&Column::RAW),
            correlation: raw.correlation(&Column::CORRELATED),
            count_box: crate::data::stats::box_stats(&raw.column(Column::Count)),
            outlier_rows: outliers.len(),
            outliers_by_season: outliers.box_by(Column::Season),
            by_season: raw.box_by(Column::Season),
        }
    }
}

/// Statistics over the date-filtered cleaned snapshot
#[derive(Debug, Clone)]
pub struct ViewAnalysis {
    pub rows: usize,
    pub head: Vec<HourlyRecord>,
    pub summary: Vec<(Column, Summary)>,
    pub kept_box: Option<BoxStats>,
    /// Share of filtered rows dropped by the outlier rule, 0..=1
    pub removed_share: f64,
    pub daily: Vec<(NaiveDate, f64)>,
    /// One entry per `ExploreColumn::ALL`
    pub explore: Vec<Vec<GroupBox>>,
}

impl ViewAnalysis {
    pub fn compute(view: &Dataset, sigma: f64, head_rows: usize) -> Self {
        let kept = view.without_outliers(sigma);
        let removed_share = if view.is_empty() {
            0.0
        } else {
            (view.len() - kept.len()) as f64 / view.len() as f64
        };

        let mut columns = Column::RAW.to_vec();
        columns.push(Column::DaylightHours);

        ViewAnalysis {
            rows: view.len(),
            head: view.head(head_rows).to_vec(),
            summary: view.describe(&columns),
            kept_box: crate::data::stats::box_stats(&kept.column(Column::Count)),
            removed_share,
            daily: view.daily_totals(),
            explore: ExploreColumn::ALL
                .iter()
                .map(|c| view.box_by(c.column()))
                .collect(),
        }
    }
}

pub struct App {
    pub sources: Sources,
    pub range: DateRange,
    pub sigma: f64,
    pub head_rows: usize,
    pub raw_analysis: RawAnalysis,
    pub view_analysis: ViewAnalysis,
    pub tab: Tab,
    pub selection: RawSelection,
    pub focused_field: FormField,
    pub explore: ExploreColumn,
    pub input_mode: InputMode,
    pub input: String,
    pub status: Option<String>,
}

impl App {
    pub fn new(sources: Sources, config: &Config) -> Result<App> {
        let range = DateRange::new(config.filter.start_date, config.filter.end_date)?;
        let sigma = config.analysis.outlier_sigma;
        let head_rows = config.analysis.head_rows;
        let raw_analysis = RawAnalysis::compute(&sources.raw, sigma, head_rows);
        let view = sources.cleaned.filter_dates(&range);
        let view_analysis = ViewAnalysis::compute(&view, sigma, head_rows);

        Ok(App {
            sources,
            range,
            sigma,
            head_rows,
            raw_analysis,
            view_analysis,
            tab: Tab::Overview,
            selection: RawSelection::default(),
            focused_field: FormField::Year,
            explore: ExploreColumn::DaylightHours,
            input_mode: InputMode::Normal,
            input: String::new(),
            status: None,
        })
    }

    /// Re-filter the cleaned data; the previous range stays on error.
    pub fn set_range(&mut self, start: NaiveDate, end: NaiveDate) -> Result<()> {
        let range = DateRange::new(start, end)?;
        let view = self.sources.cleaned.filter_dates(&range);
        log::debug!("Date filter {}..={} keeps {} rows", start, end, view.len());
        self.view_analysis = ViewAnalysis::compute(&view, self.sigma, self.head_rows);
        self.range = range;
        Ok(())
    }

    pub fn features(&self) -> std::result::Result<FeatureVector, EncodeError> {
        encode(&self.selection)
    }

    /// Predicted rentals, rounded, when a model is loaded and the form encodes.
    pub fn prediction(&self) -> Option<f64> {
        let model = self.sources.model.as_ref()?;
        let features = self.features().ok()?;
        Some(model::rentals(model.predict(&features)))
    }

    pub fn explore_groups(&self) -> &[GroupBox] {
        let idx = ExploreColumn::ALL
            .iter()
            .position(|c| *c == self.explore)
            .unwrap_or(0);
        self.view_analysis
            .explore
            .get(idx)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn next_field(&mut self) {
        let idx = FormField::ALL.iter().position(|f| *f == self.focused_field).unwrap_or(0);
        self.focused_field = FormField::ALL[(idx + 1) % FormField::ALL.len()];
    }

    fn prev_field(&mut self) {
        let idx = FormField::ALL.iter().position(|f| *f == self.focused_field).unwrap_or(0);
        self.focused_field = FormField::ALL[(idx + FormField::ALL.len() - 1) % FormField::ALL.len()];
    }

    fn next_explore(&mut self, forward: bool) {
        let len = ExploreColumn::ALL.len();
        let idx = ExploreColumn::ALL.iter().position(|c| *c == self.explore).unwrap_or(0);
        let idx = if forward { (idx + 1) % len } else { (idx + len - 1) % len };
        self.explore = ExploreColumn::ALL[idx];
    }

    /// Step the focused control: selectors cycle through their options,
    /// sliders move by 0.01 within [0, 1].
    fn adjust(&mut self, forward: bool) {
        let s = &mut self.selection;
        match self.focused_field {
            FormField::Year => {
                s.year = match s.year {
                    Year::Y2011 => Year::Y2012,
                    Year::Y2012 => Year::Y2011,
                }
            }
            FormField::Month => s.month = cycle(s.month, 1, 12, forward),
            FormField::Hour => s.hour = cycle(s.hour, 0, 23, forward),
            FormField::Holiday => s.holiday = !s.holiday,
            FormField::WorkingDay => s.working_day = !s.working_day,
            FormField::Weekday => s.weekday = cycle(s.weekday, 0, 6, forward),
            FormField::Weather => s.weather_situation = cycle(s.weather_situation, 1, 4, forward),
            field => {
                if let Some(value) = field.slider_mut(s) {
                    let step = if forward { SLIDER_STEP } else { -SLIDER_STEP };
                    *value = ((*value + step).clamp(0.0, 1.0) * 100.0).round() / 100.0;
                }
            }
        }
    }

    fn begin_edit(&mut self, target: EditTarget) {
        self.input = match target {
            EditTarget::Field(field) => field.value_text(&self.selection),
            EditTarget::StartDate => self.range.start().to_string(),
            EditTarget::EndDate => self.range.end().to_string(),
        };
        self.input_mode = InputMode::Editing(target);
        self.status = None;
    }

    fn commit_edit(&mut self, target: EditTarget) {
        let text = std::mem::take(&mut self.input);
        self.input_mode = InputMode::Normal;
        let outcome = match target {
            EditTarget::Field(field) => self.commit_slider(field, text.trim()),
            EditTarget::StartDate => parse_date(text.trim())
                .and_then(|start| self.set_range(start, self.range.end()).map_err(|e| e.to_string())),
            EditTarget::EndDate => parse_date(text.trim())
                .and_then(|end| self.set_range(self.range.start(), end).map_err(|e| e.to_string())),
        };
        if let Err(message) = outcome {
            log::debug!("Rejected input {:?}: {}", text, message);
            self.status = Some(message);
        }
    }

    fn commit_slider(&mut self, field: FormField, text: &str) -> std::result::Result<(), String> {
        let value: f64 = text
            .parse()
            .map_err(|_| format!("{}: '{}' is not a number", field.label(), text))?;
        if !(0.0..=1.0).contains(&value) {
            return Err(format!("{} must be between 0 and 1", field.label()));
        }
        match field.slider_mut(&mut self.selection) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(format!("{} is not a slider", field.label())),
        }
    }

    /// Apply one key press. Returns `false` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        match self.input_mode {
            InputMode::Normal => match code {
                KeyCode::Char('q') => return false,
                KeyCode::Tab => self.tab = self.tab.next(),
                KeyCode::BackTab => self.tab = self.tab.prev(),
                KeyCode::Char(c @ '1'..='7') => {
                    let idx = c as usize - '1' as usize;
                    self.tab = Tab::ALL[idx];
                }
                KeyCode::Char('s') => self.begin_edit(EditTarget::StartDate),
                KeyCode::Char('e') => self.begin_edit(EditTarget::EndDate),
                KeyCode::Char('r') if self.tab == Tab::Predict => {
                    self.selection = RawSelection::default();
                }
                KeyCode::Down if self.tab == Tab::Predict => self.next_field(),
                KeyCode::Up if self.tab == Tab::Predict => self.prev_field(),
                KeyCode::Right if self.tab == Tab::Predict => self.adjust(true),
                KeyCode::Left if self.tab == Tab::Predict => self.adjust(false),
                KeyCode::Enter if self.tab == Tab::Predict => {
                    if self.focused_field.is_slider() {
                        self.begin_edit(EditTarget::Field(self.focused_field));
                    } else {
                        self.adjust(true);
                    }
                }
                KeyCode::Down | KeyCode::Right if self.tab == Tab::Explore => self.next_explore(true),
                KeyCode::Up | KeyCode::Left if self.tab == Tab::Explore => self.next_explore(false),
                _ => {}
            },
            InputMode::Editing(target) => match code {
                KeyCode::Enter => self.commit_edit(target),
                KeyCode::Esc => {
                    self.input.clear();
                    self.input_mode = InputMode::Normal;
                }
                KeyCode::Char(c) if c.is_ascii_digit() || c == '.' || c == '-' => self.input.push(c),
                KeyCode::Backspace => {
                    self.input.pop();
                }
                _ => {}
            },
        }
        true
    }
}

fn cycle(value: u8, min: u8, max: u8, forward: bool) -> u8 {
    match (forward, value) {
        (true, v) if v >= max => min,
        (true, v) => v + 1,
        (false, v) if v <= min => max,
        (false, v) => v - 1,
    }
}

fn parse_date(text: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .map_err(|_| format!("'{}' is not a date (YYYY-MM-DD)", text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::FEATURE_COUNT;
    use crate::model::Target;

    const CSV: &str = "instant,dteday,season,yr,mnth,hr,holiday,weekday,workingday,weathersit,temp,atemp,hum,windspeed,casual,registered,cnt
1,2011-01-01,4,0,1,0,0,6,0,1,0.24,0.2879,0.81,0,3,13,16
2,2011-01-01,4,0,1,1,0,6,0,1,0.22,0.2727,0.8,0,8,32,40
3,2011-07-04,3,0,7,17,1,1,0,1,0.8,0.75,0.4,0.2,150,200,350
4,2012-06-12,2,1,6,8,0,2,1,2,0.6,0.58,0.7,0.1,20,500,520
";

    fn sources(model: Option<LinearModel>) -> Sources {
        let raw = Dataset::from_reader("raw", CSV.as_bytes()).unwrap();
        Sources {
            cleaned: raw.clone(),
            raw,
            model,
            scores: vec![],
            importances: vec![],
        }
    }

    fn app() -> App {
        let mut weights = vec![0.0; FEATURE_COUNT];
        weights[1] = 10.0;
        let model = LinearModel::new(Target::Count, 100.0, weights);
        App::new(sources(Some(model)), &Config::default()).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        app.input.clear();
        for c in text.chars() {
            app.handle_key(KeyCode::Char(c));
        }
    }

    #[test]
    fn test_quit_and_tab_navigation() {
        let mut app = app();
        assert!(app.handle_key(KeyCode::Tab));
        assert_eq!(app.tab, Tab::Correlation);
        app.handle_key(KeyCode::BackTab);
        app.handle_key(KeyCode::BackTab);
        assert_eq!(app.tab, Tab::Predict);
        app.handle_key(KeyCode::Char('4'));
        assert_eq!(app.tab, Tab::Explore);
        assert!(!app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn test_default_form_predicts() {
        let app = app();
        // 100 + 10 * hour 8
        assert_eq!(app.prediction(), Some(180.0));
        let features = app.features().unwrap();
        assert_eq!(features.get("daylight_hrs"), Some(14.93));
    }

    #[test]
    fn test_selectors_cycle_and_wrap() {
        let mut app = app();
        app.handle_key(KeyCode::Char('7'));
        app.handle_key(KeyCode::Down);
        assert_eq!(app.focused_field, FormField::Month);
        for _ in 0..7 {
            app.handle_key(KeyCode::Right);
        }
        // June + 7 wraps to January
        assert_eq!(app.selection.month, 1);
        assert_eq!(app.features().unwrap().get("season_4"), Some(1.0));
        app.handle_key(KeyCode::Left);
        assert_eq!(app.selection.month, 12);

        app.handle_key(KeyCode::Up);
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.selection.year, Year::Y2011);
    }

    #[test]
    fn test_slider_step_and_typed_value() {
        let mut app = app();
        app.tab = Tab::Predict;
        app.focused_field = FormField::Humidity;
        app.handle_key(KeyCode::Right);
        assert!((app.selection.humidity - 0.51).abs() < 1e-12);

        app.handle_key(KeyCode::Enter);
        assert_eq!(app.input_mode, InputMode::Editing(EditTarget::Field(FormField::Humidity)));
        type_text(&mut app, "0.9");
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.selection.humidity, 0.9);

        app.handle_key(KeyCode::Enter);
        type_text(&mut app, "1.5");
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.selection.humidity, 0.9);
        assert!(app.status.is_some());
    }

    #[test]
    fn test_slider_clamps_at_bounds() {
        let mut app = app();
        app.tab = Tab::Predict;
        app.focused_field = FormField::Windspeed;
        app.selection.windspeed = 0.0;
        app.handle_key(KeyCode::Left);
        assert_eq!(app.selection.windspeed, 0.0);
    }

    #[test]
    fn test_date_filter_edit() {
        let mut app = app();
        assert_eq!(app.view_analysis.rows, 4);

        app.handle_key(KeyCode::Char('s'));
        type_text(&mut app, "2011-07-01");
        app.handle_key(KeyCode::Enter);
        assert_eq!(app.range.start(), date("2011-07-01"));
        assert_eq!(app.view_analysis.rows, 2);
        // Raw statistics ignore the filter
        assert_eq!(app.raw_analysis.summary[0].1.count, 4);

        app.handle_key(KeyCode::Char('e'));
        type_text(&mut app, "2010-01-01");
        app.handle_key(KeyCode::Enter);
        assert!(app.status.is_some());
        assert_eq!(app.range.end(), date("2012-12-31"));
        assert_eq!(app.view_analysis.rows, 2);
    }

    #[test]
    fn test_escape_cancels_edit() {
        let mut app = app();
        app.handle_key(KeyCode::Char('s'));
        type_text(&mut app, "2012-01-01");
        app.handle_key(KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.range.start(), date("2011-01-01"));
    }

    #[test]
    fn test_explore_selection() {
        let mut app = app();
        app.tab = Tab::Explore;
        app.handle_key(KeyCode::Down);
        assert_eq!(app.explore, ExploreColumn::Holiday);
        let keys: Vec<f64> = app.explore_groups().iter().map(|g| g.key).collect();
        assert_eq!(keys, vec![0.0, 1.0]);
        app.handle_key(KeyCode::Up);
        app.handle_key(KeyCode::Up);
        assert_eq!(app.explore, ExploreColumn::WorkingDay);
    }

    #[test]
    fn test_no_model_still_encodes() {
        let app = App::new(sources(None), &Config::default()).unwrap();
        assert!(app.prediction().is_none());
        assert!(app.features().is_ok());
    }

    #[test]
    fn test_cycle_bounds() {
        assert_eq!(cycle(23, 0, 23, true), 0);
        assert_eq!(cycle(0, 0, 23, false), 23);
        assert_eq!(cycle(2, 1, 4, true), 3);
    }
}
