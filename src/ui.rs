//! Terminal rendering of the dashboard sections

use crate::app::{App, EditTarget, ExploreColumn, FormField, InputMode, Tab};
use crate::data::{BoxStats, Column, CorrelationMatrix, GroupBox, HourlyRecord, Summary};
use ratatui::{
    prelude::*,
    widgets::{Dataset as Series, *},
};

const INSIGHTS: &str = "\
Columns used for prediction: season (1 spring .. 4 winter), year (0 = 2011, 1 = 2012), \
month, hour, holiday, working day, weather situation (1 clear .. 4 heavy rain/snow), \
normalised temperature, humidity and windspeed, plus daylight hours derived from the month.

- Demand is highest in summer and lowest in winter, and higher in 2012 than in 2011.
- July and August are the busiest months.
- Hourly demand peaks at 7-8 am and 5-6 pm on working days.
- Clear weather and mid-range temperatures favour rentals.
- Moderate humidity and low windspeed go with the highest counts.";

fn num(value: f64) -> String {
    if value.is_finite() {
        format!("{:.2}", value)
    } else {
        "-".to_string()
    }
}

fn titled(title: &str) -> Block<'_> {
    Block::default().borders(Borders::ALL).title(title)
}

fn header_style() -> Style {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
}

pub fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints(
            [
                Constraint::Length(3), // Tabs
                Constraint::Length(1), // Date filter
                Constraint::Min(10),   // Section
                Constraint::Length(1), // Footer
            ]
            .as_ref(),
        )
        .split(f.area());

    let titles: Vec<&str> = Tab::ALL.iter().map(|t| t.title()).collect();
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .block(titled("Bike Sharing in Washington, D.C."))
        .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    f.render_widget(tabs, chunks[0]);

    render_filter(f, app, chunks[1]);

    match app.tab {
        Tab::Overview => render_overview(f, app, chunks[2]),
        Tab::Correlation => render_correlation(f, &app.raw_analysis.correlation, chunks[2]),
        Tab::Outliers => render_outliers(f, app, chunks[2]),
        Tab::Explore => render_explore(f, app, chunks[2]),
        Tab::Cleaned => render_cleaned(f, app, chunks[2]),
        Tab::Model => render_model(f, app, chunks[2]),
        Tab::Predict => render_predict(f, app, chunks[2]),
    }

    let footer = match &app.status {
        Some(message) => Paragraph::new(message.as_str()).style(Style::default().fg(Color::Red)),
        None => Paragraph::new(
            "q quit | Tab/1-7 section | s/e edit start/end date | arrows select | Enter edit",
        )
        .style(Style::default().fg(Color::DarkGray)),
    };
    f.render_widget(footer, chunks[3]);
}

fn render_filter(f: &mut Frame, app: &App, area: Rect) {
    let date_span = |target: EditTarget, value: String| match app.input_mode {
        InputMode::Editing(t) if t == target => Span::styled(
            format!("{}_", app.input),
            Style::default().fg(Color::Yellow),
        ),
        _ => Span::styled(value, Style::default().fg(Color::Green)),
    };
    let line = Line::from(vec![
        Span::raw("Date range: "),
        date_span(EditTarget::StartDate, app.range.start().to_string()),
        Span::raw(" .. "),
        date_span(EditTarget::EndDate, app.range.end().to_string()),
        Span::raw(format!("  ({} cleaned rows)", app.view_analysis.rows)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn records_table<'a>(title: &'a str, records: &[HourlyRecord]) -> Table<'a> {
    let columns = [
        Column::Season,
        Column::Year,
        Column::Month,
        Column::Hour,
        Column::Holiday,
        Column::Weekday,
        Column::WorkingDay,
        Column::Weather,
        Column::Temp,
        Column::Humidity,
        Column::Windspeed,
        Column::Count,
    ];
    let mut header = vec![Cell::from("dteday")];
    header.extend(columns.iter().map(|c| Cell::from(c.name())));

    let rows = records.iter().map(|r| {
        let mut cells = vec![Cell::from(r.dteday.to_string())];
        cells.extend(columns.iter().map(|c| {
            Cell::from(r.value(*c).map(|v| format!("{}", v)).unwrap_or_default())
        }));
        Row::new(cells)
    });

    let mut widths = vec![Constraint::Length(11)];
    widths.extend(columns.iter().map(|_| Constraint::Length(10)));
    Table::new(rows, widths)
        .header(Row::new(header).style(header_style()))
        .block(titled(title))
}

fn summary_table<'a>(title: &'a str, summary: &[(Column, Summary)]) -> Table<'a> {
    type Stat = fn(&Summary) -> String;
    let stats: [(&str, Stat); 8] = [
        ("count", |s| s.count.to_string()),
        ("mean", |s| num(s.mean)),
        ("std", |s| num(s.std)),
        ("min", |s| num(s.min)),
        ("25%", |s| num(s.q1)),
        ("50%", |s| num(s.median)),
        ("75%", |s| num(s.q3)),
        ("max", |s| num(s.max)),
    ];

    let mut header = vec![Cell::from("")];
    header.extend(summary.iter().map(|(c, _)| Cell::from(c.name())));

    let rows = stats.iter().map(|(label, stat)| {
        let mut cells = vec![Cell::from(*label)];
        cells.extend(summary.iter().map(|(_, s)| Cell::from(stat(s))));
        Row::new(cells)
    });

    let mut widths = vec![Constraint::Length(6)];
    widths.extend(summary.iter().map(|_| Constraint::Length(11)));
    Table::new(rows, widths)
        .header(Row::new(header).style(header_style()))
        .block(titled(title))
}

fn box_table<'a>(title: &'a str, key: &'a str, groups: &[GroupBox]) -> Table<'a> {
    let header = Row::new(vec![key, "n", "low", "q1", "median", "q3", "high", "outliers"])
        .style(header_style());
    let rows = groups.iter().map(|g| {
        let s = &g.stats;
        Row::new(vec![
            format!("{}", g.key),
            s.count.to_string(),
            num(s.lower_whisker),
            num(s.q1),
            num(s.median),
            num(s.q3),
            num(s.upper_whisker),
            s.outliers.to_string(),
        ])
    });
    let widths = [
        Constraint::Length(14),
        Constraint::Length(7),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(9),
    ];
    Table::new(rows, widths).header(header).block(titled(title))
}

fn box_text(stats: Option<BoxStats>) -> String {
    match stats {
        Some(s) => format!(
            "n = {}\nwhiskers {} .. {}\nq1 {}  median {}  q3 {}\n{} points beyond whiskers",
            s.count,
            num(s.lower_whisker),
            num(s.upper_whisker),
            num(s.q1),
            num(s.median),
            num(s.q3),
            s.outliers
        ),
        None => "no rows".to_string(),
    }
}

fn render_overview(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(app.head_rows as u16 + 3), Constraint::Min(11)].as_ref())
        .split(area);

    f.render_widget(records_table("Raw Data", &app.raw_analysis.head), chunks[0]);
    f.render_widget(
        summary_table("1. Understanding the data", &app.raw_analysis.summary),
        chunks[1],
    );
}

/// Blue for negative, red for positive, white near zero
fn heat_color(r: f64) -> Color {
    let fade = |x: f64| (255.0 * (1.0 - x.abs().min(1.0))) as u8;
    if r >= 0.0 {
        Color::Rgb(255, fade(r), fade(r))
    } else {
        Color::Rgb(fade(r), fade(r), 255)
    }
}

fn render_correlation(f: &mut Frame, matrix: &CorrelationMatrix, area: Rect) {
    let mut header = vec![Cell::from("")];
    header.extend(matrix.columns.iter().map(|c| Cell::from(c.name())));

    let rows = matrix.columns.iter().zip(&matrix.values).map(|(col, values)| {
        let mut cells = vec![Cell::from(col.name()).style(header_style())];
        cells.extend(values.iter().map(|v| match v {
            Some(r) => Cell::from(format!("{:>6.2}", r))
                .style(Style::default().fg(Color::Black).bg(heat_color(*r))),
            None => Cell::from("     -"),
        }));
        Row::new(cells).height(2)
    });

    let mut widths = vec![Constraint::Length(11)];
    widths.extend(matrix.columns.iter().map(|_| Constraint::Length(11)));
    let table = Table::new(rows, widths)
        .header(Row::new(header).style(header_style()))
        .block(titled("Correlation of weather and rental columns (raw data)"));
    f.render_widget(table, area);
}

fn render_outliers(f: &mut Frame, app: &App, area: Rect) {
    let raw = &app.raw_analysis;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(8), Constraint::Length(8)].as_ref())
        .split(area);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(chunks[0]);
    f.render_widget(
        Paragraph::new(box_text(raw.count_box)).block(titled("Raw Data - cnt")),
        top[0],
    );
    let rule = format!(
        "Outliers: |cnt - mean| >= {} std\n{} of {} raw rows flagged.\nOutliers look like the rest \
         of the data by season, so they are removed.",
        app.sigma,
        raw.outlier_rows,
        app.sources.raw.len()
    );
    f.render_widget(
        Paragraph::new(rule).wrap(Wrap { trim: true }).block(titled("3. Outlier Detection")),
        top[1],
    );

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(chunks[1]);
    f.render_widget(
        box_table("Outliers - Season Analysis", "season", &raw.outliers_by_season),
        middle[0],
    );
    f.render_widget(
        box_table("Data - Season Analysis", "season", &raw.by_season),
        middle[1],
    );

    let view = &app.view_analysis;
    let after = format!(
        "{}\n{:.1}% of the filtered cleaned rows fall outside the rule.",
        box_text(view.kept_box),
        view.removed_share * 100.0
    );
    f.render_widget(Paragraph::new(after).block(titled("After outlier removal")), chunks[2]);
}

fn median_bars(groups: &[GroupBox]) -> Vec<(String, u64)> {
    groups
        .iter()
        .map(|g| (format!("{}", g.key), g.stats.median.max(0.0).round() as u64))
        .collect()
}

fn render_explore(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(20), Constraint::Min(30)].as_ref())
        .split(area);

    let items: Vec<ListItem> = ExploreColumn::ALL
        .iter()
        .map(|c| {
            let style = if *c == app.explore {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(c.label()).style(style)
        })
        .collect();
    f.render_widget(List::new(items).block(titled("Select Column")), chunks[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(10), Constraint::Length(4)].as_ref())
        .split(chunks[1]);

    let groups = app.explore_groups();
    f.render_widget(
        box_table("cnt by selected column", app.explore.column().name(), groups),
        right[0],
    );

    let bars = median_bars(groups);
    let data: Vec<(&str, u64)> = bars.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    let chart = BarChart::default()
        .block(titled("Median cnt"))
        .data(data.as_slice())
        .bar_width(5)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Cyan));
    f.render_widget(chart, right[1]);

    f.render_widget(
        Paragraph::new(app.explore.description())
            .wrap(Wrap { trim: true })
            .block(titled("Description")),
        right[2],
    );
}

fn render_cleaned(f: &mut Frame, app: &App, area: Rect) {
    let view = &app.view_analysis;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(10),
                Constraint::Length(app.head_rows as u16 + 3),
                Constraint::Length(11),
                Constraint::Min(8),
            ]
            .as_ref(),
        )
        .split(area);

    f.render_widget(
        Paragraph::new(INSIGHTS)
            .wrap(Wrap { trim: true })
            .block(titled("5. Insights on relevant columns for prediction")),
        chunks[0],
    );
    f.render_widget(records_table("6. Data after cleaning", &view.head), chunks[1]);
    f.render_widget(summary_table("Cleaned data summary", &view.summary), chunks[2]);

    let points: Vec<(f64, f64)> = view
        .daily
        .iter()
        .enumerate()
        .map(|(i, (_, total))| (i as f64, *total))
        .collect();
    let max_total = view.daily.iter().map(|(_, t)| *t).fold(0.0, f64::max);
    let x_max = points.len().saturating_sub(1) as f64;
    let first = view.daily.first().map(|(d, _)| d.to_string()).unwrap_or_default();
    let last = view.daily.last().map(|(d, _)| d.to_string()).unwrap_or_default();

    let series = vec![Series::default()
        .name("cnt per day")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&points)];
    let chart = Chart::new(series)
        .block(titled("Bike Sharing Demand by Date"))
        .x_axis(
            Axis::default()
                .title("dteday")
                .bounds([0.0, x_max.max(1.0)])
                .labels(vec![first, last]),
        )
        .y_axis(
            Axis::default()
                .title("cnt")
                .bounds([0.0, max_total.max(1.0)])
                .labels(vec!["0".to_string(), format!("{:.0}", max_total)]),
        );
    f.render_widget(chart, chunks[3]);
}

fn render_model(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(12)].as_ref())
        .split(area);

    let sources = &app.sources;
    if sources.scores.is_empty() {
        f.render_widget(
            Paragraph::new("No model scores found. Run model_builder to produce them.")
                .block(titled("RMSLE")),
            chunks[0],
        );
    } else {
        let rows = sources
            .scores
            .iter()
            .map(|s| Row::new(vec![s.model.clone(), format!("{:.4}", s.rmsle)]));
        let table = Table::new(rows, [Constraint::Length(24), Constraint::Length(10)])
            .header(Row::new(vec!["model", "RMSLE"]).style(header_style()))
            .block(titled("RMSLE"));
        f.render_widget(table, chunks[0]);
    }

    if sources.importances.is_empty() {
        f.render_widget(
            Paragraph::new("No feature importances found.").block(titled("Feature Importance")),
            chunks[1],
        );
    } else {
        // Bar values are importances in thousandths
        let data: Vec<(&str, u64)> = sources
            .importances
            .iter()
            .map(|i| (i.feature.as_str(), (i.importance.max(0.0) * 1000.0).round() as u64))
            .collect();
        let chart = BarChart::default()
            .block(titled("Feature Importance (top 10, x1000)"))
            .direction(Direction::Horizontal)
            .data(data.as_slice())
            .bar_width(1)
            .bar_gap(0)
            .bar_style(Style::default().fg(Color::Magenta));
        f.render_widget(chart, chunks[1]);
    }
}

fn render_predict(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(36), Constraint::Min(40)].as_ref())
        .split(area);

    // Helper to style active fields
    let get_style = |field: FormField| {
        if app.focused_field == field {
            match app.input_mode {
                InputMode::Editing(_) => Style::default().fg(Color::Yellow),
                InputMode::Normal => Style::default().fg(Color::Green),
            }
        } else {
            Style::default()
        }
    };

    let items: Vec<ListItem> = FormField::ALL
        .iter()
        .map(|field| {
            let value = match app.input_mode {
                InputMode::Editing(EditTarget::Field(editing)) if editing == *field => {
                    format!("{}_", app.input)
                }
                _ => field.value_text(&app.selection),
            };
            let control = if field.is_slider() { "slider" } else { "< >" };
            ListItem::new(format!("{:<18} {:<9} {}", field.label(), value, control))
                .style(get_style(*field))
        })
        .collect();

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(12), Constraint::Min(4)].as_ref())
        .split(chunks[0]);
    f.render_widget(List::new(items).block(titled("Predictions")), left[0]);

    let derived = match (app.selection.season(), app.selection.daylight_hours()) {
        (Ok(season), Ok(hours)) => format!(
            "Season: {} ({})\nDaylight hours: {}",
            season.code(),
            season,
            hours
        ),
        (Err(e), _) | (_, Err(e)) => e.to_string(),
    };
    f.render_widget(
        Paragraph::new(derived).block(titled("Derived from month")),
        left[1],
    );

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(12), Constraint::Length(4)].as_ref())
        .split(chunks[1]);

    let result = match app.features() {
        Ok(features) => {
            let pairs: Vec<String> = features
                .iter()
                .map(|(name, value)| format!("{:<13}{:>6}", name, value))
                .collect();
            // Four columns of name/value pairs
            let per_col = pairs.len().div_ceil(4);
            let rows = (0..per_col).map(|r| {
                Row::new(
                    (0..4)
                        .map(|c| pairs.get(c * per_col + r).cloned().unwrap_or_default())
                        .collect::<Vec<_>>(),
                )
            });
            let table = Table::new(rows, [Constraint::Length(20); 4])
                .block(titled("Feature vector"));
            f.render_widget(table, right[0]);

            match app.prediction() {
                Some(n) => format!("We're predicting {} rentals for the given parameters.", n),
                None => "No model loaded. Run model_builder to train one.".to_string(),
            }
        }
        Err(e) => {
            f.render_widget(Paragraph::new(e.to_string()).block(titled("Feature vector")), right[0]);
            "Fix the selection to get a prediction.".to_string()
        }
    };
    f.render_widget(
        Paragraph::new(result)
            .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
            .block(titled("Prediction")),
        right[1],
    );
}
