//! Bike sharing dashboard CLI
//!
//! Runs the terminal dashboard, or encodes a single selection and prints the
//! model's prediction without opening the UI.

use anyhow::Context;
use bikeshare::app::{App, Sources};
use bikeshare::data::Dataset;
use bikeshare::encoder::{encode, RawSelection, SelectionPayload};
use bikeshare::model::{self, LinearModel};
use bikeshare::{ui, Config};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::fs::File;
use std::io;

#[derive(Parser)]
#[command(name = "bikeshare")]
#[command(about = "Bike sharing dashboard and rental predictor", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive dashboard (default)
    Dashboard {
        /// First day of the date filter (YYYY-MM-DD)
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last day of the date filter (YYYY-MM-DD)
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Encode one selection and print the predicted rentals
    Predict {
        /// JSON payload with dataset column names; overrides the field flags
        #[arg(long)]
        payload: Option<String>,
        #[arg(long, default_value = "1")]
        yr: u8,
        #[arg(long, default_value = "6")]
        mnth: u8,
        #[arg(long, default_value = "8")]
        hr: u8,
        #[arg(long, default_value = "0")]
        holiday: u8,
        #[arg(long, default_value = "1")]
        workingday: u8,
        #[arg(long, default_value = "2")]
        weekday: u8,
        #[arg(long, default_value = "1")]
        weathersit: u8,
        #[arg(long, default_value = "0.5")]
        temp: f64,
        #[arg(long, default_value = "0.5")]
        hum: f64,
        #[arg(long, default_value = "0.5")]
        windspeed: f64,
        /// Output format
        #[arg(long, value_enum, default_value = "table")]
        format: OutputFormat,
    },
    /// Print row counts and the rental summary of both snapshots
    Summary,
    /// Write a default config file
    Init,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn init_logging(verbose: bool, file: Option<File>) {
    let log_level = if verbose { "debug" } else { "info" };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level));
    builder.format_timestamp(None);
    // The dashboard owns the terminal, so its log goes to a file
    if let Some(file) = file {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Dashboard {
        start: None,
        end: None,
    });

    if let Commands::Init = command {
        init_logging(cli.verbose, None);
        Config::default().save(&cli.config)?;
        println!("Created default config at {}", cli.config);
        return Ok(());
    }

    let config = Config::load_or_default(&cli.config)?;

    match command {
        Commands::Dashboard { start, end } => {
            let log_file = File::create(&config.logging.file).with_context(|| {
                format!("cannot open log file {}", config.logging.file.display())
            })?;
            init_logging(cli.verbose, Some(log_file));
            dashboard(config, start, end)
        }
        Commands::Predict {
            payload,
            yr,
            mnth,
            hr,
            holiday,
            workingday,
            weekday,
            weathersit,
            temp,
            hum,
            windspeed,
            format,
        } => {
            init_logging(cli.verbose, None);
            let payload = match payload {
                Some(path) => {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("cannot read payload {}", path))?;
                    serde_json::from_str(&text)
                        .with_context(|| format!("invalid payload {}", path))?
                }
                None => SelectionPayload {
                    yr,
                    mnth,
                    hr,
                    holiday,
                    workingday,
                    weekday,
                    weathersit,
                    temp,
                    hum,
                    windspeed,
                    season: None,
                    daylight_hrs: None,
                },
            };
            predict(&config, payload, format)
        }
        Commands::Summary => {
            init_logging(cli.verbose, None);
            summary(&config)
        }
        Commands::Init => Ok(()),
    }
}

fn dashboard(
    mut config: Config,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> anyhow::Result<()> {
    if let Some(start) = start {
        config.filter.start_date = start;
    }
    if let Some(end) = end {
        config.filter.end_date = end;
    }

    // Load everything before touching the terminal so errors print normally
    let sources = Sources::load(&config)?;
    let app = App::new(sources, &config)?;

    // Setup Terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run App
    let res = run_app(&mut terminal, app);

    // Restore Terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("Dashboard loop failed: {}", err);
        return Err(err.into());
    }

    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, mut app: App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui::ui(f, &app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if !app.handle_key(key.code) {
                return Ok(());
            }
        }
    }
}

fn predict(config: &Config, payload: SelectionPayload, format: OutputFormat) -> anyhow::Result<()> {
    let selection = RawSelection::try_from(payload)?;
    let features = encode(&selection)?;
    let model = LinearModel::load(&config.model.path)
        .with_context(|| format!("cannot load model {}", config.model.path.display()))?;
    let prediction = model.predict(&features);
    log::debug!("Raw model output {}", prediction);
    let rentals = model::rentals(prediction);

    match format {
        OutputFormat::Table => {
            println!("Season:          {}", selection.season()?);
            println!("Daylight hours:  {}", selection.daylight_hours()?);
            println!();
            for (name, value) in features.iter() {
                println!("  {:<14} {}", name, value);
            }
            println!();
            println!("We're predicting {} rentals for the given parameters.", rentals);
        }
        OutputFormat::Json => {
            let vector: serde_json::Map<String, serde_json::Value> = features
                .iter()
                .map(|(name, value)| (name.to_string(), serde_json::json!(value)))
                .collect();
            let json = serde_json::json!({
                "features": vector,
                "prediction": rentals,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
    }
    Ok(())
}

fn summary(config: &Config) -> anyhow::Result<()> {
    for path in [&config.data.raw_path, &config.data.cleaned_path] {
        let dataset = Dataset::load(path)?;
        println!("{}", dataset.name());
        println!("───────────────────────────────");
        println!("  Rows:     {}", dataset.len());
        if let Some((first, last)) = dataset.date_span() {
            println!("  Range:    {} to {}", first, last);
        }
        if let Some(cnt) = dataset.summary(bikeshare::data::Column::Count) {
            println!(
                "  cnt:      mean {:.1}, std {:.1}, median {:.0}, max {:.0}",
                cnt.mean, cnt.std, cnt.median, cnt.max
            );
        }
        let outliers = dataset.outliers(config.analysis.outlier_sigma);
        println!(
            "  Outliers: {} rows beyond {} std",
            outliers.len(),
            config.analysis.outlier_sigma
        );
        println!();
    }
    Ok(())
}
