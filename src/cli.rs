//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_ledger::CsvLedger;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::classifier::RegimeClassifier;
use crate::domain::config_validation::{
    parse_correlation_threshold, parse_delimiter, parse_ledger_policy, parse_ledger_shape,
    parse_open_mode, parse_trend_rule, parse_volatility_rule, parse_window,
    validate_classifier_config, validate_config, validate_ledger_config, validate_logging_config,
};
use crate::domain::daily_feed::DailyRegimeFeed;
use crate::domain::engine::{LedgerFailurePolicy, RegimeEngine, RegimeHistory};
use crate::domain::error::RegimeError;
use crate::domain::regime::{Regime, RegimeRecord, SENTINEL_CODE, SENTINEL_LABEL};
use crate::ports::config_port::ConfigPort;
use crate::ports::regime_sink::{LedgerShape, OpenMode, RegimeSink};
use crate::ports::series_port::SeriesPort;

const DEFAULT_LEDGER_PATH: &str = "Outputs/RegimeByDay.csv";

#[derive(Parser, Debug)]
#[command(name = "regime-engine", about = "Daily market-regime classifier")]
pub struct Cli {
    /// Log at debug level regardless of RUST_LOG and [logging] level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay the full history and write one ledger row per day
    History {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long)]
        asset: Option<PathBuf>,
        #[arg(long)]
        benchmark: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Regime at the start of each given day, using only earlier rows
    Day {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(long = "date", required = true)]
        dates: Vec<NaiveDate>,
    },
    /// Show row counts and date range of the configured series
    Info {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Where the day series come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesSettings {
    pub asset_path: PathBuf,
    pub benchmark_path: Option<PathBuf>,
    pub delimiter: u8,
}

/// Where and how regime rows are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    pub path: PathBuf,
    pub shape: LedgerShape,
    pub mode: OpenMode,
    pub policy: LedgerFailurePolicy,
}

impl LedgerSettings {
    pub fn open(&self) -> Result<CsvLedger, RegimeError> {
        CsvLedger::open(&self.path, self.shape, self.mode)
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let verbose = cli.verbose;
    match cli.command {
        Command::History {
            config,
            asset,
            benchmark,
            output,
        } => run_history(
            &config,
            asset.as_deref(),
            benchmark.as_deref(),
            output.as_deref(),
            verbose,
        ),
        Command::Day { config, dates } => run_day(&config, &dates, verbose),
        Command::Info { config } => run_info(&config, verbose),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Install the stderr subscriber. `RUST_LOG` wins over `[logging] level`;
/// `verbose` wins over both.
pub fn init_logging(config: &dyn ConfigPort, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.get_choice("logging", "level", "info")))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn build_classifier(config: &dyn ConfigPort) -> Result<RegimeClassifier, RegimeError> {
    Ok(RegimeClassifier {
        window: parse_window(config)?,
        volatility: parse_volatility_rule(config)?,
        trend: parse_trend_rule(config)?,
        correlation_threshold: parse_correlation_threshold(config)?,
    })
}

pub fn build_engine(config: &dyn ConfigPort) -> Result<RegimeEngine, RegimeError> {
    Ok(RegimeEngine::new(build_classifier(config)?).with_ledger_policy(parse_ledger_policy(config)?))
}

/// Series paths from `[series]`, with command-line paths taking precedence.
pub fn build_series_settings(
    config: &dyn ConfigPort,
    asset_override: Option<&Path>,
    benchmark_override: Option<&Path>,
) -> Result<SeriesSettings, RegimeError> {
    let asset_path = match asset_override {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(config.require_string("series", "asset_path")?),
    };
    let benchmark_path = benchmark_override.map(Path::to_path_buf).or_else(|| {
        config
            .get_string("series", "benchmark_path")
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    });
    Ok(SeriesSettings {
        asset_path,
        benchmark_path,
        delimiter: parse_delimiter(config)?,
    })
}

pub fn build_ledger_settings(
    config: &dyn ConfigPort,
    path_override: Option<&Path>,
) -> Result<LedgerSettings, RegimeError> {
    let path = match path_override {
        Some(path) => path.to_path_buf(),
        None => config
            .get_string("ledger", "path")
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LEDGER_PATH)),
    };
    Ok(LedgerSettings {
        path,
        shape: parse_ledger_shape(config)?,
        mode: parse_open_mode(config)?,
        policy: parse_ledger_policy(config)?,
    })
}

/// Load the configured series and replay them through `engine` into `sink`:
/// paired when a benchmark is configured, asset-only otherwise.
pub fn run_history_pipeline(
    series_port: &dyn SeriesPort,
    settings: &SeriesSettings,
    engine: &mut RegimeEngine,
    sink: &mut dyn RegimeSink,
) -> Result<RegimeHistory, RegimeError> {
    let mut asset = series_port.load_series(&settings.asset_path)?;
    match &settings.benchmark_path {
        Some(path) => {
            let mut benchmark = series_port.load_series(path)?;
            engine.replay_paired(&mut asset, &mut benchmark, sink)
        }
        None => engine.replay_single(&mut asset, sink),
    }
}

/// One line per regime seen, in code order, then the sentinel count.
pub fn summary_lines(history: &RegimeHistory) -> Vec<String> {
    let counts = history.counts();
    let mut lines: Vec<String> = Regime::ALL
        .iter()
        .filter_map(|regime| {
            counts
                .get(regime)
                .map(|n| format!("{:>2}  {:<34}{n}", regime.code(), regime.label()))
        })
        .collect();
    lines.push(format!(
        "{:>2}  {:<34}{}",
        SENTINEL_CODE,
        SENTINEL_LABEL,
        history.sentinel_days()
    ));
    lines
}

/// Validate the sections a run needs, except the series paths which may come
/// from the command line.
fn validate_run_config(config: &dyn ConfigPort) -> Result<(), RegimeError> {
    validate_classifier_config(config)?;
    validate_ledger_config(config)?;
    validate_logging_config(config)?;
    Ok(())
}

fn report(err: &RegimeError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

fn replay_history(
    config: &dyn ConfigPort,
    asset: Option<&Path>,
    benchmark: Option<&Path>,
    output: Option<&Path>,
) -> Result<RegimeHistory, RegimeError> {
    let series = build_series_settings(config, asset, benchmark)?;
    let ledger_settings = build_ledger_settings(config, output)?;
    let mut engine = build_engine(config)?;
    info!(classifier = ?engine.classifier(), "starting history replay");

    let mut ledger = ledger_settings.open()?;
    let history = run_history_pipeline(
        &CsvAdapter::new(series.delimiter),
        &series,
        &mut engine,
        &mut ledger,
    )?;
    info!(
        path = %ledger.path().display(),
        rows = ledger.rows_written(),
        "regime ledger written"
    );
    ledger.close()?;
    Ok(history)
}

/// Answer the `day` command: one ledger row per requested date, in order.
pub fn serve_days(
    config: &dyn ConfigPort,
    dates: &[NaiveDate],
) -> Result<Vec<RegimeRecord>, RegimeError> {
    let series = build_series_settings(config, None, None)?;
    let adapter = CsvAdapter::new(series.delimiter);
    let asset = adapter.load_series(&series.asset_path)?;
    let benchmark = series
        .benchmark_path
        .as_deref()
        .map(|path| adapter.load_series(path))
        .transpose()?;

    let ledger = build_ledger_settings(config, None)?.open()?;
    let mut feed = DailyRegimeFeed::new(build_engine(config)?, asset, benchmark, ledger);
    let mut records = Vec::with_capacity(dates.len());
    for &date in dates {
        records.push(RegimeRecord::new(date, feed.on_day(date)?));
    }
    feed.into_sink().close()?;
    Ok(records)
}

/// One diagnostic line per configured series, asset first.
pub fn series_info_lines(config: &dyn ConfigPort) -> Result<Vec<String>, RegimeError> {
    let series = build_series_settings(config, None, None)?;
    let adapter = CsvAdapter::new(series.delimiter);
    std::iter::once(&series.asset_path)
        .chain(series.benchmark_path.as_ref())
        .map(|path| adapter.load_series(path).map(|loaded| loaded.info()))
        .collect()
}

fn run_history(
    config_path: &Path,
    asset: Option<&Path>,
    benchmark: Option<&Path>,
    output: Option<&Path>,
    verbose: bool,
) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_run_config(&config) {
        return report(&e);
    }
    init_logging(&config, verbose);

    let result = replay_history(&config, asset, benchmark, output);

    match result {
        Ok(history) => {
            println!("{} days classified", history.len());
            for line in summary_lines(&history) {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => report(&e),
    }
}

fn run_day(config_path: &Path, dates: &[NaiveDate], verbose: bool) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_run_config(&config) {
        return report(&e);
    }
    init_logging(&config, verbose);

    match serve_days(&config, dates) {
        Ok(records) => {
            for record in records {
                println!("{}  {:>2}  {}", record.date, record.code(), record.label());
            }
            ExitCode::SUCCESS
        }
        Err(e) => report(&e),
    }
}

fn run_info(config_path: &Path, verbose: bool) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    init_logging(&config, verbose);

    match series_info_lines(&config) {
        Ok(lines) => {
            for line in lines {
                println!("{line}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => report(&e),
    }
}

fn run_validate(config_path: &Path) -> ExitCode {
    let config = match load_config(config_path) {
        Ok(c) => c,
        Err(code) => return code,
    };
    if let Err(e) = validate_config(&config) {
        return report(&e);
    }

    let classifier = match build_classifier(&config) {
        Ok(c) => c,
        Err(e) => return report(&e),
    };
    eprintln!("Classifier:");
    eprintln!("  window:     {}", classifier.window);
    eprintln!("  volatility: {:?}", classifier.volatility);
    eprintln!("  trend:      {:?}", classifier.trend);
    eprintln!("  |rho| >     {}", classifier.correlation_threshold);
    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
