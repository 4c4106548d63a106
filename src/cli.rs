//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use crate::adapters::csv_adapter::CsvFileAdapter;
use crate::adapters::csv_report_adapter::{inspection_csv, CsvReportAdapter};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::align::{prepare_dataset, SeriesRole};
use crate::domain::backtest::{load_dataset, run_backtest_on, BacktestConfig, BacktestResult, RunMetrics};
use crate::domain::config_validation::{
    frequency_names, optional_date, validate_backtest_config, validate_strategy_config,
    validate_sweep_config, DEFAULT_INITIAL_CAPITAL, DEFAULT_LOOKBACK_MONTHS, DEFAULT_REBALANCE,
    DEFAULT_SMOOTHING_DAYS, DEFAULT_TRANSACTION_COST_PCT,
};
use crate::domain::error::RotatorError;
use crate::domain::frequency::RebalanceFrequency;
use crate::domain::leverage::{leverage_view, HybridPoint, DEFAULT_LEVERAGE};
use crate::domain::metrics::Metrics;
use crate::domain::strategy::{AssetLabels, StrategyParams};
use crate::domain::sweep::{run_sweep_on, ParamRange, SweepConfig, SweepResult};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "rotator", about = "Two-asset momentum rotation backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a single backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Csv)]
        format: ReportFormat,
    },
    /// Run the parameter sweep
    Sweep {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Csv)]
        format: ReportFormat,
        /// Evaluate grid cells on the calling thread
        #[arg(long)]
        sequential: bool,
    },
    /// Show the aligned inputs next to the synthetic leveraged series
    Inspect {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Csv)]
        format: ReportFormat,
    },
    /// Validate a configuration without reading data
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let outcome = match cli.command {
        Command::Backtest {
            config,
            output,
            format,
        } => run_backtest(&config, output.as_deref(), format).map(|_| ()),
        Command::Sweep {
            config,
            output,
            format,
            sequential,
        } => run_sweep(&config, output.as_deref(), format, sequential).map(|_| ()),
        Command::Inspect {
            config,
            output,
            format,
        } => run_inspect(&config, output.as_deref(), format).map(|_| ()),
        Command::Validate { config } => run_validate(&config),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, RotatorError> {
    FileConfigAdapter::from_file(path).map_err(|e| RotatorError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn reporter(format: ReportFormat) -> &'static dyn ReportPort {
    match format {
        ReportFormat::Csv => &CsvReportAdapter,
        ReportFormat::Json => &JsonReportAdapter,
    }
}

fn read_u32(config: &dyn ConfigPort, section: &str, key: &str, default: i64) -> Result<u32, RotatorError> {
    let value = config.get_int(section, key, default);
    u32::try_from(value).map_err(|_| RotatorError::ConfigInvalid {
        section: section.into(),
        key: key.into(),
        reason: format!("{value} is out of range"),
    })
}

pub fn build_labels(config: &dyn ConfigPort) -> AssetLabels {
    let defaults = AssetLabels::default();
    let label = |key: &str, fallback: String| {
        config
            .get_string("data", key)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(fallback)
    };
    AssetLabels {
        asset_a: label("asset_a_label", defaults.asset_a),
        asset_b: label("asset_b_label", defaults.asset_b),
    }
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, RotatorError> {
    let rebalance = config
        .get_string("strategy", "rebalance")
        .unwrap_or_else(|| DEFAULT_REBALANCE.to_string());

    let params = StrategyParams {
        lookback_months: read_u32(config, "strategy", "lookback_months", DEFAULT_LOOKBACK_MONTHS)?,
        smoothing_days: read_u32(config, "strategy", "smoothing_days", DEFAULT_SMOOTHING_DAYS)? as usize,
        frequency: RebalanceFrequency::parse_lenient(&rebalance),
        transaction_cost_pct: config.get_double(
            "backtest",
            "transaction_cost_pct",
            DEFAULT_TRANSACTION_COST_PCT,
        ),
        initial_capital: config.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL),
    };

    Ok(BacktestConfig {
        params,
        use_leverage: config.get_bool("backtest", "use_leverage", false),
        start_date: optional_date(config, "backtest", "start_date")?,
        end_date: optional_date(config, "backtest", "end_date")?,
    })
}

pub fn build_sweep_config(config: &dyn ConfigPort, sequential: bool) -> Result<SweepConfig, RotatorError> {
    let range = |name: &str, start: i64, end: i64, step: i64| -> Result<ParamRange, RotatorError> {
        Ok(ParamRange::new(
            read_u32(config, "sweep", &format!("{name}_start"), start)?,
            read_u32(config, "sweep", &format!("{name}_end"), end)?,
            read_u32(config, "sweep", &format!("{name}_step"), step)?,
        ))
    };

    Ok(SweepConfig {
        lookback: range("lookback", 1, 12, 1)?,
        smoothing: range("smoothing", 1, 50, 5)?,
        frequencies: frequency_names(config)
            .iter()
            .map(|name| RebalanceFrequency::parse_lenient(name))
            .collect(),
        transaction_cost_pct: config.get_double(
            "backtest",
            "transaction_cost_pct",
            DEFAULT_TRANSACTION_COST_PCT,
        ),
        initial_capital: config.get_double("backtest", "initial_capital", DEFAULT_INITIAL_CAPITAL),
        use_leverage: config.get_bool("backtest", "use_leverage", false),
        start_date: optional_date(config, "backtest", "start_date")?,
        end_date: optional_date(config, "backtest", "end_date")?,
        parallel: config.get_bool("sweep", "parallel", true) && !sequential,
    })
}

fn open_data(config: &FileConfigAdapter) -> Result<CsvFileAdapter, RotatorError> {
    let data = CsvFileAdapter::from_config(config, config.base_dir())?;
    for role in [SeriesRole::AssetA, SeriesRole::AssetB, SeriesRole::Rate, SeriesRole::Leveraged] {
        if let Some(path) = data.path(role) {
            eprintln!("  {:<10} {}", role, path.display());
        }
    }
    Ok(data)
}

fn print_metrics_row(name: &str, m: &Metrics) {
    eprintln!(
        "{:<16} {:>8.2}% {:>8.2}% {:>7.2} {:>7.2}% {:>14.2} {:>7}",
        name,
        m.cagr * 100.0,
        m.max_drawdown * 100.0,
        m.sharpe_ratio,
        m.volatility * 100.0,
        m.final_balance,
        m.trade_count,
    );
}

fn print_metrics_header() {
    eprintln!(
        "{:<16} {:>9} {:>9} {:>7} {:>8} {:>14} {:>7}",
        "", "CAGR", "Max DD", "Sharpe", "Vol", "Final", "Trades"
    );
}

pub fn print_run_metrics(metrics: &RunMetrics, labels: &AssetLabels) {
    eprintln!("\n=== Results ===");
    print_metrics_header();
    print_metrics_row("Strategy", &metrics.strategy);
    print_metrics_row(&format!("{} (hold)", labels.asset_a), &metrics.asset_a);
    print_metrics_row(&format!("{} (hold)", labels.asset_b), &metrics.asset_b);
}

fn run_backtest(
    config_path: &Path,
    output_path: Option<&Path>,
    format: ReportFormat,
) -> Result<BacktestResult, RotatorError> {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;
    validate_strategy_config(&adapter)?;

    // Stage 2: Resolve run parameters
    let bt_config = build_backtest_config(&adapter)?;
    let labels = build_labels(&adapter);

    // Stage 3: Resolve input files
    eprintln!("Reading input series:");
    let data = open_data(&adapter)?;

    run_backtest_pipeline(&data, &bt_config, &labels, output_path, format)
}

/// Fetch, prepare, simulate, print and optionally persist a single run.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    bt_config: &BacktestConfig,
    labels: &AssetLabels,
    output_path: Option<&Path>,
    format: ReportFormat,
) -> Result<BacktestResult, RotatorError> {
    let raw = data_port.fetch_all()?;
    let rows = load_dataset(
        &raw,
        bt_config.start_date,
        bt_config.end_date,
        bt_config.use_leverage,
    )?;

    if let (Some(first), Some(last)) = (rows.first(), rows.last()) {
        eprintln!(
            "Running backtest: {} rows, {} to {}",
            rows.len(),
            first.date,
            last.date
        );
    }
    if bt_config.use_leverage {
        eprintln!("  {} replaced by {DEFAULT_LEVERAGE}x synthetic leveraged series", labels.asset_b);
    }

    let result = run_backtest_on(&rows, bt_config);

    eprintln!("\n{}", result.analysis);
    print_run_metrics(&result.metrics, labels);

    if let Some(output) = output_path {
        reporter(format).write_backtest(&result, labels, output)?;
        eprintln!("\nHistory written to: {}", output.display());
    }
    Ok(result)
}

fn run_sweep(
    config_path: &Path,
    output_path: Option<&Path>,
    format: ReportFormat,
    sequential: bool,
) -> Result<SweepResult, RotatorError> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;
    validate_sweep_config(&adapter)?;

    let sweep_config = build_sweep_config(&adapter, sequential)?;
    let labels = build_labels(&adapter);

    eprintln!("Reading input series:");
    let data = open_data(&adapter)?;

    run_sweep_pipeline(&data, &sweep_config, &labels, output_path, format)
}

/// Fetch, prepare and evaluate the full grid, then print and optionally persist it.
pub fn run_sweep_pipeline(
    data_port: &dyn DataPort,
    sweep_config: &SweepConfig,
    labels: &AssetLabels,
    output_path: Option<&Path>,
    format: ReportFormat,
) -> Result<SweepResult, RotatorError> {
    let raw = data_port.fetch_all()?;
    let rows = load_dataset(
        &raw,
        sweep_config.start_date,
        sweep_config.end_date,
        sweep_config.use_leverage,
    )?;

    let combinations = sweep_config.lookback.values().len()
        * sweep_config.smoothing.values().len()
        * sweep_config.frequencies.len();
    eprintln!(
        "Running sweep: {} combinations over {} rows{}",
        combinations,
        rows.len(),
        if sweep_config.parallel { "" } else { " (sequential)" }
    );

    let started = Instant::now();
    let result = run_sweep_on(&rows, sweep_config);
    eprintln!(
        "  {} points in {:.2}s",
        result.points.len(),
        started.elapsed().as_secs_f64()
    );

    eprintln!("\n=== Benchmarks ===");
    print_metrics_header();
    print_metrics_row(&format!("{} (hold)", labels.asset_a), &result.benchmarks.asset_a);
    print_metrics_row(&format!("{} (hold)", labels.asset_b), &result.benchmarks.asset_b);

    if let Some(output) = output_path {
        reporter(format).write_sweep(&result, output)?;
        eprintln!("\nGrid written to: {}", output.display());
    }
    Ok(result)
}

fn run_inspect(
    config_path: &Path,
    output_path: Option<&Path>,
    format: ReportFormat,
) -> Result<Vec<HybridPoint>, RotatorError> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;
    let labels = build_labels(&adapter);

    eprintln!("Reading input series:");
    let data = open_data(&adapter)?;

    run_inspect_pipeline(&data, &labels, output_path, format)
}

/// Build the leverage inspection view over the full date range.
pub fn run_inspect_pipeline(
    data_port: &dyn DataPort,
    labels: &AssetLabels,
    output_path: Option<&Path>,
    format: ReportFormat,
) -> Result<Vec<HybridPoint>, RotatorError> {
    let raw = data_port.fetch_all()?;
    let rows = prepare_dataset(&raw, None, None)?;
    let points = leverage_view(&rows, DEFAULT_LEVERAGE);

    let real = points.iter().filter(|p| p.is_real_leveraged).count();
    eprintln!(
        "Inspection: {} rows, {} with real leveraged prices, {} synthetic",
        points.len(),
        real,
        points.len() - real
    );

    match output_path {
        Some(output) => {
            reporter(format).write_inspection(&points, labels, output)?;
            eprintln!("Inspection written to: {}", output.display());
        }
        None => print!("{}", inspection_csv(&points, labels)?),
    }
    Ok(points)
}

pub fn run_validate(config_path: &Path) -> Result<(), RotatorError> {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_backtest_config(&adapter)?;
    validate_strategy_config(&adapter)?;
    validate_sweep_config(&adapter)?;

    let bt = build_backtest_config(&adapter)?;
    let sweep = build_sweep_config(&adapter, false)?;
    let labels = build_labels(&adapter);
    let data = CsvFileAdapter::from_config(&adapter, adapter.base_dir())?;

    eprintln!("\nData:");
    for role in [SeriesRole::AssetA, SeriesRole::AssetB, SeriesRole::Rate, SeriesRole::Leveraged] {
        let path = data
            .path(role)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string());
        eprintln!("  {:<10} {}", role, path);
    }
    eprintln!("  labels     {} / {}", labels.asset_a, labels.asset_b);

    let window = |d: Option<chrono::NaiveDate>| d.map(|d| d.to_string()).unwrap_or_else(|| "-".into());
    eprintln!("\nBacktest:");
    eprintln!("  initial capital   {:.2}", bt.params.initial_capital);
    eprintln!("  transaction cost  {}%", bt.params.transaction_cost_pct);
    eprintln!("  synthetic 3x      {}", bt.use_leverage);
    eprintln!("  window            {} to {}", window(bt.start_date), window(bt.end_date));

    eprintln!("\nStrategy:");
    eprintln!("  lookback          {} months", bt.params.lookback_months);
    eprintln!("  smoothing         {} days", bt.params.smoothing_days);
    eprintln!("  rebalance         {}", bt.params.frequency);

    let freqs: Vec<String> = sweep.frequencies.iter().map(|f| f.to_string()).collect();
    eprintln!("\nSweep:");
    eprintln!("  lookback months   {:?}", sweep.lookback.values());
    eprintln!("  smoothing days    {:?}", sweep.smoothing.values());
    eprintln!("  frequencies       {}", freqs.join(", "));
    eprintln!("  cells             {}", sweep.cells().len());

    eprintln!("\nConfiguration is valid.");
    Ok(())
}
