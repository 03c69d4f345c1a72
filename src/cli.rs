//! CLI definition and dispatch.

use chrono::Duration;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::console_report_adapter::ConsoleReportAdapter;
use crate::adapters::csv_adapter::{CsvAdapter, DEFAULT_PAGE_SIZE};
use crate::adapters::csv_report_adapter::{CsvReportAdapter, MultiReport};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config_validation::{parse_date, validate_config};
use crate::domain::driver::{self, DriverConfig, WindowAdvance};
use crate::domain::error::RsitraderError;
use crate::domain::history::{assemble_history, DataRequest};
use crate::domain::metrics::RunSummary;
use crate::domain::strategy::{
    StrategyParameters, DEFAULT_FEE_RATE, DEFAULT_RSI_BUY, DEFAULT_RSI_PERIOD, DEFAULT_RSI_SELL,
    DEFAULT_TRADE_AMOUNT_RATIO,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_INITIAL_BALANCE: f64 = 1_000_000.0;
pub const DEFAULT_NUM_WINDOWS: i64 = 30;
pub const DEFAULT_WINDOW_DAYS: i64 = 30;
pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Parser, Debug)]
#[command(name = "rsitrader", about = "RSI threshold strategy backtester")]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the multi-window backtest
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Override [data] symbol
        #[arg(long)]
        symbol: Option<String>,
        /// Override [data] data_dir
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Write per-window results as CSV
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Install the global `tracing` subscriber, writing to stderr.
pub fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            symbol,
            data_dir,
            output,
        } => run_backtest(&config, symbol.as_deref(), data_dir.as_deref(), output.as_deref()),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, RsitraderError> {
    FileConfigAdapter::from_file(path).map_err(|e| RsitraderError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

pub fn build_strategy_params(config: &dyn ConfigPort) -> StrategyParameters {
    StrategyParameters {
        rsi_period: config.get_int("strategy", "rsi_period", DEFAULT_RSI_PERIOD as i64) as usize,
        trade_amount_ratio: config.get_double(
            "strategy",
            "trade_amount_ratio",
            DEFAULT_TRADE_AMOUNT_RATIO,
        ),
        rsi_buy_threshold: config.get_double("strategy", "rsi_buy", DEFAULT_RSI_BUY),
        rsi_sell_threshold: config.get_double("strategy", "rsi_sell", DEFAULT_RSI_SELL),
        fee_rate: config.get_double("strategy", "fee_rate", DEFAULT_FEE_RATE),
    }
}

pub fn build_driver_config(config: &dyn ConfigPort) -> Result<DriverConfig, RsitraderError> {
    let window_days = config.get_int("backtest", "window_days", DEFAULT_WINDOW_DAYS);
    let advance = match config
        .get_string("backtest", "window_advance")
        .map(|s| s.trim().to_lowercase())
        .as_deref()
    {
        None | Some("calendar") => WindowAdvance::Calendar,
        Some("bars") => WindowAdvance::Bars(window_days.max(0) as usize),
        Some(other) => {
            return Err(RsitraderError::ConfigInvalid {
                section: "backtest".into(),
                key: "window_advance".into(),
                reason: format!("unknown mode {:?}", other),
            });
        }
    };

    let window_length =
        Duration::try_days(window_days).ok_or_else(|| RsitraderError::ConfigInvalid {
            section: "backtest".into(),
            key: "window_days".into(),
            reason: format!("{} days is out of range", window_days),
        })?;

    Ok(DriverConfig {
        initial_balance: config.get_double("backtest", "initial_balance", DEFAULT_INITIAL_BALANCE),
        num_windows: config
            .get_int("backtest", "num_windows", DEFAULT_NUM_WINDOWS)
            .max(0) as usize,
        window_length,
        advance,
        params: build_strategy_params(config),
    })
}

pub fn build_data_request(
    config: &dyn ConfigPort,
    symbol_override: Option<&str>,
) -> Result<DataRequest, RsitraderError> {
    let symbol = match symbol_override {
        Some(s) => s.trim().to_uppercase(),
        None => config.require_string("data", "symbol")?,
    };
    Ok(DataRequest {
        symbol,
        interval: config.require_string("data", "interval")?,
        start_date: parse_date(config, "start_date")?,
        end_date: parse_date(config, "end_date")?,
    })
}

/// Fetch history, run the window chain and stream results to `reporter`.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    request: &DataRequest,
    driver_config: &DriverConfig,
    reporter: &dyn ReportPort,
) -> Result<RunSummary, RsitraderError> {
    info!(
        symbol = %request.symbol,
        interval = %request.interval,
        start = %request.start_date,
        end = %request.end_date,
        "loading price history"
    );
    let history = assemble_history(data_port, request)?;

    let minimum = driver_config.params.warmup_bars() + 1;
    if history.len() < minimum {
        warn!(
            symbol = %request.symbol,
            bars = history.len(),
            minimum,
            "history shorter than the RSI warm-up, no trades possible"
        );
    }

    info!(
        windows = driver_config.num_windows,
        window_days = driver_config.window_length.num_days(),
        advance = ?driver_config.advance,
        initial_balance = driver_config.initial_balance,
        "running backtest"
    );
    let results = driver::run_with(&history, driver_config, |r| reporter.report(r))?;

    let summary = RunSummary::compute(
        &results,
        driver_config.initial_balance,
        driver_config.num_windows,
    );
    reporter.finish(&summary)?;
    Ok(summary)
}

fn run_backtest(
    config_path: &Path,
    symbol: Option<&str>,
    data_dir: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), RsitraderError> {
    info!("loading config from {}", config_path.display());
    let config = load_config(config_path)?;
    validate_config(&config)?;

    let request = build_data_request(&config, symbol)?;
    let driver_config = build_driver_config(&config)?;

    let data_dir = data_dir
        .map(Path::to_path_buf)
        .or_else(|| config.get_string("data", "data_dir").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
    let page_size = config.get_int("data", "page_size", DEFAULT_PAGE_SIZE as i64).max(1) as usize;
    let data_port = CsvAdapter::with_page_size(data_dir, page_size);

    let currency = config.get_string("report", "currency").unwrap_or_default();
    let console = ConsoleReportAdapter::stdout(currency);

    let output = output
        .map(Path::to_path_buf)
        .or_else(|| config.get_string("report", "output").map(PathBuf::from));

    let summary = match output {
        Some(path) => {
            let csv_report = CsvReportAdapter::create(&path)?;
            let sinks: Vec<&dyn ReportPort> = vec![&console, &csv_report];
            let summary =
                run_backtest_pipeline(&data_port, &request, &driver_config, &MultiReport::new(sinks))?;
            info!("results written to {}", path.display());
            summary
        }
        None => run_backtest_pipeline(&data_port, &request, &driver_config, &console)?,
    };

    info!(
        completed = summary.windows_completed,
        final_balance = summary.final_balance,
        total_return = summary.total_return,
        "done"
    );
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), RsitraderError> {
    info!("validating {}", config_path.display());
    let config = load_config(config_path)?;
    validate_config(&config)?;

    let request = build_data_request(&config, None)?;
    let driver_config = build_driver_config(&config)?;
    driver_config.validate()?;

    let p = &driver_config.params;
    eprintln!("Data:     {} ({}) {} to {}", request.symbol, request.interval, request.start_date, request.end_date);
    eprintln!(
        "Backtest: {} windows of {} days ({:?}), initial balance {:.2}",
        driver_config.num_windows,
        driver_config.window_length.num_days(),
        driver_config.advance,
        driver_config.initial_balance
    );
    eprintln!(
        "Strategy: RSI({}) buy < {} sell > {}, trade ratio {}, fee {}",
        p.rsi_period, p.rsi_buy_threshold, p.rsi_sell_threshold, p.trade_amount_ratio, p.fee_rate
    );
    eprintln!("\nConfiguration is valid.");
    Ok(())
}
