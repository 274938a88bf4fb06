//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::indicator_feed::EmaAtrFeed;
use crate::adapters::paper_gateway::PaperGateway;
use crate::adapters::text_report::TextReport;
use crate::adapters::trade_csv::export_trades;
use crate::domain::config::TraderConfig;
use crate::domain::error::TraderError;
use crate::domain::live::{InstantSleeper, LiveTrader};
use crate::domain::metrics::{evaluate, Evaluation};
use crate::domain::position::PositionState;
use crate::domain::simulation::{run_backtest, Engine, MIN_BARS};
use crate::ports::data_port::DataPort;
use crate::ports::indicator_port::IndicatorFeed;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "crosstrader", about = "MA crossover trader with an ATR trailing stop")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay a CSV history and print performance metrics
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides [backtest] csv_filepath
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Write the closed trades to this CSV file
        #[arg(long)]
        trades_out: Option<PathBuf>,
    },
    /// Run the live loop against a paper venue replaying a CSV history
    Live {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: PathBuf,
        /// Stop after this many cycles (default: until the data runs out)
        #[arg(long)]
        cycles: Option<usize>,
        /// Starting quote balance (default: [backtest] initial_balance)
        #[arg(long)]
        balance: Option<f64>,
    },
    /// Check a configuration file and print the resolved settings
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            data,
            trades_out,
        } => run_backtest_command(&config, data.as_deref(), trades_out.as_deref()),
        Command::Live {
            config,
            data,
            cycles,
            balance,
        } => run_live_command(&config, &data, cycles, balance),
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

pub fn load_config(path: &Path) -> Result<TraderConfig, TraderError> {
    info!("loading config from {}", path.display());
    let adapter = FileConfigAdapter::from_file(path)?;
    TraderConfig::from_port(&adapter)
}

fn report_title(kind: &str, config: &TraderConfig) -> String {
    format!(
        "{kind} Results: {} {}",
        config.market.symbol, config.market.timeframe
    )
}

fn run_backtest_command(
    config_path: &Path,
    data_override: Option<&Path>,
    trades_out: Option<&Path>,
) -> Result<(), TraderError> {
    let config = load_config(config_path)?;

    let csv_path = data_override
        .map(Path::to_path_buf)
        .or_else(|| config.csv_filepath.clone())
        .ok_or_else(|| TraderError::ConfigMissing {
            section: "backtest".into(),
            key: "csv_filepath".into(),
        })?;

    let data_port = CsvAdapter::new(csv_path);
    let feed = EmaAtrFeed::new(config.indicators);
    let mut report = TextReport::new(io::stdout(), report_title("Backtest", &config));

    run_backtest_pipeline(&data_port, &feed, &config, &mut report, trades_out)?;
    Ok(())
}

/// Load, augment, replay, evaluate, report. Fails fast on the first error.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    feed: &dyn IndicatorFeed,
    config: &TraderConfig,
    report: &mut dyn ReportPort,
    trades_out: Option<&Path>,
) -> Result<Evaluation, TraderError> {
    let rows = data_port.fetch_ohlcv()?;
    let bars = feed.augment(&rows);
    info!(
        rows = rows.len(),
        warmup = rows.len().saturating_sub(bars.len()),
        "running backtest on {} bars",
        bars.len()
    );

    let result = run_backtest(&bars, config.risk)?;
    if let PositionState::Open(open) = &result.final_state {
        warn!(
            "position opened {} at {:.2} is still open at end of data and not counted",
            open.entry_time, open.entry_price
        );
    }
    info!(
        trades = result.ledger.len(),
        "processed {} bar transitions", result.bars_processed
    );

    let evaluation = evaluate(&result.ledger, &config.metrics);
    report.write_with_trades(&evaluation, &result.ledger)?;

    if let Some(path) = trades_out {
        export_trades(&result.ledger, path)?;
        info!("trades written to {}", path.display());
    }

    Ok(evaluation)
}

fn run_live_command(
    config_path: &Path,
    data_path: &Path,
    cycles: Option<usize>,
    balance: Option<f64>,
) -> Result<(), TraderError> {
    let config = load_config(config_path)?;
    let rows = CsvAdapter::new(data_path.to_path_buf()).fetch_ohlcv()?;
    let feed = EmaAtrFeed::new(config.indicators);

    // the first poll must already see two augmented bars
    let initial_window = feed.warmup() + MIN_BARS;
    if rows.len() < initial_window {
        return Err(TraderError::InsufficientData {
            bars: rows.len(),
            minimum: initial_window,
        });
    }
    let available = rows.len() - initial_window + 1;
    let cycles = cycles.unwrap_or(available);

    let starting_quote = balance.unwrap_or(config.metrics.initial_balance);
    if starting_quote <= config.live.min_quote_order {
        warn!(
            "starting balance {starting_quote} {} is not above min_quote_order {}; no buys will be placed",
            config.market.quote_asset, config.live.min_quote_order
        );
    }

    let gateway = PaperGateway::new(
        rows,
        config.market.clone(),
        starting_quote,
        config.metrics.fee_percent,
        initial_window,
    );
    let mut trader = LiveTrader::new(
        gateway,
        feed,
        InstantSleeper,
        Engine::crossover(config.risk),
        config.market.clone(),
        config.live,
    );

    info!(
        "paper trading {} for {cycles} cycles ({available} bars available)",
        config.market.symbol
    );
    let summary = trader.run_cycles(cycles);

    let gateway = trader.gateway();
    let base = gateway.balance(&config.market.base_asset);
    let quote = gateway.balance(&config.market.quote_asset);
    let equity = quote + base * gateway.last_close().unwrap_or(0.0);
    info!(
        cycles = summary.cycles,
        failed = summary.failed,
        "paper session finished: {}={base}, {}={quote:.2}, equity {equity:.2}",
        config.market.base_asset,
        config.market.quote_asset
    );

    let engine = trader.into_engine();
    let evaluation = evaluate(engine.ledger(), &config.metrics);
    TextReport::new(io::stdout(), report_title("Paper Trading", &config))
        .write_with_trades(&evaluation, engine.ledger())
}

fn run_validate(config_path: &Path) -> Result<(), TraderError> {
    let config = load_config(config_path)?;

    println!("Market:        {} ({})", config.market.symbol, config.market.timeframe);
    println!(
        "Indicators:    fast {} / slow {} / atr {}",
        config.indicators.fast_period, config.indicators.slow_period, config.indicators.atr_period
    );
    if config.risk.use_trailing_stop {
        println!("Trailing stop: {} x ATR", config.risk.atr_multiplier);
    } else {
        println!("Trailing stop: fixed at entry ({} x ATR)", config.risk.atr_multiplier);
    }
    println!(
        "Backtest:      balance {}, fee {}%",
        config.metrics.initial_balance, config.metrics.fee_percent
    );
    match &config.csv_filepath {
        Some(path) => println!("Data:          {}", path.display()),
        None => println!("Data:          (none, pass --data)"),
    }
    println!("\nConfiguration is valid.");
    Ok(())
}
