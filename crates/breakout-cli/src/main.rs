mod commands;
mod infra;
mod obs;
mod output;

use breakout_domain::value_objects::date_range::parse_date;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use commands::{AnalyzeArgs, CacheAction, Command};
use std::path::PathBuf;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (git ",
    env!("BREAKOUT_GIT_SHA"),
    ", target ",
    env!("BREAKOUT_TARGET"),
    ")"
);

#[derive(Parser)]
#[command(name = "breakout")]
#[command(
    about = "Volume breakout analyzer",
    version,
    long_version = LONG_VERSION,
    arg_required_else_help = true
)]
#[command(
    after_help = "Examples:\n  breakout analyze --symbol AAPL --start 2024-01-01 --end 2025-01-01\n  breakout analyze --config configs/sample.toml --out reports/\n  breakout analyze --csv data/aapl.csv --symbol AAPL --json\n  breakout report --input reports/AAPL_breakout_analysis.csv\n  breakout validate --config configs/sample.toml\n  breakout cache list\n"
)]
struct Cli {
    /// Log filter used when BREAKOUT_LOG is unset.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    /// text | json
    #[arg(long, global = true, default_value = "text")]
    log_format: String,
    /// Serve Prometheus metrics on host:port.
    #[arg(long, global = true)]
    metrics_addr: Option<String>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Fetch a daily series and list breakout sessions with forward returns.
    Analyze {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
        /// First session date (YYYY-MM-DD).
        #[arg(long, value_parser = parse_date_arg)]
        start: Option<NaiveDate>,
        /// End date, exclusive (YYYY-MM-DD).
        #[arg(long, value_parser = parse_date_arg)]
        end: Option<NaiveDate>,
        /// Percent above the trailing average volume (min 50).
        #[arg(long)]
        volume_threshold: Option<f64>,
        /// Minimum daily price change in percent (min 0.1).
        #[arg(long)]
        price_threshold: Option<f64>,
        /// Trading days to hold after a breakout (min 1).
        #[arg(long)]
        holding_period: Option<usize>,
        /// Read sessions from a local OHLCV CSV instead of the configured source.
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Write the breakout CSV into this directory.
        #[arg(long)]
        out: Option<PathBuf>,
        /// Ignore cached series and fetch again.
        #[arg(long, default_value_t = false)]
        refresh: bool,
        /// Print the analysis as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Summarise a previously exported breakout CSV.
    Report {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Check a config file without fetching data.
    Validate {
        #[arg(long)]
        config: PathBuf,
    },
    /// Inspect or clear the series cache.
    Cache {
        #[command(subcommand)]
        action: CacheCommand,
    },
}

#[derive(Subcommand)]
enum CacheCommand {
    List {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    Clear {
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

fn parse_date_arg(value: &str) -> Result<NaiveDate, String> {
    parse_date(value)
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = obs::init_tracing(&cli.log_level, &cli.log_format) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
    if let Err(err) = obs::init_metrics(cli.metrics_addr.as_deref()) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }

    let command = match cli.command {
        CliCommand::Analyze {
            config,
            symbol,
            start,
            end,
            volume_threshold,
            price_threshold,
            holding_period,
            csv,
            out,
            refresh,
            json,
        } => Command::Analyze(AnalyzeArgs {
            config,
            symbol,
            start,
            end,
            volume_threshold,
            price_threshold,
            holding_period,
            csv,
            out,
            refresh,
            json,
        }),
        CliCommand::Report { input, json } => Command::Report { input, json },
        CliCommand::Validate { config } => Command::Validate { config },
        CliCommand::Cache { action } => match action {
            CacheCommand::List { config, cache_dir } => Command::Cache {
                action: CacheAction::List,
                config,
                cache_dir,
            },
            CacheCommand::Clear { config, cache_dir } => Command::Cache {
                action: CacheAction::Clear,
                config,
                cache_dir,
            },
        },
    };

    if let Err(err) = commands::run(command) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}
