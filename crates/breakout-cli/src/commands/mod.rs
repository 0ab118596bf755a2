mod analyze;
mod cache;
mod report;
mod validate;

use std::path::PathBuf;

pub struct AnalyzeArgs {
    pub config: Option<PathBuf>,
    pub symbol: Option<String>,
    pub start: Option<chrono::NaiveDate>,
    pub end: Option<chrono::NaiveDate>,
    pub volume_threshold: Option<f64>,
    pub price_threshold: Option<f64>,
    pub holding_period: Option<usize>,
    pub csv: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub refresh: bool,
    pub json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    List,
    Clear,
}

pub enum Command {
    Analyze(AnalyzeArgs),
    Report {
        input: PathBuf,
        json: bool,
    },
    Validate {
        config: PathBuf,
    },
    Cache {
        action: CacheAction,
        config: Option<PathBuf>,
        cache_dir: Option<PathBuf>,
    },
}

pub fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Analyze(args) => analyze::run_analyze(args),
        Command::Report { input, json } => report::run_report(input, json),
        Command::Validate { config } => validate::run_validate(config),
        Command::Cache {
            action,
            config,
            cache_dir,
        } => cache::run_cache(action, config, cache_dir),
    }
}

fn load_optional_config(
    path: Option<&PathBuf>,
) -> Result<breakout_application::config::Config, String> {
    match path {
        Some(path) => breakout_application::config::load_config(path),
        None => Ok(breakout_application::config::Config::default()),
    }
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}
