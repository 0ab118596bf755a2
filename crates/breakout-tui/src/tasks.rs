use breakout_application::analysis::{analyze_breakouts, AnalyzeRequest, BreakoutAnalysis};
use breakout_application::config::Config;
use breakout_application::reporting::{export_results, ExportResult};
use breakout_application::shared::market_data_source;
use breakout_infrastructure::artifacts::FilesystemArtifactWriter;
use breakout_infrastructure::market_data::open_market_data;
use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;

pub enum TaskEvent {
    Input(crossterm::event::Event),
    AnalysisFinished(Result<BreakoutAnalysis, String>),
    ExportFinished(Result<ExportResult, String>),
}

/// Runs analysis and export work on tokio's blocking pool and reports back
/// through the UI event channel.
#[derive(Clone)]
pub struct TaskRunner {
    tx: tokio::sync::mpsc::UnboundedSender<TaskEvent>,
}

impl TaskRunner {
    pub fn new(tx: tokio::sync::mpsc::UnboundedSender<TaskEvent>) -> Self {
        Self { tx }
    }

    pub fn start_analysis(&self, config: Arc<Config>, request: AnalyzeRequest, today: NaiveDate) {
        let tx = self.tx.clone();
        tokio::task::spawn_blocking(move || {
            let result = run_analysis(config.as_ref(), &request, today);
            let _ = tx.send(TaskEvent::AnalysisFinished(result));
        });
    }

    pub fn start_export(&self, analysis: Arc<BreakoutAnalysis>, out_dir: PathBuf, with_summary: bool) {
        let tx = self.tx.clone();
        tokio::task::spawn_blocking(move || {
            let writer = FilesystemArtifactWriter::new();
            let result = export_results(analysis.as_ref(), &out_dir, &writer, with_summary);
            let _ = tx.send(TaskEvent::ExportFinished(result));
        });
    }
}

fn run_analysis(
    config: &Config,
    request: &AnalyzeRequest,
    today: NaiveDate,
) -> Result<BreakoutAnalysis, String> {
    let market_data = open_market_data(&market_data_source(config, None, false)?)?;
    analyze_breakouts(request, market_data.as_ref(), today)
}
