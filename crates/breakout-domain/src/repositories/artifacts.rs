use crate::services::breakout::BreakoutEvent;
use crate::services::summary::BreakoutSummary;
use crate::value_objects::breakout_params::BreakoutParams;
use std::path::Path;

/// A breakout table as read back from an export.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakoutTable {
    pub volume_window: usize,
    pub holding_period: usize,
    pub events: Vec<BreakoutEvent>,
}

pub trait ArtifactWriter {
    fn ensure_dir(&self, path: &Path) -> Result<(), String>;
    fn write_breakouts_csv(
        &self,
        path: &Path,
        events: &[BreakoutEvent],
        params: &BreakoutParams,
    ) -> Result<(), String>;
    fn write_summary_json(
        &self,
        path: &Path,
        summary: Option<&BreakoutSummary>,
        meta: Option<&serde_json::Value>,
    ) -> Result<(), String>;
}

pub trait ArtifactReader {
    fn read_breakouts_csv(&self, path: &Path) -> Result<BreakoutTable, String>;
    fn exists(&self, path: &Path) -> bool;
}
