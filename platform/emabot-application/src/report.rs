use emabot_domain::entities::metrics::MetricsSummary;
use emabot_domain::services::ohlcv::DataQualityReport;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Backtest,
    Live,
}

impl RunMode {
    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Backtest => "backtest",
            RunMode::Live => "live",
        }
    }
}

/// Outcome of a finished run, for console output and callers.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: String,
    pub mode: RunMode,
    pub symbols: Vec<String>,
    pub summary: MetricsSummary,
    pub data_quality: Option<DataQualityReport>,
    /// Where artifacts were written, when an output directory was set.
    pub run_dir: Option<PathBuf>,
    /// True when the run stopped on a cancel request.
    pub canceled: bool,
}

impl RunReport {
    pub fn starting_value(&self) -> f64 {
        self.summary.starting_value
    }

    pub fn final_value(&self) -> f64 {
        self.summary.final_value
    }
}
