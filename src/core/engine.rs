use crate::config::FinderConfig;
use crate::core::aggregator::Aggregator;
use crate::core::report::{Report, ReportMode};
use crate::domain::window::DateWindow;
use crate::utils::error::Result;
use std::path::Path;

pub struct ReportEngine {
    aggregator: Aggregator,
}

impl ReportEngine {
    pub fn new(aggregator: Aggregator) -> Self {
        Self { aggregator }
    }

    /// Loads and validates the configuration before any backend is contacted.
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = FinderConfig::from_file(path)?;
        Self::from_config(&config)
    }

    pub fn from_config(config: &FinderConfig) -> Result<Self> {
        Ok(Self::new(Aggregator::from_config(config)?))
    }

    pub async fn run(&self, mode: ReportMode, window: &DateWindow) -> Report {
        tracing::info!(
            "Building {:?} report for {} .. {}",
            mode,
            window.since(),
            window.till()
        );

        let report = self.aggregator.aggregate(mode, window).await;

        tracing::info!(
            "Report ready: {} subjects, {} failed backend calls",
            report.subjects.len(),
            report.failures.len()
        );
        report
    }
}
