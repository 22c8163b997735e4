#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Hurricane impact hypothesis-testing engine.
//!
//! For every county of a mobility/epidemiological panel, partitions the rows
//! into control ("population") and hurricane-window ("sample") weekdays, runs
//! a fixed battery of t-tests, derives before/after case and testing
//! differentials and aggregates the results into one cross-county dataset.
//! That dataset then feeds group comparisons, a two-way ANOVA and a
//! normality diagnostic.
//!
//! The lookup tables from [`hurricane_impact_exposure`] are only borrowed;
//! nothing here mutates shared state.

pub mod aggregate;
pub mod anova;
pub mod battery;
pub mod before_after;
pub mod compare;
pub mod config;
pub mod output;
pub mod progress;
pub mod stats;
pub mod windows;

use hurricane_impact_exposure::{ExposureError, ExposureTables};
use hurricane_impact_exposure_models::Observation;
use hurricane_impact_hypothesis_models::{AnalysisSummary, CountyTestResult};

use crate::{
    aggregate::CrossCountyAggregator, compare::summarize, config::AnalysisConfig,
    progress::ProgressCallback, windows::StudyWindows,
};

/// Errors that can occur while running the analysis.
#[derive(Debug, thiserror::Error)]
pub enum HypothesisError {
    /// The panel has no rows to analyze.
    #[error("Panel is empty")]
    EmptyPanel,

    /// Exposure lookup or ingestion failed.
    #[error(transparent)]
    Exposure(#[from] ExposureError),

    /// The configuration is invalid.
    #[error("Invalid configuration: {message}")]
    Config {
        /// What is wrong.
        message: String,
    },

    /// The study windows cannot be built.
    #[error("Invalid window: {message}")]
    InvalidWindow {
        /// What is wrong.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading or writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-county results and the cross-county summary.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub results: Vec<CountyTestResult>,
    pub summary: AnalysisSummary,
}

/// Runs the whole analysis.
///
/// # Errors
///
/// * [`HypothesisError::EmptyPanel`] if the panel is empty or has no rows in
///   the mobility range.
/// * [`HypothesisError::InvalidWindow`] if the study windows cannot be
///   built.
/// * [`HypothesisError::Exposure`] if a panel county has no hurricane
///   exposure record.
pub fn analyze(
    panel: &[Observation],
    tables: &ExposureTables,
    config: &AnalysisConfig,
    progress: &dyn ProgressCallback,
) -> Result<Analysis, HypothesisError> {
    if panel.is_empty() {
        return Err(HypothesisError::EmptyPanel);
    }

    let windows = StudyWindows::new(config.hurricane.window(), &config.windows)?;
    log::info!(
        "Hurricane {} ({}), mobility range {}",
        config.hurricane.name,
        windows.hurricane(),
        windows.mobility()
    );

    let results =
        CrossCountyAggregator::new(tables, windows, config.analysis).aggregate(panel, progress)?;
    let summary = summarize(&config.hurricane.name, &results, &config.analysis);

    Ok(Analysis { results, summary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        aggregate::tests::tables,
        battery::tests::{county_rows, laura},
        config::load_config,
        progress::NullProgress,
    };

    #[test]
    fn end_to_end_with_default_config() {
        let config = load_config(None).unwrap();
        let windows = laura();
        let tables = tables(&[(22001, 3), (22003, 0), (48001, 2), (48003, 0)], &[]);
        let mut panel = Vec::new();
        for (county, sample) in [(22001, 5.0), (22003, 11.0), (48001, 6.0), (48003, 12.0)] {
            panel.extend(county_rows(county, &windows, |i| 9.0 + (i % 4) as f64, |_| sample));
        }

        let analysis = analyze(&panel, &tables, &config, &NullProgress).unwrap();
        assert_eq!(analysis.results.len(), 4);
        assert_eq!(analysis.summary.counties, 4);
        assert_eq!(analysis.summary.affected_counties, 2);
        assert_eq!(analysis.summary.affected_vs_unaffected.n_a, 2);
    }

    #[test]
    fn empty_panel_is_an_error() {
        let config = load_config(None).unwrap();
        let tables = tables(&[], &[]);
        assert!(matches!(
            analyze(&[], &tables, &config, &NullProgress),
            Err(HypothesisError::EmptyPanel)
        ));
    }
}
