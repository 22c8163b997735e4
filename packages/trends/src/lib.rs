#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Plot-ready exports of a finished analysis.
//!
//! [`focused`] annotates every panel row with county attributes through the
//! County Attribute Resolver; [`series`] reduces the panel to daily
//! cross-county means per mobility group. Nothing is rendered here.

pub mod focused;
pub mod groups;
pub mod series;

use std::{
    fs::File,
    io::BufWriter,
    path::{Path, PathBuf},
};

use hurricane_impact_exposure::{CountyAttributeResolver, ExposureError, ExposureTables};
use hurricane_impact_exposure_models::{EvacuationRecord, Observation};
use hurricane_impact_hypothesis::{HypothesisError, config::AnalysisConfig};
use hurricane_impact_hypothesis_models::CountyTestResult;

pub const FOCUSED_PANEL_FILE: &str = "focused_panel.csv";
pub const TREND_SERIES_FILE: &str = "trend_series.csv";

/// Errors that can occur while building the trend exports.
#[derive(Debug, thiserror::Error)]
pub enum TrendsError {
    /// Attribute lookup or ingestion failed.
    #[error(transparent)]
    Exposure(#[from] ExposureError),

    /// Configuration or window construction failed.
    #[error(transparent)]
    Hypothesis(#[from] HypothesisError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Writes [`FOCUSED_PANEL_FILE`] and [`TREND_SERIES_FILE`] into `dir`.
///
/// `tables` supplies the hurricane exposure; evacuation orders and
/// t-statistics come from `results`.
///
/// # Errors
///
/// Returns an error if an attribute lookup fails or a file cannot be
/// written.
pub fn export(
    dir: &Path,
    panel: &[Observation],
    tables: &ExposureTables,
    results: &[CountyTestResult],
    config: &AnalysisConfig,
) -> Result<Vec<PathBuf>, TrendsError> {
    std::fs::create_dir_all(dir)?;

    let statistics = groups::person_trip_statistics(results);
    let mobility_groups = groups::mobility_groups(results);
    let resolver =
        CountyAttributeResolver::new(tables, config.hurricane.window()).with_statistics(&statistics);

    let focused_path = dir.join(FOCUSED_PANEL_FILE);
    let rows = focused::annotate(panel, &resolver, &mobility_groups)?;
    focused::write_focused(&rows, BufWriter::new(File::create(&focused_path)?))?;
    log::info!("Wrote {} annotated rows to {}", rows.len(), focused_path.display());

    let series_path = dir.join(TREND_SERIES_FILE);
    let range = series::trend_range(config)?;
    let points = series::trend_series(panel, &mobility_groups, range);
    series::write_series(&points, BufWriter::new(File::create(&series_path)?))?;
    log::info!("Wrote {} trend points ({range}) to {}", points.len(), series_path.display());

    Ok(vec![focused_path, series_path])
}

/// Evacuation records carried by a finished analysis.
#[must_use]
pub fn evacuation_records(results: &[CountyTestResult]) -> Vec<EvacuationRecord> {
    results
        .iter()
        .map(|r| EvacuationRecord {
            county: r.county,
            order: r.evacuation_order.clone(),
        })
        .collect()
}
