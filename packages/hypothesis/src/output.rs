//! Result persistence.
//!
//! The per-county dataset is written as CSV, one row per county in the
//! order given; the summary as pretty-printed JSON (`NaN` renders as
//! `null`).

use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use hurricane_impact_hypothesis_models::{AnalysisSummary, CountyTestResult};

use crate::HypothesisError;

pub const RESULTS_FILE: &str = "hypothesis_tests.csv";
pub const SUMMARY_FILE: &str = "summary.json";

/// Writes the per-county dataset as CSV.
///
/// # Errors
///
/// Returns [`HypothesisError::Csv`] or [`HypothesisError::Io`] if writing
/// fails.
pub fn write_results<W: Write>(
    results: &[CountyTestResult],
    writer: W,
) -> Result<(), HypothesisError> {
    let mut csv = csv::Writer::from_writer(writer);
    for result in results {
        csv.serialize(result)?;
    }
    csv.flush()?;
    Ok(())
}

/// Reads a per-county dataset written by [`write_results`].
///
/// # Errors
///
/// Returns [`HypothesisError::Csv`] if a row cannot be parsed.
pub fn read_results<R: Read>(reader: R) -> Result<Vec<CountyTestResult>, HypothesisError> {
    let mut csv = csv::Reader::from_reader(reader);
    csv.deserialize()
        .map(|row| row.map_err(HypothesisError::from))
        .collect()
}

/// Reads a per-county dataset from a file.
///
/// # Errors
///
/// Returns [`HypothesisError::Io`] if the file cannot be opened, or
/// [`HypothesisError::Csv`] if a row cannot be parsed.
pub fn read_results_from_path(path: &Path) -> Result<Vec<CountyTestResult>, HypothesisError> {
    log::info!("Reading county results from {}", path.display());
    read_results(File::open(path)?)
}

/// Writes the summary as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`HypothesisError::Json`] if serialization fails.
pub fn write_summary<W: Write>(
    summary: &AnalysisSummary,
    mut writer: W,
) -> Result<(), HypothesisError> {
    serde_json::to_writer_pretty(&mut writer, summary)?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Writes both outputs into `dir`, creating it if needed. Returns the paths
/// written.
///
/// # Errors
///
/// Returns an error if the directory or either file cannot be written.
pub fn write_outputs(
    dir: &Path,
    results: &[CountyTestResult],
    summary: &AnalysisSummary,
) -> Result<Vec<PathBuf>, HypothesisError> {
    std::fs::create_dir_all(dir)?;

    let results_path = dir.join(RESULTS_FILE);
    write_results(results, BufWriter::new(File::create(&results_path)?))?;
    log::info!("Wrote {} county rows to {}", results.len(), results_path.display());

    let summary_path = dir.join(SUMMARY_FILE);
    let mut writer = BufWriter::new(File::create(&summary_path)?);
    write_summary(summary, &mut writer)?;
    writer.flush()?;
    log::info!("Wrote summary to {}", summary_path.display());

    Ok(vec![results_path, summary_path])
}

#[cfg(test)]
mod tests {
    use hurricane_impact_exposure_models::CountyFips;

    use super::*;
    use crate::{
        aggregate::{CrossCountyAggregator, tests::tables},
        battery::tests::{county_rows, laura},
        compare::summarize,
        config::AnalysisOptions,
        progress::NullProgress,
    };

    fn results() -> Vec<CountyTestResult> {
        let windows = laura();
        let tables = tables(&[(22001, 3), (22003, 0), (48001, 1)], &[(22001, "Mandatory")]);
        let mut panel = county_rows(48001, &windows, |i| 9.0 + (i % 3) as f64, |_| 8.0);
        panel.extend(county_rows(22003, &windows, |i| 9.0 + (i % 4) as f64, |_| 12.0));
        // Only hurricane rows: a degenerate county.
        panel.extend(
            windows
                .hurricane()
                .days()
                .map(|d| crate::battery::tests::observation(22001, d, 4.0)),
        );
        CrossCountyAggregator::new(&tables, windows, AnalysisOptions::default())
            .aggregate(&panel, &NullProgress)
            .unwrap()
    }

    #[test]
    fn rerun_is_byte_identical() {
        let mut first = Vec::new();
        write_results(&results(), &mut first).unwrap();
        let mut second = Vec::new();
        write_results(&results(), &mut second).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn summary_rerun_is_byte_identical() {
        let render = || {
            let summary = summarize("Laura", &results(), &AnalysisOptions::default());
            let mut out = Vec::new();
            write_summary(&summary, &mut out).unwrap();
            out
        };
        let first = render();
        assert!(!first.is_empty());
        assert_eq!(first, render());
    }

    #[test]
    fn header_uses_result_column_names() {
        let mut out = Vec::new();
        write_results(&results(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("CTFIPs,CTNAME,STFIPs,nb_affected_days,evacuation_order"));
        assert!(header.contains("t_stat_2samp_out_st_trip"));
        assert!(header.ends_with("mobility_variation,affected_hurricane"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn csv_reads_back_with_nan_and_missing_centroids() {
        let original = results();
        let mut out = Vec::new();
        write_results(&original, &mut out).unwrap();
        let read = read_results(out.as_slice()).unwrap();

        assert_eq!(read.len(), original.len());
        assert_eq!(read[0].county, CountyFips(22001));
        assert!(read[0].t_stat_2samp_person_trip.is_nan());
        assert_eq!(read[0].centroid_y, original[0].centroid_y);
        assert_eq!(read[1].evacuation_order, original[1].evacuation_order);
        assert_eq!(
            read[2].t_stat_2samp_person_trip,
            original[2].t_stat_2samp_person_trip
        );
    }

    #[test]
    fn summary_json_lists_degenerate_counties() {
        let results = results();
        let summary = summarize("Laura", &results, &AnalysisOptions::default());
        let mut out = Vec::new();
        write_summary(&summary, &mut out).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["hurricane"], "Laura");
        assert_eq!(value["degenerate_counties"][0]["county"], 22001);
        assert_eq!(value["anova"]["rows"][3]["term"], "Residual");
    }
}
