//! The work behind each subcommand, shared by the flag-driven and
//! interactive entry points.

use std::path::{Path, PathBuf};

use hurricane_impact_cli_utils::{IndicatifProgress, MultiProgress};
use hurricane_impact_exposure::{ExposureTables, ingest};
use hurricane_impact_hypothesis::{
    analyze,
    config::{AnalysisConfig, load_config},
    output,
    windows::StudyWindows,
};

/// Inputs of the `analyze` step.
#[derive(Debug, Clone)]
pub struct AnalyzeInputs {
    pub panel: PathBuf,
    pub hurricane: PathBuf,
    pub evacuation: PathBuf,
    pub counties: PathBuf,
    pub output_dir: PathBuf,
    pub config: Option<PathBuf>,
}

/// Inputs of the `trends` step.
#[derive(Debug, Clone)]
pub struct TrendsInputs {
    pub panel: PathBuf,
    pub hurricane: PathBuf,
    pub results: PathBuf,
    pub output_dir: PathBuf,
    pub config: Option<PathBuf>,
}

fn config_from(path: Option<&Path>) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let config = load_config(path)?;
    log::info!(
        "Using configuration for hurricane {} ({} to {})",
        config.hurricane.name,
        config.hurricane.start,
        config.hurricane.end
    );
    Ok(config)
}

/// Ingests every input, runs the per-county battery and the cross-county
/// comparisons, and writes the results and summary.
///
/// # Errors
///
/// Returns an error if an input cannot be read, the analysis fails, or an
/// output cannot be written.
pub fn analyze_command(
    multi: &MultiProgress,
    inputs: &AnalyzeInputs,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = config_from(inputs.config.as_deref())?;
    let options = config.ingest_options()?;

    let panel = ingest::read_panel_from_path(&inputs.panel, &options)?;
    let tables = ExposureTables::build(
        ingest::read_hurricane_from_path(&inputs.hurricane, &options)?,
        ingest::read_evacuations_from_path(&inputs.evacuation)?,
        ingest::read_counties_from_path(&inputs.counties)?,
        &options.date_format,
    );

    let progress = IndicatifProgress::counties_bar(multi, "Testing counties");
    let analysis = analyze(&panel, &tables, &config, progress.as_ref())?;

    let summary = &analysis.summary;
    log::info!(
        "{} counties tested, {} affected, {} with degenerate tests",
        summary.counties,
        summary.affected_counties,
        summary.degenerate_counties.len()
    );

    for path in output::write_outputs(&inputs.output_dir, &analysis.results, summary)? {
        println!("{}", path.display());
    }
    Ok(())
}

/// Builds the annotated panel and trend series from a previous `analyze`
/// run.
///
/// # Errors
///
/// Returns an error if an input cannot be read or an export fails.
pub fn trends_command(inputs: &TrendsInputs) -> Result<(), Box<dyn std::error::Error>> {
    let config = config_from(inputs.config.as_deref())?;
    let options = config.ingest_options()?;

    let panel = ingest::read_panel_from_path(&inputs.panel, &options)?;
    let results = output::read_results_from_path(&inputs.results)?;
    let tables = ExposureTables::build(
        ingest::read_hurricane_from_path(&inputs.hurricane, &options)?,
        hurricane_impact_trends::evacuation_records(&results),
        Vec::new(),
        &options.date_format,
    );

    let written =
        hurricane_impact_trends::export(&inputs.output_dir, &panel, &tables, &results, &config)?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

/// Prints the effective configuration as TOML.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or rendered.
pub fn config_command(path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    print!("{}", load_config(path)?.to_toml()?);
    Ok(())
}

/// Prints every day of the mobility range with its weekday and window
/// labels.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the windows
/// cannot be built.
pub fn windows_command(path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(path)?;
    let windows = StudyWindows::new(config.hurricane.window(), &config.windows)?;

    println!("Hurricane {}: {}", config.hurricane.name, windows.hurricane());
    println!("Mobility range: {}", windows.mobility());
    println!("Before cases:   {}", windows.before_cases());
    println!("After cases:    {}", windows.after_cases());
    println!();
    println!(
        "{:<12} {:<4} {:<8} {:<10} {:<7} {:<6}",
        "DATE", "DAY", "WEEKDAY", "HURRICANE", "BEFORE", "AFTER"
    );
    println!("{}", "-".repeat(52));

    let flag = |set: bool| if set { "x" } else { "" };
    for (date, labels) in windows.calendar() {
        println!(
            "{:<12} {:<4} {:<8} {:<10} {:<7} {:<6}",
            date.to_string(),
            date.format("%a").to_string(),
            flag(labels.is_weekday),
            flag(labels.in_hurricane_range),
            flag(labels.in_before_covid_window),
            flag(labels.in_after_covid_window)
        );
    }
    Ok(())
}
