//! Analysis configuration.
//!
//! The default configuration (Hurricane Laura, 2020) is embedded at compile
//! time. A user-supplied TOML file replaces it; sections other than
//! `[hurricane]` fall back to their defaults when omitted.

use std::{collections::BTreeSet, path::Path};

use chrono::NaiveDate;
use hurricane_impact_exposure::{DEFAULT_DATE_FORMAT, IngestOptions};
use hurricane_impact_exposure_models::{DateWindow, fips};
use hurricane_impact_hypothesis_models::{AnovaType, Baseline, Correction, NanPolicy};
use serde::{Deserialize, Serialize};

use crate::HypothesisError;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config/analysis.toml");

/// Full analysis configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub hurricane: HurricaneConfig,
    #[serde(default)]
    pub windows: WindowConfig,
    #[serde(default)]
    pub inputs: InputConfig,
    #[serde(default)]
    pub analysis: AnalysisOptions,
}

/// The hurricane under study. Both dates are inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HurricaneConfig {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl HurricaneConfig {
    #[must_use]
    pub const fn window(&self) -> DateWindow {
        DateWindow::new(self.start, self.end)
    }
}

/// Buffer magnitudes around the hurricane window, in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Days of mobility data kept on each side of the hurricane.
    pub mobility_buffer_days: u32,
    /// Days before the hurricane start covered by the "before" case window.
    pub cases_before_days: u32,
    /// Days after the hurricane end covered by the "after" case window.
    pub cases_after_days: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            mobility_buffer_days: 60,
            cases_before_days: 9,
            cases_after_days: 14,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// `chrono` format of panel dates and hurricane date headers.
    pub date_format: String,
    /// State FIPS codes (or abbreviations) kept from the panel. Empty keeps
    /// every state.
    pub study_states: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            study_states: Vec::new(),
        }
    }
}

/// Statistical options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    pub baseline: Baseline,
    pub correction: Correction,
    pub nan_policy: NanPolicy,
    pub anova_type: AnovaType,
}

/// Parses and validates a TOML configuration string.
///
/// # Errors
///
/// Returns [`HypothesisError::Config`] if the TOML is malformed or fails
/// validation.
pub fn parse_config(toml_str: &str) -> Result<AnalysisConfig, HypothesisError> {
    let config: AnalysisConfig =
        toml::de::from_str(toml_str).map_err(|e| HypothesisError::Config {
            message: e.to_string(),
        })?;
    config.validate()?;
    Ok(config)
}

/// Loads the configuration at `path`, or the embedded default when `None`.
///
/// # Errors
///
/// Returns [`HypothesisError::Io`] if the file cannot be read, or
/// [`HypothesisError::Config`] if it is invalid.
pub fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, HypothesisError> {
    match path {
        Some(path) => {
            log::info!("Loading analysis config from {}", path.display());
            parse_config(&std::fs::read_to_string(path)?)
        }
        None => parse_config(DEFAULT_CONFIG),
    }
}

impl AnalysisConfig {
    /// Checks the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`HypothesisError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<(), HypothesisError> {
        let invalid = |message: String| Err(HypothesisError::Config { message });

        if self.hurricane.start > self.hurricane.end {
            return invalid(format!(
                "hurricane start {} is after end {}",
                self.hurricane.start, self.hurricane.end
            ));
        }
        let windows = &self.windows;
        if windows.mobility_buffer_days < windows.cases_before_days
            || windows.mobility_buffer_days < windows.cases_after_days
        {
            return invalid(format!(
                "mobility buffer ({} days) must cover the case windows ({} before, {} after)",
                windows.mobility_buffer_days, windows.cases_before_days, windows.cases_after_days
            ));
        }
        if self.inputs.date_format.trim().is_empty() {
            return invalid("date_format must not be empty".to_string());
        }
        self.study_states().map(|_| ())
    }

    /// Study states as numeric FIPS codes.
    ///
    /// # Errors
    ///
    /// Returns [`HypothesisError::Config`] for an unknown state reference.
    pub fn study_states(&self) -> Result<BTreeSet<u32>, HypothesisError> {
        self.inputs
            .study_states
            .iter()
            .map(|state| {
                fips::parse_state(state).ok_or_else(|| HypothesisError::Config {
                    message: format!("unknown study state '{state}'"),
                })
            })
            .collect()
    }

    /// Options for the CSV readers.
    ///
    /// # Errors
    ///
    /// Returns [`HypothesisError::Config`] for an unknown study state.
    pub fn ingest_options(&self) -> Result<IngestOptions, HypothesisError> {
        Ok(IngestOptions {
            date_format: self.inputs.date_format.clone(),
            study_states: self.study_states()?,
        })
    }

    /// Renders the configuration back to TOML.
    ///
    /// # Errors
    ///
    /// Returns [`HypothesisError::Config`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, HypothesisError> {
        toml::to_string(self).map_err(|e| HypothesisError::Config {
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_default_parses() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.hurricane.name, "Laura");
        assert_eq!(
            config.hurricane.start,
            NaiveDate::from_ymd_opt(2020, 8, 23).unwrap()
        );
        assert_eq!(config.windows, WindowConfig::default());
        assert_eq!(config.analysis, AnalysisOptions::default());
        assert_eq!(
            config.study_states().unwrap(),
            BTreeSet::from([1, 5, 22, 28, 29, 40, 47, 48])
        );
    }

    #[test]
    fn omitted_sections_use_defaults() {
        let config = parse_config(
            r#"
            [hurricane]
            name = "Delta"
            start = "2020-10-09"
            end = "2020-10-11"

            [analysis]
            correction = "holm"
            "#,
        )
        .unwrap();
        assert_eq!(config.windows.mobility_buffer_days, 60);
        assert_eq!(config.inputs.date_format, DEFAULT_DATE_FORMAT);
        assert_eq!(config.analysis.correction, Correction::Holm);
        assert_eq!(config.analysis.anova_type, AnovaType::Type2);
    }

    #[test]
    fn rejects_reversed_hurricane_window() {
        let err = parse_config(
            r#"
            [hurricane]
            name = "Backwards"
            start = "2020-08-27"
            end = "2020-08-23"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, HypothesisError::Config { .. }));
    }

    #[test]
    fn rejects_buffer_smaller_than_case_window() {
        let err = parse_config(
            r#"
            [hurricane]
            name = "Laura"
            start = "2020-08-23"
            end = "2020-08-27"

            [windows]
            mobility_buffer_days = 7
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("mobility buffer"));
    }

    #[test]
    fn rejects_unknown_state() {
        let err = parse_config(
            r#"
            [hurricane]
            name = "Laura"
            start = "2020-08-23"
            end = "2020-08-27"

            [inputs]
            study_states = ["22", "ZZ"]
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("ZZ"));
    }

    #[test]
    fn renders_back_to_toml() {
        let config = load_config(None).unwrap();
        let rendered = config.to_toml().unwrap();
        assert_eq!(parse_config(&rendered).unwrap(), config);
    }
}
