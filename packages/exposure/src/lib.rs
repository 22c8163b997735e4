#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Panel and exposure ingestion plus read-only county lookup tables.
//!
//! [`ingest`] reads the mobility panel, the wide hurricane exposure table,
//! evacuation orders and county boundaries from CSV. [`tables`] freezes the
//! exposure inputs into [`ExposureTables`], and [`resolver`] answers
//! per-county attribute queries against them.

pub mod geometry;
pub mod ingest;
pub mod resolver;
pub mod tables;

use std::collections::BTreeSet;

use hurricane_impact_exposure_models::{AttributeKind, CountyFips};

pub use resolver::CountyAttributeResolver;
pub use tables::ExposureTables;

/// Date format used by the panel and hurricane inputs unless configured
/// otherwise.
pub const DEFAULT_DATE_FORMAT: &str = "%m/%d/%Y";

/// Errors that can occur while loading or resolving exposure data.
#[derive(Debug, thiserror::Error)]
pub enum ExposureError {
    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A date string did not match the configured format.
    #[error("Invalid date '{value}' (expected format {format})")]
    InvalidDate {
        /// The offending value.
        value: String,
        /// The expected `chrono` format string.
        format: String,
    },

    /// A required column is absent from an input file.
    #[error("Missing column '{column}' in {file}")]
    MissingColumn {
        /// Column name.
        column: String,
        /// Which input was being read.
        file: &'static str,
    },

    /// A cell could not be parsed.
    #[error("Invalid value '{value}' in column '{column}'")]
    InvalidValue {
        /// Column name.
        column: String,
        /// The offending value.
        value: String,
    },

    /// A county in the panel has no hurricane exposure record.
    #[error("No hurricane exposure record for county {county}")]
    MissingExposure {
        /// The county that was looked up.
        county: CountyFips,
    },

    /// No day-level exposure flag exists for a county/date pair.
    #[error("No day-level exposure for key '{key}'")]
    MissingDailyExposure {
        /// Composite `"{county}_{date}"` key.
        key: String,
    },

    /// No test statistic was supplied for a county.
    #[error("No t-statistic for county {county}")]
    MissingStatistic {
        /// The county that was looked up.
        county: CountyFips,
    },

    /// A date-keyed attribute was requested without a date.
    #[error("Attribute '{kind}' requires a date")]
    MissingDate {
        /// The attribute that was requested.
        kind: AttributeKind,
    },
}

/// Options shared by the CSV readers.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// `chrono` format of panel dates and hurricane date headers.
    pub date_format: String,
    /// State FIPS codes to keep. Empty keeps every state.
    pub study_states: BTreeSet<u32>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            study_states: BTreeSet::new(),
        }
    }
}

impl IngestOptions {
    /// Whether rows of the given state should be kept.
    #[must_use]
    pub fn keeps_state(&self, state: u32) -> bool {
        self.study_states.is_empty() || self.study_states.contains(&state)
    }

    /// Parses a date with the configured format.
    ///
    /// # Errors
    ///
    /// Returns [`ExposureError::InvalidDate`] if the value does not match.
    pub fn parse_date(&self, value: &str) -> Result<chrono::NaiveDate, ExposureError> {
        chrono::NaiveDate::parse_from_str(value.trim(), &self.date_format).map_err(|_| {
            ExposureError::InvalidDate {
                value: value.to_string(),
                format: self.date_format.clone(),
            }
        })
    }
}
