#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! County, panel and hurricane exposure record types.
//!
//! These types describe the inputs of the hypothesis-testing pipeline: the
//! daily county mobility/epidemiological panel, per-county hurricane
//! exposure, evacuation orders and county geometry. They are built once by
//! ingestion and treated as read-only afterwards.

pub mod fips;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Label used when a county has no evacuation record.
pub const NO_EVACUATION_ORDER: &str = "No evacuation order";

/// Marker rendered for attributes queried outside their validity window.
pub const NOT_APPLICABLE: &str = "N/A";

/// Numeric county FIPS code (state code * 1000 + county code).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CountyFips(pub u32);

impl std::fmt::Display for CountyFips {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CountyFips {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Closed date interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    #[must_use]
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether `date` lies inside the window, both ends included.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Iterates every date of the window in order.
    pub fn days(self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take_while(move |d| *d <= self.end)
    }
}

impl std::fmt::Display for DateWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// One county x one date record of the mobility/epidemiological panel.
///
/// Metric cells that were empty in the source load as `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub county: CountyFips,
    pub county_name: String,
    pub state_id: u32,
    pub date: NaiveDate,
    /// The date exactly as written in the panel file.
    pub date_label: String,
    /// Monday through Friday.
    pub is_weekday: bool,
    pub trips_per_person: f64,
    /// `trips_per_person * population`.
    pub trips_total: f64,
    pub out_of_county_trips_per_person: f64,
    pub out_of_state_trips_per_person: f64,
    pub miles_per_person: f64,
    pub pct_working_from_home: f64,
    pub new_cases_per_1000: f64,
    pub active_cases_per_1000: f64,
    /// Reported at state granularity upstream.
    pub tests_per_1000: f64,
}

/// Numeric panel columns compared by the test battery and calculators.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Metric {
    TripsPerPerson,
    TripsTotal,
    OutOfCountyTripsPerPerson,
    OutOfStateTripsPerPerson,
    MilesPerPerson,
    PctWorkingFromHome,
    NewCasesPer1000,
    TestsPer1000,
}

impl Observation {
    /// Value of the given metric column.
    #[must_use]
    pub const fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::TripsPerPerson => self.trips_per_person,
            Metric::TripsTotal => self.trips_total,
            Metric::OutOfCountyTripsPerPerson => self.out_of_county_trips_per_person,
            Metric::OutOfStateTripsPerPerson => self.out_of_state_trips_per_person,
            Metric::MilesPerPerson => self.miles_per_person,
            Metric::PctWorkingFromHome => self.pct_working_from_home,
            Metric::NewCasesPer1000 => self.new_cases_per_1000,
            Metric::TestsPer1000 => self.tests_per_1000,
        }
    }
}

/// Per-county hurricane exposure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HurricaneExposure {
    pub county: CountyFips,
    pub county_name: String,
    /// Day-level affected flags over the hurricane record's date range.
    pub daily: Vec<HurricaneDay>,
    /// Number of days flagged as affected.
    pub affected_days: u32,
}

/// One day-level cell of the hurricane table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HurricaneDay {
    pub date: NaiveDate,
    /// The column header the date was parsed from.
    pub label: String,
    pub affected: bool,
}

/// Evacuation order issued for a county.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvacuationRecord {
    pub county: CountyFips,
    pub order: String,
}

/// County boundary carried through to the results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyGeometry {
    pub county: CountyFips,
    pub name: String,
    /// Boundary as a `GeoJSON` geometry string.
    pub geometry: String,
    pub centroid_x: f64,
    pub centroid_y: f64,
}

/// Attributes the County Attribute Resolver can look up.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttributeKind {
    /// Number of affected days, keyed by county.
    AffectedDayCount,
    /// Evacuation order label, keyed by county.
    EvacuationOrder,
    /// Day-level affected flag, keyed by county and date.
    AffectedOnDate,
    /// Two-sample person-trip t-statistic, keyed by county.
    TTestStatistic,
}

/// A resolved county attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    AffectedDays(u32),
    Evacuation(String),
    Affected(bool),
    Statistic(f64),
    /// The queried date lies outside the attribute's validity window.
    NotApplicable,
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AffectedDays(days) => write!(f, "{days}"),
            Self::Evacuation(order) => write!(f, "{order}"),
            Self::Affected(affected) => write!(f, "{}", u8::from(*affected)),
            Self::Statistic(value) => write!(f, "{value}"),
            Self::NotApplicable => write!(f, "{NOT_APPLICABLE}"),
        }
    }
}
