#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-county hypothesis test results and cross-county comparison types.
//!
//! [`CountyTestResult`] is the one-row-per-county record the pipeline
//! persists; its serialized column names are the ones downstream plotting
//! expects. The remaining types describe the cross-county comparisons, the
//! ANOVA table and the analysis options that shaped them.

use hurricane_impact_exposure_models::{CountyFips, Metric};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Alternative hypothesis of a t-test, phrased for the first group (the
/// hurricane-window sample) against the second.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum Alternative {
    TwoSided,
    /// The first group's mean is less than the second's.
    Less,
    /// The first group's mean is greater than the second's.
    Greater,
}

/// Statistic and p-value of a single test. Either may be `NaN` when the
/// test is degenerate (too few observations, zero variance).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
}

impl TestOutcome {
    pub const NAN: Self = Self {
        statistic: f64::NAN,
        p_value: f64::NAN,
    };

    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.statistic.is_nan() || self.p_value.is_nan()
    }
}

/// The fixed battery of per-county tests.
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
pub enum BatteryTest {
    /// One-sample test of hurricane-window trips/person against the
    /// population mean.
    PersonTripOneSample,
    PersonTrip,
    TotalTrip,
    OutOfCountyTrip,
    OutOfStateTrip,
    PersonMile,
    WorkFromHome,
}

impl BatteryTest {
    pub const ALL: [Self; 7] = [
        Self::PersonTripOneSample,
        Self::PersonTrip,
        Self::TotalTrip,
        Self::OutOfCountyTrip,
        Self::OutOfStateTrip,
        Self::PersonMile,
        Self::WorkFromHome,
    ];

    /// Panel column the test compares.
    #[must_use]
    pub const fn metric(self) -> Metric {
        match self {
            Self::PersonTripOneSample | Self::PersonTrip => Metric::TripsPerPerson,
            Self::TotalTrip => Metric::TripsTotal,
            Self::OutOfCountyTrip => Metric::OutOfCountyTripsPerPerson,
            Self::OutOfStateTrip => Metric::OutOfStateTripsPerPerson,
            Self::PersonMile => Metric::MilesPerPerson,
            Self::WorkFromHome => Metric::PctWorkingFromHome,
        }
    }

    /// Out-of-county and out-of-state trips are expected to drop during the
    /// hurricane; every other test is two-sided.
    #[must_use]
    pub const fn alternative(self) -> Alternative {
        match self {
            Self::OutOfCountyTrip | Self::OutOfStateTrip => Alternative::Less,
            Self::PersonTripOneSample
            | Self::PersonTrip
            | Self::TotalTrip
            | Self::PersonMile
            | Self::WorkFromHome => Alternative::TwoSided,
        }
    }

    #[must_use]
    pub const fn is_one_sample(self) -> bool {
        matches!(self, Self::PersonTripOneSample)
    }
}

/// One row of the cross-county dataset.
///
/// Column names follow the established output layout (`CTFIPs`, `CTNAME`,
/// `t_stat_2samp_person_trip`, ...). Population summaries and the sample
/// summaries are computed from the same metric column they are named
/// after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyTestResult {
    #[serde(rename = "CTFIPs")]
    pub county: CountyFips,
    #[serde(rename = "CTNAME")]
    pub county_name: String,
    #[serde(rename = "STFIPs")]
    pub state_id: u32,
    pub nb_affected_days: u32,
    pub evacuation_order: String,

    pub pop_trip_mean: f64,
    pub pop_trip_var: f64,
    pub sample_trip_mean: f64,
    pub pop_out_of_county_trip_mean: f64,
    pub sample_out_of_county_trip_mean: f64,
    pub pop_out_of_state_trip_mean: f64,
    pub sample_out_of_state_trip_mean: f64,
    pub pop_mile_mean: f64,
    pub sample_mile_mean: f64,
    pub pop_work_home_mean: f64,
    pub sample_work_home_mean: f64,

    pub t_stat_1samp_person_trip: f64,
    pub p_value_1samp_person_trip: f64,
    pub t_stat_2samp_person_trip: f64,
    pub p_value_2samp_person_trip: f64,
    pub t_stat_2samp_total_trip: f64,
    pub p_value_2samp_total_trip: f64,
    pub t_stat_2samp_out_ct_trip: f64,
    pub p_value_2samp_out_ct_trip: f64,
    pub t_stat_2samp_out_st_trip: f64,
    pub p_value_2samp_out_st_trip: f64,
    pub t_stat_2samp_person_mile: f64,
    pub p_value_2samp_person_mile: f64,
    pub t_stat_2samp_perc_work_home: f64,
    pub p_value_2samp_perc_work_home: f64,

    pub case_difference: f64,
    pub after_cases: f64,
    pub before_cases: f64,
    pub test_difference: f64,
    pub after_testing: f64,
    pub before_testing: f64,

    /// County boundary as `GeoJSON`, empty when no boundary was loaded.
    pub geometry: String,
    pub centroid_x: Option<f64>,
    pub centroid_y: Option<f64>,

    /// Two-sample person-trip t-statistic is positive.
    pub mobility_variation: bool,
    /// At least one affected day.
    pub affected_hurricane: bool,
}

impl CountyTestResult {
    /// Statistic and p-value of one test of the battery.
    #[must_use]
    pub const fn outcome(&self, test: BatteryTest) -> TestOutcome {
        let (statistic, p_value) = match test {
            BatteryTest::PersonTripOneSample => (
                self.t_stat_1samp_person_trip,
                self.p_value_1samp_person_trip,
            ),
            BatteryTest::PersonTrip => (
                self.t_stat_2samp_person_trip,
                self.p_value_2samp_person_trip,
            ),
            BatteryTest::TotalTrip => (self.t_stat_2samp_total_trip, self.p_value_2samp_total_trip),
            BatteryTest::OutOfCountyTrip => (
                self.t_stat_2samp_out_ct_trip,
                self.p_value_2samp_out_ct_trip,
            ),
            BatteryTest::OutOfStateTrip => (
                self.t_stat_2samp_out_st_trip,
                self.p_value_2samp_out_st_trip,
            ),
            BatteryTest::PersonMile => (
                self.t_stat_2samp_person_mile,
                self.p_value_2samp_person_mile,
            ),
            BatteryTest::WorkFromHome => (
                self.t_stat_2samp_perc_work_home,
                self.p_value_2samp_perc_work_home,
            ),
        };
        TestOutcome { statistic, p_value }
    }

    /// Tests of the battery whose statistic or p-value is `NaN`.
    #[must_use]
    pub fn degenerate_tests(&self) -> Vec<BatteryTest> {
        BatteryTest::ALL
            .into_iter()
            .filter(|test| self.outcome(*test).is_degenerate())
            .collect()
    }
}

/// Which rows summarize the population (control) side.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Baseline {
    /// Non-hurricane weekday rows, the same rows the two-sample tests use.
    #[default]
    ControlWindow,
    /// Every weekday row in the mobility range, hurricane window included.
    AllWeekdays,
}

/// Multiple-comparison correction across the battery of one county.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Correction {
    #[default]
    None,
    Bonferroni,
    Holm,
}

/// Treatment of `NaN` values in cross-county comparisons.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NanPolicy {
    /// Any `NaN` input makes the result `NaN`.
    #[default]
    Propagate,
    /// `NaN` inputs are dropped first.
    Omit,
}

/// Sums-of-squares type of the ANOVA table.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnovaType {
    /// Sequential sums of squares.
    Type1,
    /// Each main effect adjusted for the other; interaction adjusted for
    /// both.
    #[default]
    Type2,
}

/// Two-sample comparison of `case_difference` between two county groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupComparison {
    pub name: String,
    pub group_a: String,
    pub group_b: String,
    pub n_a: usize,
    pub n_b: usize,
    pub mean_a: f64,
    pub mean_b: f64,
    #[serde(flatten)]
    pub outcome: TestOutcome,
}

/// One row of an ANOVA table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaRow {
    pub term: String,
    pub df: f64,
    pub sum_sq: f64,
    pub mean_sq: f64,
    #[serde(rename = "F")]
    pub f_value: f64,
    #[serde(rename = "PR(>F)")]
    pub p_value: f64,
}

/// ANOVA of `case_difference` on mobility variation, hurricane exposure and
/// their interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaTable {
    pub anova_type: AnovaType,
    /// Rows used in the fit.
    pub n_observations: usize,
    /// Rows dropped for a `NaN` response.
    pub n_dropped: usize,
    pub rows: Vec<AnovaRow>,
}

impl AnovaTable {
    #[must_use]
    pub fn row(&self, term: &str) -> Option<&AnovaRow> {
        self.rows.iter().find(|r| r.term == term)
    }
}

/// Shapiro-Wilk normality diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalityCheck {
    pub column: String,
    pub n: usize,
    pub w: f64,
    pub p_value: f64,
}

/// A county whose battery produced `NaN` results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegenerateCounty {
    pub county: CountyFips,
    pub county_name: String,
    pub tests: Vec<BatteryTest>,
}

/// Everything the cross-county stage reports besides the per-county rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub hurricane: String,
    pub counties: usize,
    pub affected_counties: usize,
    pub correction: Correction,
    pub nan_policy: NanPolicy,
    pub affected_vs_unaffected: GroupComparison,
    pub evacuation_order_vs_none: GroupComparison,
    pub anova: AnovaTable,
    pub normality: NormalityCheck,
    pub degenerate_counties: Vec<DegenerateCounty>,
}
