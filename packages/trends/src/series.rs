//! Daily cross-county trend series.
//!
//! Produces long-format `(series, date, value)` points over the trend range
//! `[start - (buffer - 30), end + (buffer - 30)]`: the mean trips/person of
//! every county, and the 7-day trailing rolling mean of new cases per
//! [`MobilityGroup`]. A day without data, or a rolling window touching one,
//! has no value.

#![allow(clippy::cast_precision_loss)]

use std::{collections::BTreeMap, io::Write};

use chrono::NaiveDate;
use hurricane_impact_exposure_models::{CountyFips, DateWindow, Metric, Observation};
use hurricane_impact_hypothesis::{
    config::{AnalysisConfig, WindowConfig},
    stats::mean,
    windows::StudyWindows,
};
use serde::Serialize;

use crate::{TrendsError, groups::MobilityGroup};

/// Days trimmed from each end of the mobility range.
pub const TREND_MARGIN_DAYS: u32 = 30;

/// Width of the trailing case average.
pub const ROLLING_WINDOW: usize = 7;

pub const MEAN_TRIPS_SERIES: &str = "mean_trips_per_person";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub series: String,
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// The trend range of `config`.
///
/// # Errors
///
/// Returns [`TrendsError::Hypothesis`] if the range runs off the calendar.
pub fn trend_range(config: &AnalysisConfig) -> Result<DateWindow, TrendsError> {
    let trimmed = WindowConfig {
        mobility_buffer_days: config
            .windows
            .mobility_buffer_days
            .saturating_sub(TREND_MARGIN_DAYS),
        ..config.windows
    };
    Ok(StudyWindows::new(config.hurricane.window(), &trimmed)?.mobility())
}

/// Name of the rolling new-case series of `group`.
#[must_use]
pub fn case_series_name(group: MobilityGroup) -> String {
    format!("new_cases_7d_{group}")
}

/// Builds every series over `range`.
#[must_use]
pub fn trend_series(
    panel: &[Observation],
    groups: &BTreeMap<CountyFips, MobilityGroup>,
    range: DateWindow,
) -> Vec<TrendPoint> {
    let dates: Vec<NaiveDate> = range.days().collect();
    let mut points = Vec::with_capacity(dates.len() * (1 + MobilityGroup::ALL.len()));

    let trips = daily_means(panel.iter(), range, Metric::TripsPerPerson);
    push_series(&mut points, MEAN_TRIPS_SERIES, &dates, &trips);

    for group in MobilityGroup::ALL {
        let rows = panel
            .iter()
            .filter(|o| groups.get(&o.county) == Some(&group));
        let cases = daily_means(rows, range, Metric::NewCasesPer1000);
        let rolling = rolling_mean(&cases, ROLLING_WINDOW);
        push_series(&mut points, &case_series_name(group), &dates, &rolling);
    }

    points
}

fn push_series(points: &mut Vec<TrendPoint>, name: &str, dates: &[NaiveDate], values: &[f64]) {
    points.extend(dates.iter().zip(values).map(|(date, value)| TrendPoint {
        series: name.to_string(),
        date: *date,
        value: (!value.is_nan()).then_some(*value),
    }));
}

/// Mean of `metric` across rows for every day of `range`, `NaN` on days
/// without rows.
fn daily_means<'a>(
    rows: impl Iterator<Item = &'a Observation>,
    range: DateWindow,
    metric: Metric,
) -> Vec<f64> {
    let mut by_date: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for row in rows.filter(|o| range.contains(o.date)) {
        by_date.entry(row.date).or_default().push(row.metric(metric));
    }
    range
        .days()
        .map(|date| by_date.get(&date).map_or(f64::NAN, |values| mean(values)))
        .collect()
}

/// Trailing mean over `window` values; `NaN` until the window is full or
/// while it contains a `NaN`.
#[must_use]
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                return f64::NAN;
            }
            let slice = &values[i + 1 - window..=i];
            if slice.iter().any(|v| v.is_nan()) {
                f64::NAN
            } else {
                slice.iter().sum::<f64>() / window as f64
            }
        })
        .collect()
}

/// Writes points as `series,date,value` CSV.
///
/// # Errors
///
/// Returns [`TrendsError::Csv`] or [`TrendsError::Io`] if writing fails.
pub fn write_series<W: Write>(points: &[TrendPoint], writer: W) -> Result<(), TrendsError> {
    let mut csv = csv::Writer::from_writer(writer);
    for point in points {
        csv.serialize(point)?;
    }
    csv.flush()?;
    Ok(())
}
