//! Before/After Case-Difference Calculator.

use hurricane_impact_exposure_models::{DateWindow, Metric, Observation};

use crate::{stats::mean, windows::StudyWindows};

/// Mean new-case and testing rates around the hurricane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaseDifferences {
    pub before_cases: f64,
    pub after_cases: f64,
    /// `after_cases - before_cases`.
    pub case_difference: f64,
    pub before_testing: f64,
    pub after_testing: f64,
    /// `after_testing - before_testing`.
    pub test_difference: f64,
}

/// Computes the case and testing means of one county's rows in the before
/// and after windows. Every calendar day counts, weekends included; empty
/// cells are skipped.
#[must_use]
pub fn case_differences(rows: &[Observation], windows: &StudyWindows) -> CaseDifferences {
    let window_mean = |window: DateWindow, metric: Metric| {
        let values: Vec<f64> = rows
            .iter()
            .filter(|o| window.contains(o.date))
            .map(|o| o.metric(metric))
            .collect();
        mean(&values)
    };

    let before_cases = window_mean(windows.before_cases(), Metric::NewCasesPer1000);
    let after_cases = window_mean(windows.after_cases(), Metric::NewCasesPer1000);
    let before_testing = window_mean(windows.before_cases(), Metric::TestsPer1000);
    let after_testing = window_mean(windows.after_cases(), Metric::TestsPer1000);

    CaseDifferences {
        before_cases,
        after_cases,
        case_difference: after_cases - before_cases,
        before_testing,
        after_testing,
        test_difference: after_testing - before_testing,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battery::tests::{county_rows, laura};

    #[test]
    fn differences_are_after_minus_before() {
        let windows = laura();
        let mut rows = county_rows(22001, &windows, |_| 3.0, |_| 2.0);
        for row in &mut rows {
            let labels = windows.classify(row.date);
            // Only the shared end date sits in both windows.
            row.new_cases_per_1000 = match (
                labels.in_before_covid_window,
                labels.in_after_covid_window,
            ) {
                (true, true) => 3.0,
                (true, false) => 1.0,
                (false, true) => 5.0,
                (false, false) => 100.0,
            };
            row.tests_per_1000 = if labels.in_after_covid_window { 4.0 } else { 2.0 };
        }

        let diff = case_differences(&rows, &windows);
        // Before: 13 days at 1.0 plus the end date at 3.0.
        assert!((diff.before_cases - 16.0 / 14.0).abs() < 1e-12);
        // After: the end date at 3.0 plus 14 days at 5.0.
        assert!((diff.after_cases - 73.0 / 15.0).abs() < 1e-12);
        assert!((diff.case_difference - (diff.after_cases - diff.before_cases)).abs() < 1e-12);

        assert!((diff.after_testing - 4.0).abs() < 1e-12);
        assert!((diff.before_testing - 30.0 / 14.0).abs() < 1e-12);
    }

    #[test]
    fn missing_cells_are_skipped_and_empty_windows_are_nan() {
        let windows = laura();
        let mut rows = county_rows(22001, &windows, |_| 3.0, |_| 2.0);
        for row in &mut rows {
            if windows.classify(row.date).in_before_covid_window {
                row.tests_per_1000 = f64::NAN;
            }
        }
        rows[0].new_cases_per_1000 = f64::NAN;

        let diff = case_differences(&rows, &windows);
        assert!((diff.before_cases - 0.1).abs() < 1e-12);
        assert!(diff.before_testing.is_nan());
        assert!(diff.test_difference.is_nan());
        // The shared end date is empty; the rest of the after window is not.
        assert!((diff.after_testing - 2.0).abs() < 1e-12);
    }
}
