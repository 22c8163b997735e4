//! Per-County Test Battery.
//!
//! Splits one county's rows into population (control weekdays) and sample
//! (hurricane-window weekdays), summarizes both and runs the fixed set of
//! t-tests in [`BatteryTest::ALL`]. Degenerate groups are not special-cased:
//! they surface as `NaN` outcomes.

use hurricane_impact_exposure_models::{Metric, Observation};
use hurricane_impact_hypothesis_models::{Baseline, BatteryTest, Correction, TestOutcome};

use crate::{
    stats::{adjust_p_values, mean, ttest_1samp, ttest_ind, variance},
    windows::StudyWindows,
};

/// Rows of one county split by window.
#[derive(Debug, Clone, Default)]
pub struct Partition<'a> {
    /// Weekdays outside the hurricane window.
    pub population: Vec<&'a Observation>,
    /// Weekdays inside the hurricane window.
    pub sample: Vec<&'a Observation>,
}

impl Partition<'_> {
    #[must_use]
    pub fn population_values(&self, metric: Metric) -> Vec<f64> {
        self.population.iter().map(|o| o.metric(metric)).collect()
    }

    #[must_use]
    pub fn sample_values(&self, metric: Metric) -> Vec<f64> {
        self.sample.iter().map(|o| o.metric(metric)).collect()
    }
}

/// Splits `rows` into population and sample. Weekend rows belong to
/// neither.
#[must_use]
pub fn partition<'a>(rows: &'a [Observation], windows: &StudyWindows) -> Partition<'a> {
    let mut split = Partition::default();
    for row in rows {
        let labels = windows.classify_row(row);
        if labels.in_sample() {
            split.sample.push(row);
        } else if labels.in_population() {
            split.population.push(row);
        }
    }
    split
}

/// Population and sample means of one metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupMeans {
    pub population: f64,
    pub sample: f64,
}

/// Statistical fields of one county's result.
#[derive(Debug, Clone, PartialEq)]
pub struct BatteryResult {
    pub trips: GroupMeans,
    pub pop_trip_var: f64,
    pub out_of_county_trips: GroupMeans,
    pub out_of_state_trips: GroupMeans,
    pub miles: GroupMeans,
    pub work_home: GroupMeans,
    /// Outcomes in [`BatteryTest::ALL`] order.
    pub outcomes: [TestOutcome; 7],
}

impl BatteryResult {
    #[must_use]
    pub fn outcome(&self, test: BatteryTest) -> TestOutcome {
        BatteryTest::ALL
            .iter()
            .position(|t| *t == test)
            .map_or(TestOutcome::NAN, |i| self.outcomes[i])
    }
}

/// Runs the battery over one county's rows.
///
/// `baseline` selects the rows the population summaries (means, trip
/// variance, one-sample reference mean) are computed over. The two-sample
/// tests always compare against the control rows.
#[must_use]
pub fn run_battery(
    rows: &[Observation],
    windows: &StudyWindows,
    baseline: Baseline,
    correction: Correction,
) -> BatteryResult {
    let split = partition(rows, windows);
    let reference: Vec<&Observation> = match baseline {
        Baseline::ControlWindow => split.population.clone(),
        Baseline::AllWeekdays => rows
            .iter()
            .filter(|o| o.is_weekday)
            .collect(),
    };
    let reference_values =
        |metric: Metric| -> Vec<f64> { reference.iter().map(|o| o.metric(metric)).collect() };
    let group_means = |metric: Metric| GroupMeans {
        population: mean(&reference_values(metric)),
        sample: mean(&split.sample_values(metric)),
    };

    let trips = group_means(Metric::TripsPerPerson);
    let outcomes = BatteryTest::ALL.map(|test| {
        let sample = split.sample_values(test.metric());
        if test.is_one_sample() {
            ttest_1samp(&sample, trips.population, test.alternative())
        } else {
            ttest_ind(
                &sample,
                &split.population_values(test.metric()),
                test.alternative(),
            )
        }
    });

    BatteryResult {
        trips,
        pop_trip_var: variance(&reference_values(Metric::TripsPerPerson)),
        out_of_county_trips: group_means(Metric::OutOfCountyTripsPerPerson),
        out_of_state_trips: group_means(Metric::OutOfStateTripsPerPerson),
        miles: group_means(Metric::MilesPerPerson),
        work_home: group_means(Metric::PctWorkingFromHome),
        outcomes: corrected(outcomes, correction),
    }
}

fn corrected(mut outcomes: [TestOutcome; 7], correction: Correction) -> [TestOutcome; 7] {
    let p_values = outcomes.map(|o| o.p_value);
    for (outcome, p_value) in outcomes
        .iter_mut()
        .zip(adjust_p_values(&p_values, correction))
    {
        outcome.p_value = p_value;
    }
    outcomes
}
