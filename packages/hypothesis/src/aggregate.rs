//! Cross-County Aggregator.
//!
//! Runs the test battery and the before/after calculator for every county
//! of the panel and assembles one [`CountyTestResult`] per county, sorted by
//! county id.

use hurricane_impact_exposure::ExposureTables;
use hurricane_impact_exposure_models::Observation;
use hurricane_impact_hypothesis_models::{BatteryTest, CountyTestResult, DegenerateCounty};

use crate::{
    HypothesisError,
    battery::run_battery,
    before_after::case_differences,
    config::AnalysisOptions,
    progress::ProgressCallback,
    windows::StudyWindows,
};

/// Builds the cross-county dataset from a panel and read-only lookup
/// tables.
#[derive(Debug, Clone, Copy)]
pub struct CrossCountyAggregator<'a> {
    tables: &'a ExposureTables,
    windows: StudyWindows,
    options: AnalysisOptions,
}

impl<'a> CrossCountyAggregator<'a> {
    #[must_use]
    pub const fn new(
        tables: &'a ExposureTables,
        windows: StudyWindows,
        options: AnalysisOptions,
    ) -> Self {
        Self {
            tables,
            windows,
            options,
        }
    }

    /// Produces one result per county with rows in the mobility range.
    ///
    /// A county whose tests are degenerate still gets a row; the failing
    /// tests are logged at `warn`.
    ///
    /// # Errors
    ///
    /// * [`HypothesisError::EmptyPanel`] if the panel has no rows in the
    ///   mobility range.
    /// * [`HypothesisError::Exposure`] if a county has no hurricane
    ///   exposure record.
    pub fn aggregate(
        &self,
        panel: &[Observation],
        progress: &dyn ProgressCallback,
    ) -> Result<Vec<CountyTestResult>, HypothesisError> {
        let mobility = self.windows.mobility();
        let mut rows: Vec<Observation> = panel
            .iter()
            .filter(|o| mobility.contains(o.date))
            .cloned()
            .collect();
        if rows.is_empty() {
            log::warn!(
                "None of the {} panel rows fall in the mobility range {mobility}",
                panel.len()
            );
            return Err(HypothesisError::EmptyPanel);
        }
        rows.sort_by(|a, b| (a.county, a.date).cmp(&(b.county, b.date)));

        let counties: Vec<&[Observation]> = rows.chunk_by(|a, b| a.county == b.county).collect();
        log::info!(
            "Testing {} counties over {} rows ({mobility})",
            counties.len(),
            rows.len()
        );
        progress.set_total(counties.len() as u64);

        let mut results = Vec::with_capacity(counties.len());
        for county_rows in counties {
            let result = self.county_result(county_rows)?;
            let degenerate = result.degenerate_tests();
            if !degenerate.is_empty() {
                log::warn!(
                    "County {} ({}) has NaN results for: {}",
                    result.county,
                    result.county_name,
                    test_names(&degenerate)
                );
            }
            progress.set_message(format!("County {}", result.county));
            progress.inc(1);
            results.push(result);
        }

        progress.finish(format!("Tested {} counties", results.len()));
        Ok(results)
    }

    fn county_result(&self, rows: &[Observation]) -> Result<CountyTestResult, HypothesisError> {
        let first = rows.first().ok_or(HypothesisError::EmptyPanel)?;
        let county = first.county;
        log::debug!("Testing county {county} ({} rows)", rows.len());

        let affected_days = self.tables.affected_days(county)?;
        let evacuation_order = self.tables.evacuation_order(county).to_string();
        let (geometry, centroid_x, centroid_y) = match self.tables.geometry(county) {
            Some(g) => (g.geometry.clone(), Some(g.centroid_x), Some(g.centroid_y)),
            None => {
                log::warn!("No geometry for county {county}");
                (String::new(), None, None)
            }
        };

        let battery = run_battery(
            rows,
            &self.windows,
            self.options.baseline,
            self.options.correction,
        );
        let cases = case_differences(rows, &self.windows);
        let outcome = |test: BatteryTest| battery.outcome(test);

        let person_trip = outcome(BatteryTest::PersonTrip);
        let one_sample = outcome(BatteryTest::PersonTripOneSample);
        let total_trip = outcome(BatteryTest::TotalTrip);
        let out_county = outcome(BatteryTest::OutOfCountyTrip);
        let out_state = outcome(BatteryTest::OutOfStateTrip);
        let person_mile = outcome(BatteryTest::PersonMile);
        let work_home = outcome(BatteryTest::WorkFromHome);

        Ok(CountyTestResult {
            county,
            county_name: first.county_name.clone(),
            state_id: first.state_id,
            nb_affected_days: affected_days,
            evacuation_order,

            pop_trip_mean: battery.trips.population,
            pop_trip_var: battery.pop_trip_var,
            sample_trip_mean: battery.trips.sample,
            pop_out_of_county_trip_mean: battery.out_of_county_trips.population,
            sample_out_of_county_trip_mean: battery.out_of_county_trips.sample,
            pop_out_of_state_trip_mean: battery.out_of_state_trips.population,
            sample_out_of_state_trip_mean: battery.out_of_state_trips.sample,
            pop_mile_mean: battery.miles.population,
            sample_mile_mean: battery.miles.sample,
            pop_work_home_mean: battery.work_home.population,
            sample_work_home_mean: battery.work_home.sample,

            t_stat_1samp_person_trip: one_sample.statistic,
            p_value_1samp_person_trip: one_sample.p_value,
            t_stat_2samp_person_trip: person_trip.statistic,
            p_value_2samp_person_trip: person_trip.p_value,
            t_stat_2samp_total_trip: total_trip.statistic,
            p_value_2samp_total_trip: total_trip.p_value,
            t_stat_2samp_out_ct_trip: out_county.statistic,
            p_value_2samp_out_ct_trip: out_county.p_value,
            t_stat_2samp_out_st_trip: out_state.statistic,
            p_value_2samp_out_st_trip: out_state.p_value,
            t_stat_2samp_person_mile: person_mile.statistic,
            p_value_2samp_person_mile: person_mile.p_value,
            t_stat_2samp_perc_work_home: work_home.statistic,
            p_value_2samp_perc_work_home: work_home.p_value,

            case_difference: cases.case_difference,
            after_cases: cases.after_cases,
            before_cases: cases.before_cases,
            test_difference: cases.test_difference,
            after_testing: cases.after_testing,
            before_testing: cases.before_testing,

            geometry,
            centroid_x,
            centroid_y,

            mobility_variation: person_trip.statistic > 0.0,
            affected_hurricane: affected_days > 0,
        })
    }
}

/// Counties with at least one `NaN` statistic or p-value.
#[must_use]
pub fn degenerate_counties(results: &[CountyTestResult]) -> Vec<DegenerateCounty> {
    results
        .iter()
        .filter_map(|r| {
            let tests = r.degenerate_tests();
            (!tests.is_empty()).then(|| DegenerateCounty {
                county: r.county,
                county_name: r.county_name.clone(),
                tests,
            })
        })
        .collect()
}

fn test_names(tests: &[BatteryTest]) -> String {
    tests
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
