//! Mobility-direction grouping of counties.

use std::collections::BTreeMap;

use hurricane_impact_exposure_models::CountyFips;
use hurricane_impact_hypothesis_models::CountyTestResult;
use serde::Serialize;
use strum_macros::{AsRefStr, Display, EnumString};

/// Which trend group a county belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MobilityGroup {
    /// No affected days.
    Unaffected,
    /// Affected, person-trip t-statistic `>= 0`.
    AffectedIncrease,
    /// Affected, person-trip t-statistic `< 0`.
    AffectedDecrease,
}

impl MobilityGroup {
    pub const ALL: [Self; 3] = [
        Self::Unaffected,
        Self::AffectedIncrease,
        Self::AffectedDecrease,
    ];

    /// Group of a county result. An affected county with a `NaN`
    /// statistic has none.
    #[must_use]
    pub fn of(result: &CountyTestResult) -> Option<Self> {
        let statistic = result.t_stat_2samp_person_trip;
        if !result.affected_hurricane {
            Some(Self::Unaffected)
        } else if statistic >= 0.0 {
            Some(Self::AffectedIncrease)
        } else if statistic < 0.0 {
            Some(Self::AffectedDecrease)
        } else {
            None
        }
    }
}

#[must_use]
pub fn mobility_groups(results: &[CountyTestResult]) -> BTreeMap<CountyFips, MobilityGroup> {
    results
        .iter()
        .filter_map(|r| MobilityGroup::of(r).map(|group| (r.county, group)))
        .collect()
}

/// Two-sample person-trip t-statistic per county.
#[must_use]
pub fn person_trip_statistics(results: &[CountyTestResult]) -> BTreeMap<CountyFips, f64> {
    results
        .iter()
        .map(|r| (r.county, r.t_stat_2samp_person_trip))
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use hurricane_impact_exposure_models::NO_EVACUATION_ORDER;

    use super::*;

    pub fn result(county: u32, affected_days: u32, statistic: f64) -> CountyTestResult {
        CountyTestResult {
            county: CountyFips(county),
            county_name: format!("County {county}"),
            state_id: county / 1000,
            nb_affected_days: affected_days,
            evacuation_order: if county % 2 == 0 {
                "Mandatory".to_string()
            } else {
                NO_EVACUATION_ORDER.to_string()
            },
            pop_trip_mean: 3.0,
            pop_trip_var: 0.5,
            sample_trip_mean: 2.5,
            pop_out_of_county_trip_mean: 0.6,
            sample_out_of_county_trip_mean: 0.5,
            pop_out_of_state_trip_mean: 0.1,
            sample_out_of_state_trip_mean: 0.1,
            pop_mile_mean: 30.0,
            sample_mile_mean: 25.0,
            pop_work_home_mean: 20.0,
            sample_work_home_mean: 22.0,
            t_stat_1samp_person_trip: statistic,
            p_value_1samp_person_trip: 0.5,
            t_stat_2samp_person_trip: statistic,
            p_value_2samp_person_trip: 0.5,
            t_stat_2samp_total_trip: statistic,
            p_value_2samp_total_trip: 0.5,
            t_stat_2samp_out_ct_trip: statistic,
            p_value_2samp_out_ct_trip: 0.5,
            t_stat_2samp_out_st_trip: statistic,
            p_value_2samp_out_st_trip: 0.5,
            t_stat_2samp_person_mile: statistic,
            p_value_2samp_person_mile: 0.5,
            t_stat_2samp_perc_work_home: statistic,
            p_value_2samp_perc_work_home: 0.5,
            case_difference: 0.1,
            after_cases: 0.3,
            before_cases: 0.2,
            test_difference: 0.0,
            after_testing: 2.0,
            before_testing: 2.0,
            geometry: String::new(),
            centroid_x: None,
            centroid_y: None,
            mobility_variation: statistic > 0.0,
            affected_hurricane: affected_days > 0,
        }
    }

    #[test]
    fn groups_follow_exposure_then_direction() {
        assert_eq!(
            MobilityGroup::of(&result(1001, 0, -4.0)),
            Some(MobilityGroup::Unaffected)
        );
        assert_eq!(
            MobilityGroup::of(&result(1003, 2, 0.0)),
            Some(MobilityGroup::AffectedIncrease)
        );
        assert_eq!(
            MobilityGroup::of(&result(1005, 2, -0.1)),
            Some(MobilityGroup::AffectedDecrease)
        );
        assert_eq!(MobilityGroup::of(&result(1007, 2, f64::NAN)), None);
    }

    #[test]
    fn nan_statistic_drops_county_from_groups_only() {
        let results = vec![result(1001, 0, 1.0), result(1003, 2, f64::NAN)];
        assert_eq!(mobility_groups(&results).len(), 1);
        assert_eq!(person_trip_statistics(&results).len(), 2);
    }
}
