//! Attribute-annotated panel export.
//!
//! Every panel row gets its county's evacuation order, affected-day count,
//! day-level affected flag and person-trip t-statistic, all resolved through
//! [`CountyAttributeResolver`]. Rows dated outside the resolver's validity
//! window carry `N/A` in those columns.

use std::{collections::BTreeMap, io::Write};

use hurricane_impact_exposure::CountyAttributeResolver;
use hurricane_impact_exposure_models::{AttributeKind, CountyFips, Observation};
use serde::Serialize;

use crate::{TrendsError, groups::MobilityGroup};

/// One annotated panel row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FocusedRow {
    #[serde(rename = "CTFIPS")]
    pub county: CountyFips,
    #[serde(rename = "CTNAME")]
    pub county_name: String,
    #[serde(rename = "STFIPS")]
    pub state_id: u32,
    /// The panel's date text, unchanged.
    pub date: String,
    #[serde(rename = "Trips/person")]
    pub trips_per_person: f64,
    #[serde(rename = "New cases/1000 people")]
    pub new_cases_per_1000: f64,
    pub mobility_group: Option<MobilityGroup>,
    pub evacuation: String,
    pub nb_day_affected_hurricane: String,
    pub if_affected_hurricane: String,
    pub t_testing: String,
}

/// Annotates `panel`.
///
/// # Errors
///
/// Propagates resolver failures: a county without a hurricane record, a
/// missing day-level cell inside the validity window, or a county without a
/// statistic.
pub fn annotate(
    panel: &[Observation],
    resolver: &CountyAttributeResolver<'_>,
    groups: &BTreeMap<CountyFips, MobilityGroup>,
) -> Result<Vec<FocusedRow>, TrendsError> {
    panel
        .iter()
        .map(|row| -> Result<FocusedRow, TrendsError> {
            let resolve = |kind| {
                resolver
                    .resolve(row.county, kind, Some(row.date))
                    .map(|value| value.to_string())
            };
            Ok(FocusedRow {
                county: row.county,
                county_name: row.county_name.clone(),
                state_id: row.state_id,
                date: row.date_label.clone(),
                trips_per_person: row.trips_per_person,
                new_cases_per_1000: row.new_cases_per_1000,
                mobility_group: groups.get(&row.county).copied(),
                evacuation: resolve(AttributeKind::EvacuationOrder)?,
                nb_day_affected_hurricane: resolve(AttributeKind::AffectedDayCount)?,
                if_affected_hurricane: resolve(AttributeKind::AffectedOnDate)?,
                t_testing: resolve(AttributeKind::TTestStatistic)?,
            })
        })
        .collect()
}

/// Writes annotated rows as CSV.
///
/// # Errors
///
/// Returns [`TrendsError::Csv`] or [`TrendsError::Io`] if writing fails.
pub fn write_focused<W: Write>(rows: &[FocusedRow], writer: W) -> Result<(), TrendsError> {
    let mut csv = csv::Writer::from_writer(writer);
    for row in rows {
        csv.serialize(row)?;
    }
    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use hurricane_impact_exposure::ExposureTables;
    use hurricane_impact_exposure_models::{
        DateWindow, HurricaneDay, HurricaneExposure, NOT_APPLICABLE,
    };

    use super::*;
    use crate::{evacuation_records, groups::mobility_groups, groups::tests::result};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 8, day).unwrap()
    }

    fn observation(county: u32, day: u32) -> Observation {
        Observation {
            county: CountyFips(county),
            county_name: format!("County {county}"),
            state_id: county / 1000,
            date: date(day),
            date_label: format!("8/{day}/2020"),
            is_weekday: true,
            trips_per_person: 3.0,
            trips_total: 3000.0,
            out_of_county_trips_per_person: 0.6,
            out_of_state_trips_per_person: 0.1,
            miles_per_person: 30.0,
            pct_working_from_home: 20.0,
            new_cases_per_1000: 0.2,
            active_cases_per_1000: 1.0,
            tests_per_1000: 2.0,
        }
    }

    #[test]
    fn rows_outside_hurricane_window_are_not_applicable() {
        let results = vec![result(22002, 2, -1.5)];
        let exposures = vec![HurricaneExposure {
            county: CountyFips(22002),
            county_name: "County 22002".to_string(),
            daily: (20..=30)
                .map(|d| HurricaneDay {
                    date: date(d),
                    label: format!("{d:02}/08/2020"),
                    affected: d == 25 || d == 26,
                })
                .collect(),
            affected_days: 2,
        }];
        let tables =
            ExposureTables::build(exposures, evacuation_records(&results), Vec::new(), "%m/%d/%Y");
        let statistics = crate::groups::person_trip_statistics(&results);
        let resolver = CountyAttributeResolver::new(&tables, DateWindow::new(date(23), date(27)))
            .with_statistics(&statistics);
        let panel = vec![observation(22002, 22), observation(22002, 25)];

        let rows = annotate(&panel, &resolver, &mobility_groups(&results)).unwrap();

        assert_eq!(rows[0].date, "8/22/2020");
        assert_eq!(rows[0].evacuation, NOT_APPLICABLE);
        assert_eq!(rows[0].t_testing, NOT_APPLICABLE);
        assert_eq!(rows[0].mobility_group, Some(MobilityGroup::AffectedDecrease));

        assert_eq!(rows[1].evacuation, "Mandatory");
        assert_eq!(rows[1].nb_day_affected_hurricane, "2");
        assert_eq!(rows[1].if_affected_hurricane, "1");
        assert_eq!(rows[1].t_testing, "-1.5");

        let mut out = Vec::new();
        write_focused(&rows, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("CTFIPS,CTNAME,STFIPS,date,Trips/person"));
        assert!(text.contains("affected_decrease"));
    }

    #[test]
    fn missing_exposure_inside_window_is_an_error() {
        let tables = ExposureTables::build(Vec::new(), Vec::new(), Vec::new(), "%m/%d/%Y");
        let resolver = CountyAttributeResolver::new(&tables, DateWindow::new(date(23), date(27)));
        let panel = vec![observation(22002, 24)];
        assert!(annotate(&panel, &resolver, &BTreeMap::new()).is_err());
    }
}
