//! Read-only county lookup tables.
//!
//! [`ExposureTables`] is built once from the ingested exposure, evacuation
//! and geometry records and then only borrowed. Affected-day counts and
//! evacuation orders are keyed by county; day-level affected flags are keyed
//! by the composite `"{county}_{date}"` string, where the date is the
//! hurricane table's column header as written.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use hurricane_impact_exposure_models::{
    CountyFips, CountyGeometry, EvacuationRecord, HurricaneExposure, NO_EVACUATION_ORDER,
};

use crate::ExposureError;

/// Immutable per-county attribute tables.
#[derive(Debug, Clone, Default)]
pub struct ExposureTables {
    affected_days: BTreeMap<CountyFips, u32>,
    affected_on_date: BTreeMap<String, bool>,
    day_labels: BTreeMap<NaiveDate, String>,
    evacuation: BTreeMap<CountyFips, String>,
    geometry: BTreeMap<CountyFips, CountyGeometry>,
    date_format: String,
}

impl ExposureTables {
    /// Builds the tables from ingested records.
    ///
    /// Duplicate counties keep the last record seen, with a warning.
    #[must_use]
    pub fn build(
        exposures: Vec<HurricaneExposure>,
        evacuations: Vec<EvacuationRecord>,
        counties: Vec<CountyGeometry>,
        date_format: &str,
    ) -> Self {
        let mut affected_days = BTreeMap::new();
        let mut affected_on_date = BTreeMap::new();
        let mut day_labels = BTreeMap::new();

        for exposure in exposures {
            for day in exposure.daily {
                affected_on_date.insert(composite_key(exposure.county, &day.label), day.affected);
                day_labels.entry(day.date).or_insert(day.label);
            }
            if affected_days
                .insert(exposure.county, exposure.affected_days)
                .is_some()
            {
                log::warn!("Duplicate hurricane record for county {}", exposure.county);
            }
        }

        let mut evacuation = BTreeMap::new();
        for record in evacuations {
            if evacuation.insert(record.county, record.order).is_some() {
                log::warn!("Duplicate evacuation record for county {}", record.county);
            }
        }

        let geometry = counties.into_iter().map(|c| (c.county, c)).collect();

        Self {
            affected_days,
            affected_on_date,
            day_labels,
            evacuation,
            geometry,
            date_format: date_format.to_string(),
        }
    }

    /// Number of affected days for a county.
    ///
    /// # Errors
    ///
    /// Returns [`ExposureError::MissingExposure`] if the county has no
    /// hurricane record.
    pub fn affected_days(&self, county: CountyFips) -> Result<u32, ExposureError> {
        self.affected_days
            .get(&county)
            .copied()
            .ok_or(ExposureError::MissingExposure { county })
    }

    /// Evacuation order label, or [`NO_EVACUATION_ORDER`] when the county
    /// has no record.
    #[must_use]
    pub fn evacuation_order(&self, county: CountyFips) -> &str {
        self.evacuation
            .get(&county)
            .map_or(NO_EVACUATION_ORDER, String::as_str)
    }

    /// Day-level affected flag for a county on a date.
    ///
    /// # Errors
    ///
    /// Returns [`ExposureError::MissingDailyExposure`] if the hurricane
    /// table has no cell for that county and date.
    pub fn affected_on(&self, county: CountyFips, date: NaiveDate) -> Result<bool, ExposureError> {
        let key = self.key(county, date);
        self.affected_on_date
            .get(&key)
            .copied()
            .ok_or(ExposureError::MissingDailyExposure { key })
    }

    #[must_use]
    pub fn geometry(&self, county: CountyFips) -> Option<&CountyGeometry> {
        self.geometry.get(&county)
    }

    /// The composite day-level key for `county` and `date`. Dates absent
    /// from the hurricane table are rendered in the ingestion format.
    #[must_use]
    pub fn key(&self, county: CountyFips, date: NaiveDate) -> String {
        match self.day_labels.get(&date) {
            Some(label) => composite_key(county, label),
            None => composite_key(county, &date.format(&self.date_format).to_string()),
        }
    }
}

/// Formats the `"{county}_{date}"` key of the day-level table.
#[must_use]
pub fn composite_key(county: CountyFips, date_label: &str) -> String {
    format!("{county}_{date_label}")
}

#[cfg(test)]
mod tests {
    use hurricane_impact_exposure_models::HurricaneDay;

    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 8, day).unwrap()
    }

    fn day(day: u32, affected: bool) -> HurricaneDay {
        HurricaneDay {
            date: date(day),
            label: format!("8/{day}/2020"),
            affected,
        }
    }

    fn tables() -> ExposureTables {
        let exposures = vec![
            HurricaneExposure {
                county: CountyFips(22001),
                county_name: "Acadia Parish".to_string(),
                daily: vec![day(23, false), day(24, true)],
                affected_days: 1,
            },
            HurricaneExposure {
                county: CountyFips(48001),
                county_name: "Anderson County".to_string(),
                daily: vec![day(23, false), day(24, false)],
                affected_days: 0,
            },
        ];
        let evacuations = vec![EvacuationRecord {
            county: CountyFips(22001),
            order: "Mandatory".to_string(),
        }];
        ExposureTables::build(exposures, evacuations, Vec::new(), "%m/%d/%Y")
    }

    #[test]
    fn affected_days_by_county() {
        let tables = tables();
        assert_eq!(tables.affected_days(CountyFips(22001)).unwrap(), 1);
        assert_eq!(tables.affected_days(CountyFips(48001)).unwrap(), 0);
    }

    #[test]
    fn missing_exposure_is_an_error() {
        let err = tables().affected_days(CountyFips(1001)).unwrap_err();
        assert!(matches!(
            err,
            ExposureError::MissingExposure {
                county: CountyFips(1001)
            }
        ));
    }

    #[test]
    fn missing_evacuation_defaults_to_sentinel() {
        let tables = tables();
        assert_eq!(tables.evacuation_order(CountyFips(22001)), "Mandatory");
        assert_eq!(tables.evacuation_order(CountyFips(48001)), NO_EVACUATION_ORDER);
    }

    #[test]
    fn day_level_lookup_uses_composite_key() {
        let tables = tables();
        assert_eq!(tables.key(CountyFips(22001), date(24)), "22001_8/24/2020");
        assert!(tables.affected_on(CountyFips(22001), date(24)).unwrap());
        assert!(!tables.affected_on(CountyFips(22001), date(23)).unwrap());

        let err = tables.affected_on(CountyFips(22001), date(30)).unwrap_err();
        assert!(matches!(err, ExposureError::MissingDailyExposure { .. }));
    }

    #[test]
    fn dates_outside_the_table_use_the_ingestion_format() {
        assert_eq!(tables().key(CountyFips(48001), date(30)), "48001_08/30/2020");
    }
}
