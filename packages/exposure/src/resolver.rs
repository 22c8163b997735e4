//! County Attribute Resolver.
//!
//! Maps a county (and, for day-level attributes, a date) to one of the
//! [`AttributeKind`]s. Each kind has its own typed lookup, selected by a
//! closed `match`. When a date is supplied and falls outside the resolver's
//! validity window the result is [`AttributeValue::NotApplicable`] for every
//! kind, even if the tables hold a value for it.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use hurricane_impact_exposure_models::{AttributeKind, AttributeValue, CountyFips, DateWindow};

use crate::{ExposureError, ExposureTables};

/// Read-only attribute lookups over [`ExposureTables`] and, optionally, the
/// per-county person-trip t-statistics of a finished analysis.
#[derive(Debug, Clone, Copy)]
pub struct CountyAttributeResolver<'a> {
    tables: &'a ExposureTables,
    statistics: Option<&'a BTreeMap<CountyFips, f64>>,
    validity: DateWindow,
}

impl<'a> CountyAttributeResolver<'a> {
    /// Creates a resolver whose date-dependent lookups are valid inside
    /// `validity`.
    #[must_use]
    pub const fn new(tables: &'a ExposureTables, validity: DateWindow) -> Self {
        Self {
            tables,
            statistics: None,
            validity,
        }
    }

    /// Attaches per-county t-statistics for [`AttributeKind::TTestStatistic`].
    #[must_use]
    pub const fn with_statistics(mut self, statistics: &'a BTreeMap<CountyFips, f64>) -> Self {
        self.statistics = Some(statistics);
        self
    }

    /// Resolves one attribute of `county`.
    ///
    /// `on` is the observation date when the lookup is made on behalf of a
    /// dated row; it is required for [`AttributeKind::AffectedOnDate`].
    ///
    /// # Errors
    ///
    /// * [`ExposureError::MissingExposure`] for an affected-day count of a
    ///   county without a hurricane record.
    /// * [`ExposureError::MissingDailyExposure`] when the day-level table has
    ///   no cell for the county and date.
    /// * [`ExposureError::MissingStatistic`] when no statistic was attached
    ///   for the county.
    /// * [`ExposureError::MissingDate`] for a day-level lookup without a
    ///   date.
    ///
    /// A missing evacuation record is not an error.
    pub fn resolve(
        &self,
        county: CountyFips,
        kind: AttributeKind,
        on: Option<NaiveDate>,
    ) -> Result<AttributeValue, ExposureError> {
        if let Some(date) = on
            && !self.validity.contains(date)
        {
            return Ok(AttributeValue::NotApplicable);
        }

        match kind {
            AttributeKind::AffectedDayCount => self
                .tables
                .affected_days(county)
                .map(AttributeValue::AffectedDays),
            AttributeKind::EvacuationOrder => Ok(AttributeValue::Evacuation(
                self.tables.evacuation_order(county).to_string(),
            )),
            AttributeKind::AffectedOnDate => {
                let date = on.ok_or(ExposureError::MissingDate { kind })?;
                self.tables
                    .affected_on(county, date)
                    .map(AttributeValue::Affected)
            }
            AttributeKind::TTestStatistic => self
                .statistics
                .and_then(|stats| stats.get(&county))
                .copied()
                .map(AttributeValue::Statistic)
                .ok_or(ExposureError::MissingStatistic { county }),
        }
    }
}
