//! CSV readers for the pipeline inputs.
//!
//! Every reader takes any [`Read`] so tests can feed in-memory strings; the
//! `*_from_path` helpers open files. Panel rows outside the configured study
//! states are dropped here, and derived panel columns (total trips,
//! out-of-county and out-of-state trips per person, weekday flag) are
//! computed once on load.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{Datelike, NaiveDate, Weekday};
use hurricane_impact_exposure_models::{
    CountyFips, CountyGeometry, EvacuationRecord, HurricaneDay, HurricaneExposure, Observation,
};
use serde::Deserialize;

use crate::geometry::boundary_centroid;
use crate::{ExposureError, IngestOptions};

/// One row of the mobility panel as it appears on disk.
#[derive(Debug, Deserialize)]
struct PanelRow {
    #[serde(rename = "CTFIPS")]
    county: u32,
    #[serde(rename = "CTNAME")]
    county_name: String,
    #[serde(rename = "STFIPS")]
    state_id: u32,
    date: String,
    #[serde(rename = "Trips/person")]
    trips_per_person: Option<f64>,
    #[serde(rename = "Population")]
    population: Option<f64>,
    #[serde(rename = "% out-of-county trips")]
    pct_out_of_county: Option<f64>,
    #[serde(rename = "% out-of-state trips")]
    pct_out_of_state: Option<f64>,
    #[serde(rename = "Miles/person")]
    miles_per_person: Option<f64>,
    #[serde(rename = "% working from home")]
    pct_working_from_home: Option<f64>,
    #[serde(rename = "New cases/1000 people")]
    new_cases_per_1000: Option<f64>,
    #[serde(rename = "Active cases/1000 people")]
    active_cases_per_1000: Option<f64>,
    #[serde(rename = "Tests done/1000 people")]
    tests_per_1000: Option<f64>,
}

impl PanelRow {
    fn into_observation(self, date: NaiveDate) -> Observation {
        let nan = |v: Option<f64>| v.unwrap_or(f64::NAN);
        let trips_per_person = nan(self.trips_per_person);

        Observation {
            county: CountyFips(self.county),
            county_name: self.county_name,
            state_id: self.state_id,
            date,
            date_label: self.date,
            is_weekday: is_weekday(date),
            trips_per_person,
            trips_total: trips_per_person * nan(self.population),
            out_of_county_trips_per_person: trips_per_person * nan(self.pct_out_of_county) / 100.0,
            out_of_state_trips_per_person: trips_per_person * nan(self.pct_out_of_state) / 100.0,
            miles_per_person: nan(self.miles_per_person),
            pct_working_from_home: nan(self.pct_working_from_home),
            new_cases_per_1000: nan(self.new_cases_per_1000),
            active_cases_per_1000: nan(self.active_cases_per_1000),
            tests_per_1000: nan(self.tests_per_1000),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EvacuationRow {
    #[serde(rename = "CTFIPS")]
    county: u32,
    #[serde(rename = "ORDER")]
    order: String,
}

#[derive(Debug, Deserialize)]
struct CountyRow {
    #[serde(rename = "GEOID")]
    geoid: String,
    #[serde(rename = "NAME", default)]
    name: String,
    geometry: String,
}

/// Monday through Friday. No holiday calendar is applied.
#[must_use]
pub fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Reads the county-day mobility panel.
///
/// Rows are returned sorted by county and date.
///
/// # Errors
///
/// Returns [`ExposureError`] if the CSV is malformed or a date does not
/// match the configured format.
pub fn read_panel<R: Read>(
    reader: R,
    options: &IngestOptions,
) -> Result<Vec<Observation>, ExposureError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut panel = Vec::new();
    let mut skipped: u64 = 0;

    for result in csv_reader.deserialize::<PanelRow>() {
        let row = result?;
        if !options.keeps_state(row.state_id) {
            skipped += 1;
            continue;
        }
        let date = options.parse_date(&row.date)?;
        panel.push(row.into_observation(date));
    }

    panel.sort_by(|a, b| (a.county, a.date).cmp(&(b.county, b.date)));

    log::info!(
        "Loaded {} panel rows ({skipped} outside the study states)",
        panel.len()
    );
    Ok(panel)
}

/// Reads the wide hurricane exposure table.
///
/// Expects `CTFIPS` and `CTNAME` columns; every other non-empty header must
/// be a date in the configured format whose cells are day-level affected
/// flags (any positive number counts as affected, empty as unaffected).
///
/// # Errors
///
/// Returns [`ExposureError`] if a required column is missing, a header is
/// not a date, or a cell is not numeric.
pub fn read_hurricane<R: Read>(
    reader: R,
    options: &IngestOptions,
) -> Result<Vec<HurricaneExposure>, ExposureError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader.headers()?.clone();
    let county_idx = column_index(&headers, "CTFIPS", "hurricane")?;
    let name_idx = column_index(&headers, "CTNAME", "hurricane")?;

    let mut day_columns = Vec::new();
    for (i, header) in headers.iter().enumerate() {
        if i == county_idx || i == name_idx || header.is_empty() {
            continue;
        }
        day_columns.push((i, options.parse_date(header)?, header.to_string()));
    }

    let mut exposures = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        let county = parse_county(record.get(county_idx).unwrap_or(""))?;
        let county_name = record.get(name_idx).unwrap_or("").to_string();

        let mut daily = Vec::with_capacity(day_columns.len());
        for (i, date, label) in &day_columns {
            let cell = record.get(*i).unwrap_or("");
            daily.push(HurricaneDay {
                date: *date,
                label: label.clone(),
                affected: parse_flag(cell, label)?,
            });
        }
        daily.sort_by_key(|day| day.date);

        let affected_days = u32::try_from(daily.iter().filter(|day| day.affected).count())
            .unwrap_or(u32::MAX);

        exposures.push(HurricaneExposure {
            county,
            county_name,
            daily,
            affected_days,
        });
    }

    log::info!(
        "Loaded hurricane exposure for {} counties over {} days",
        exposures.len(),
        day_columns.len()
    );
    Ok(exposures)
}

/// Reads evacuation orders (`CTFIPS`, `ORDER`).
///
/// # Errors
///
/// Returns [`ExposureError`] if the CSV is malformed.
pub fn read_evacuations<R: Read>(reader: R) -> Result<Vec<EvacuationRecord>, ExposureError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in csv_reader.deserialize::<EvacuationRow>() {
        let row = result?;
        records.push(EvacuationRecord {
            county: CountyFips(row.county),
            order: row.order,
        });
    }

    log::info!("Loaded {} evacuation records", records.len());
    Ok(records)
}

/// Reads county boundaries (`GEOID`, optional `NAME`, `geometry` as
/// `GeoJSON`) and computes their centroids.
///
/// Rows whose geometry cannot be parsed are skipped with a warning.
///
/// # Errors
///
/// Returns [`ExposureError`] if the CSV is malformed or a GEOID is not
/// numeric.
pub fn read_counties<R: Read>(reader: R) -> Result<Vec<CountyGeometry>, ExposureError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut counties = Vec::new();
    for result in csv_reader.deserialize::<CountyRow>() {
        let row = result?;
        let county = parse_county(&row.geoid)?;

        let Some((centroid_x, centroid_y)) = boundary_centroid(&row.geometry) else {
            log::warn!("Failed to parse GeoJSON boundary for county {county}");
            continue;
        };

        counties.push(CountyGeometry {
            county,
            name: row.name,
            geometry: row.geometry,
            centroid_x,
            centroid_y,
        });
    }

    log::info!("Loaded {} county boundaries", counties.len());
    Ok(counties)
}

/// Opens and reads the panel CSV at `path`.
///
/// # Errors
///
/// See [`read_panel`].
pub fn read_panel_from_path(
    path: &Path,
    options: &IngestOptions,
) -> Result<Vec<Observation>, ExposureError> {
    log::info!("Reading panel from {}", path.display());
    read_panel(File::open(path)?, options)
}

/// Opens and reads the hurricane CSV at `path`.
///
/// # Errors
///
/// See [`read_hurricane`].
pub fn read_hurricane_from_path(
    path: &Path,
    options: &IngestOptions,
) -> Result<Vec<HurricaneExposure>, ExposureError> {
    log::info!("Reading hurricane exposure from {}", path.display());
    read_hurricane(File::open(path)?, options)
}

/// Opens and reads the evacuation CSV at `path`.
///
/// # Errors
///
/// See [`read_evacuations`].
pub fn read_evacuations_from_path(path: &Path) -> Result<Vec<EvacuationRecord>, ExposureError> {
    log::info!("Reading evacuation orders from {}", path.display());
    read_evacuations(File::open(path)?)
}

/// Opens and reads the county boundary CSV at `path`.
///
/// # Errors
///
/// See [`read_counties`].
pub fn read_counties_from_path(path: &Path) -> Result<Vec<CountyGeometry>, ExposureError> {
    log::info!("Reading county boundaries from {}", path.display());
    read_counties(File::open(path)?)
}

fn column_index(
    headers: &csv::StringRecord,
    column: &str,
    file: &'static str,
) -> Result<usize, ExposureError> {
    headers
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| ExposureError::MissingColumn {
            column: column.to_string(),
            file,
        })
}

/// Parses a county identifier, tolerating float renderings like `"22001.0"`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_county(value: &str) -> Result<CountyFips, ExposureError> {
    let trimmed = value.trim();
    if let Ok(id) = trimmed.parse::<u32>() {
        return Ok(CountyFips(id));
    }
    match trimmed.parse::<f64>() {
        Ok(id) if id >= 0.0 && id.fract() == 0.0 && id <= f64::from(u32::MAX) => {
            Ok(CountyFips(id as u32))
        }
        _ => Err(ExposureError::InvalidValue {
            column: "CTFIPS".to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_flag(value: &str, column: &str) -> Result<bool, ExposureError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(false);
    }
    trimmed
        .parse::<f64>()
        .map(|v| v > 0.0)
        .map_err(|_| ExposureError::InvalidValue {
            column: column.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PANEL: &str = "\
CTFIPS,CTNAME,STFIPS,date,Trips/person,Population,% out-of-county trips,% out-of-state trips,Miles/person,% working from home,New cases/1000 people,Active cases/1000 people,Tests done/1000 people
22001,Acadia Parish,22,8/24/2020,3.0,1000,10,2,30.5,12,0.4,5.1,2.0
22001,Acadia Parish,22,8/23/2020,2.0,1000,50,,28.0,11,0.3,5.0,1.9
6001,Alameda County,6,8/24/2020,3.5,2000,20,1,20.0,30,0.1,1.0,3.0
";

    fn options(states: &[u32]) -> IngestOptions {
        IngestOptions {
            study_states: states.iter().copied().collect(),
            ..IngestOptions::default()
        }
    }

    #[test]
    fn reads_panel_with_derived_columns() {
        let panel = read_panel(PANEL.as_bytes(), &options(&[22])).unwrap();
        assert_eq!(panel.len(), 2);

        // Sorted by date within the county.
        let sunday = &panel[0];
        assert_eq!(sunday.date.to_string(), "2020-08-23");
        assert!(!sunday.is_weekday);
        assert!((sunday.trips_total - 2000.0).abs() < 1e-9);
        assert!((sunday.out_of_county_trips_per_person - 1.0).abs() < 1e-9);
        assert!(sunday.out_of_state_trips_per_person.is_nan());

        let monday = &panel[1];
        assert!(monday.is_weekday);
        assert_eq!(monday.date_label, "8/24/2020");
        assert!((monday.out_of_state_trips_per_person - 0.06).abs() < 1e-9);
    }

    #[test]
    fn empty_study_states_keep_all_rows() {
        let panel = read_panel(PANEL.as_bytes(), &IngestOptions::default()).unwrap();
        assert_eq!(panel.len(), 3);
        assert_eq!(panel[0].county, CountyFips(6001));
    }

    #[test]
    fn malformed_panel_date_is_fatal() {
        let csv = PANEL.replace("8/24/2020", "2020-08-24");
        let err = read_panel(csv.as_bytes(), &IngestOptions::default()).unwrap_err();
        assert!(matches!(err, ExposureError::InvalidDate { .. }));
    }

    #[test]
    fn reads_wide_hurricane_table() {
        let csv = "\
CTFIPS,CTNAME,8/23/2020,8/24/2020,8/25/2020
22001,Acadia Parish,0,1,1
48001,Anderson County,0,0,
";
        let exposures = read_hurricane(csv.as_bytes(), &IngestOptions::default()).unwrap();
        assert_eq!(exposures.len(), 2);
        assert_eq!(exposures[0].affected_days, 2);
        assert_eq!(exposures[0].daily.len(), 3);
        assert!(exposures[0].daily[1].affected);
        assert_eq!(exposures[0].daily[1].label, "8/24/2020");
        assert_eq!(exposures[1].affected_days, 0);
    }

    #[test]
    fn day_keys_follow_the_hurricane_header() {
        let csv = "CTFIPS,CTNAME,8/23/2020,8/24/2020\n22001,Acadia Parish,0,1\n";
        let options = IngestOptions::default();
        let exposures = read_hurricane(csv.as_bytes(), &options).unwrap();
        let tables =
            crate::ExposureTables::build(exposures, Vec::new(), Vec::new(), &options.date_format);

        let monday = NaiveDate::from_ymd_opt(2020, 8, 24).unwrap();
        assert_eq!(tables.key(CountyFips(22001), monday), "22001_8/24/2020");
        assert!(tables.affected_on(CountyFips(22001), monday).unwrap());
    }

    #[test]
    fn hurricane_table_requires_county_column() {
        let csv = "FIPS,CTNAME,8/23/2020\n22001,Acadia,1\n";
        let err = read_hurricane(csv.as_bytes(), &IngestOptions::default()).unwrap_err();
        assert!(matches!(err, ExposureError::MissingColumn { .. }));
    }

    #[test]
    fn reads_evacuations() {
        let csv = "CTFIPS,ORDER\n22001,Mandatory\n22019,Voluntary\n";
        let records = read_evacuations(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].county, CountyFips(22019));
        assert_eq!(records[1].order, "Voluntary");
    }

    #[test]
    fn reads_counties_and_skips_bad_geometry() {
        let csv = "\
GEOID,NAME,geometry
22001,Acadia,\"{\"\"type\"\":\"\"Polygon\"\",\"\"coordinates\"\":[[[0,0],[2,0],[2,2],[0,2],[0,0]]]}\"
22003,Allen,not geojson
";
        let counties = read_counties(csv.as_bytes()).unwrap();
        assert_eq!(counties.len(), 1);
        assert_eq!(counties[0].county, CountyFips(22001));
        assert!((counties[0].centroid_x - 1.0).abs() < 1e-12);
    }

    #[test]
    fn parses_float_county_ids() {
        assert_eq!(parse_county("22001.0").unwrap(), CountyFips(22001));
        assert!(parse_county("22001.5").is_err());
        assert!(parse_county("abc").is_err());
    }
}
