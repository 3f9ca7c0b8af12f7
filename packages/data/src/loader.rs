//! Incident CSV parsing.
//!
//! Reads the Montreal `actes-criminels.csv` export and converts each row
//! into an [`IncidentRecord`]. Blank or malformed numeric cells become
//! `None`; rows whose date can't be parsed are skipped.

use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use crime_dashboard_crime_models::{CrimeCategory, TimeOfDay};
use crime_dashboard_data_models::IncidentRecord;
use serde::Deserialize;

use crate::DataError;

/// Columns that must be present in the header row.
const REQUIRED_COLUMNS: &[&str] = &["CATEGORIE", "DATE", "LONGITUDE", "LATITUDE"];

/// One row of the source CSV, as written by the city.
#[derive(Debug, Deserialize)]
struct RawIncidentRow {
    #[serde(rename = "CATEGORIE")]
    category: String,
    #[serde(rename = "DATE")]
    date: String,
    #[serde(rename = "QUART", default)]
    shift: Option<String>,
    #[serde(rename = "PDQ", default)]
    pdq: Option<String>,
    #[serde(rename = "LONGITUDE", deserialize_with = "csv::invalid_option")]
    longitude: Option<f64>,
    #[serde(rename = "LATITUDE", deserialize_with = "csv::invalid_option")]
    latitude: Option<f64>,
}

/// Loads all incidents from the CSV file at `path`.
///
/// # Errors
///
/// Returns [`DataError`] if the file can't be opened, isn't valid CSV, or
/// lacks a required column.
pub fn load_incidents(path: &Path) -> Result<Vec<IncidentRecord>, DataError> {
    log::info!("Loading incidents from {}", path.display());
    let file = std::fs::File::open(path)?;
    let records = read_incidents(file)?;
    log::info!("Loaded {} incidents", records.len());
    Ok(records)
}

/// Parses incidents from any CSV reader.
///
/// # Errors
///
/// Returns [`DataError`] if the input isn't valid CSV or lacks a required
/// column.
pub fn read_incidents<R: Read>(input: R) -> Result<Vec<IncidentRecord>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == *column) {
            return Err(DataError::MissingColumn {
                column: (*column).to_string(),
            });
        }
    }

    let mut records = Vec::new();
    let mut skipped = 0_usize;

    for row in reader.deserialize::<RawIncidentRow>() {
        let row = row?;
        match to_record(row) {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        log::warn!("Skipped {skipped} rows with an unparseable date");
    }

    Ok(records)
}

fn to_record(row: RawIncidentRow) -> Option<IncidentRecord> {
    let date = parse_date(&row.date)?;
    Some(IncidentRecord {
        date,
        category: CrimeCategory::from_raw_label(&row.category),
        time_of_day: row.shift.as_deref().and_then(TimeOfDay::from_shift),
        pdq: row.pdq.as_deref().and_then(parse_pdq),
        longitude: row.longitude,
        latitude: row.latitude,
    })
}

/// Parses the leading `YYYY-MM-DD` of a date or datetime cell.
fn parse_date(s: &str) -> Option<NaiveDate> {
    let day = s.get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

/// Parses a station number written either as `38` or `38.0`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn parse_pdq(s: &str) -> Option<u16> {
    let s = s.trim();
    if let Ok(n) = s.parse::<u16>() {
        return Some(n);
    }
    let f = s.parse::<f64>().ok()?;
    if f.fract() == 0.0 && (0.0..=f64::from(u16::MAX)).contains(&f) {
        return Some(f as u16);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
CATEGORIE,DATE,QUART,PDQ,X,Y,LONGITUDE,LATITUDE
Méfait,2018-09-13,jour,30.0,294904.16,5047548.14,-73.626778,45.567780
Vols qualifiés,2019-04-30 00:00:00,soir,38,,,-73.579,45.523
Introduction,not-a-date,nuit,21,,,-73.56,45.50
Vol de véhicule à moteur,2020-01-05,nuit,,,,,
";

    #[test]
    fn parses_sample_rows() {
        let records = read_incidents(SAMPLE.as_bytes()).unwrap();
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].category, CrimeCategory::Mischief);
        assert_eq!(records[0].pdq, Some(30));
        assert_eq!(records[0].time_of_day, Some(TimeOfDay::Day));
        assert_eq!(records[0].year(), 2018);

        assert_eq!(records[1].category, CrimeCategory::Robbery);
        assert_eq!(records[1].pdq, Some(38));
        assert_eq!(records[1].time_of_day, Some(TimeOfDay::Evening));

        assert_eq!(records[2].category, CrimeCategory::MotorVehicleTheft);
        assert_eq!(records[2].pdq, None);
        assert_eq!(records[2].coordinates(), None);
    }

    #[test]
    fn missing_coordinate_column_is_an_error() {
        let csv = "CATEGORIE,DATE,LONGITUDE\nMéfait,2018-09-13,-73.6\n";
        let err = read_incidents(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { column } if column == "LATITUDE"));
    }

    #[test]
    fn pdq_parsing() {
        assert_eq!(parse_pdq("38"), Some(38));
        assert_eq!(parse_pdq("38.0"), Some(38));
        assert_eq!(parse_pdq("38.5"), None);
        assert_eq!(parse_pdq(""), None);
        assert_eq!(parse_pdq("-1"), None);
    }

    #[test]
    fn loading_missing_file_fails() {
        let err = load_incidents(Path::new("/nonexistent/actes-criminels.csv")).unwrap_err();
        assert!(matches!(err, DataError::Io(_)));
    }
}
