//! Shared utility functions for the displacement tracker service

use chrono::NaiveDate;

/// Date formats accepted in the date column, tried in order
const DATE_FORMATS: [&str; 2] = ["%d/%m/%Y", "%Y-%m-%d"];

/// Tokens treated as a missing measurement (compared case-insensitively)
const MISSING_MARKERS: [&str; 5] = ["", "na", "n/a", "nan", "null"];

/// Parse an observation date in either day-first slash or ISO hyphen form
///
/// Field surveys are usually exported as `DD/MM/YYYY`, while files that went
/// through a spreadsheet or dataframe round trip come back as `YYYY-MM-DD`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use displacement_tracker_service::utils::parse_observation_date;
///
/// let expected = NaiveDate::from_ymd_opt(2021, 3, 15).unwrap();
/// assert_eq!(parse_observation_date("15/03/2021"), Some(expected));
/// assert_eq!(parse_observation_date("2021-03-15"), Some(expected));
/// assert_eq!(parse_observation_date("03-15-2021"), None);
/// ```
pub fn parse_observation_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

/// Whether a cell holds one of the missing-value markers
pub fn is_missing_marker(value: &str) -> bool {
    let trimmed = value.trim();
    MISSING_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

/// Parse a numeric cell, mapping missing markers (and a literal NaN) to `None`
///
/// # Examples
///
/// ```
/// use displacement_tracker_service::utils::parse_measurement;
///
/// assert_eq!(parse_measurement("-1.25").unwrap(), Some(-1.25));
/// assert_eq!(parse_measurement("").unwrap(), None);
/// assert_eq!(parse_measurement("NA").unwrap(), None);
/// assert!(parse_measurement("abc").is_err());
/// ```
pub fn parse_measurement(value: &str) -> Result<Option<f64>, &'static str> {
    if is_missing_marker(value) {
        return Ok(None);
    }

    let parsed = value
        .trim()
        .parse::<f64>()
        .map_err(|_| "Not a floating point number")?;

    if parsed.is_nan() {
        Ok(None)
    } else if parsed.is_infinite() {
        Err("Infinite values are not measurements")
    } else {
        Ok(Some(parsed))
    }
}

/// Normalize -0.0 to 0.0 for cleaner API responses
pub fn normalize_zero(value: f64) -> f64 {
    if value == 0.0 {
        0.0 // Converts both 0.0 and -0.0 to 0.0
    } else {
        value
    }
}
