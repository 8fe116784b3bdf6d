// Shared fixtures for integration tests
#![allow(dead_code)]

use displacement_tracker_service::services::AnalysisService;

/// Two days, one control point, rainfall present
pub const TWO_DAY_CSV: &str = "fecha,54218,rainfall(mm)\n2020-01-01,1.0,5\n2020-01-02,3.0,10\n";

/// Non-numeric cell in the second data row of column 54218
pub const MALFORMED_CELL_CSV: &str = "fecha,54218,rainfall(mm)\n2020-01-01,1.0,5\n2020-01-02,abc,10\n";

pub const MISSING_DATE_CSV: &str = "date,54218,rainfall(mm)\n2020-01-01,1.0,5\n";

pub const DUPLICATE_RAINFALL_CSV: &str =
    "fecha,54218,rainfall(mm),rainfall(mm)\n2020-01-01,1.0,5,6\n";

pub const SINGLE_ROW_CSV: &str = "fecha,54218,rainfall(mm)\n2020-01-01,1.0,5\n";

pub const SAMPLE_FILE: &str = include_str!("../sample-data-files/displacement_rainfall.csv");

pub fn service() -> AnalysisService {
    AnalysisService::default()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
