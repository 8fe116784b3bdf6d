use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, instrument};
use utoipa::ToSchema;

use crate::analysis_error::AnalysisError;
use crate::series::SeriesTable;

/// Rate of change of the mean displacement between two consecutive usable rows
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RateSample {
    pub date: NaiveDate,
    pub previous_date: NaiveDate,
    /// Mean displacement across all control points on `date`, in cm
    pub mean_displacement_cm: f64,
    /// Signed change per day, in cm/day
    pub rate_cm_per_day: f64,
}

/// Date with the highest mean daily displacement rate
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PeakRate {
    pub date: NaiveDate,
    pub previous_date: NaiveDate,
    pub rate_cm_per_day: f64,
}

impl From<&RateSample> for PeakRate {
    fn from(sample: &RateSample) -> Self {
        Self {
            date: sample.date,
            previous_date: sample.previous_date,
            rate_cm_per_day: sample.rate_cm_per_day,
        }
    }
}

/// Compute the rate for every adjacent pair of rows with a defined mean
///
/// Rows where every displacement is missing are dropped before pairing.
/// Pairs that share a date, or whose rate overflows `f64`, have no defined
/// rate and are skipped.
pub fn daily_rates(table: &SeriesTable) -> Vec<RateSample> {
    let means: Vec<(NaiveDate, f64)> = table
        .records()
        .iter()
        .filter_map(|record| record.mean_displacement().map(|mean| (record.date, mean)))
        .collect();

    means
        .windows(2)
        .filter_map(|pair| {
            let (previous_date, previous_mean) = pair[0];
            let (date, mean) = pair[1];
            let days = date.signed_duration_since(previous_date).num_days();

            if days == 0 {
                debug!("Skipping pair with zero day delta on {}", date);
                return None;
            }

            let rate = (mean - previous_mean) / days as f64;
            if !rate.is_finite() {
                debug!("Skipping non-finite rate on {}", date);
                return None;
            }

            Some(RateSample {
                date,
                previous_date,
                mean_displacement_cm: mean,
                rate_cm_per_day: rate,
            })
        })
        .collect()
}

/// Highest rate among already computed samples, earliest date on ties
pub fn peak_of(rates: &[RateSample]) -> Option<PeakRate> {
    rates
        .iter()
        .reduce(|current, sample| {
            if sample.rate_cm_per_day.total_cmp(&current.rate_cm_per_day) == Ordering::Greater {
                sample
            } else {
                current
            }
        })
        .map(PeakRate::from)
}

/// Find the date of maximum mean daily displacement rate
///
/// Ties go to the earliest date. Fails with `NoRateComputable` when no pair
/// of rows yields a rate.
#[instrument(skip(table), fields(rows = table.len()))]
pub fn find_peak_rate(table: &SeriesTable) -> Result<PeakRate, AnalysisError> {
    let rates = daily_rates(table);
    let peak = peak_of(&rates).ok_or(AnalysisError::NoRateComputable)?;

    info!(
        "Peak mean displacement rate {:.3} cm/day on {} ({} rates computed)",
        peak.rate_cm_per_day,
        peak.date,
        rates.len()
    );

    Ok(peak)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::Record;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn table(rows: Vec<(NaiveDate, Vec<Option<f64>>)>) -> SeriesTable {
        let width = rows.first().map(|(_, v)| v.len()).unwrap_or(1);
        let series_ids = (0..width).map(|i| format!("{}", 100 + i)).collect();
        let records = rows
            .into_iter()
            .map(|(date, displacements)| Record {
                date,
                displacements,
                rainfall_mm: None,
            })
            .collect();
        SeriesTable::new("fecha".to_string(), series_ids, None, records)
    }

    #[test]
    fn test_single_pair_rate() {
        let t = table(vec![
            (date(2020, 1, 1), vec![Some(1.0)]),
            (date(2020, 1, 2), vec![Some(3.0)]),
        ]);
        let peak = find_peak_rate(&t).unwrap();
        assert_eq!(peak.date, date(2020, 1, 2));
        assert_eq!(peak.previous_date, date(2020, 1, 1));
        assert!((peak.rate_cm_per_day - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_rate_divides_by_day_gap() {
        let t = table(vec![
            (date(2020, 1, 1), vec![Some(0.0)]),
            (date(2020, 1, 11), vec![Some(5.0)]),
        ]);
        let rates = daily_rates(&t);
        assert_eq!(rates.len(), 1);
        assert!((rates[0].rate_cm_per_day - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_rate_of_cross_series_mean() {
        // means: 2.0 then 4.0, one missing value on day 2 is excluded
        let t = table(vec![
            (date(2020, 1, 1), vec![Some(1.0), Some(3.0)]),
            (date(2020, 1, 3), vec![Some(4.0), None]),
        ]);
        let rates = daily_rates(&t);
        assert!((rates[0].mean_displacement_cm - 4.0).abs() < 1e-12);
        assert!((rates[0].rate_cm_per_day - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rows_without_values_are_excluded() {
        let t = table(vec![
            (date(2020, 1, 1), vec![Some(1.0)]),
            (date(2020, 1, 2), vec![None]),
            (date(2020, 1, 3), vec![Some(5.0)]),
        ]);
        let rates = daily_rates(&t);
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].previous_date, date(2020, 1, 1));
        assert!((rates[0].rate_cm_per_day - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_day_delta_skipped() {
        let t = table(vec![
            (date(2020, 1, 1), vec![Some(1.0)]),
            (date(2020, 1, 1), vec![Some(9.0)]),
            (date(2020, 1, 2), vec![Some(10.0)]),
        ]);
        let rates = daily_rates(&t);
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].date, date(2020, 1, 2));
        assert!((rates[0].rate_cm_per_day - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_tie_goes_to_earliest_date() {
        let t = table(vec![
            (date(2020, 1, 1), vec![Some(0.0)]),
            (date(2020, 1, 2), vec![Some(1.0)]),
            (date(2020, 1, 3), vec![Some(1.5)]),
            (date(2020, 1, 4), vec![Some(2.5)]),
        ]);
        let peak = find_peak_rate(&t).unwrap();
        assert_eq!(peak.date, date(2020, 1, 2));
    }

    #[test]
    fn test_negative_rates_are_kept() {
        let t = table(vec![
            (date(2020, 1, 1), vec![Some(5.0)]),
            (date(2020, 1, 2), vec![Some(3.0)]),
            (date(2020, 1, 3), vec![Some(2.0)]),
        ]);
        let peak = find_peak_rate(&t).unwrap();
        assert_eq!(peak.date, date(2020, 1, 3));
        assert!((peak.rate_cm_per_day + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_peak_is_maximum_of_all_rates() {
        let t = table(vec![
            (date(2020, 1, 1), vec![Some(0.0), Some(0.0)]),
            (date(2020, 1, 5), vec![Some(2.0), Some(1.0)]),
            (date(2020, 1, 6), vec![Some(4.0), Some(2.0)]),
            (date(2020, 2, 1), vec![Some(1.0), Some(1.0)]),
        ]);
        let peak = find_peak_rate(&t).unwrap();
        for sample in daily_rates(&t) {
            assert!(peak.rate_cm_per_day >= sample.rate_cm_per_day);
        }
        assert_eq!(peak.date, date(2020, 1, 6));
    }

    #[test]
    fn test_single_row_has_no_rate() {
        let t = table(vec![(date(2020, 1, 1), vec![Some(1.0)])]);
        assert!(matches!(
            find_peak_rate(&t),
            Err(AnalysisError::NoRateComputable)
        ));
    }

    #[test]
    fn test_same_day_rows_have_no_rate() {
        let t = table(vec![
            (date(2020, 1, 1), vec![Some(1.0)]),
            (date(2020, 1, 1), vec![Some(2.0)]),
        ]);
        assert!(matches!(
            find_peak_rate(&t),
            Err(AnalysisError::NoRateComputable)
        ));
    }

    #[test]
    fn test_near_max_values_give_finite_peak() {
        let t = table(vec![
            (date(2020, 1, 1), vec![Some(0.0), Some(0.0)]),
            (date(2020, 1, 2), vec![Some(1e308), Some(1e308)]),
            (date(2020, 1, 3), vec![Some(1e308), Some(1e308)]),
        ]);
        let rates = daily_rates(&t);
        assert_eq!(rates.len(), 2);
        assert!(rates.iter().all(|r| r.rate_cm_per_day.is_finite()));
        assert_eq!(rates[0].rate_cm_per_day, 1e308);
        assert_eq!(rates[1].rate_cm_per_day, 0.0);

        let peak = find_peak_rate(&t).unwrap();
        assert_eq!(peak.date, date(2020, 1, 2));
        assert_eq!(peak.rate_cm_per_day, 1e308);
    }

    #[test]
    fn test_overflowing_rate_is_skipped() {
        let t = table(vec![
            (date(2020, 1, 1), vec![Some(-1e308)]),
            (date(2020, 1, 2), vec![Some(1e308)]),
            (date(2020, 1, 3), vec![Some(1e308)]),
        ]);
        let rates = daily_rates(&t);
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].date, date(2020, 1, 3));

        let peak = find_peak_rate(&t).unwrap();
        assert_eq!(peak.rate_cm_per_day, 0.0);
    }

    #[test]
    fn test_peak_of_samples() {
        let sample = |day, rate| RateSample {
            date: date(2020, 1, day),
            previous_date: date(2020, 1, day - 1),
            mean_displacement_cm: 0.0,
            rate_cm_per_day: rate,
        };

        assert_eq!(peak_of(&[]), None);

        let peak = peak_of(&[sample(2, 1.0), sample(3, 4.0), sample(4, 4.0), sample(5, -2.0)])
            .unwrap();
        assert_eq!(peak.date, date(2020, 1, 3));
        assert_eq!(peak.rate_cm_per_day, 4.0);
    }
}
