//! Descriptive statistics per numeric column
//!
//! Mirrors a dataframe `describe()`: count, mean, sample standard deviation,
//! min, quartiles and max. Missing values are excluded. Values that are not
//! defined for the column (a mean of nothing, a deviation from one value) are
//! `None` rather than zero.

use serde::Serialize;
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::series::SeriesTable;
use crate::utils::normalize_zero;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ColumnStatistics {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation (N - 1); undefined below two values
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub p25: Option<f64>,
    pub median: Option<f64>,
    pub p75: Option<f64>,
    pub max: Option<f64>,
}

/// Statistics for every numeric column, in table order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StatisticsTable {
    columns: Vec<ColumnStatistics>,
}

impl StatisticsTable {
    pub fn get(&self, column: &str) -> Option<&ColumnStatistics> {
        self.columns.iter().find(|stats| stats.column == column)
    }

    pub fn columns(&self) -> &[ColumnStatistics] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<ColumnStatistics> {
        self.columns
    }
}

/// Running mean/variance/min/max using Welford's algorithm
#[derive(Debug, Clone)]
struct RunningMoments {
    count: usize,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningMoments {
    fn new() -> Self {
        Self {
            count: 0,
            mean: 0.0,
            m2: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    fn add(&mut self, value: f64) {
        self.count += 1;
        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }

    fn sample_stddev(&self) -> Option<f64> {
        (self.count > 1).then(|| (self.m2 / (self.count - 1) as f64).sqrt())
    }

    fn min(&self) -> Option<f64> {
        (self.count > 0).then_some(self.min)
    }

    fn max(&self) -> Option<f64> {
        (self.count > 0).then_some(self.max)
    }
}

/// Linear-interpolated percentile over sorted values, `p` in [0, 100]
fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        Some(sorted[lower])
    } else {
        let frac = rank - lower as f64;
        Some(sorted[lower] * (1.0 - frac) + sorted[upper] * frac)
    }
}

/// Describe one column of optional values
pub fn describe(column: &str, values: &[Option<f64>]) -> ColumnStatistics {
    let mut present: Vec<f64> = values.iter().flatten().copied().collect();

    let mut moments = RunningMoments::new();
    for &value in &present {
        moments.add(value);
    }

    present.sort_by(|a, b| a.total_cmp(b));

    ColumnStatistics {
        column: column.to_string(),
        count: moments.count,
        mean: moments.mean().map(normalize_zero),
        std: moments.sample_stddev(),
        min: moments.min(),
        p25: percentile(&present, 25.0),
        median: percentile(&present, 50.0),
        p75: percentile(&present, 75.0),
        max: moments.max(),
    }
}

/// Describe every numeric column of the table (displacement series, then rainfall)
#[instrument(skip(table), fields(rows = table.len()))]
pub fn summarize(table: &SeriesTable) -> StatisticsTable {
    let columns: Vec<ColumnStatistics> = table
        .numeric_columns()
        .iter()
        .map(|column| describe(&column.id, &column.values))
        .collect();

    debug!("Computed statistics for {} columns", columns.len());

    StatisticsTable { columns }
}
