// Analysis module
//
// Computations over a parsed SeriesTable:
// - rate: day-over-day change of the mean displacement and its peak
// - statistics: descriptive statistics per numeric column

pub mod rate;
pub mod statistics;

pub use rate::{daily_rates, find_peak_rate, peak_of, PeakRate, RateSample};
pub use statistics::{summarize, ColumnStatistics, StatisticsTable};
