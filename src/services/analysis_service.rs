use serde::Serialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::analysis::{daily_rates, peak_of, summarize, ColumnStatistics, PeakRate, RateSample};
use crate::analysis_error::AnalysisError;
use crate::config::Config;
use crate::series::{ChartData, ColumnNaming, CsvParser, Record, SeriesTable};

pub const DEFAULT_PREVIEW_ROWS: usize = 5;

/// Everything the presentation layer needs for one upload
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnalysisReport {
    pub date_column: String,
    pub series_ids: Vec<String>,
    pub rainfall_column: Option<String>,
    pub row_count: usize,
    pub chart: ChartData,
    /// Absent when fewer than two usable rows exist
    pub peak_rate: Option<PeakRate>,
    pub rates: Vec<RateSample>,
    pub statistics: Vec<ColumnStatistics>,
    pub preview: Vec<Record>,
}

/// Runs the parse -> classify -> analyze -> summarize pipeline
///
/// Holds only immutable settings, so one instance can be shared across
/// requests; every call builds and drops its own table.
#[derive(Debug, Clone)]
pub struct AnalysisService {
    parser: CsvParser,
    preview_rows: usize,
}

impl Default for AnalysisService {
    fn default() -> Self {
        Self::new(ColumnNaming::default(), DEFAULT_PREVIEW_ROWS)
    }
}

impl AnalysisService {
    pub fn new(naming: ColumnNaming, preview_rows: usize) -> Self {
        Self {
            parser: CsvParser::new(naming),
            preview_rows,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.column_naming(), config.preview_rows)
    }

    pub fn preview_rows(&self) -> usize {
        self.preview_rows
    }

    /// Parse an upload without analyzing it
    pub fn load(&self, input: &[u8]) -> Result<SeriesTable, AnalysisError> {
        self.parser.parse(input)
    }

    /// Analyze an upload using the configured preview size
    pub fn analyze(&self, input: &[u8]) -> Result<AnalysisReport, AnalysisError> {
        self.analyze_with_preview(input, self.preview_rows)
    }

    #[instrument(skip(self, input), fields(input_size = input.len()))]
    pub fn analyze_with_preview(
        &self,
        input: &[u8],
        preview_rows: usize,
    ) -> Result<AnalysisReport, AnalysisError> {
        let table = self.parser.parse(input)?;
        let report = Self::build_report(&table, preview_rows);

        info!(
            "Analyzed {} rows, {} series, peak rate {}",
            report.row_count,
            report.series_ids.len(),
            report
                .peak_rate
                .as_ref()
                .map(|p| format!("{:.3} cm/day on {}", p.rate_cm_per_day, p.date))
                .unwrap_or_else(|| "not computable".to_string())
        );

        Ok(report)
    }

    /// Build the report for an already parsed table
    pub fn build_report(table: &SeriesTable, preview_rows: usize) -> AnalysisReport {
        let rates = daily_rates(table);
        let peak_rate = peak_of(&rates);
        if peak_rate.is_none() {
            warn!(
                "Omitting rate annotation: {}",
                AnalysisError::NoRateComputable
            );
        }

        AnalysisReport {
            date_column: table.date_column().to_string(),
            series_ids: table.series_ids().to_vec(),
            rainfall_column: table.rainfall_column().map(str::to_string),
            row_count: table.len(),
            chart: table.chart_data(),
            peak_rate,
            rates,
            statistics: summarize(table).into_columns(),
            preview: table.head(preview_rows).to_vec(),
        }
    }
}
