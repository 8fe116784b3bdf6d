#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("The uploaded file is empty or has no data rows")]
    EmptyFile,
    #[error("Malformed date at row {row} (line {line}), column '{column}': '{value}' (expected DD/MM/YYYY or YYYY-MM-DD)")]
    MalformedDate {
        row: usize,
        line: u64,
        column: String,
        value: String,
    },
    #[error("Malformed numeric cell at row {row} (line {line}), column '{column}': '{value}'")]
    MalformedNumericCell {
        row: usize,
        line: u64,
        column: String,
        value: String,
    },
    #[error("Row {row} (line {line}) has {found} fields, expected {expected}")]
    RaggedRow {
        row: usize,
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("Missing date column '{0}'")]
    MissingDateColumn(String),
    #[error("Ambiguous rainfall column: {count} columns are named '{name}'")]
    AmbiguousRainfallColumn { name: String, count: usize },
    #[error("Duplicate column '{0}'")]
    DuplicateColumn(String),
    #[error("No displacement columns found")]
    NoDisplacementColumns,
    #[error("No displacement rate can be computed (fewer than two usable rows)")]
    NoRateComputable,
    #[error("Failed to read CSV: {0}")]
    Csv(#[from] csv::Error),
}

impl AnalysisError {
    /// Stable identifier used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::EmptyFile => "empty_file",
            AnalysisError::MalformedDate { .. } => "malformed_date",
            AnalysisError::MalformedNumericCell { .. } => "malformed_numeric_cell",
            AnalysisError::RaggedRow { .. } => "ragged_row",
            AnalysisError::MissingDateColumn(_) => "missing_date_column",
            AnalysisError::AmbiguousRainfallColumn { .. } => "ambiguous_rainfall_column",
            AnalysisError::DuplicateColumn(_) => "duplicate_column",
            AnalysisError::NoDisplacementColumns => "no_displacement_columns",
            AnalysisError::NoRateComputable => "no_rate_computable",
            AnalysisError::Csv(_) => "malformed_csv",
        }
    }
}
