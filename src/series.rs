// Series module
//
// Loading of displacement/rainfall uploads: column classification, CSV
// parsing and the in-memory table the analyzers work on.

pub mod classifier;
pub mod models;
pub mod parser;

pub use classifier::{classify_columns, ColumnNaming};
pub use models::{ChartData, ColumnLayout, ColumnRole, Record, SeriesColumn, SeriesTable};
pub use parser::CsvParser;
