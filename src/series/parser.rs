//! CSV parser for displacement/rainfall uploads
//!
//! Turns raw upload bytes into a [`SeriesTable`]. The first row is the
//! header; the date column accepts `DD/MM/YYYY` or `YYYY-MM-DD`; every other
//! kept column must hold floating point values or a missing marker.

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, info, instrument};

use crate::analysis_error::AnalysisError;
use crate::series::classifier::{classify_columns, ColumnNaming};
use crate::series::models::{ColumnLayout, Record, SeriesTable};
use crate::utils::{parse_measurement, parse_observation_date};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Debug, Clone, Default)]
pub struct CsvParser {
    naming: ColumnNaming,
}

impl CsvParser {
    pub fn new(naming: ColumnNaming) -> Self {
        Self { naming }
    }

    /// Parse an upload into a date-ordered table
    #[instrument(skip(self, input), fields(input_size = input.len()))]
    pub fn parse(&self, input: &[u8]) -> Result<SeriesTable, AnalysisError> {
        let input = input.strip_prefix(UTF8_BOM).unwrap_or(input);

        if input.iter().all(|b| b.is_ascii_whitespace()) {
            debug!("Upload contains no content");
            return Err(AnalysisError::EmptyFile);
        }

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(input);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() {
            return Err(AnalysisError::EmptyFile);
        }

        let layout = classify_columns(&headers, &self.naming)?;

        let mut records = Vec::new();
        for result in reader.records() {
            let raw = result?;

            // Whitespace-only lines survive trimming as a single empty field
            if raw.iter().all(str::is_empty) {
                debug!("Skipping blank line");
                continue;
            }

            let row = records.len() + 1;
            // Header occupies line 1
            let line = raw
                .position()
                .map(|p| p.line())
                .unwrap_or(row as u64 + 1);

            if raw.len() != headers.len() {
                return Err(AnalysisError::RaggedRow {
                    row,
                    line,
                    expected: headers.len(),
                    found: raw.len(),
                });
            }

            records.push(Self::parse_record(&layout, &raw, row, line)?);
        }

        if records.is_empty() {
            debug!("Upload has a header but no data rows");
            return Err(AnalysisError::EmptyFile);
        }

        info!(
            "Parsed {} rows across {} displacement series",
            records.len(),
            layout.displacement_indices.len()
        );

        Ok(SeriesTable::new(
            layout.date_header().to_string(),
            layout.series_ids(),
            layout.rainfall_header().map(str::to_string),
            records,
        ))
    }

    fn parse_record(
        layout: &ColumnLayout,
        raw: &StringRecord,
        row: usize,
        line: u64,
    ) -> Result<Record, AnalysisError> {
        let date_cell = raw.get(layout.date_index).unwrap_or("");
        let date = parse_observation_date(date_cell).ok_or_else(|| AnalysisError::MalformedDate {
            row,
            line,
            column: layout.date_header().to_string(),
            value: date_cell.to_string(),
        })?;

        let displacements = layout
            .displacement_indices
            .iter()
            .map(|&idx| Self::parse_numeric(layout, raw, idx, row, line))
            .collect::<Result<Vec<_>, _>>()?;

        let rainfall_mm = match layout.rainfall_index {
            Some(idx) => Self::parse_numeric(layout, raw, idx, row, line)?,
            None => None,
        };

        Ok(Record {
            date,
            displacements,
            rainfall_mm,
        })
    }

    fn parse_numeric(
        layout: &ColumnLayout,
        raw: &StringRecord,
        idx: usize,
        row: usize,
        line: u64,
    ) -> Result<Option<f64>, AnalysisError> {
        let cell = raw.get(idx).unwrap_or("");
        parse_measurement(cell).map_err(|_| AnalysisError::MalformedNumericCell {
            row,
            line,
            column: layout.headers[idx].clone(),
            value: cell.to_string(),
        })
    }
}
