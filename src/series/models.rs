use std::io::Write;

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

/// Role assigned to each CSV column by the classifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRole {
    Date,
    Rainfall,
    /// Displacement series of one control point, keyed by its header
    Displacement { series_id: String },
    /// Unnamed index columns left behind by dataframe exports
    Ignored,
}

/// Result of classifying a header row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub headers: Vec<String>,
    pub roles: Vec<ColumnRole>,
    pub date_index: usize,
    pub rainfall_index: Option<usize>,
    /// Displacement column indices in presentation order
    pub displacement_indices: Vec<usize>,
}

impl ColumnLayout {
    pub fn date_header(&self) -> &str {
        &self.headers[self.date_index]
    }

    pub fn rainfall_header(&self) -> Option<&str> {
        self.rainfall_index.map(|idx| self.headers[idx].as_str())
    }

    pub fn series_ids(&self) -> Vec<String> {
        self.displacement_indices
            .iter()
            .map(|&idx| self.headers[idx].clone())
            .collect()
    }
}

/// One row of the upload: a date, one value per control point and the rainfall
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Record {
    pub date: NaiveDate,
    /// Displacement in centimeters, aligned with the table's `series_ids`
    pub displacements: Vec<Option<f64>>,
    pub rainfall_mm: Option<f64>,
}

impl Record {
    /// Arithmetic mean over the non-missing displacement values
    ///
    /// Accumulated incrementally so values near `f64::MAX` do not overflow.
    pub fn mean_displacement(&self) -> Option<f64> {
        let mut count = 0usize;
        let mut mean = 0.0_f64;
        for &value in self.displacements.iter().flatten() {
            count += 1;
            mean += (value - mean) / count as f64;
        }

        (count > 0).then_some(mean)
    }
}

/// One named column of values for charting
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SeriesColumn {
    pub id: String,
    pub values: Vec<Option<f64>>,
}

/// Columnar view of the table for a dual-axis chart
///
/// Displacement series go on the primary axis (cm), rainfall on the
/// secondary axis (mm).
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChartData {
    pub dates: Vec<NaiveDate>,
    pub displacement_series: Vec<SeriesColumn>,
    pub rainfall: Option<SeriesColumn>,
}

/// Parsed upload, ordered by ascending date and immutable after construction
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesTable {
    date_column: String,
    series_ids: Vec<String>,
    rainfall_column: Option<String>,
    records: Vec<Record>,
}

impl SeriesTable {
    /// Build a table, sorting records by date (stable for duplicate dates)
    pub fn new(
        date_column: String,
        series_ids: Vec<String>,
        rainfall_column: Option<String>,
        mut records: Vec<Record>,
    ) -> Self {
        records.sort_by_key(|record| record.date);
        Self {
            date_column,
            series_ids,
            rainfall_column,
            records,
        }
    }

    pub fn date_column(&self) -> &str {
        &self.date_column
    }

    pub fn series_ids(&self) -> &[String] {
        &self.series_ids
    }

    pub fn rainfall_column(&self) -> Option<&str> {
        self.rainfall_column.as_deref()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First `n` records, for previews
    pub fn head(&self, n: usize) -> &[Record] {
        &self.records[..n.min(self.records.len())]
    }

    pub fn rainfall(&self) -> Option<Vec<Option<f64>>> {
        self.rainfall_column
            .as_ref()
            .map(|_| self.records.iter().map(|r| r.rainfall_mm).collect())
    }

    /// All numeric columns: displacement series first, rainfall last
    pub fn numeric_columns(&self) -> Vec<SeriesColumn> {
        let mut columns: Vec<SeriesColumn> = self
            .series_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| SeriesColumn {
                id: id.clone(),
                values: self.records.iter().map(|r| r.displacements[idx]).collect(),
            })
            .collect();

        if let (Some(id), Some(values)) = (self.rainfall_column.as_ref(), self.rainfall()) {
            columns.push(SeriesColumn {
                id: id.clone(),
                values,
            });
        }

        columns
    }

    pub fn chart_data(&self) -> ChartData {
        let mut displacement_series = self.numeric_columns();
        let rainfall = if self.rainfall_column.is_some() {
            displacement_series.pop()
        } else {
            None
        };

        ChartData {
            dates: self.records.iter().map(|r| r.date).collect(),
            displacement_series,
            rainfall,
        }
    }

    /// Write the table back out as CSV with ISO dates and empty missing cells
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        let mut header = vec![self.date_column.clone()];
        header.extend(self.series_ids.iter().cloned());
        if let Some(rainfall) = &self.rainfall_column {
            header.push(rainfall.clone());
        }
        csv_writer.write_record(&header)?;

        for record in &self.records {
            let mut row = vec![record.date.format("%Y-%m-%d").to_string()];
            row.extend(record.displacements.iter().map(|v| format_cell(*v)));
            if self.rainfall_column.is_some() {
                row.push(format_cell(record.rainfall_mm));
            }
            csv_writer.write_record(&row)?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}

fn format_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_table() -> SeriesTable {
        SeriesTable::new(
            "fecha".to_string(),
            vec!["101".to_string(), "202".to_string()],
            Some("rainfall(mm)".to_string()),
            vec![
                Record {
                    date: date(2020, 1, 3),
                    displacements: vec![Some(2.0), None],
                    rainfall_mm: None,
                },
                Record {
                    date: date(2020, 1, 1),
                    displacements: vec![Some(1.0), Some(3.0)],
                    rainfall_mm: Some(5.0),
                },
            ],
        )
    }

    #[test]
    fn test_table_sorted_by_date() {
        let table = sample_table();
        assert_eq!(table.records()[0].date, date(2020, 1, 1));
        assert_eq!(table.records()[1].date, date(2020, 1, 3));
    }

    #[test]
    fn test_mean_displacement_skips_missing() {
        let table = sample_table();
        assert_eq!(table.records()[0].mean_displacement(), Some(2.0));
        assert_eq!(table.records()[1].mean_displacement(), Some(2.0));

        let empty = Record {
            date: date(2020, 1, 1),
            displacements: vec![None, None],
            rainfall_mm: Some(1.0),
        };
        assert_eq!(empty.mean_displacement(), None);
    }

    #[test]
    fn test_mean_displacement_near_max_stays_finite() {
        let huge = Record {
            date: date(2020, 1, 1),
            displacements: vec![Some(1e308), Some(1e308), None],
            rainfall_mm: None,
        };
        assert_eq!(huge.mean_displacement(), Some(1e308));
    }

    #[test]
    fn test_head_clamps_to_len() {
        let table = sample_table();
        assert_eq!(table.head(1).len(), 1);
        assert_eq!(table.head(10).len(), 2);
    }

    #[test]
    fn test_rainfall_values() {
        let table = sample_table();
        assert_eq!(table.rainfall(), Some(vec![Some(5.0), None]));
    }

    #[test]
    fn test_chart_data_splits_rainfall() {
        let chart = sample_table().chart_data();
        assert_eq!(chart.dates.len(), 2);
        assert_eq!(chart.displacement_series.len(), 2);
        assert_eq!(chart.displacement_series[0].id, "101");
        let rainfall = chart.rainfall.expect("rainfall column present");
        assert_eq!(rainfall.id, "rainfall(mm)");
    }

    #[test]
    fn test_write_csv() {
        let mut buffer = Vec::new();
        sample_table().write_csv(&mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "fecha,101,202,rainfall(mm)\n2020-01-01,1,3,5\n2020-01-03,2,,\n"
        );
    }
}
