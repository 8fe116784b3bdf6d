//! Column classification for displacement uploads
//!
//! Assigns every header one of the [`ColumnRole`]s. The date and rainfall
//! columns are found by name (case-insensitive); everything else that has a
//! real header is a displacement series keyed by that header.

use std::collections::HashSet;

use tracing::{debug, instrument, warn};

use crate::analysis_error::AnalysisError;
use crate::series::models::{ColumnLayout, ColumnRole};

pub const DEFAULT_DATE_COLUMN: &str = "fecha";
pub const DEFAULT_RAINFALL_COLUMN: &str = "rainfall(mm)";

/// Header names that identify the date and rainfall columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnNaming {
    pub date_column: String,
    pub rainfall_column: String,
}

impl Default for ColumnNaming {
    fn default() -> Self {
        Self {
            date_column: DEFAULT_DATE_COLUMN.to_string(),
            rainfall_column: DEFAULT_RAINFALL_COLUMN.to_string(),
        }
    }
}

/// Whether a header is an index column left over from a dataframe export
fn is_unnamed(header: &str) -> bool {
    header.is_empty() || header.starts_with("Unnamed")
}

/// Classify a header row
///
/// Fails with `MissingDateColumn` when no header matches the date name and
/// with `AmbiguousRainfallColumn` when more than one header matches the
/// rainfall name. Displacement columns are ordered numerically when every
/// one of them is an integer control-point code, otherwise in file order.
#[instrument(skip(headers), fields(column_count = headers.len()))]
pub fn classify_columns(
    headers: &[String],
    naming: &ColumnNaming,
) -> Result<ColumnLayout, AnalysisError> {
    let headers: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();

    let mut roles = Vec::with_capacity(headers.len());
    let mut date_index = None;
    let mut rainfall_indices = Vec::new();
    let mut displacement_indices = Vec::new();

    for (idx, header) in headers.iter().enumerate() {
        let role = if is_unnamed(header) {
            warn!("Ignoring unnamed column at position {}", idx + 1);
            ColumnRole::Ignored
        } else if header.eq_ignore_ascii_case(&naming.date_column) {
            if date_index.is_some() {
                return Err(AnalysisError::DuplicateColumn(header.clone()));
            }
            date_index = Some(idx);
            ColumnRole::Date
        } else if header.eq_ignore_ascii_case(&naming.rainfall_column) {
            rainfall_indices.push(idx);
            ColumnRole::Rainfall
        } else {
            displacement_indices.push(idx);
            ColumnRole::Displacement {
                series_id: header.clone(),
            }
        };

        debug!("Column {} '{}' classified as {:?}", idx + 1, header, role);
        roles.push(role);
    }

    let date_index =
        date_index.ok_or_else(|| AnalysisError::MissingDateColumn(naming.date_column.clone()))?;

    if rainfall_indices.len() > 1 {
        return Err(AnalysisError::AmbiguousRainfallColumn {
            name: naming.rainfall_column.clone(),
            count: rainfall_indices.len(),
        });
    }

    {
        let mut seen = HashSet::new();
        for &idx in &displacement_indices {
            if !seen.insert(headers[idx].as_str()) {
                return Err(AnalysisError::DuplicateColumn(headers[idx].clone()));
            }
        }
    }

    if displacement_indices.is_empty() {
        return Err(AnalysisError::NoDisplacementColumns);
    }

    order_by_control_point(&headers, &mut displacement_indices);

    debug!(
        "Classified {} displacement columns (rainfall column present: {})",
        displacement_indices.len(),
        !rainfall_indices.is_empty()
    );

    Ok(ColumnLayout {
        headers,
        roles,
        date_index,
        rainfall_index: rainfall_indices.first().copied(),
        displacement_indices,
    })
}

/// Sort by numeric control-point code when every header is an integer
fn order_by_control_point(headers: &[String], indices: &mut [usize]) {
    let codes: Option<Vec<i64>> = indices
        .iter()
        .map(|&idx| headers[idx].parse::<i64>().ok())
        .collect();

    if let Some(codes) = codes {
        let mut keyed: Vec<(i64, usize)> = codes.into_iter().zip(indices.iter().copied()).collect();
        keyed.sort_by_key(|(code, _)| *code);
        for (slot, (_, idx)) in indices.iter_mut().zip(keyed) {
            *slot = idx;
        }
    }
}
