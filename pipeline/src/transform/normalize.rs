//! Row normalization: one raw row in, one typed [`Record`] or a drop reason out.

use serde::Serialize;

use super::coerce::{coerce_number, parse_time_of_day, TimeParseError};
use super::headers::HeaderMapping;
use crate::models::Record;
use crate::parser::RawRow;

/// A row discarded because its timestamp did not parse.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedRow {
    /// Source line of the row.
    pub line: u64,
    /// Time cell as found, empty when the cell was missing.
    pub time_text: String,
    pub reason: String,
}

/// Normalize a single row.
///
/// Returns the record on success. When the time cell is missing or malformed
/// the row is rejected with a [`DroppedRow`]; numeric cells that fail to
/// coerce are simply left out of the record.
pub fn normalize_row(
    row: &RawRow,
    header_map: &[HeaderMapping],
    time_header: &str,
) -> Result<Record, DroppedRow> {
    let time_cell = row.get(time_header);

    let time = time_cell
        .ok_or(TimeParseError::NotText)
        .and_then(parse_time_of_day)
        .map_err(|e| DroppedRow {
            line: row.line,
            time_text: time_cell.and_then(|v| v.as_str()).unwrap_or_default().to_string(),
            reason: e.to_string(),
        })?;

    let original_time = time_cell.and_then(|v| v.as_str()).unwrap_or_default();
    let mut record = Record::new(row.line, time, original_time);

    let time_mapped = header_map
        .iter()
        .find(|m| m.original == time_header)
        .map(|m| m.mapped.as_str());

    for mapping in header_map {
        if mapping.original == time_header || Some(mapping.mapped.as_str()) == time_mapped {
            continue;
        }
        // Later columns mapping to the same name overwrite earlier ones
        if let Some(value) = row.get(&mapping.original).and_then(coerce_number) {
            record.values.insert(mapping.mapped.clone(), value);
        }
    }

    Ok(record)
}
