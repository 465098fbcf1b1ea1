//! High-level ingestion API: bytes in, time-ordered [`Dataset`] out.
//!
//! Combines every step: decoding, time column detection, header aliasing,
//! row normalization, sorting and parameter discovery.
//!
//! # Example
//!
//! ```rust,ignore
//! use circuitview::{Ingestor, IngestOptions};
//!
//! let ingestor = Ingestor::new(&IngestOptions::default())?;
//! let outcome = ingestor.ingest_bytes(&std::fs::read("meter.csv")?)?;
//! println!("{} records, parameters: {:?}", outcome.dataset.len(), outcome.dataset.parameters);
//! ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::headers::{detect_time_column, AliasTable, HeaderMapping, HeaderResolver, DEFAULT_VENDOR_PREFIX};
use super::normalize::{normalize_row, DroppedRow};
use crate::error::{ConfigError, IngestError, IngestResult};
use crate::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::models::{Dataset, Record};
use crate::parser::{decode_bytes, RawRow, RawTable, DEFAULT_DELIMITER};

/// Options for the ingestion pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestOptions {
    /// Cell delimiter
    pub delimiter: u8,

    /// Regex for the vendor token stripped from header starts; empty disables it
    pub vendor_prefix: String,

    /// Header alias rules, scanned in order
    pub alias_table: AliasTable,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            vendor_prefix: regex::escape(DEFAULT_VENDOR_PREFIX),
            alias_table: AliasTable::default(),
        }
    }
}

/// Decoded file information
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Records, parameters and the bookkeeping needed to explain them.
#[derive(Debug, Clone)]
pub struct Assembled {
    pub dataset: Dataset,
    pub time_column: String,
    pub header_map: Vec<HeaderMapping>,
    pub dropped: Vec<DroppedRow>,
}

/// What happened during one ingestion, for display next to the charts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub upload_id: String,
    pub file_name: Option<String>,
    pub csv_info: CsvInfo,
    pub time_column: String,
    pub header_map: Vec<HeaderMapping>,
    pub record_count: usize,
    pub parameter_count: usize,
    pub dropped: Vec<DroppedRow>,
}

/// Result of a successful ingestion
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub dataset: Dataset,
    pub report: IngestReport,
}

/// Runs the pipeline with a fixed set of options.
#[derive(Debug, Clone)]
pub struct Ingestor {
    resolver: HeaderResolver,
    delimiter: u8,
}

impl Default for Ingestor {
    fn default() -> Self {
        Self {
            resolver: HeaderResolver::default(),
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

impl Ingestor {
    pub fn new(options: &IngestOptions) -> Result<Self, ConfigError> {
        Ok(Self {
            resolver: HeaderResolver::new(options.alias_table.clone(), &options.vendor_prefix)?,
            delimiter: options.delimiter,
        })
    }

    pub fn resolver(&self) -> &HeaderResolver {
        &self.resolver
    }

    /// Decode raw upload bytes and ingest them.
    pub fn ingest_bytes(&self, bytes: &[u8]) -> IngestResult<IngestOutcome> {
        log_info("📖 Reading CSV file...");
        let table = decode_bytes(bytes, self.delimiter)?;
        self.ingest_table(table)
    }

    /// Ingest an already-decoded table.
    pub fn ingest_table(&self, table: RawTable) -> IngestResult<IngestOutcome> {
        log_success(format!("Detected encoding: {}", table.encoding));
        log_success(format!("Read {} rows", table.rows.len()));

        let csv_info = CsvInfo {
            encoding: table.encoding.clone(),
            delimiter: table.delimiter,
            headers: table.headers.clone(),
            row_count: table.rows.len(),
        };

        let assembled = self.assemble(&table.rows, &table.headers)?;

        let report = IngestReport {
            upload_id: Uuid::new_v4().to_string(),
            file_name: None,
            csv_info,
            time_column: assembled.time_column,
            header_map: assembled.header_map,
            record_count: assembled.dataset.len(),
            parameter_count: assembled.dataset.parameters.len(),
            dropped: assembled.dropped,
        };

        Ok(IngestOutcome {
            dataset: assembled.dataset,
            report,
        })
    }

    /// Turn decoded rows into a sorted dataset.
    ///
    /// Fails with [`IngestError::NoTimeColumn`] when no header looks like a
    /// timestamp, [`IngestError::EmptyResult`] when every row is dropped and
    /// [`IngestError::NoNumericColumns`] when no column holds a number.
    pub fn assemble(&self, rows: &[RawRow], headers: &[String]) -> IngestResult<Assembled> {
        let time_column = detect_time_column(headers)?.to_string();
        log_success(format!("Time column: \"{}\"", time_column));

        let header_map = self.resolver.header_map(headers);
        print_header_map(&header_map, &time_column);

        let mut records = Vec::with_capacity(rows.len());
        let mut dropped = Vec::new();

        for row in rows {
            match normalize_row(row, &header_map, &time_column) {
                Ok(record) => records.push(record),
                Err(skip) => dropped.push(skip),
            }
        }

        if !dropped.is_empty() {
            log_warning(format!("{} rows skipped (unreadable time)", dropped.len()));
        }

        if records.is_empty() {
            return Err(IngestError::EmptyResult);
        }

        // Stable: rows sharing a timestamp keep file order
        records.sort_by_key(|r| r.time);
        for (i, record) in records.iter_mut().enumerate() {
            record.index = i;
        }

        let parameters = published_parameters(&header_map, &time_column, &records);
        if parameters.is_empty() {
            return Err(IngestError::NoNumericColumns);
        }

        log_success(format!("{} records, {} parameters", records.len(), parameters.len()));

        Ok(Assembled {
            dataset: Dataset { records, parameters },
            time_column,
            header_map,
            dropped,
        })
    }
}

/// Assemble with the default vocabulary and vendor prefix.
pub fn assemble(rows: &[RawRow], headers: &[String]) -> IngestResult<Assembled> {
    Ingestor::default().assemble(rows, headers)
}

/// Ingest raw bytes with default options.
pub fn ingest_bytes(bytes: &[u8]) -> IngestResult<IngestOutcome> {
    Ingestor::default().ingest_bytes(bytes)
}

/// Mapped names, in header order and without repeats, that hold at least one
/// number. The time column and anything aliased to its name are excluded.
fn published_parameters(header_map: &[HeaderMapping], time_column: &str, records: &[Record]) -> Vec<String> {
    let time_mapped = header_map
        .iter()
        .find(|m| m.original == time_column)
        .map(|m| m.mapped.as_str());

    let mut parameters: Vec<String> = Vec::new();
    for mapping in header_map {
        if mapping.original == time_column || Some(mapping.mapped.as_str()) == time_mapped {
            continue;
        }
        if parameters.contains(&mapping.mapped) {
            continue;
        }
        if records.iter().any(|r| r.values.contains_key(&mapping.mapped)) {
            parameters.push(mapping.mapped.clone());
        }
    }
    parameters
}

fn print_header_map(header_map: &[HeaderMapping], time_column: &str) {
    log_info(format!("📋 CSV has {} columns:", header_map.len()));
    for (i, m) in header_map.iter().enumerate() {
        if m.original == time_column {
            log_info_indent(format!("[{:2}] {} (time)", i + 1, m.original), 1);
        } else {
            log_info_indent(format!("[{:2}] {} → {}", i + 1, m.original, m.mapped), 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_table;

    fn table(csv: &str) -> RawTable {
        parse_table(csv, b';', "utf-8".to_string()).unwrap()
    }

    #[test]
    fn test_default_options() {
        let opts = IngestOptions::default();
        assert_eq!(opts.delimiter, b';');
        assert_eq!(opts.alias_table.rules().len(), 12);
        assert!(Ingestor::new(&opts).is_ok());
    }

    #[test]
    fn test_sorted_and_indexed() {
        let t = table(
            "Time;kW\n\
             01/01/2024 10:00:00;3\n\
             01/01/2024 08:00:00;1\n\
             01/01/2024 09:00:00;2",
        );
        let out = assemble(&t.rows, &t.headers).unwrap();
        let times: Vec<u32> = out.dataset.records.iter().map(|r| r.time).collect();
        assert_eq!(times, vec![28_800_000, 32_400_000, 36_000_000]);

        let indexes: Vec<usize> = out.dataset.records.iter().map(|r| r.index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);

        let lines: Vec<u64> = out.dataset.records.iter().map(|r| r.source_line).collect();
        assert_eq!(lines, vec![3, 4, 2]);
    }

    #[test]
    fn test_parameters_require_numbers() {
        let t = table(
            "Time;kW;Comment;PF\n\
             d 01:00;1,5;ok;\n\
             d 02:00;2,5;fine;",
        );
        let out = assemble(&t.rows, &t.headers).unwrap();
        assert_eq!(out.dataset.parameters, vec!["Active power"]);
    }

    #[test]
    fn test_parameters_deduplicated_in_header_order() {
        let t = table("Time;PF;Voltage R;R phase voltage\nd 01:00;0,9;230;231");
        let out = assemble(&t.rows, &t.headers).unwrap();
        assert_eq!(out.dataset.parameters, vec!["Power factor", "R phase voltage"]);
    }

    #[test]
    fn test_no_numeric_columns() {
        let t = table("Time;Comment\nd 01:00;hello");
        assert!(matches!(
            assemble(&t.rows, &t.headers),
            Err(IngestError::NoNumericColumns)
        ));
    }

    #[test]
    fn test_dropped_rows_reported() {
        let t = table("Time;kW\nbad;1\nd 01:00;2\nalso bad;3");
        let out = assemble(&t.rows, &t.headers).unwrap();
        assert_eq!(out.dataset.len(), 1);
        let lines: Vec<u64> = out.dropped.iter().map(|d| d.line).collect();
        assert_eq!(lines, vec![2, 4]);
    }

    #[test]
    fn test_index_contiguous_after_drops() {
        let t = table(
            "Time;kW\n\
             d 10:00;1\n\
             bad;2\n\
             d 08:00;3\n\
             also bad;4\n\
             d 09:00;5",
        );
        let out = assemble(&t.rows, &t.headers).unwrap();

        let indexes: Vec<usize> = out.dataset.records.iter().map(|r| r.index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);

        let lines: Vec<u64> = out.dataset.records.iter().map(|r| r.source_line).collect();
        assert_eq!(lines, vec![4, 6, 2]);
    }

    #[test]
    fn test_record_field_named_column() {
        let out = ingest_bytes(b"Time;Index;kW\nd 10:00;7;1\nd 09:00;8;2\n").unwrap();
        assert_eq!(out.dataset.parameters, vec!["index (column)", "Active power"]);

        let first = &out.dataset.records[0];
        assert_eq!(first.index, 0);
        assert_eq!(first.value("index (column)"), Some(8.0));

        let json = serde_json::to_value(first).unwrap();
        assert_eq!(json["index"], 0);
        assert_eq!(json["index (column)"], 8.0);

        let text = serde_json::to_string(first).unwrap();
        let back: Record = serde_json::from_str(&text).unwrap();
        assert_eq!(&back, first);
    }

    #[test]
    fn test_second_time_column_not_published() {
        let out = ingest_bytes(b"Time;TIME;kW\nd 10:00;5;1\n").unwrap();
        assert_eq!(out.dataset.parameters, vec!["Active power"]);
        assert_eq!(out.dataset.records[0].values.len(), 1);
    }

    #[test]
    fn test_ingest_bytes_report() {
        let out = ingest_bytes(b"Time;kW;kVAR\n01/01/2024 00:01:00;1;0,5\n").unwrap();
        assert_eq!(out.report.csv_info.delimiter, ';');
        assert_eq!(out.report.csv_info.row_count, 1);
        assert_eq!(out.report.time_column, "Time");
        assert_eq!(out.report.parameter_count, 2);
        assert!(!out.report.upload_id.is_empty());
    }

    #[test]
    fn test_custom_delimiter() {
        let opts = IngestOptions {
            delimiter: b',',
            ..IngestOptions::default()
        };
        let out = Ingestor::new(&opts)
            .unwrap()
            .ingest_bytes(b"timestamp,kW\nx 12:00,\"4,5\"")
            .unwrap();
        assert_eq!(out.dataset.records[0].value("Active power"), Some(4.5));
    }
}
