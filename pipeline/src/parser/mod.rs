//! Table decoding with encoding auto-detection.
//!
//! Turns uploaded bytes into a header row plus one JSON object per data row.
//! Nothing metering-specific happens here: cells stay strings, and interpreting
//! them is the job of [`crate::transform`].

use csv::{ReaderBuilder, Trim};
use serde_json::{Map, Value};

use crate::error::{DecodeError, DecodeResult};

/// Delimiter used by the metering exports.
pub const DEFAULT_DELIMITER: u8 = b';';

/// A single data row, keyed by the raw header text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based line number of the row in the decoded text.
    pub line: u64,
    /// Cell values keyed by header. Headers past the end of a short row are absent.
    pub cells: Map<String, Value>,
}

impl RawRow {
    pub fn new(line: u64, cells: Map<String, Value>) -> Self {
        Self { line, cells }
    }

    pub fn get(&self, header: &str) -> Option<&Value> {
        self.cells.get(header)
    }
}

/// Result of decoding with metadata
#[derive(Debug, Clone)]
pub struct RawTable {
    /// Detected or used encoding
    pub encoding: String,
    /// Delimiter used to split cells
    pub delimiter: char,
    /// Column headers in file order
    pub headers: Vec<String>,
    /// Data rows, empty lines skipped
    pub rows: Vec<RawRow>,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the given encoding.
///
/// Unknown encodings and invalid UTF-8 fall back to lossy UTF-8 rather than
/// failing; a mangled cell is dropped later by coercion, not here.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let text = match encoding.to_lowercase().as_str() {
        // The WHATWG decoder for every latin1 label is windows-1252
        "iso-8859-1" | "latin-1" | "latin1" | "windows-1252" | "cp1252" => {
            encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned()
        }
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    // Excel likes to prepend a BOM, which would otherwise end up in the first header
    match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    }
}

/// Parse delimited text into a [`RawTable`].
///
/// The first row is the header row. Rows with too few or too many cells are
/// tolerated: missing cells are absent from the row, extra cells are ignored.
///
/// # Example
/// ```ignore
/// use circuitview::parse_table;
///
/// let table = parse_table("Time;Voltage R\n01/01/2024 09:15:00;231,2", b';', "utf-8".into()).unwrap();
/// assert_eq!(table.headers, vec!["Time", "Voltage R"]);
/// assert_eq!(table.rows[0].get("Voltage R").unwrap(), "231,2");
/// ```
pub fn parse_table(content: &str, delimiter: u8, encoding: String) -> DecodeResult<RawTable> {
    if content.trim().is_empty() {
        return Err(DecodeError::EmptyFile);
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| DecodeError::Malformed {
            line: 1,
            message: e.to_string(),
        })?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(DecodeError::NoHeaders);
    }

    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result.map_err(|e| DecodeError::Malformed {
            line: e.position().map(|p| p.line()).unwrap_or(0),
            message: e.to_string(),
        })?;

        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let mut cells = Map::new();

        for (header, value) in headers.iter().zip(record.iter()) {
            cells.insert(header.clone(), Value::String(value.to_string()));
        }

        rows.push(RawRow::new(line, cells));
    }

    Ok(RawTable {
        encoding,
        delimiter: delimiter as char,
        headers,
        rows,
    })
}

/// Decode uploaded bytes: detect the encoding, then split on `delimiter`.
pub fn decode_bytes(bytes: &[u8], delimiter: u8) -> DecodeResult<RawTable> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    parse_table(&content, delimiter, encoding)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(csv: &str) -> RawTable {
        parse_table(csv, b';', "utf-8".to_string()).unwrap()
    }

    #[test]
    fn test_simple_table() {
        let t = table("Time;Voltage R\n01/01/2024 09:15:00;231,2\n01/01/2024 09:16:00;230,9");

        assert_eq!(t.headers, vec!["Time", "Voltage R"]);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0].get("Time").unwrap(), "01/01/2024 09:15:00");
        assert_eq!(t.rows[0].get("Voltage R").unwrap(), "231,2");
        assert_eq!(t.rows[1].get("Voltage R").unwrap(), "230,9");
    }

    #[test]
    fn test_line_numbers_follow_source() {
        let t = table("Time;kW\na;1\n\nb;2\n");

        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0].line, 2);
        assert_eq!(t.rows[1].line, 4);
    }

    #[test]
    fn test_quoted_values() {
        let t = table("name;value\n\"Alice\";\"12,5\"");
        assert_eq!(t.rows[0].get("name").unwrap(), "Alice");
        assert_eq!(t.rows[0].get("value").unwrap(), "12,5");
    }

    #[test]
    fn test_short_row_leaves_cells_absent() {
        let t = table("a;b;c\n1;2");
        assert_eq!(t.rows[0].get("a").unwrap(), "1");
        assert_eq!(t.rows[0].get("b").unwrap(), "2");
        assert!(t.rows[0].get("c").is_none());
    }

    #[test]
    fn test_extra_cells_ignored() {
        let t = table("a;b\n1;2;3;4");
        assert_eq!(t.rows[0].cells.len(), 2);
    }

    #[test]
    fn test_whitespace_only_row_skipped() {
        let t = table("a;b\n1;2\n ; \n3;4");
        assert_eq!(t.rows.len(), 2);
    }

    #[test]
    fn test_empty_content_error() {
        let err = parse_table("  \n", b';', "utf-8".into()).unwrap_err();
        assert!(matches!(err, DecodeError::EmptyFile));
    }

    #[test]
    fn test_decode_bytes_strips_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"Time;kW\nx;1");
        let t = decode_bytes(&bytes, b';').unwrap();
        assert_eq!(t.headers[0], "Time");
        assert_eq!(t.delimiter, ';');
    }

    #[test]
    fn test_latin1_decoding() {
        // "Intensité" in ISO-8859-1
        let bytes: &[u8] = &[0x49, 0x6E, 0x74, 0x65, 0x6E, 0x73, 0x69, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Intensité");
    }

    #[test]
    fn test_latin1_currency_sign() {
        // 0xA4 is the generic currency sign in latin1, not the euro sign
        let decoded = decode_content(&[0x31, 0x30, 0xA4], "iso-8859-1");
        assert_eq!(decoded, "10\u{a4}");
        assert_eq!(decode_content(&[0x80], "latin1"), "\u{20ac}");
    }
}
