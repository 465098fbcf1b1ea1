//! Domain models for the CircuitView ingestion pipeline.
//!
//! - [`Record`] - one normalized meter reading
//! - [`Dataset`] - time-ordered records plus the parameters they carry
//! - [`ParameterDescriptor`] - unit and preferred chart kind for a parameter
//! - [`ChartKind`] - line or bar rendering

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Milliseconds in one day; every `Record::time` is below this.
pub const DAY_MS: u32 = 24 * 3600 * 1000;

/// Keys a serialized [`Record`] uses for its own fields. Parameter names must
/// not collide with these.
pub const RECORD_FIELDS: [&str; 4] = ["index", "sourceLine", "time", "originalTime"];

// =============================================================================
// Record
// =============================================================================

/// A single normalized row.
///
/// Serializes flat, the way the chart layer expects it:
/// `{"index": 0, "sourceLine": 2, "time": 33300000, "originalTime": "...", "R phase voltage": 231.2}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Position in the final, sorted dataset.
    pub index: usize,
    /// Line of the source file this record came from.
    pub source_line: u64,
    /// Time-of-day offset in milliseconds since midnight.
    pub time: u32,
    /// Timestamp text exactly as read from the file.
    pub original_time: String,
    /// Numeric fields keyed by parameter name.
    #[serde(flatten)]
    pub values: BTreeMap<String, f64>,
}

impl Record {
    pub fn new(source_line: u64, time: u32, original_time: impl Into<String>) -> Self {
        Self {
            index: 0,
            source_line,
            time,
            original_time: original_time.into(),
            values: BTreeMap::new(),
        }
    }

    /// Value of a parameter, if this row had a number for it.
    pub fn value(&self, parameter: &str) -> Option<f64> {
        self.values.get(parameter).copied()
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// The artifact handed to the presentation layer after a successful upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Records sorted ascending by `time`.
    pub records: Vec<Record>,
    /// Parameters with at least one numeric value, in header order.
    pub parameters: Vec<String>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_parameter(&self, parameter: &str) -> bool {
        self.parameters.iter().any(|p| p == parameter)
    }

    /// All numeric values of `parameter`, in time order.
    pub fn values<'a>(&'a self, parameter: &'a str) -> impl Iterator<Item = f64> + 'a {
        self.records.iter().filter_map(move |r| r.value(parameter))
    }

    /// `(time, value)` pairs for one parameter, ready for a chart series.
    pub fn series(&self, parameter: &str) -> Vec<(u32, f64)> {
        self.records
            .iter()
            .filter_map(|r| r.value(parameter).map(|v| (r.time, v)))
            .collect()
    }

    /// Descriptors for every published parameter.
    pub fn descriptors(&self) -> Vec<ParameterDescriptor> {
        self.parameters.iter().map(|p| ParameterDescriptor::describe(p)).collect()
    }
}

// =============================================================================
// Parameter descriptors
// =============================================================================

/// Preferred chart rendering for a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Line,
    Bar,
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartKind::Line => write!(f, "line"),
            ChartKind::Bar => write!(f, "bar"),
        }
    }
}

/// Unit and chart kind for a parameter name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterDescriptor {
    pub name: String,
    /// Empty for unitless quantities such as power factor.
    pub unit: &'static str,
    pub chart_type: ChartKind,
}

/// Keyword rules checked in order; the first hit decides.
const DESCRIPTOR_RULES: &[(&[&str], &str, ChartKind)] = &[
    (&["power factor", "pf"], "", ChartKind::Line),
    (&["reactive power", "kvar"], "kVAR", ChartKind::Bar),
    (&["apparent power", "kva"], "kVA", ChartKind::Bar),
    (&["active power", "kw"], "kW", ChartKind::Bar),
    (&["voltage"], "V", ChartKind::Line),
    (&["current"], "A", ChartKind::Line),
];

impl ParameterDescriptor {
    /// Derive the descriptor from keywords in the name. Unrecognized names get
    /// no unit and a line chart.
    pub fn describe(name: &str) -> Self {
        let lower = name.to_lowercase();
        let (unit, chart_type) = DESCRIPTOR_RULES
            .iter()
            .find(|(keywords, _, _)| keywords.iter().any(|k| contains_word(&lower, k)))
            .map(|(_, unit, kind)| (*unit, *kind))
            .unwrap_or(("", ChartKind::Line));

        Self {
            name: name.to_string(),
            unit,
            chart_type,
        }
    }

    /// Axis label such as `"Active power (kW)"`.
    pub fn label(&self) -> String {
        if self.unit.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.unit)
        }
    }
}

/// Whether `needle` occurs in `haystack` bounded by non-alphanumeric characters
/// or the ends of the string.
pub(crate) fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_ascii_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_ascii_alphanumeric());
        before_ok && after_ok
    })
}

// =============================================================================
// Tests
// =============================================================================
