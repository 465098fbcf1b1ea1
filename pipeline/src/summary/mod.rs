//! Per-parameter statistics and the downloadable summary report.
//!
//! Summaries only read the dataset; computing one twice, or on a dataset
//! re-ingested from [`export_csv`], gives the same numbers.

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{SummaryError, SummaryResult};
use crate::models::{Dataset, ParameterDescriptor};

pub mod export;

pub use export::export_csv;

/// Min/max/average of one parameter over a dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSummary {
    pub parameter: String,
    pub unit: &'static str,
    /// Records in the dataset, whether or not they carry this parameter.
    pub data_points: usize,
    /// Records that carry a value for this parameter.
    pub samples: usize,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

/// Summarize one published parameter.
pub fn summarize(dataset: &Dataset, parameter: &str) -> SummaryResult<ParameterSummary> {
    if dataset.is_empty() {
        return Err(SummaryError::NoData);
    }
    if !dataset.has_parameter(parameter) {
        return Err(SummaryError::UnknownParameter(parameter.to_string()));
    }

    let (samples, min, max, sum) = dataset.values(parameter).fold(
        (0usize, f64::INFINITY, f64::NEG_INFINITY, 0.0),
        |(n, min, max, sum), v| (n + 1, min.min(v), max.max(v), sum + v),
    );

    if samples == 0 {
        return Err(SummaryError::NoValues(parameter.to_string()));
    }

    Ok(ParameterSummary {
        parameter: parameter.to_string(),
        unit: ParameterDescriptor::describe(parameter).unit,
        data_points: dataset.len(),
        samples,
        min,
        max,
        avg: sum / samples as f64,
    })
}

/// Summaries for every published parameter, in parameter order.
pub fn summarize_all(dataset: &Dataset) -> SummaryResult<Vec<ParameterSummary>> {
    dataset
        .parameters
        .iter()
        .map(|p| summarize(dataset, p))
        .collect()
}

/// The text report offered for download next to the main chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub primary: ParameterSummary,
    /// Present only in compare mode with a second parameter picked.
    pub secondary: Option<ParameterSummary>,
}

impl SummaryReport {
    pub fn build(dataset: &Dataset, primary: &str, secondary: Option<&str>) -> SummaryResult<Self> {
        Ok(Self {
            primary: summarize(dataset, primary)?,
            secondary: secondary.map(|s| summarize(dataset, s)).transpose()?,
        })
    }

    pub fn render(&self) -> String {
        let p = &self.primary;
        let mut lines = vec![
            format!("Summary Report for: {}", p.parameter),
            format!("Data Points: {}", p.data_points),
            "---".to_string(),
        ];
        lines.extend(stat_lines(p));

        if let Some(s) = &self.secondary {
            lines.push(String::new());
            lines.push(format!("Secondary Parameter: {}", s.parameter));
            lines.push("---".to_string());
            lines.extend(stat_lines(s));
        }

        lines.join("\n")
    }
}

fn stat_lines(s: &ParameterSummary) -> [String; 3] {
    [
        format!("Minimum: {:.2} {}", s.min, s.unit),
        format!("Maximum: {:.2} {}", s.max, s.unit),
        format!("Average: {:.2} {}", s.avg, s.unit),
    ]
}

/// `circuitview_summary_Active_power_2024-01-01.txt`
pub fn summary_file_name(parameter: &str, date: NaiveDate) -> String {
    format!(
        "circuitview_summary_{}_{}.txt",
        parameter.replace(' ', "_"),
        date.format("%Y-%m-%d")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Record;

    fn dataset() -> Dataset {
        let rows = [
            (1000, Some(230.0), Some(1.0)),
            (2000, Some(232.0), None),
            (3000, Some(234.5), Some(3.0)),
        ];
        let records = rows
            .iter()
            .enumerate()
            .map(|(i, (t, v, p))| {
                let mut r = Record::new(i as u64 + 2, *t, format!("d 00:00:0{}", i + 1));
                r.index = i;
                if let Some(v) = v {
                    r.values.insert("R phase voltage".into(), *v);
                }
                if let Some(p) = p {
                    r.values.insert("Active power".into(), *p);
                }
                r
            })
            .collect();
        Dataset {
            records,
            parameters: vec!["R phase voltage".into(), "Active power".into()],
        }
    }

    #[test]
    fn test_summarize() {
        let s = summarize(&dataset(), "Active power").unwrap();
        assert_eq!(s.data_points, 3);
        assert_eq!(s.samples, 2);
        assert_eq!(s.min, 1.0);
        assert_eq!(s.max, 3.0);
        assert_eq!(s.avg, 2.0);
        assert_eq!(s.unit, "kW");
    }

    #[test]
    fn test_summarize_is_repeatable() {
        let ds = dataset();
        let before = ds.clone();
        let first = summarize_all(&ds).unwrap();
        let second = summarize_all(&ds).unwrap();
        assert_eq!(first, second);
        assert_eq!(ds, before);
    }

    #[test]
    fn test_summary_errors() {
        assert_eq!(summarize(&Dataset::default(), "kW"), Err(SummaryError::NoData));
        assert_eq!(
            summarize(&dataset(), "Power factor"),
            Err(SummaryError::UnknownParameter("Power factor".into()))
        );
    }

    #[test]
    fn test_render_primary_only() {
        let report = SummaryReport::build(&dataset(), "R phase voltage", None).unwrap();
        let expected = "Summary Report for: R phase voltage\n\
                        Data Points: 3\n\
                        ---\n\
                        Minimum: 230.00 V\n\
                        Maximum: 234.50 V\n\
                        Average: 232.17 V";
        assert_eq!(report.render(), expected);
    }

    #[test]
    fn test_render_with_secondary() {
        let report = SummaryReport::build(&dataset(), "R phase voltage", Some("Active power")).unwrap();
        let text = report.render();
        assert!(text.contains("\n\nSecondary Parameter: Active power\n---\n"));
        assert!(text.ends_with("Average: 2.00 kW"));
    }

    #[test]
    fn test_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(
            summary_file_name("Active power", date),
            "circuitview_summary_Active_power_2024-01-01.txt"
        );
    }
}
