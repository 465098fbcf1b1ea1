//! Transformation module.
//!
//! This module turns decoded CSV rows into a typed dataset:
//! - Headers: alias table, header resolver, time column detection
//! - Coerce: timestamp and numeric cell parsing
//! - Normalize: one raw row to one record
//! - Pipeline: assembly, sorting and parameter discovery

pub mod coerce;
pub mod headers;
pub mod normalize;
pub mod pipeline;

pub use coerce::{coerce_number, parse_time_of_day, parse_time_text, TimeParseError};
pub use headers::{detect_time_column, AliasRule, AliasTable, HeaderMapping, HeaderResolver};
pub use normalize::{normalize_row, DroppedRow};
pub use pipeline::*;
