//! # CircuitView - electrical meter CSV ingestion
//!
//! CircuitView turns semicolon-delimited meter exports into a time-ordered
//! dataset of numeric readings, ready for charting and summary reports.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV bytes  │────▶│   Parser    │────▶│  Transform  │────▶│   Dataset   │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │ (alias+sort)│     │ (time-ord.) │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//!                                                                    │
//!                                         ┌─────────────┐            │
//!                                         │  Summary /  │◀───────────┘
//!                                         │   Export    │
//!                                         └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use circuitview::{ingest_bytes, SummaryReport};
//!
//! let outcome = ingest_bytes(&std::fs::read("meter.csv")?)?;
//! let report = SummaryReport::build(&outcome.dataset, "Active power", None)?;
//! println!("{}", report.render());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Record, Dataset, parameter descriptors
//! - [`parser`] - CSV decoding with encoding detection
//! - [`transform`] - Header aliasing, row normalization, assembly
//! - [`summary`] - Statistics, text report and CSV export
//! - [`session`] - Upload state around the current dataset
//! - [`prefs`] - Favorites and chart selection
//! - [`config`] - Environment configuration
//! - [`logs`] - Progress messages

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Consumers
pub mod session;
pub mod summary;

// Ambient
pub mod config;
pub mod logs;
pub mod prefs;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    DecodeError,
    IngestError,
    PreferenceError,
    SessionError,
    SummaryError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{ChartKind, Dataset, ParameterDescriptor, Record, DAY_MS};

// =============================================================================
// Re-exports - CSV Parsing
// =============================================================================

pub use parser::{decode_bytes, decode_content, detect_encoding, parse_table, RawRow, RawTable};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    assemble,
    coerce_number,
    detect_time_column,
    ingest_bytes,
    parse_time_of_day,
    AliasRule,
    AliasTable,
    Assembled,
    CsvInfo,
    DroppedRow,
    HeaderMapping,
    HeaderResolver,
    IngestOptions,
    IngestOutcome,
    IngestReport,
    Ingestor,
};

// =============================================================================
// Re-exports - Summary, session, preferences
// =============================================================================

pub use summary::{export_csv, summarize, summarize_all, summary_file_name, ParameterSummary, SummaryReport};

pub use session::{IngestState, Session};

pub use prefs::{ChartSelection, Favorites, JsonFileStore, MemoryStore, PreferenceStore};

pub use config::Config;
