//! Environment configuration.
//!
//! ```text
//! CIRCUITVIEW_VENDOR_PREFIX   regex stripped from header starts (empty disables)
//! CIRCUITVIEW_DELIMITER       single ASCII cell delimiter, default ';'
//! CIRCUITVIEW_PREFS           preferences file, default .circuitview/preferences.json
//! ```

use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::parser::DEFAULT_DELIMITER;
use crate::transform::{headers::DEFAULT_VENDOR_PREFIX, IngestOptions, Ingestor};

/// Preferences file used when `CIRCUITVIEW_PREFS` is unset
pub const DEFAULT_PREFS_PATH: &str = ".circuitview/preferences.json";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub delimiter: u8,
    pub vendor_prefix: String,
    pub prefs_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
            vendor_prefix: regex::escape(DEFAULT_VENDOR_PREFIX),
            prefs_path: PathBuf::from(DEFAULT_PREFS_PATH),
        }
    }
}

impl Config {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(prefix) = lookup("CIRCUITVIEW_VENDOR_PREFIX") {
            regex::Regex::new(&prefix)?;
            config.vendor_prefix = prefix;
        }
        if let Some(delim) = lookup("CIRCUITVIEW_DELIMITER") {
            config.delimiter = parse_delimiter(&delim)?;
        }
        if let Some(path) = lookup("CIRCUITVIEW_PREFS").filter(|p| !p.trim().is_empty()) {
            config.prefs_path = PathBuf::from(path);
        }

        Ok(config)
    }

    pub fn to_options(&self) -> IngestOptions {
        IngestOptions {
            delimiter: self.delimiter,
            vendor_prefix: self.vendor_prefix.clone(),
            ..IngestOptions::default()
        }
    }

    pub fn ingestor(&self) -> Result<Ingestor, ConfigError> {
        Ingestor::new(&self.to_options())
    }
}

/// Accepts one ASCII character, or `\t` / `tab` for tab-separated files.
pub fn parse_delimiter(raw: &str) -> Result<u8, ConfigError> {
    match raw {
        "\\t" | "tab" | "\t" => return Ok(b'\t'),
        _ => {}
    }
    let trimmed = raw.trim();
    match trimmed.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(ConfigError::InvalidDelimiter(raw.to_string())),
    }
}
