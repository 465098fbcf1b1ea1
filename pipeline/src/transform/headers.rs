//! Header aliasing and time column detection.
//!
//! Raw headers from meter exports are noisy ("IOITSecure447>Voltage R",
//! "Total kW", "PF avg"). The resolver maps them to canonical parameter names
//! through an ordered alias table; anything it does not recognize passes
//! through in cleaned form.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, IngestResult};
use crate::models::{contains_word, RECORD_FIELDS};

/// Vendor token some gateways prepend to every column name.
pub const DEFAULT_VENDOR_PREFIX: &str = "ioitsecure447>";

/// Substrings identifying the time column, highest priority first.
pub const TIME_CANDIDATES: [&str; 3] = ["time", "timestamp", "date"];

// =============================================================================
// Alias table
// =============================================================================

/// One classification rule: a canonical name and the fragments that select it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasRule {
    pub canonical: String,
    pub aliases: Vec<String>,
}

impl AliasRule {
    pub fn new(canonical: impl Into<String>, aliases: &[&str]) -> Self {
        Self {
            canonical: canonical.into(),
            aliases: aliases.iter().map(|a| a.to_lowercase()).collect(),
        }
    }

    /// Whether any alias appears as a whole word run in the cleaned header.
    pub fn matches(&self, cleaned: &str) -> bool {
        self.aliases.iter().any(|alias| contains_word(cleaned, alias))
    }
}

/// Ordered alias rules. Scanned front to back, first match wins, so a header
/// that could plausibly fit two rules goes to the earlier one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AliasTable {
    rules: Vec<AliasRule>,
}

impl AliasTable {
    pub fn new(rules: Vec<AliasRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|r| AliasRule {
                aliases: r.aliases.iter().map(|a| a.trim().to_lowercase()).collect(),
                canonical: r.canonical,
            })
            .collect();
        Self { rules }
    }

    /// Load a table from a JSON array of `{"canonical": ..., "aliases": [...]}`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let rules: Vec<AliasRule> = serde_json::from_str(json)?;
        Ok(Self::new(rules))
    }

    pub fn rules(&self) -> &[AliasRule] {
        &self.rules
    }

    /// Canonical name of the first rule matching `cleaned`.
    pub fn lookup(&self, cleaned: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.matches(cleaned))
            .map(|rule| rule.canonical.as_str())
    }
}

impl Default for AliasTable {
    /// The electrical metering vocabulary.
    fn default() -> Self {
        Self::new(vec![
            AliasRule::new("R phase voltage", &["r phase voltage", "voltage r", "voltage rn"]),
            AliasRule::new("Y phase voltage", &["y phase voltage", "voltage y", "voltage yn"]),
            AliasRule::new("B phase voltage", &["b phase voltage", "voltage b", "voltage bn"]),
            AliasRule::new("Average phase voltage", &["average phase voltage", "avg voltage"]),
            AliasRule::new("Power factor", &["power factor", "pf"]),
            AliasRule::new("R phase line current", &["r phase line current", "current r", "current r1"]),
            AliasRule::new("Y phase line current", &["y phase line current", "current y", "current y1"]),
            AliasRule::new("B phase line current", &["b phase line current", "current b", "current b1"]),
            AliasRule::new("Neutral current", &["neutral current", "n current"]),
            AliasRule::new("Active power", &["active power", "kw"]),
            AliasRule::new("Reactive power", &["reactive power", "kvar"]),
            AliasRule::new("Apparent power", &["apparent power", "kva"]),
        ])
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// A raw header and the name its values are published under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderMapping {
    pub original: String,
    pub mapped: String,
}

/// Maps raw headers to canonical names.
#[derive(Debug, Clone)]
pub struct HeaderResolver {
    table: AliasTable,
    vendor_prefix: Option<Regex>,
}

impl HeaderResolver {
    /// Build a resolver. `vendor_prefix` is a regex matched case-insensitively
    /// at the start of the header; an empty pattern disables stripping.
    pub fn new(table: AliasTable, vendor_prefix: &str) -> Result<Self, regex::Error> {
        let vendor_prefix = if vendor_prefix.is_empty() {
            None
        } else {
            Some(Regex::new(&format!("(?i)^(?:{})", vendor_prefix))?)
        };
        Ok(Self { table, vendor_prefix })
    }

    pub fn table(&self) -> &AliasTable {
        &self.table
    }

    /// Lowercase, trim and strip the vendor prefix.
    pub fn clean(&self, raw: &str) -> String {
        let lower = raw.trim().to_lowercase();
        match &self.vendor_prefix {
            Some(re) => re.replace(&lower, "").trim().to_string(),
            None => lower,
        }
    }

    /// Canonical name for a raw header, or its cleaned text when no alias applies.
    ///
    /// Names that would shadow a record field get a ` (column)` suffix.
    pub fn resolve(&self, raw: &str) -> String {
        let cleaned = self.clean(raw);
        let name = match self.table.lookup(&cleaned) {
            Some(canonical) => canonical.to_string(),
            None => cleaned,
        };
        if RECORD_FIELDS.contains(&name.as_str()) {
            format!("{} (column)", name)
        } else {
            name
        }
    }

    /// Resolve every header once, keeping file order.
    pub fn header_map(&self, headers: &[String]) -> Vec<HeaderMapping> {
        headers
            .iter()
            .map(|h| HeaderMapping {
                original: h.clone(),
                mapped: self.resolve(h),
            })
            .collect()
    }
}

impl Default for HeaderResolver {
    fn default() -> Self {
        Self {
            table: AliasTable::default(),
            vendor_prefix: Regex::new(&format!("(?i)^(?:{})", regex::escape(DEFAULT_VENDOR_PREFIX))).ok(),
        }
    }
}

/// Find the time column.
///
/// Each candidate is tried against every header before moving to the next
/// one, so a header containing "time" beats one containing "date" wherever it
/// sits in the file.
pub fn detect_time_column(headers: &[String]) -> IngestResult<&str> {
    TIME_CANDIDATES
        .iter()
        .find_map(|candidate| {
            headers
                .iter()
                .find(|h| h.to_lowercase().contains(*candidate))
        })
        .map(|h| h.as_str())
        .ok_or(IngestError::NoTimeColumn)
}
