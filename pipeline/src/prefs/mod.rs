//! Preferences - favorite parameters and the chart selection.
//!
//! Values live in a key/value [`PreferenceStore`]; the CLI uses a JSON file,
//! tests use the in-memory store.

use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PreferenceResult;

const FAVORITES_KEY: &str = "favorites";
const PRIMARY_KEY: &str = "selectedParam";
const SECONDARY_KEY: &str = "selectedParamSecondary";
const COMPARE_KEY: &str = "isCompareMode";

/// Favorites shown before the user has picked any
pub const DEFAULT_FAVORITES: [&str; 3] = ["Average phase voltage", "Power factor", "Active power"];

// =============================================================================
// Stores
// =============================================================================

pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value) -> PreferenceResult<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: Map<String, Value>,
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> PreferenceResult<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }
}

/// One JSON object on disk, rewritten on every `set`.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonFileStore {
    /// Open the store. A missing file is an empty store; an unreadable one is an error.
    pub fn open(path: impl AsRef<Path>) -> PreferenceResult<Self> {
        let path = PathBuf::from(path.as_ref());
        let values = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                Map::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Map::new()
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> PreferenceResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> PreferenceResult<()> {
        self.values.insert(key.to_string(), value);
        self.flush()
    }
}

// =============================================================================
// Favorites
// =============================================================================

/// Favorite parameters, persisted as a JSON array of names.
pub struct Favorites<S: PreferenceStore> {
    store: S,
    list: Vec<String>,
}

impl<S: PreferenceStore> Favorites<S> {
    pub fn load(store: S) -> Self {
        let list = store
            .get(FAVORITES_KEY)
            .and_then(|v| serde_json::from_value::<Vec<String>>(v).ok())
            .unwrap_or_else(|| DEFAULT_FAVORITES.iter().map(|s| s.to_string()).collect());
        Self { store, list }
    }

    pub fn list(&self) -> &[String] {
        &self.list
    }

    pub fn contains(&self, parameter: &str) -> bool {
        self.list.iter().any(|p| p == parameter)
    }

    /// Add the parameter if absent, remove it if present. Returns whether it
    /// is a favorite afterwards.
    pub fn toggle(&mut self, parameter: &str) -> PreferenceResult<bool> {
        if parameter.trim().is_empty() {
            return Ok(false);
        }
        let now_favorite = if let Some(pos) = self.list.iter().position(|p| p == parameter) {
            self.list.remove(pos);
            false
        } else {
            self.list.push(parameter.to_string());
            true
        };
        self.persist()?;
        Ok(now_favorite)
    }

    /// Drop favorites the current dataset does not publish. An empty
    /// parameter list means no dataset yet, and leaves the list alone.
    pub fn retain_available(&mut self, parameters: &[String]) -> PreferenceResult<usize> {
        if parameters.is_empty() {
            return Ok(0);
        }
        let before = self.list.len();
        self.list.retain(|f| parameters.contains(f));
        let removed = before - self.list.len();
        if removed > 0 {
            self.persist()?;
        }
        Ok(removed)
    }

    /// Favorites present in the dataset, in favorite order.
    pub fn visible<'a>(&'a self, parameters: &'a [String]) -> Vec<&'a str> {
        self.list
            .iter()
            .filter(|f| parameters.contains(*f))
            .map(|f| f.as_str())
            .collect()
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn persist(&mut self) -> PreferenceResult<()> {
        self.store.set(FAVORITES_KEY, serde_json::to_value(&self.list)?)
    }
}

// =============================================================================
// Chart selection
// =============================================================================

/// Which parameters the charts show.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSelection {
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub compare_mode: bool,
}

impl ChartSelection {
    pub fn load(store: &impl PreferenceStore) -> Self {
        let text = |key: &str| store.get(key).and_then(|v| v.as_str().map(String::from));
        Self {
            primary: text(PRIMARY_KEY),
            secondary: text(SECONDARY_KEY),
            compare_mode: store.get(COMPARE_KEY).and_then(|v| v.as_bool()).unwrap_or(false),
        }
    }

    pub fn save(&self, store: &mut impl PreferenceStore) -> PreferenceResult<()> {
        let text = |v: &Option<String>| v.clone().map(Value::String).unwrap_or(Value::Null);
        store.set(PRIMARY_KEY, text(&self.primary))?;
        store.set(SECONDARY_KEY, text(&self.secondary))?;
        store.set(COMPARE_KEY, Value::Bool(self.compare_mode))
    }

    /// Fit the selection to a new parameter list.
    pub fn reconcile(&mut self, parameters: &[String]) {
        if parameters.is_empty() {
            self.primary = None;
            self.secondary = None;
            return;
        }
        if !self.primary.as_ref().is_some_and(|p| parameters.contains(p)) {
            self.primary = parameters.first().cloned();
        }
        if self.secondary.as_ref().is_some_and(|s| !parameters.contains(s)) {
            self.secondary = None;
        }
    }

    pub fn set_compare_mode(&mut self, on: bool) {
        self.compare_mode = on;
        if !on {
            self.secondary = None;
        }
    }

    /// The secondary parameter, only while comparing.
    pub fn active_secondary(&self) -> Option<&str> {
        if self.compare_mode {
            self.secondary.as_deref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn params(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_favorites() {
        let favs = Favorites::load(MemoryStore::default());
        assert_eq!(favs.list(), &params(&DEFAULT_FAVORITES));
    }

    #[test]
    fn test_toggle() {
        let mut favs = Favorites::load(MemoryStore::default());
        assert!(favs.toggle("Neutral current").unwrap());
        assert!(favs.contains("Neutral current"));
        assert!(!favs.toggle("Power factor").unwrap());
        assert!(!favs.contains("Power factor"));
        assert!(!favs.toggle("  ").unwrap());
        assert_eq!(favs.list().len(), 3);

        let store = favs.into_store();
        assert_eq!(
            store.get("favorites").unwrap(),
            serde_json::json!(["Average phase voltage", "Active power", "Neutral current"])
        );
    }

    #[test]
    fn test_retain_available() {
        let mut favs = Favorites::load(MemoryStore::default());
        assert_eq!(favs.retain_available(&[]).unwrap(), 0);
        assert_eq!(favs.list().len(), 3);

        let removed = favs.retain_available(&params(&["Active power", "kwh total"])).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(favs.list(), &params(&["Active power"]));
    }

    #[test]
    fn test_visible() {
        let favs = Favorites::load(MemoryStore::default());
        let available = params(&["Active power", "Power factor", "Neutral current"]);
        assert_eq!(favs.visible(&available), vec!["Power factor", "Active power"]);
    }

    #[test]
    fn test_reconcile() {
        let mut sel = ChartSelection {
            primary: Some("Gone".into()),
            secondary: Some("Also gone".into()),
            compare_mode: true,
        };
        sel.reconcile(&params(&["Active power", "Power factor"]));
        assert_eq!(sel.primary.as_deref(), Some("Active power"));
        assert_eq!(sel.secondary, None);

        sel.secondary = Some("Power factor".into());
        sel.reconcile(&params(&["Power factor", "Active power"]));
        assert_eq!(sel.primary.as_deref(), Some("Active power"));
        assert_eq!(sel.active_secondary(), Some("Power factor"));

        sel.set_compare_mode(false);
        assert_eq!(sel.secondary, None);

        sel.reconcile(&[]);
        assert_eq!(sel.primary, None);
    }

    #[test]
    fn test_json_file_store_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        assert!(store.get("selectedParam").is_none());

        let sel = ChartSelection {
            primary: Some("Power factor".into()),
            secondary: None,
            compare_mode: true,
        };
        sel.save(&mut store).unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(ChartSelection::load(&reopened), sel);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "not json").unwrap();
        assert!(JsonFileStore::open(&path).is_err());
    }
}
