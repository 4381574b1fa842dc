//! TOML-based persistence for input aliases and favourites.
//!
//! Reads and writes [`PreferencesFile`] to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\monitor-switch\config.toml`
//! - Linux:    `~/.config/monitor-switch/config.toml`
//! - macOS:    `~/Library/Application Support/monitor-switch/config.toml`
//!
//! The `MONSWITCH_CONFIG` environment variable overrides the location.
//!
//! # File layout
//!
//! ```toml
//! version = 1
//!
//! [[aliases]]
//! monitor_id = "ACME123"
//! input = 21
//! alias = "Laptop"
//!
//! [[favorites]]
//! monitor_id = "ACME123"
//! input = 21
//! ```
//!
//! Aliases and favourites are stored as arrays of tables rather than nested
//! maps because TOML table keys must be strings and the input code is a number.
//!
//! # Importing JSON preferences
//!
//! Earlier Monitor Switch releases kept the same preferences as JSON in
//! `~/.config/monitor-switch/config.json`.  When the TOML file does not exist
//! yet, [`PreferenceStore::open`] converts that file once and writes the
//! result as TOML.  The JSON file is left in place.
//!
//! # Failure policy
//!
//! A missing file is an empty store.  An unreadable or malformed file is also
//! treated as empty (with a warning) so a corrupt config can never stop the
//! menu from appearing.  Writes happen on every mutation; if a write fails the
//! in-memory change is discarded and the mutation reports failure.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use monswitch_core::{normalize_alias, Favorite, InputSource};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Environment variable that overrides the preference file location.
pub const CONFIG_PATH_ENV: &str = "MONSWITCH_CONFIG";

/// File name of the JSON preferences written by earlier releases.
pub const LEGACY_FILE_NAME: &str = "config.json";

/// Error type for preference file operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing preferences at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse preferences TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The preferences could not be serialized to TOML.
    #[error("failed to serialize preferences: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A JSON preference file from an earlier release could not be parsed.
    #[error("failed to parse legacy JSON preferences: {0}")]
    Legacy(#[from] serde_json::Error),
}

// ── File schema ───────────────────────────────────────────────────────────────

/// Everything persisted in the preference file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreferencesFile {
    /// Schema version – bump when breaking changes are introduced.
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub aliases: Vec<AliasEntry>,
    #[serde(default)]
    pub favorites: Vec<FavoriteEntry>,
}

/// One `(monitor, input) → label` override.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AliasEntry {
    pub monitor_id: String,
    pub input: InputSource,
    pub alias: String,
}

/// One favourited `(monitor, input)` pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FavoriteEntry {
    pub monitor_id: String,
    pub input: InputSource,
}

fn default_version() -> u32 {
    1
}

impl Default for PreferencesFile {
    fn default() -> Self {
        Self {
            version: default_version(),
            aliases: Vec::new(),
            favorites: Vec::new(),
        }
    }
}

impl PreferencesFile {
    pub fn alias(&self, monitor_id: &str, input: InputSource) -> Option<&str> {
        self.aliases
            .iter()
            .find(|a| a.monitor_id == monitor_id && a.input == input)
            .map(|a| a.alias.as_str())
    }

    /// Sets or replaces an alias.  An empty label removes the alias instead.
    pub fn set_alias(&mut self, monitor_id: &str, input: InputSource, alias: &str) {
        let Some(alias) = normalize_alias(alias) else {
            self.remove_alias(monitor_id, input);
            return;
        };
        match self
            .aliases
            .iter_mut()
            .find(|a| a.monitor_id == monitor_id && a.input == input)
        {
            Some(entry) => entry.alias = alias.to_string(),
            None => self.aliases.push(AliasEntry {
                monitor_id: monitor_id.to_string(),
                input,
                alias: alias.to_string(),
            }),
        }
    }

    pub fn remove_alias(&mut self, monitor_id: &str, input: InputSource) {
        self.aliases
            .retain(|a| !(a.monitor_id == monitor_id && a.input == input));
    }

    pub fn is_favorite(&self, monitor_id: &str, input: InputSource) -> bool {
        self.favorites
            .iter()
            .any(|f| f.monitor_id == monitor_id && f.input == input)
    }

    /// Adds a favourite at the end of the list; no-op if already present.
    pub fn add_favorite(&mut self, monitor_id: &str, input: InputSource) {
        if !self.is_favorite(monitor_id, input) {
            self.favorites.push(FavoriteEntry {
                monitor_id: monitor_id.to_string(),
                input,
            });
        }
    }

    pub fn remove_favorite(&mut self, monitor_id: &str, input: InputSource) {
        self.favorites
            .retain(|f| !(f.monitor_id == monitor_id && f.input == input));
    }

    /// Favourites in insertion order.
    pub fn favorites(&self) -> Vec<Favorite> {
        self.favorites
            .iter()
            .map(|f| Favorite::new(f.monitor_id.clone(), f.input))
            .collect()
    }
}

// ── Paths and file I/O ────────────────────────────────────────────────────────

/// Resolves the preference file path: `$MONSWITCH_CONFIG` if set, otherwise
/// `config.toml` in the platform config directory.
///
/// # Errors
///
/// Returns [`StoreError::NoPlatformConfigDir`] if neither is available.
pub fn default_config_path() -> Result<PathBuf, StoreError> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(path));
    }
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(StoreError::NoPlatformConfigDir)
}

/// Loads preferences from `path`, returning an empty store if the file does
/// not exist.
///
/// # Errors
///
/// Returns [`StoreError::Io`] for file-system errors other than "not found",
/// and [`StoreError::Parse`] if the TOML is malformed.
pub fn load_preferences(path: &Path) -> Result<PreferencesFile, StoreError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(PreferencesFile::default()),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persists `prefs` to `path`, creating the parent directory if needed.
///
/// # Errors
///
/// Returns [`StoreError::Io`] for file-system failures or
/// [`StoreError::Serialize`] if serialization fails.
pub fn save_preferences(path: &Path, prefs: &PreferencesFile) -> Result<(), StoreError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(prefs)?;
    std::fs::write(path, content).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config base directory including the
/// `monitor-switch` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("monitor-switch"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("monitor-switch"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("monitor-switch")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Legacy JSON import ────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
struct LegacyPreferences {
    #[serde(default)]
    monitors: HashMap<String, LegacyMonitor>,
    #[serde(default)]
    favorites: Vec<LegacyFavorite>,
}

#[derive(Debug, Default, Deserialize)]
struct LegacyMonitor {
    #[serde(default)]
    input_aliases: HashMap<u16, String>,
}

#[derive(Debug, Deserialize)]
struct LegacyFavorite {
    monitor_id: String,
    input_value: u16,
}

impl From<LegacyPreferences> for PreferencesFile {
    fn from(legacy: LegacyPreferences) -> Self {
        let mut prefs = PreferencesFile::default();

        // JSON objects are unordered; sort so the written TOML is stable.
        let mut monitors: Vec<_> = legacy.monitors.into_iter().collect();
        monitors.sort_by(|a, b| a.0.cmp(&b.0));
        for (monitor_id, monitor) in monitors {
            let mut aliases: Vec<_> = monitor.input_aliases.into_iter().collect();
            aliases.sort_unstable_by_key(|(code, _)| *code);
            for (code, alias) in aliases {
                prefs.set_alias(&monitor_id, InputSource::from_code(code), &alias);
            }
        }
        for favorite in legacy.favorites {
            prefs.add_favorite(&favorite.monitor_id, InputSource::from_code(favorite.input_value));
        }
        prefs
    }
}

/// Loads a JSON preference file written by an earlier release.
///
/// Returns `Ok(None)` when the file does not exist.
///
/// # Errors
///
/// Returns [`StoreError::Io`] for other file-system errors and
/// [`StoreError::Legacy`] if the JSON is malformed.
pub fn load_legacy_preferences(path: &Path) -> Result<Option<PreferencesFile>, StoreError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let legacy: LegacyPreferences = serde_json::from_str(&content)?;
            Ok(Some(legacy.into()))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes the first legacy file found in `candidates` to `path` as TOML.
///
/// Does nothing when `path` already exists.  Returns whether a file was
/// imported.
///
/// # Errors
///
/// Propagates read, parse and write failures.
pub fn import_legacy_preferences(path: &Path, candidates: &[PathBuf]) -> Result<bool, StoreError> {
    if path.exists() {
        return Ok(false);
    }
    for candidate in candidates {
        let Some(prefs) = load_legacy_preferences(candidate)? else {
            continue;
        };
        save_preferences(path, &prefs)?;
        info!(
            from = %candidate.display(),
            to = %path.display(),
            aliases = prefs.aliases.len(),
            favorites = prefs.favorites.len(),
            "imported legacy preferences"
        );
        return Ok(true);
    }
    Ok(false)
}

/// Where a legacy file may live for the TOML file at `path`: next to it, and
/// for the default location also the path earlier releases used on every
/// platform.
fn legacy_candidates(path: &Path, default_location: bool) -> Vec<PathBuf> {
    let mut candidates = vec![path.with_file_name(LEGACY_FILE_NAME)];
    if default_location {
        if let Some(home) = std::env::var_os("HOME") {
            let legacy = PathBuf::from(home)
                .join(".config")
                .join("monitor-switch")
                .join(LEGACY_FILE_NAME);
            if !candidates.contains(&legacy) {
                candidates.push(legacy);
            }
        }
    }
    candidates.retain(|candidate| candidate != path);
    candidates
}

// ── Store ─────────────────────────────────────────────────────────────────────

/// In-memory preferences bound to the file they were loaded from.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: Option<PathBuf>,
    prefs: PreferencesFile,
}

impl PreferenceStore {
    /// Opens the store at `path`, or at [`default_config_path`] when `None`.
    ///
    /// Imports a legacy JSON file first if the TOML file does not exist.
    ///
    /// Never fails: an unresolvable path yields an in-memory store whose
    /// writes all fail; an unreadable file yields an empty store.
    pub fn open(path: Option<PathBuf>) -> Self {
        let default_location = path.is_none() && std::env::var_os(CONFIG_PATH_ENV).is_none();
        let path = match path {
            Some(p) => Some(p),
            None => match default_config_path() {
                Ok(p) => Some(p),
                Err(e) => {
                    warn!("preferences will not be persisted: {e}");
                    None
                }
            },
        };
        if let Some(path) = path.as_deref() {
            if let Err(e) = import_legacy_preferences(path, &legacy_candidates(path, default_location)) {
                warn!("legacy preferences not imported: {e}");
            }
        }
        let mut store = Self {
            path,
            prefs: PreferencesFile::default(),
        };
        store.reload();
        store
    }

    /// Re-reads the file from disk, replacing the in-memory copy.
    pub fn reload(&mut self) {
        let Some(path) = self.path.as_deref() else {
            return;
        };
        self.prefs = match load_preferences(path) {
            Ok(prefs) => {
                debug!(
                    path = %path.display(),
                    aliases = prefs.aliases.len(),
                    favorites = prefs.favorites.len(),
                    "preferences loaded"
                );
                prefs
            }
            Err(e) => {
                warn!("ignoring unreadable preferences: {e}");
                PreferencesFile::default()
            }
        };
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn prefs(&self) -> &PreferencesFile {
        &self.prefs
    }

    /// Applies `change` to a copy of the preferences and writes it to disk.
    ///
    /// The in-memory copy is only replaced when the write succeeds.  Returns
    /// whether the change was persisted.
    pub fn update(&mut self, change: impl FnOnce(&mut PreferencesFile)) -> bool {
        let Some(path) = self.path.as_deref() else {
            warn!("preference change discarded: no config path");
            return false;
        };
        let mut next = self.prefs.clone();
        change(&mut next);
        match save_preferences(path, &next) {
            Ok(()) => {
                self.prefs = next;
                true
            }
            Err(e) => {
                warn!("preference change discarded: {e}");
                false
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_path() -> (PathBuf, PathBuf) {
        let dir = std::env::temp_dir().join(format!("monswitch_store_{}", Uuid::new_v4()));
        let path = dir.join("nested").join("config.toml");
        (dir, path)
    }

    // ── PreferencesFile ───────────────────────────────────────────────────────

    #[test]
    fn test_default_preferences_are_empty() {
        let prefs = PreferencesFile::default();
        assert_eq!(prefs.version, 1);
        assert!(prefs.aliases.is_empty());
        assert!(prefs.favorites.is_empty());
    }

    #[test]
    fn test_set_alias_replaces_existing_entry() {
        let mut prefs = PreferencesFile::default();
        prefs.set_alias("ACME123", InputSource::USB_C1, "Laptop");
        prefs.set_alias("ACME123", InputSource::USB_C1, "Work laptop");

        assert_eq!(prefs.aliases.len(), 1);
        assert_eq!(prefs.alias("ACME123", InputSource::USB_C1), Some("Work laptop"));
    }

    #[test]
    fn test_set_empty_alias_removes_entry() {
        let mut prefs = PreferencesFile::default();
        prefs.set_alias("ACME123", InputSource::USB_C1, "Laptop");

        prefs.set_alias("ACME123", InputSource::USB_C1, "");

        assert!(prefs.aliases.is_empty(), "empty alias must never be stored");
        assert_eq!(prefs.alias("ACME123", InputSource::USB_C1), None);
    }

    #[test]
    fn test_aliases_are_scoped_per_monitor() {
        let mut prefs = PreferencesFile::default();
        prefs.set_alias("A", InputSource::HDMI1, "Console");

        assert_eq!(prefs.alias("B", InputSource::HDMI1), None);
    }

    #[test]
    fn test_add_favorite_is_idempotent_and_ordered() {
        let mut prefs = PreferencesFile::default();
        prefs.add_favorite("A", InputSource::HDMI1);
        prefs.add_favorite("B", InputSource::USB_C1);
        prefs.add_favorite("A", InputSource::HDMI1);

        let favorites = prefs.favorites();
        assert_eq!(favorites.len(), 2);
        assert_eq!(favorites[0], Favorite::new("A", InputSource::HDMI1));
        assert_eq!(favorites[1], Favorite::new("B", InputSource::USB_C1));
    }

    #[test]
    fn test_remove_favorite_twice_leaves_it_absent() {
        let mut prefs = PreferencesFile::default();
        prefs.add_favorite("A", InputSource::HDMI1);

        prefs.remove_favorite("A", InputSource::HDMI1);
        prefs.remove_favorite("A", InputSource::HDMI1);

        assert!(!prefs.is_favorite("A", InputSource::HDMI1));
    }

    // ── TOML ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_preferences_round_trip_through_toml() {
        let mut prefs = PreferencesFile::default();
        prefs.set_alias("ACME123", InputSource::USB_C1, "Laptop");
        prefs.add_favorite("ACME123", InputSource::USB_C1);

        let text = toml::to_string_pretty(&prefs).expect("serialize");
        let restored: PreferencesFile = toml::from_str(&text).expect("deserialize");

        assert_eq!(prefs, restored);
        assert!(text.contains("[[aliases]]"));
        assert!(text.contains("input = 21"));
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let prefs: PreferencesFile = toml::from_str("").expect("deserialize empty");
        assert_eq!(prefs, PreferencesFile::default());
    }

    // ── Files ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_load_preferences_returns_default_when_file_absent() {
        let (_dir, path) = temp_path();
        let prefs = load_preferences(&path).expect("absent file is not an error");
        assert_eq!(prefs, PreferencesFile::default());
    }

    #[test]
    fn test_load_preferences_reports_malformed_toml() {
        let (dir, path) = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[[[ not toml").unwrap();

        assert!(matches!(load_preferences(&path), Err(StoreError::Parse(_))));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_store_update_writes_through_and_reloads() {
        // Arrange
        let (dir, path) = temp_path();
        let mut store = PreferenceStore::open(Some(path.clone()));

        // Act
        let saved = store.update(|p| p.add_favorite("ACME123", InputSource::USB_C1));
        let reopened = PreferenceStore::open(Some(path.clone()));

        // Assert
        assert!(saved);
        assert!(reopened.prefs().is_favorite("ACME123", InputSource::USB_C1));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_store_open_on_malformed_file_starts_empty() {
        let (dir, path) = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "favorites = 3").unwrap();

        let store = PreferenceStore::open(Some(path));

        assert_eq!(store.prefs(), &PreferencesFile::default());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_store_update_failure_keeps_previous_state() {
        // Arrange: the "directory" is a regular file, so create_dir_all fails.
        let (dir, _) = temp_path();
        std::fs::create_dir_all(&dir).unwrap();
        let blocker = dir.join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let mut store = PreferenceStore::open(Some(blocker.join("config.toml")));

        // Act
        let saved = store.update(|p| p.add_favorite("A", InputSource::HDMI1));

        // Assert
        assert!(!saved);
        assert!(!store.prefs().is_favorite("A", InputSource::HDMI1));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_reload_picks_up_external_edits() {
        let (dir, path) = temp_path();
        let mut store = PreferenceStore::open(Some(path.clone()));

        let mut external = PreferencesFile::default();
        external.set_alias("A", InputSource::HDMI2, "Console");
        save_preferences(&path, &external).expect("save");
        store.reload();

        assert_eq!(store.prefs().alias("A", InputSource::HDMI2), Some("Console"));
        std::fs::remove_dir_all(&dir).ok();
    }

    // ── Legacy JSON ───────────────────────────────────────────────────────────

    const LEGACY_JSON: &str = r#"{
        "monitors": {
            "ACME123": { "input_aliases": { "27": "Laptop", "17": "  Desktop " } },
            "EMPTY": {}
        },
        "favorites": [
            { "monitor_id": "ACME123", "input_value": 27 },
            { "monitor_id": "ACME123", "input_value": 27 }
        ]
    }"#;

    #[test]
    fn test_open_imports_legacy_json_next_to_the_config() {
        // Arrange
        let (dir, path) = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path.with_file_name(LEGACY_FILE_NAME), LEGACY_JSON).unwrap();

        // Act
        let store = PreferenceStore::open(Some(path.clone()));

        // Assert
        let prefs = store.prefs();
        assert_eq!(prefs.alias("ACME123", InputSource::from_code(27)), Some("Laptop"));
        assert_eq!(prefs.alias("ACME123", InputSource::HDMI1), Some("Desktop"));
        assert_eq!(prefs.favorites(), vec![Favorite::new("ACME123", InputSource::from_code(27))]);
        let written = load_preferences(&path).expect("imported file is valid TOML");
        assert_eq!(&written, prefs);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_existing_toml_is_never_overwritten_by_import() {
        // Arrange
        let (dir, path) = temp_path();
        let mut current = PreferencesFile::default();
        current.set_alias("ACME123", InputSource::HDMI1, "Current");
        save_preferences(&path, &current).expect("save");
        std::fs::write(path.with_file_name(LEGACY_FILE_NAME), LEGACY_JSON).unwrap();

        // Act
        let imported = import_legacy_preferences(&path, &[path.with_file_name(LEGACY_FILE_NAME)]);
        let store = PreferenceStore::open(Some(path.clone()));

        // Assert
        assert!(!imported.expect("no error"));
        assert_eq!(store.prefs(), &current);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_malformed_legacy_json_is_reported_and_skipped() {
        let (dir, path) = temp_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let legacy = path.with_file_name(LEGACY_FILE_NAME);
        std::fs::write(&legacy, "{ not json").unwrap();

        assert!(matches!(load_legacy_preferences(&legacy), Err(StoreError::Legacy(_))));
        let store = PreferenceStore::open(Some(path.clone()));

        assert_eq!(store.prefs(), &PreferencesFile::default());
        assert!(!path.exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_legacy_candidates_exclude_the_config_itself() {
        let path = PathBuf::from("/tmp/monswitch/config.json");

        assert!(legacy_candidates(&path, false).is_empty());
    }
}
