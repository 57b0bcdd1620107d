/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Global preferences, persisted as TOML under the user config directory.

pub mod legacy;

use std::path::{Path, PathBuf};

use linkshell_core::{OpenDefaults, OpenMode};
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};

pub use legacy::{DEFAULT_TARGET_URL, LegacyUrlConfig, migrate_legacy_url};

const PREFS_FILE: &str = "prefs.toml";
const APP_DIR: &str = "linkshell";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppPrefs {
    #[serde(deserialize_with = "lenient_open_mode")]
    pub default_open_mode: OpenMode,
    /// Blank means "system default".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_app_id: Option<String>,
    pub confirm_http_every_time: bool,
    pub did_migrate_legacy_url: bool,
}

impl Default for AppPrefs {
    fn default() -> Self {
        Self {
            default_open_mode: OpenMode::CustomView,
            preferred_app_id: None,
            confirm_http_every_time: true,
            did_migrate_legacy_url: false,
        }
    }
}

impl AppPrefs {
    pub fn preferred_app(&self) -> Option<&str> {
        self.preferred_app_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    pub fn open_defaults(&self) -> OpenDefaults {
        OpenDefaults {
            default_mode: self.default_open_mode,
            preferred_app_id: self.preferred_app().map(str::to_string),
        }
    }
}

/// Unknown or misspelled modes fall back to the default instead of
/// rejecting the whole file.
fn lenient_open_mode<'de, D>(deserializer: D) -> Result<OpenMode, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.parse().unwrap_or_else(|e| {
        warn!("Ignoring stored default_open_mode: {e}");
        OpenMode::default()
    }))
}

/// Write-through preferences store. Every setter persists immediately.
pub struct PrefsStore {
    path: PathBuf,
    prefs: AppPrefs,
}

impl PrefsStore {
    /// Load `prefs.toml` from `config_dir`; a missing file yields defaults.
    pub fn open(config_dir: &Path) -> Result<Self, PrefsError> {
        let path = config_dir.join(PREFS_FILE);
        let prefs = match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content)
                .map_err(|e| PrefsError::Parse(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => AppPrefs::default(),
            Err(e) => {
                return Err(PrefsError::Io(format!(
                    "Failed to read {}: {e}",
                    path.display()
                )));
            },
        };
        debug!("Loaded preferences from {}", path.display());
        Ok(Self { path, prefs })
    }

    pub fn prefs(&self) -> &AppPrefs {
        &self.prefs
    }

    pub fn set_default_open_mode(&mut self, mode: OpenMode) -> Result<(), PrefsError> {
        self.prefs.default_open_mode = mode;
        self.save()
    }

    pub fn set_preferred_app_id(&mut self, app_id: Option<String>) -> Result<(), PrefsError> {
        self.prefs.preferred_app_id = app_id.filter(|id| !id.trim().is_empty());
        self.save()
    }

    pub fn set_confirm_http_every_time(&mut self, confirm: bool) -> Result<(), PrefsError> {
        self.prefs.confirm_http_every_time = confirm;
        self.save()
    }

    pub fn mark_legacy_migrated(&mut self) -> Result<(), PrefsError> {
        self.prefs.did_migrate_legacy_url = true;
        self.save()
    }

    fn save(&self) -> Result<(), PrefsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PrefsError::Io(format!("Failed to create dir: {e}")))?;
        }
        let content = toml::to_string_pretty(&self.prefs)
            .map_err(|e| PrefsError::Serialize(format!("{e}")))?;
        std::fs::write(&self.path, content).map_err(|e| {
            PrefsError::Io(format!("Failed to write {}: {e}", self.path.display()))
        })
    }
}

/// `<config dir>/linkshell`, home of `prefs.toml` and the legacy config.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR))
}

/// `<data dir>/linkshell`, home of the bookmark database.
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrefsError {
    Io(String),
    Parse(String),
    Serialize(String),
}

impl std::fmt::Display for PrefsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrefsError::Io(e) => write!(f, "IO error: {e}"),
            PrefsError::Parse(e) => write!(f, "Preferences parse error: {e}"),
            PrefsError::Serialize(e) => write!(f, "Preferences serialize error: {e}"),
        }
    }
}

impl std::error::Error for PrefsError {}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let store = PrefsStore::open(dir.path()).unwrap();
        assert_eq!(store.prefs(), &AppPrefs::default());
        assert!(store.prefs().confirm_http_every_time);
        assert_eq!(store.prefs().default_open_mode, OpenMode::CustomView);
    }

    #[test]
    fn test_setters_write_through() {
        let dir = TempDir::new().unwrap();
        {
            let mut store = PrefsStore::open(dir.path()).unwrap();
            store.set_default_open_mode(OpenMode::InSession).unwrap();
            store.set_preferred_app_id(Some("firefox".into())).unwrap();
            store.set_confirm_http_every_time(false).unwrap();
        }
        let store = PrefsStore::open(dir.path()).unwrap();
        assert_eq!(store.prefs().default_open_mode, OpenMode::InSession);
        assert_eq!(store.prefs().preferred_app(), Some("firefox"));
        assert!(!store.prefs().confirm_http_every_time);
        assert!(!store.prefs().did_migrate_legacy_url);
    }

    #[test]
    fn test_blank_preferred_app_is_cleared() {
        let dir = TempDir::new().unwrap();
        let mut store = PrefsStore::open(dir.path()).unwrap();
        store.set_preferred_app_id(Some("  ".into())).unwrap();
        assert_eq!(store.prefs().preferred_app_id, None);
        assert_eq!(store.prefs().open_defaults().preferred_app_id, None);
    }

    #[test]
    fn test_partial_and_unknown_values_fall_back() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(PREFS_FILE),
            "default_open_mode = \"tabs\"\npreferred_app_id = \"\"\n",
        )
        .unwrap();
        let store = PrefsStore::open(dir.path()).unwrap();
        assert_eq!(store.prefs().default_open_mode, OpenMode::CustomView);
        assert!(store.prefs().confirm_http_every_time);
        assert_eq!(store.prefs().preferred_app(), None);
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(PREFS_FILE), "confirm_http_every_time = maybe").unwrap();
        assert!(matches!(
            PrefsStore::open(dir.path()),
            Err(PrefsError::Parse(_))
        ));
    }
}
