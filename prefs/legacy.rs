/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The single-URL configuration that predates the bookmark catalogue, and
//! its one-time migration into it.

use std::path::Path;

use linkshell_core::{Bookmark, BookmarkDraft, url_canon};
use log::{info, warn};
use serde::Deserialize;

use super::{PrefsError, PrefsStore};
use crate::persistence::BookmarkStore;

/// Built-in destination of the single-URL configuration; also the seed
/// bookmark of a fresh catalogue.
pub const DEFAULT_TARGET_URL: &str = "https://linux.do";

const LEGACY_FILE: &str = "url_config.toml";

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct LegacyUrlConfig {
    pub target_url: Option<String>,
}

impl LegacyUrlConfig {
    /// Read `url_config.toml` from `config_dir`. Missing or unreadable files
    /// read as empty.
    pub fn load(config_dir: &Path) -> Self {
        let path = config_dir.join(LEGACY_FILE);
        let Ok(content) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        toml::from_str(&content).unwrap_or_else(|e| {
            warn!("Ignoring unreadable {}: {e}", path.display());
            Self::default()
        })
    }

    /// The URL the single-URL configuration would open: the stored value
    /// when it is https, else the built-in default.
    pub fn effective_url(&self) -> &str {
        self.target_url
            .as_deref()
            .filter(|url| url_canon::is_https(url))
            .unwrap_or(DEFAULT_TARGET_URL)
    }
}

/// Import a customised legacy URL as a bookmark, once.
///
/// The migration flag is set whatever happens to the import, so a URL that
/// cannot be stored is never retried.
pub fn migrate_legacy_url(
    prefs: &mut PrefsStore,
    store: &BookmarkStore,
    legacy: &LegacyUrlConfig,
) -> Result<Option<Bookmark>, PrefsError> {
    if prefs.prefs().did_migrate_legacy_url {
        return Ok(None);
    }

    let imported = match legacy.target_url.as_deref() {
        Some(raw) if raw != DEFAULT_TARGET_URL => {
            match url_canon::try_normalize(raw).filter(|url| url_canon::is_valid_scheme(url)) {
                Some(normalized) => match store.add(&BookmarkDraft::new("", normalized)) {
                    Ok(bookmark) => {
                        info!("Migrated legacy URL {} into bookmarks", bookmark.url);
                        Some(bookmark)
                    },
                    Err(e) => {
                        warn!("Legacy URL migration skipped: {e}");
                        None
                    },
                },
                None => {
                    warn!("Legacy URL {raw} is not a valid http/https URL; not migrated");
                    None
                },
            }
        },
        _ => None,
    };

    prefs.mark_legacy_migrated()?;
    Ok(imported)
}
