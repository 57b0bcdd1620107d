/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Application state: the preferences store, the bookmark store, and the
//! startup steps that tie them together.

use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};

use crate::persistence::{BookmarkStore, BookmarkStoreError};
use crate::prefs::{
    self, DEFAULT_TARGET_URL, LegacyUrlConfig, PrefsError, PrefsStore, migrate_legacy_url,
};

/// Where the app keeps its files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppDirs {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl AppDirs {
    /// Explicit overrides win; otherwise the platform directories.
    pub fn resolve(
        config_override: Option<PathBuf>,
        data_override: Option<PathBuf>,
    ) -> Result<Self, AppError> {
        let config_dir = config_override
            .or_else(prefs::default_config_dir)
            .ok_or(AppError::NoConfigDir)?;
        let data_dir = data_override
            .or_else(prefs::default_data_dir)
            .ok_or(AppError::NoDataDir)?;
        Ok(Self {
            config_dir,
            data_dir,
        })
    }
}

pub struct LinkshellApp {
    pub prefs: PrefsStore,
    pub store: Arc<BookmarkStore>,
    dirs: AppDirs,
}

impl LinkshellApp {
    /// Open both stores, seed a brand-new catalogue, and run the one-time
    /// legacy migration. Seed and migration failures are logged, not fatal.
    pub fn open(dirs: AppDirs) -> Result<Self, AppError> {
        let mut prefs = PrefsStore::open(&dirs.config_dir).map_err(AppError::Prefs)?;
        let store = BookmarkStore::open(dirs.data_dir.clone()).map_err(AppError::Store)?;

        match store.seed_if_new(DEFAULT_TARGET_URL) {
            Ok(Some(seed)) => info!("Seeded new catalogue with {}", seed.url),
            Ok(None) => {},
            Err(e) => warn!("Failed to seed bookmark catalogue: {e}"),
        }

        let legacy = LegacyUrlConfig::load(&dirs.config_dir);
        if let Err(e) = migrate_legacy_url(&mut prefs, &store, &legacy) {
            warn!("Legacy URL migration could not record its flag: {e}");
        }

        Ok(Self {
            prefs,
            store: Arc::new(store),
            dirs,
        })
    }

    pub fn dirs(&self) -> &AppDirs {
        &self.dirs
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    NoConfigDir,
    NoDataDir,
    Prefs(PrefsError),
    Store(BookmarkStoreError),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NoConfigDir => write!(f, "No config directory available; pass --config-dir"),
            AppError::NoDataDir => write!(f, "No data directory available; pass --data-dir"),
            AppError::Prefs(e) => write!(f, "{e}"),
            AppError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for AppError {}
