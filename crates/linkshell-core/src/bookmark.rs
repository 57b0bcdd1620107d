/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Bookmark catalogue entries.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::open_mode::OpenMode;
use crate::url_canon;

/// Stable bookmark identity. Never changes on edit.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookmarkId(String);

impl BookmarkId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for BookmarkId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for BookmarkId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for BookmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: BookmarkId,
    pub title: String,
    /// Canonical URL; unique across the catalogue.
    pub url: String,
    /// Milliseconds since the Unix epoch.
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub rank: i64,
    pub open_mode: Option<OpenMode>,
    pub app_id: Option<String>,
}

impl Bookmark {
    /// Case-insensitive containment on title or URL. Blank queries match
    /// everything.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.title.to_lowercase().contains(&needle) || self.url.to_lowercase().contains(&needle)
    }
}

/// User input for an add or edit, before canonicalization.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BookmarkDraft {
    pub title: String,
    pub raw_url: String,
    pub open_mode: Option<OpenMode>,
    pub app_id: Option<String>,
}

impl BookmarkDraft {
    pub fn new(title: impl Into<String>, raw_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            raw_url: raw_url.into(),
            open_mode: None,
            app_id: None,
        }
    }

    pub fn with_open_mode(mut self, mode: Option<OpenMode>) -> Self {
        self.open_mode = mode;
        self
    }

    pub fn with_app_id(mut self, app_id: Option<String>) -> Self {
        self.app_id = app_id;
        self
    }

    /// Canonical URL plus the title to store: the trimmed title, or the
    /// URL's host when the title is blank. `None` when the URL is blank,
    /// does not parse, or does not canonicalize to http/https.
    pub fn canonicalize(&self) -> Option<CanonicalDraft> {
        if self.raw_url.trim().is_empty() {
            return None;
        }
        let url = url_canon::try_normalize(&self.raw_url)?;
        if !url_canon::is_valid_scheme(&url) {
            return None;
        }
        let title = match self.title.trim() {
            "" => url_canon::title_from_url(&url),
            title => title.to_string(),
        };
        let app_id = self
            .app_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);
        Some(CanonicalDraft {
            title,
            url,
            open_mode: self.open_mode,
            app_id,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalDraft {
    pub title: String,
    pub url: String,
    pub open_mode: Option<OpenMode>,
    pub app_id: Option<String>,
}

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> i64 {
    let nanos = time::OffsetDateTime::now_utc().unix_timestamp_nanos();
    i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX)
}
