/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Serializable types for bookmark persistence.

use linkshell_core::{Bookmark, BookmarkId, OpenMode};
use rkyv::{Archive, Deserialize, Serialize};

/// Open-mode override as stored (mirrors [`OpenMode`]).
#[derive(Archive, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[rkyv(derive(Debug, PartialEq))]
pub enum PersistedOpenMode {
    CustomView,
    ExternalApp,
    InSession,
}

impl From<OpenMode> for PersistedOpenMode {
    fn from(mode: OpenMode) -> Self {
        match mode {
            OpenMode::CustomView => Self::CustomView,
            OpenMode::ExternalApp => Self::ExternalApp,
            OpenMode::InSession => Self::InSession,
        }
    }
}

impl From<PersistedOpenMode> for OpenMode {
    fn from(mode: PersistedOpenMode) -> Self {
        match mode {
            PersistedOpenMode::CustomView => Self::CustomView,
            PersistedOpenMode::ExternalApp => Self::ExternalApp,
            PersistedOpenMode::InSession => Self::InSession,
        }
    }
}

/// Persisted bookmark row, keyed by `bookmark_id` in the bookmarks table.
#[derive(Archive, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PersistedBookmark {
    pub bookmark_id: String,
    pub title: String,
    pub url: String,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub rank: i64,
    pub open_mode: Option<PersistedOpenMode>,
    pub app_id: Option<String>,
}

impl From<&Bookmark> for PersistedBookmark {
    fn from(bookmark: &Bookmark) -> Self {
        Self {
            bookmark_id: bookmark.id.as_str().to_string(),
            title: bookmark.title.clone(),
            url: bookmark.url.clone(),
            created_at_ms: bookmark.created_at_ms,
            updated_at_ms: bookmark.updated_at_ms,
            rank: bookmark.rank,
            open_mode: bookmark.open_mode.map(PersistedOpenMode::from),
            app_id: bookmark.app_id.clone(),
        }
    }
}

impl From<PersistedBookmark> for Bookmark {
    fn from(row: PersistedBookmark) -> Self {
        Self {
            id: BookmarkId::from(row.bookmark_id),
            title: row.title,
            url: row.url,
            created_at_ms: row.created_at_ms,
            updated_at_ms: row.updated_at_ms,
            rank: row.rank,
            open_mode: row.open_mode.map(OpenMode::from),
            app_id: row.app_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persisted_bookmark_rkyv_roundtrip() {
        let row = PersistedBookmark {
            bookmark_id: "b-1".into(),
            title: "Example".into(),
            url: "https://example.com".into(),
            created_at_ms: 1_700_000_000_000,
            updated_at_ms: 1_700_000_000_500,
            rank: 3,
            open_mode: Some(PersistedOpenMode::InSession),
            app_id: Some("firefox".into()),
        };
        let bytes = rkyv::to_bytes::<rkyv::rancor::Error>(&row).unwrap();
        let archived =
            rkyv::access::<ArchivedPersistedBookmark, rkyv::rancor::Error>(&bytes).unwrap();
        assert_eq!(archived.url.as_str(), "https://example.com");
        let restored = rkyv::deserialize::<PersistedBookmark, rkyv::rancor::Error>(archived).unwrap();
        assert_eq!(restored, row);
    }
}
