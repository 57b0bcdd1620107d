/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Bookmark store using redb (tables) + rkyv (row serialization).
//!
//! Layout:
//! - `bookmarks`: bookmark id -> rkyv-serialized [`PersistedBookmark`]
//! - `url_index`: canonical URL -> bookmark id, the uniqueness constraint
//!
//! Every committed mutation republishes the full rank-ordered catalogue on a
//! `tokio::sync::watch` channel; subscriptions filter that snapshot.

pub mod types;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use linkshell_core::bookmark::now_millis;
use linkshell_core::{Bookmark, BookmarkDraft, BookmarkId, ShellError};
use log::{debug, info, warn};
use redb::{ReadableDatabase, ReadableTable};
use tokio::sync::watch;
use types::PersistedBookmark;

const BOOKMARKS_TABLE: redb::TableDefinition<&str, &[u8]> = redb::TableDefinition::new("bookmarks");
const URL_INDEX_TABLE: redb::TableDefinition<&str, &str> = redb::TableDefinition::new("url_index");
const DATABASE_FILE: &str = "bookmarks.redb";

/// Title of the bookmark a brand-new catalogue starts with.
pub const SEED_BOOKMARK_TITLE: &str = "Linux.do";

type Catalogue = Arc<Vec<Bookmark>>;

/// Persistent bookmark catalogue. Safe to share behind an `Arc`; redb
/// serializes writers.
pub struct BookmarkStore {
    db: redb::Database,
    changes: watch::Sender<Catalogue>,
    created_fresh: AtomicBool,
}

impl BookmarkStore {
    /// Open or create the store inside `base_dir`.
    pub fn open(base_dir: PathBuf) -> Result<Self, BookmarkStoreError> {
        std::fs::create_dir_all(&base_dir)
            .map_err(|e| BookmarkStoreError::Io(format!("Failed to create dir: {e}")))?;

        let path = base_dir.join(DATABASE_FILE);
        let created_fresh = !path.exists();
        let db = redb::Database::create(&path)
            .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;

        // Make sure both tables exist so read transactions never miss them.
        let write_txn = db
            .begin_write()
            .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;
        {
            write_txn
                .open_table(BOOKMARKS_TABLE)
                .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;
            write_txn
                .open_table(URL_INDEX_TABLE)
                .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;
        }
        write_txn
            .commit()
            .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;

        let initial = load_catalogue(&db)?;
        info!(
            "Opened bookmark store at {} ({} entries)",
            path.display(),
            initial.len()
        );
        let (changes, _) = watch::channel(Arc::new(initial));
        Ok(Self {
            db,
            changes,
            created_fresh: AtomicBool::new(created_fresh),
        })
    }

    /// Insert the built-in starter bookmark, but only into a database that
    /// did not exist before this process opened it. Runs at most once.
    pub fn seed_if_new(&self, seed_url: &str) -> Result<Option<Bookmark>, BookmarkStoreError> {
        if !self.created_fresh.swap(false, Ordering::SeqCst) {
            return Ok(None);
        }
        match self.add(&BookmarkDraft::new(SEED_BOOKMARK_TITLE, seed_url)) {
            Ok(bookmark) => Ok(Some(bookmark)),
            Err(BookmarkStoreError::DuplicateUrl(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Current catalogue, rank ascending.
    pub fn list(&self) -> Vec<Bookmark> {
        self.changes.borrow().to_vec()
    }

    pub fn get(&self, id: &BookmarkId) -> Option<Bookmark> {
        self.changes
            .borrow()
            .iter()
            .find(|bookmark| &bookmark.id == id)
            .cloned()
    }

    /// Subscription to the full catalogue.
    pub fn observe_all(&self) -> BookmarkSubscription {
        self.observe_search("")
    }

    /// Subscription to entries whose title or URL contains `query`
    /// (case-insensitive). A blank query observes everything.
    pub fn observe_search(&self, query: &str) -> BookmarkSubscription {
        BookmarkSubscription {
            rx: self.changes.subscribe(),
            query: query.trim().to_string(),
            primed: false,
        }
    }

    /// Add a bookmark at the end of the ordering.
    pub fn add(&self, draft: &BookmarkDraft) -> Result<Bookmark, BookmarkStoreError> {
        let canonical = draft
            .canonicalize()
            .ok_or_else(|| BookmarkStoreError::InvalidUrl(draft.raw_url.trim().to_string()))?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;
        let bookmark = {
            let mut bookmarks = write_txn
                .open_table(BOOKMARKS_TABLE)
                .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;
            let mut index = write_txn
                .open_table(URL_INDEX_TABLE)
                .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;

            if index
                .get(canonical.url.as_str())
                .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?
                .is_some()
            {
                return Err(BookmarkStoreError::DuplicateUrl(canonical.url));
            }

            let mut max_rank = None;
            for entry in bookmarks
                .iter()
                .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?
            {
                let (_, value) = entry.map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;
                let row = decode_row(value.value())?;
                max_rank = max_rank.max(Some(row.rank));
            }

            let now = now_millis();
            let bookmark = Bookmark {
                id: BookmarkId::generate(),
                title: canonical.title,
                url: canonical.url,
                created_at_ms: now,
                updated_at_ms: now,
                rank: max_rank.map_or(0, |rank| rank + 1),
                open_mode: canonical.open_mode,
                app_id: canonical.app_id,
            };
            let bytes = encode_row(&PersistedBookmark::from(&bookmark))?;
            bookmarks
                .insert(bookmark.id.as_str(), bytes.as_slice())
                .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;
            index
                .insert(bookmark.url.as_str(), bookmark.id.as_str())
                .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;
            bookmark
        };
        write_txn
            .commit()
            .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;

        debug!("Added bookmark {} -> {}", bookmark.id, bookmark.url);
        self.publish()?;
        Ok(bookmark)
    }

    /// Rewrite title, URL, and overrides of an existing bookmark. Id, rank,
    /// and creation time are kept. Unknown ids are a silent no-op
    /// (`Ok(None)`).
    pub fn update(
        &self,
        id: &BookmarkId,
        draft: &BookmarkDraft,
    ) -> Result<Option<Bookmark>, BookmarkStoreError> {
        let canonical = draft
            .canonicalize()
            .ok_or_else(|| BookmarkStoreError::InvalidUrl(draft.raw_url.trim().to_string()))?;

        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;
        let updated = {
            let mut bookmarks = write_txn
                .open_table(BOOKMARKS_TABLE)
                .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;
            let mut index = write_txn
                .open_table(URL_INDEX_TABLE)
                .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;

            let existing = match bookmarks
                .get(id.as_str())
                .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?
            {
                Some(value) => Some(decode_row(value.value())?),
                None => None,
            };

            match existing {
                None => None,
                Some(existing) => {
                    let owner = index
                        .get(canonical.url.as_str())
                        .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?
                        .map(|value| value.value().to_string());
                    if owner.is_some_and(|owner| owner != id.as_str()) {
                        return Err(BookmarkStoreError::DuplicateUrl(canonical.url));
                    }

                    if existing.url != canonical.url {
                        index
                            .remove(existing.url.as_str())
                            .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;
                        index
                            .insert(canonical.url.as_str(), id.as_str())
                            .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;
                    }

                    let mut bookmark = Bookmark::from(existing);
                    bookmark.title = canonical.title;
                    bookmark.url = canonical.url;
                    bookmark.open_mode = canonical.open_mode;
                    bookmark.app_id = canonical.app_id;
                    bookmark.updated_at_ms = now_millis();

                    let bytes = encode_row(&PersistedBookmark::from(&bookmark))?;
                    bookmarks
                        .insert(id.as_str(), bytes.as_slice())
                        .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;
                    Some(bookmark)
                },
            }
        };

        let Some(bookmark) = updated else {
            write_txn
                .abort()
                .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;
            debug!("Ignoring update of unknown bookmark {id}");
            return Ok(None);
        };
        write_txn
            .commit()
            .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;

        self.publish()?;
        Ok(Some(bookmark))
    }

    /// Remove a bookmark. Returns whether anything was removed; removing an
    /// unknown id publishes nothing.
    pub fn delete(&self, id: &BookmarkId) -> Result<bool, BookmarkStoreError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;
        let removed = {
            let mut bookmarks = write_txn
                .open_table(BOOKMARKS_TABLE)
                .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;
            let mut index = write_txn
                .open_table(URL_INDEX_TABLE)
                .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;

            let row = match bookmarks
                .remove(id.as_str())
                .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?
            {
                Some(value) => Some(decode_row(value.value())?),
                None => None,
            };
            if let Some(row) = &row {
                index
                    .remove(row.url.as_str())
                    .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;
            }
            row.is_some()
        };

        if !removed {
            write_txn
                .abort()
                .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;
            return Ok(false);
        }
        write_txn
            .commit()
            .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;

        debug!("Deleted bookmark {id}");
        self.publish()?;
        Ok(true)
    }

    fn publish(&self) -> Result<(), BookmarkStoreError> {
        let catalogue = load_catalogue(&self.db)?;
        self.changes.send_replace(Arc::new(catalogue));
        Ok(())
    }
}

fn encode_row(row: &PersistedBookmark) -> Result<rkyv::util::AlignedVec, BookmarkStoreError> {
    rkyv::to_bytes::<rkyv::rancor::Error>(row)
        .map_err(|e| BookmarkStoreError::Codec(format!("Failed to serialize bookmark: {e}")))
}

fn decode_row(bytes: &[u8]) -> Result<PersistedBookmark, BookmarkStoreError> {
    let mut aligned = rkyv::util::AlignedVec::<16>::new();
    aligned.extend_from_slice(bytes);
    rkyv::from_bytes::<PersistedBookmark, rkyv::rancor::Error>(&aligned)
        .map_err(|e| BookmarkStoreError::Codec(format!("Failed to deserialize bookmark: {e}")))
}

/// Read every row, ordered by rank then creation time. Rows that fail to
/// decode are skipped.
fn load_catalogue(db: &redb::Database) -> Result<Vec<Bookmark>, BookmarkStoreError> {
    let read_txn = db
        .begin_read()
        .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;
    let table = read_txn
        .open_table(BOOKMARKS_TABLE)
        .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;
    let mut catalogue = Vec::new();
    for entry in table
        .iter()
        .map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?
    {
        let (key, value) = entry.map_err(|e| BookmarkStoreError::Redb(format!("{e}")))?;
        match decode_row(value.value()) {
            Ok(row) => catalogue.push(Bookmark::from(row)),
            Err(e) => warn!("Skipping unreadable bookmark {}: {e}", key.value()),
        }
    }
    catalogue.sort_by(|a, b| {
        a.rank
            .cmp(&b.rank)
            .then(a.created_at_ms.cmp(&b.created_at_ms))
    });
    Ok(catalogue)
}

/// Restartable stream of catalogue snapshots. The first [`next`] yields the
/// current state; each later call waits for the next committed change.
///
/// [`next`]: BookmarkSubscription::next
pub struct BookmarkSubscription {
    rx: watch::Receiver<Catalogue>,
    query: String,
    primed: bool,
}

impl BookmarkSubscription {
    pub fn query(&self) -> &str {
        &self.query
    }

    /// `None` once the store has been dropped.
    pub async fn next(&mut self) -> Option<Vec<Bookmark>> {
        if self.primed {
            self.rx.changed().await.ok()?;
        }
        self.primed = true;
        Some(self.current())
    }

    /// Filtered snapshot of the latest catalogue; marks it as seen.
    pub fn current(&mut self) -> Vec<Bookmark> {
        let catalogue = Arc::clone(&self.rx.borrow_and_update());
        catalogue
            .iter()
            .filter(|bookmark| bookmark.matches_query(&self.query))
            .cloned()
            .collect()
    }

    /// Whether a change is waiting that [`next`](Self::next) would return
    /// immediately.
    pub fn has_pending(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookmarkStoreError {
    InvalidUrl(String),
    DuplicateUrl(String),
    Io(String),
    Redb(String),
    Codec(String),
}

impl BookmarkStoreError {
    /// User-facing taxonomy entry, for the failures a user can act on.
    pub fn as_shell_error(&self) -> Option<ShellError> {
        match self {
            BookmarkStoreError::InvalidUrl(url) => Some(ShellError::InvalidUrl(url.clone())),
            BookmarkStoreError::DuplicateUrl(url) => Some(ShellError::DuplicateUrl(url.clone())),
            BookmarkStoreError::Io(_)
            | BookmarkStoreError::Redb(_)
            | BookmarkStoreError::Codec(_) => None,
        }
    }
}

impl std::fmt::Display for BookmarkStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookmarkStoreError::InvalidUrl(url) => {
                write!(f, "Invalid URL (http/https only): {url}")
            },
            BookmarkStoreError::DuplicateUrl(url) => {
                write!(f, "A bookmark for {url} already exists")
            },
            BookmarkStoreError::Io(e) => write!(f, "IO error: {e}"),
            BookmarkStoreError::Redb(e) => write!(f, "Redb error: {e}"),
            BookmarkStoreError::Codec(e) => write!(f, "Codec error: {e}"),
        }
    }
}

impl std::error::Error for BookmarkStoreError {}
