/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Add/edit form submission: validation, the edit-time insecure gate, and
//! the store write.

use linkshell_core::{
    Bookmark, BookmarkDraft, BookmarkId, InsecureCheck, ShellError,
    requires_insecure_confirmation,
};

use crate::persistence::{BookmarkStore, BookmarkStoreError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The URL is becoming plain http; ask, then submit again confirmed.
    NeedsConfirmation { url: String },
    Saved(Bookmark),
    /// The edited bookmark no longer exists.
    Gone,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveError {
    Rejected(ShellError),
    Store(BookmarkStoreError),
}

impl From<BookmarkStoreError> for SaveError {
    fn from(e: BookmarkStoreError) -> Self {
        match e.as_shell_error() {
            Some(shell) => SaveError::Rejected(shell),
            None => SaveError::Store(e),
        }
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Rejected(e) => write!(f, "{e}"),
            SaveError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SaveError {}

/// Submit the form. `editing` is the bookmark being edited, `None` for an
/// add. Nothing is written until validation and the insecure gate pass.
pub fn submit(
    store: &BookmarkStore,
    editing: Option<&BookmarkId>,
    draft: &BookmarkDraft,
    confirmed: bool,
) -> Result<SaveOutcome, SaveError> {
    let canonical = draft.canonicalize().ok_or_else(|| {
        SaveError::Rejected(ShellError::InvalidUrl(draft.raw_url.trim().to_string()))
    })?;

    let previous = editing.and_then(|id| store.get(id));
    let check = InsecureCheck::EditTransition {
        previous_url: previous.as_ref().map(|bookmark| bookmark.url.as_str()),
    };
    if requires_insecure_confirmation(&canonical.url, check) && !confirmed {
        return Ok(SaveOutcome::NeedsConfirmation { url: canonical.url });
    }

    match editing {
        None => Ok(SaveOutcome::Saved(store.add(draft)?)),
        Some(id) => Ok(store
            .update(id, draft)?
            .map_or(SaveOutcome::Gone, SaveOutcome::Saved)),
    }
}
