/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Portable kernel for Linkshell.
//!
//! Everything here is pure: URL canonicalization, bookmark drafts, open-mode
//! resolution, navigation interception, and the navigation session state
//! machine. Platform work (rendering, storage, launching apps) reaches the
//! kernel only through the traits in [`host`].

pub mod bookmark;
pub mod error;
pub mod host;
pub mod interceptor;
pub mod open_mode;
pub mod session;
pub mod url_canon;

pub use bookmark::{Bookmark, BookmarkDraft, BookmarkId, CanonicalDraft};
pub use error::ShellError;
pub use interceptor::{NavigationDecision, classify_navigation};
pub use open_mode::{
    AppChoice, InsecureCheck, OpenDefaults, OpenMode, OpenTarget, requires_insecure_confirmation,
    resolve_open_target,
};
pub use session::{
    FailureReason, LoadToken, NavigationSession, RendererEvent, ResumeState, SessionSignal,
    SessionState,
};
