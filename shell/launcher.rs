/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! "Open this bookmark": resolve the effective target, gate insecure
//! navigation, then either dispatch externally or request an in-session
//! view.

use linkshell_core::{
    AppChoice, Bookmark, InsecureCheck, OpenMode, OpenTarget, ShellError,
    requires_insecure_confirmation, resolve_open_target,
};
use log::{debug, warn};

use crate::prefs::AppPrefs;
use crate::services::dispatch::{Dispatcher, LaunchRoute, ProcessLauncher};

/// Everything an embedding host needs to start a navigation session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionRequest {
    pub url: String,
    /// Application forced for web hand-offs out of the session.
    pub preferred_app: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// Plain-http open; ask the user, then call again with `confirmed`.
    NeedsConfirmation { url: String },
    Dispatched { target: OpenTarget, route: LaunchRoute },
    InSession(SessionRequest),
}

/// Run the open flow for `bookmark`. The confirmation gate is evaluated on
/// every call; `confirmed` records the user's answer to it.
pub fn open_bookmark<L: ProcessLauncher>(
    bookmark: &Bookmark,
    prefs: &AppPrefs,
    confirmed: bool,
    dispatcher: &Dispatcher<L>,
) -> Result<LaunchOutcome, ShellError> {
    let target = resolve_open_target(
        bookmark.open_mode,
        bookmark.app_id.as_deref(),
        &prefs.open_defaults(),
    );

    let check = InsecureCheck::DirectOpen {
        confirm_every_time: prefs.confirm_http_every_time,
    };
    if requires_insecure_confirmation(&bookmark.url, check) && !confirmed {
        debug!("Open of {} waits for insecure confirmation", bookmark.url);
        return Ok(LaunchOutcome::NeedsConfirmation {
            url: bookmark.url.clone(),
        });
    }

    match target.mode {
        OpenMode::InSession => Ok(LaunchOutcome::InSession(SessionRequest {
            url: bookmark.url.clone(),
            preferred_app: target.app.app_id().map(str::to_string),
        })),
        OpenMode::CustomView | OpenMode::ExternalApp => {
            match dispatcher.launch(&bookmark.url, target.mode, &target.app) {
                Ok(route) => Ok(LaunchOutcome::Dispatched { target, route }),
                Err(e) => {
                    warn!("Could not open {}: {e}", bookmark.url);
                    Err(ShellError::ExternalDispatchFailed(bookmark.url.clone()))
                },
            }
        },
    }
}

/// Whether a bookmark's application override applies to its effective mode.
pub fn app_choice_applies(mode_override: Option<OpenMode>, prefs: &AppPrefs) -> bool {
    mode_override
        .unwrap_or(prefs.default_open_mode)
        .uses_external_app()
}

/// Effective application shown next to a bookmark.
pub fn effective_app(bookmark: &Bookmark, prefs: &AppPrefs) -> AppChoice {
    resolve_open_target(
        bookmark.open_mode,
        bookmark.app_id.as_deref(),
        &prefs.open_defaults(),
    )
    .app
}
