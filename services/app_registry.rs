/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Installed-application registry: which browsers a bookmark may be routed
//! to.

use std::collections::HashSet;

use log::debug;

/// Browsers probed on `PATH` even when nothing advertises them.
pub const KNOWN_BROWSERS: &[(&str, &str)] = &[
    ("firefox", "Firefox"),
    ("chromium", "Chromium"),
    ("google-chrome", "Google Chrome"),
    ("microsoft-edge", "Microsoft Edge"),
    ("brave-browser", "Brave"),
];

/// Environment variable holding a `:`-separated list of preferred browsers.
const BROWSER_ENV: &str = "BROWSER";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppEntry {
    pub label: String,
    pub app_id: String,
}

impl AppEntry {
    pub fn new(label: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            app_id: app_id.into(),
        }
    }
}

/// Read-only source of launchable applications.
pub trait AppRegistry {
    fn list(&self) -> Vec<AppEntry>;
}

/// Registry backed by `$BROWSER` and a `PATH` probe of [`KNOWN_BROWSERS`].
#[derive(Clone, Copy, Debug, Default)]
pub struct PathAppRegistry;

impl AppRegistry for PathAppRegistry {
    fn list(&self) -> Vec<AppEntry> {
        let discovered: Vec<AppEntry> = std::env::var(BROWSER_ENV)
            .map(|value| {
                value
                    .split(':')
                    .map(str::trim)
                    .filter(|command| !command.is_empty())
                    .filter(|command| which::which(command).is_ok())
                    .map(|command| AppEntry::new(label_for(command), command))
                    .collect()
            })
            .unwrap_or_default();

        let whitelisted: Vec<AppEntry> = KNOWN_BROWSERS
            .iter()
            .filter(|(command, _)| which::which(command).is_ok())
            .map(|(command, label)| AppEntry::new(*label, *command))
            .collect();

        let entries = merge_entries(discovered, whitelisted);
        debug!("Found {} launchable browsers", entries.len());
        entries
    }
}

fn label_for(command: &str) -> String {
    KNOWN_BROWSERS
        .iter()
        .find(|(known, _)| *known == command)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| command.to_string())
}

/// Discovered entries first, then the whitelist; first occurrence of an id
/// wins, result sorted by label.
pub fn merge_entries(discovered: Vec<AppEntry>, whitelisted: Vec<AppEntry>) -> Vec<AppEntry> {
    let mut seen = HashSet::new();
    let mut merged: Vec<AppEntry> = discovered
        .into_iter()
        .chain(whitelisted)
        .filter(|entry| seen.insert(entry.app_id.clone()))
        .collect();
    merged.sort_by(|a, b| a.label.cmp(&b.label));
    merged
}

/// One row of a "pick an application" list. `app_id == None` is the leading
/// "follow the default" row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppChoiceRow {
    pub label: String,
    pub app_id: Option<String>,
}

/// Prefix `entries` with a row meaning "no specific application".
pub fn choice_rows(default_label: &str, entries: Vec<AppEntry>) -> Vec<AppChoiceRow> {
    std::iter::once(AppChoiceRow {
        label: default_label.to_string(),
        app_id: None,
    })
    .chain(entries.into_iter().map(|entry| AppChoiceRow {
        label: entry.label,
        app_id: Some(entry.app_id),
    }))
    .collect()
}
