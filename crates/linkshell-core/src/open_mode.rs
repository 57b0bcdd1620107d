/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Open-mode resolution: layering a bookmark's overrides over the global
//! defaults, and the insecure-navigation confirmation gate.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::url_canon;

/// How a bookmark is launched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpenMode {
    /// Tabbed view hosted by an external application.
    #[default]
    CustomView,
    /// Full hand-off to an external application.
    ExternalApp,
    /// Render inside this shell's own navigation session.
    InSession,
}

impl OpenMode {
    pub const ALL: [OpenMode; 3] = [
        OpenMode::CustomView,
        OpenMode::ExternalApp,
        OpenMode::InSession,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            OpenMode::CustomView => "custom-view",
            OpenMode::ExternalApp => "external-app",
            OpenMode::InSession => "in-session",
        }
    }

    /// Whether the mode launches through an external application, i.e.
    /// whether an application choice is meaningful for it.
    pub fn uses_external_app(self) -> bool {
        !matches!(self, OpenMode::InSession)
    }
}

impl fmt::Display for OpenMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OpenMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        OpenMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| {
                format!("unknown open mode '{needle}' (expected custom-view, external-app or in-session)")
            })
    }
}

/// Application a launch is routed to.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum AppChoice {
    Specific(String),
    /// No application is forced; the platform decides.
    SystemDefault,
}

impl AppChoice {
    pub fn app_id(&self) -> Option<&str> {
        match self {
            AppChoice::Specific(id) => Some(id),
            AppChoice::SystemDefault => None,
        }
    }
}

/// The global half of the two-level resolution.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OpenDefaults {
    pub default_mode: OpenMode,
    pub preferred_app_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenTarget {
    pub mode: OpenMode,
    pub app: AppChoice,
}

/// Blank application ids mean "no override".
fn non_blank(id: Option<&str>) -> Option<&str> {
    id.map(str::trim).filter(|id| !id.is_empty())
}

/// Resolve the effective mode and application for a launch.
///
/// Mode: override, else global default. Application: override, else global
/// preference, else [`AppChoice::SystemDefault`].
pub fn resolve_open_target(
    mode_override: Option<OpenMode>,
    app_override: Option<&str>,
    defaults: &OpenDefaults,
) -> OpenTarget {
    let mode = mode_override.unwrap_or(defaults.default_mode);
    let app = non_blank(app_override)
        .or_else(|| non_blank(defaults.preferred_app_id.as_deref()))
        .map(|id| AppChoice::Specific(id.to_string()))
        .unwrap_or(AppChoice::SystemDefault);
    OpenTarget { mode, app }
}

/// Which user action the insecure-navigation gate is evaluated for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InsecureCheck<'a> {
    /// Opening a bookmark; gated by the global confirm flag.
    DirectOpen { confirm_every_time: bool },
    /// Saving an edit; gated on the URL becoming plain http.
    EditTransition { previous_url: Option<&'a str> },
}

/// Whether the user must confirm before the action proceeds.
pub fn requires_insecure_confirmation(url: &str, check: InsecureCheck<'_>) -> bool {
    if !url_canon::is_http(url) {
        return false;
    }
    match check {
        InsecureCheck::DirectOpen { confirm_every_time } => confirm_every_time,
        InsecureCheck::EditTransition { previous_url } => {
            !previous_url.is_some_and(url_canon::is_http)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults(mode: OpenMode, app: Option<&str>) -> OpenDefaults {
        OpenDefaults {
            default_mode: mode,
            preferred_app_id: app.map(str::to_string),
        }
    }

    #[test]
    fn test_no_override_uses_global_default_mode() {
        let target = resolve_open_target(None, None, &defaults(OpenMode::CustomView, None));
        assert_eq!(target.mode, OpenMode::CustomView);
        assert_eq!(target.app, AppChoice::SystemDefault);
    }

    #[test]
    fn test_mode_override_wins_regardless_of_default() {
        for default_mode in OpenMode::ALL {
            let target = resolve_open_target(
                Some(OpenMode::InSession),
                None,
                &defaults(default_mode, None),
            );
            assert_eq!(target.mode, OpenMode::InSession);
        }
    }

    #[test]
    fn test_app_resolution_layers() {
        let global = defaults(OpenMode::ExternalApp, Some("firefox"));
        assert_eq!(
            resolve_open_target(None, Some("chromium"), &global).app,
            AppChoice::Specific("chromium".into())
        );
        assert_eq!(
            resolve_open_target(None, None, &global).app,
            AppChoice::Specific("firefox".into())
        );
        assert_eq!(
            resolve_open_target(None, Some("   "), &global).app,
            AppChoice::Specific("firefox".into())
        );
        assert_eq!(
            resolve_open_target(None, None, &defaults(OpenMode::ExternalApp, Some(""))).app,
            AppChoice::SystemDefault
        );
    }

    #[test]
    fn test_direct_open_gate_follows_confirm_flag() {
        let confirm = InsecureCheck::DirectOpen {
            confirm_every_time: true,
        };
        let skip = InsecureCheck::DirectOpen {
            confirm_every_time: false,
        };
        assert!(requires_insecure_confirmation("http://a.com", confirm));
        assert!(!requires_insecure_confirmation("http://a.com", skip));
        assert!(!requires_insecure_confirmation("https://a.com", confirm));
    }

    #[test]
    fn test_edit_gate_only_fires_on_transition_to_http() {
        let new = InsecureCheck::EditTransition { previous_url: None };
        let from_https = InsecureCheck::EditTransition {
            previous_url: Some("https://a.com"),
        };
        let from_http = InsecureCheck::EditTransition {
            previous_url: Some("http://a.com"),
        };
        assert!(requires_insecure_confirmation("http://a.com", new));
        assert!(requires_insecure_confirmation("http://a.com", from_https));
        assert!(!requires_insecure_confirmation("http://a.com/b", from_http));
        assert!(!requires_insecure_confirmation("https://a.com", new));
    }

    #[test]
    fn test_open_mode_parses_case_insensitively() {
        assert_eq!("In-Session".parse::<OpenMode>(), Ok(OpenMode::InSession));
        assert!("tabs".parse::<OpenMode>().is_err());
        assert_eq!(OpenMode::ExternalApp.to_string(), "external-app");
    }
}
