/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Per-request navigation classification inside an active session.
//!
//! Same-host https is the only thing a session may load by itself. Anything
//! else is either absorbed (schemes with no safe cross-boundary meaning) or
//! handed off to an external application.

use url::Url;

/// Schemes that are swallowed without navigating or handing off.
const ABSORBED_SCHEMES: &[&str] = &["javascript", "file", "content", "data", "blob", "about"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavigationDecision {
    /// Let the renderer load it in this session.
    Continue,
    /// Drop the request silently.
    Absorb,
    /// Do not load; dispatch the URL to an external application.
    HandOff(Url),
}

/// Classify a navigation request against the session's current host.
pub fn classify_navigation(target: &str, current_host: Option<&str>) -> NavigationDecision {
    let Ok(url) = Url::parse(target.trim()) else {
        return NavigationDecision::Absorb;
    };
    let scheme = url.scheme().to_ascii_lowercase();
    if ABSORBED_SCHEMES.contains(&scheme.as_str()) {
        return NavigationDecision::Absorb;
    }
    if scheme == "https"
        && let (Some(host), Some(current)) = (url.host_str(), current_host)
        && host.eq_ignore_ascii_case(current)
    {
        return NavigationDecision::Continue;
    }
    NavigationDecision::HandOff(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn is_hand_off(decision: &NavigationDecision) -> bool {
        matches!(decision, NavigationDecision::HandOff(_))
    }

    #[test]
    fn test_same_host_https_continues() {
        assert_eq!(
            classify_navigation("https://a.com/x", Some("a.com")),
            NavigationDecision::Continue
        );
        assert_eq!(
            classify_navigation("https://A.com/x", Some("a.com")),
            NavigationDecision::Continue
        );
    }

    #[test]
    fn test_other_host_hands_off() {
        let decision = classify_navigation("https://b.com/x", Some("a.com"));
        match decision {
            NavigationDecision::HandOff(url) => assert_eq!(url.as_str(), "https://b.com/x"),
            other => panic!("expected hand-off, got {other:?}"),
        }
    }

    #[test]
    fn test_same_host_http_downgrade_hands_off() {
        assert!(is_hand_off(&classify_navigation(
            "http://a.com/x",
            Some("a.com")
        )));
    }

    #[rstest]
    #[case("javascript:void(0)")]
    #[case("file:///etc/passwd")]
    #[case("content://media/external/1")]
    #[case("data:text/html,hi")]
    #[case("about:blank")]
    #[case("not a url")]
    fn test_non_network_schemes_are_absorbed(#[case] target: &str) {
        assert_eq!(
            classify_navigation(target, Some("a.com")),
            NavigationDecision::Absorb
        );
    }

    #[rstest]
    #[case("mailto:someone@a.com")]
    #[case("tel:+15555550100")]
    #[case("intent://scan/#Intent;scheme=zxing;end")]
    #[case("ftp://a.com/file")]
    fn test_other_schemes_hand_off(#[case] target: &str) {
        assert!(is_hand_off(&classify_navigation(target, Some("a.com"))));
    }

    #[test]
    fn test_https_without_current_host_hands_off() {
        assert!(is_hand_off(&classify_navigation("https://a.com", None)));
    }
}
