/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! URL canonicalization.
//!
//! The canonical form is the uniqueness key of the bookmark catalogue, so
//! everything here is pure and idempotent: `normalize(normalize(x)) ==
//! normalize(x)` for every input that normalizes successfully.

use url::Url;

const DEFAULT_SCHEME_PREFIX: &str = "https://";

/// True when `raw` starts with an RFC 3986 `scheme:` prefix.
fn has_scheme_prefix(raw: &str) -> bool {
    let Some((scheme, _)) = raw.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {},
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

/// Canonicalize user-entered URL text.
///
/// Text without a scheme gets `https://`. The result is rebuilt as
/// `scheme://host[:port][path][?query][#fragment]` with scheme and host
/// lower-cased, default ports dropped, and a bare `/` path collapsed to
/// nothing. Input that does not parse into a host-bearing URL is returned
/// trimmed (and prefixed) but otherwise unchanged; callers that must reject
/// it use [`try_normalize`].
pub fn normalize(raw: &str) -> String {
    let candidate = with_scheme(raw);
    match rebuild(&candidate) {
        Some(canonical) => canonical,
        None => candidate,
    }
}

/// Like [`normalize`], but `None` when the input does not parse into a
/// host-bearing URL.
pub fn try_normalize(raw: &str) -> Option<String> {
    rebuild(&with_scheme(raw))
}

fn with_scheme(raw: &str) -> String {
    let trimmed = raw.trim();
    if has_scheme_prefix(trimmed) {
        trimmed.to_string()
    } else {
        format!("{DEFAULT_SCHEME_PREFIX}{trimmed}")
    }
}

fn rebuild(candidate: &str) -> Option<String> {
    let parsed = Url::parse(candidate).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    if host.is_empty() {
        return None;
    }
    let scheme = parsed.scheme().to_ascii_lowercase();

    let mut out = format!("{scheme}://{host}");
    if let Some(port) = parsed.port()
        && !is_default_port(&scheme, port)
    {
        out.push(':');
        out.push_str(&port.to_string());
    }
    let path = parsed.path();
    if path != "/" {
        out.push_str(path);
    }
    if let Some(query) = parsed.query() {
        out.push('?');
        out.push_str(query);
    }
    if let Some(fragment) = parsed.fragment() {
        out.push('#');
        out.push_str(fragment);
    }
    Some(out)
}

fn is_default_port(scheme: &str, port: u16) -> bool {
    matches!((scheme, port), ("http", 80) | ("https", 443))
}

/// True iff the URL is an `http://` or `https://` URL (case-insensitive).
pub fn is_valid_scheme(url: &str) -> bool {
    is_http(url) || is_https(url)
}

pub fn is_https(url: &str) -> bool {
    url.to_ascii_lowercase().starts_with("https://")
}

pub fn is_http(url: &str) -> bool {
    url.to_ascii_lowercase().starts_with("http://")
}

/// Lower-cased host of a URL, if it has one.
pub fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(|host| host.to_ascii_lowercase())
}

/// Display title derived from a URL: its host without a leading `www.`,
/// or the URL itself when no host can be extracted.
pub fn title_from_url(url: &str) -> String {
    match host_of(url) {
        Some(host) => host
            .strip_prefix("www.")
            .map(str::to_string)
            .unwrap_or(host),
        None => url.to_string(),
    }
}
