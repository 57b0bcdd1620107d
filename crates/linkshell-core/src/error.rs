/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

/// User-facing failure taxonomy. Nothing here is fatal to the process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShellError {
    /// Fails canonicalization or the http/https scheme check.
    InvalidUrl(String),
    /// Another bookmark already has this canonical URL.
    DuplicateUrl(String),
    NoConnectivity,
    /// Main-frame network error, or a 5xx main-frame response.
    LoadFailed { status: Option<u16> },
    CertificateUntrusted,
    RendererCrashed,
    /// No application could take the URL.
    ExternalDispatchFailed(String),
}

impl std::fmt::Display for ShellError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShellError::InvalidUrl(url) => write!(f, "Invalid URL (http/https only): {url}"),
            ShellError::DuplicateUrl(url) => write!(f, "A bookmark for {url} already exists"),
            ShellError::NoConnectivity => write!(f, "No network connection"),
            ShellError::LoadFailed { status: Some(code) } => {
                write!(f, "Page failed to load (HTTP {code})")
            },
            ShellError::LoadFailed { status: None } => write!(f, "Page failed to load"),
            ShellError::CertificateUntrusted => {
                write!(f, "The site's security certificate is not trusted")
            },
            ShellError::RendererCrashed => write!(f, "Page failed to load (renderer restarted)"),
            ShellError::ExternalDispatchFailed(url) => write!(f, "No application could open {url}"),
        }
    }
}

impl std::error::Error for ShellError {}
