/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! External dispatch: handing a URL to another application.
//!
//! [`Dispatcher::launch`] runs the bookmark launch fallback chain (mode's
//! primary launch, plain open with the application, system default).
//! [`Dispatcher`] also serves as the session's single-shot
//! [`ExternalDispatch`] port for hand-offs.

use std::process::{Child, ExitStatus, Stdio};
use std::thread::JoinHandle;

use linkshell_core::host::ExternalDispatch;
use linkshell_core::{AppChoice, OpenMode, url_canon};
use log::{debug, info};

#[cfg(target_os = "macos")]
const PLATFORM_OPENER: &[&str] = &["open"];
#[cfg(target_os = "windows")]
const PLATFORM_OPENER: &[&str] = &["cmd", "/C", "start", ""];
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const PLATFORM_OPENER: &[&str] = &["xdg-open"];

/// Process-level launching primitives.
pub trait ProcessLauncher {
    /// Start `program` with `args` without waiting for it.
    fn spawn(&self, program: &str, args: &[String]) -> Result<(), DispatchError>;
    /// Let the platform pick the handler for `url`.
    fn open_default(&self, url: &str) -> Result<(), DispatchError>;
}

/// Launches real processes: `which` resolves programs on `PATH`, web URLs go
/// through `webbrowser`, anything else through the platform opener.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn spawn(&self, program: &str, args: &[String]) -> Result<(), DispatchError> {
        let path = which::which(program)
            .map_err(|e| DispatchError::Launch(format!("{program}: {e}")))?;
        let child = std::process::Command::new(&path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| DispatchError::Launch(format!("{}: {e}", path.display())))?;
        debug!("Spawned {} (pid {})", path.display(), child.id());
        if let Err(e) = reap_in_background(child) {
            debug!("No reaper thread for {}: {e}", path.display());
        }
        Ok(())
    }

    fn open_default(&self, url: &str) -> Result<(), DispatchError> {
        if url_canon::is_valid_scheme(url) {
            return webbrowser::open(url).map_err(|e| DispatchError::Launch(format!("{e}")));
        }
        let Some((program, leading)) = PLATFORM_OPENER.split_first() else {
            return Err(DispatchError::NoHandler);
        };
        let args: Vec<String> = leading
            .iter()
            .map(|arg| arg.to_string())
            .chain(std::iter::once(url.to_string()))
            .collect();
        self.spawn(program, &args)
    }
}

/// Wait for a launched application on a detached thread so its exit status
/// is collected and no zombie outlives it.
fn reap_in_background(mut child: Child) -> std::io::Result<JoinHandle<Option<ExitStatus>>> {
    std::thread::Builder::new()
        .name(format!("reap-{}", child.id()))
        .spawn(move || child.wait().ok())
}

/// Which step of the fallback chain took the URL.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LaunchRoute {
    Primary,
    AppFallback,
    SystemDefault,
}

pub struct Dispatcher<L = SystemLauncher> {
    launcher: L,
}

impl Default for Dispatcher<SystemLauncher> {
    fn default() -> Self {
        Self::new(SystemLauncher)
    }
}

impl<L: ProcessLauncher> Dispatcher<L> {
    pub fn new(launcher: L) -> Self {
        Self { launcher }
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Launch `url` for an external open mode.
    ///
    /// With a specific application: the mode's primary launch, then a plain
    /// open with the application. Finally the system default. Only when
    /// every step fails does this return an error.
    pub fn launch(
        &self,
        url: &str,
        mode: OpenMode,
        app: &AppChoice,
    ) -> Result<LaunchRoute, DispatchError> {
        if let AppChoice::Specific(app_id) = app {
            let primary = primary_args(mode, app_id, url);
            let plain = vec![url.to_string()];

            match self.launcher.spawn(app_id, &primary) {
                Ok(()) => {
                    info!("Opened {url} with {app_id} ({mode})");
                    return Ok(LaunchRoute::Primary);
                },
                Err(e) => debug!("Primary launch of {url} with {app_id} failed: {e}"),
            }
            if primary != plain {
                match self.launcher.spawn(app_id, &plain) {
                    Ok(()) => {
                        info!("Opened {url} with {app_id}");
                        return Ok(LaunchRoute::AppFallback);
                    },
                    Err(e) => debug!("Plain launch of {url} with {app_id} failed: {e}"),
                }
            }
        }

        match self.launcher.open_default(url) {
            Ok(()) => {
                info!("Opened {url} with the system default");
                Ok(LaunchRoute::SystemDefault)
            },
            Err(e) => {
                debug!("System default open of {url} failed: {e}");
                Err(DispatchError::NoHandler)
            },
        }
    }
}

impl<L: ProcessLauncher> ExternalDispatch for Dispatcher<L> {
    fn open_externally(&self, url: &str, preferred_app: Option<&str>) -> bool {
        let result = match preferred_app {
            Some(app_id) => self.launcher.spawn(app_id, &[url.to_string()]),
            None => self.launcher.open_default(url),
        };
        if let Err(e) = &result {
            debug!("Hand-off of {url} failed: {e}");
        }
        result.is_ok()
    }
}

/// Arguments for the mode's primary launch. A custom view asks the browser
/// for a minimal window where it knows how.
fn primary_args(mode: OpenMode, app_id: &str, url: &str) -> Vec<String> {
    match mode {
        OpenMode::CustomView if is_chromium_family(app_id) => vec![format!("--app={url}")],
        OpenMode::CustomView if app_id.contains("firefox") => {
            vec!["--new-window".to_string(), url.to_string()]
        },
        OpenMode::CustomView | OpenMode::ExternalApp | OpenMode::InSession => vec![url.to_string()],
    }
}

fn is_chromium_family(app_id: &str) -> bool {
    ["chrom", "edge", "brave", "vivaldi"]
        .iter()
        .any(|marker| app_id.contains(marker))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Every launch route failed.
    NoHandler,
    Launch(String),
}

impl std::fmt::Display for DispatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchError::NoHandler => write!(f, "No application could open the URL"),
            DispatchError::Launch(e) => write!(f, "Launch error: {e}"),
        }
    }
}

impl std::error::Error for DispatchError {}
