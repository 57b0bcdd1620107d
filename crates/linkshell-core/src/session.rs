/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Navigation session: the load-lifecycle state machine for one embedded view.
//!
//! Renderer callbacks arrive as [`RendererEvent`]s tagged with the
//! [`LoadToken`] of the load that produced them. The session answers with a
//! list of [`SessionSignal`]s for the hosting view to render (progress bar,
//! error panel, certificate prompt). Every transition runs on the view's
//! control thread through `&mut self`.
//!
//! ```text
//! Idle ──load──▶ Loading ──finish──▶ Loaded
//!                  │  ▲                │
//!      error / 5xx │  │ retry          │ page-initiated load
//!                  ▼  │                ▼
//!                 Failed ◀──cancel── Prompting ◀── certificate error
//! ```
//!
//! A renderer crash in any state replaces the renderer and lands in
//! `Failed`; teardown lands in `Terminated` from anywhere.

use log::{debug, info, warn};

use crate::error::ShellError;
use crate::host::{Connectivity, ExternalDispatch, Renderer, RendererConfig, RendererFactory};
use crate::interceptor::{NavigationDecision, classify_navigation};
use crate::url_canon;

/// Generation marker for "is this exact load still current".
///
/// Bumped on every load, renderer replacement, and teardown. Callbacks
/// carrying an older token are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadToken(u64);

impl LoadToken {
    pub fn generation(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureReason {
    NoConnectivity,
    /// Main-frame network error.
    LoadFailed,
    /// Main-frame 5xx response.
    HttpStatus(u16),
    /// The user declined an untrusted certificate.
    CertificateRejected,
    RendererCrashed,
}

impl FailureReason {
    pub fn to_error(self) -> ShellError {
        match self {
            FailureReason::NoConnectivity => ShellError::NoConnectivity,
            FailureReason::LoadFailed => ShellError::LoadFailed { status: None },
            FailureReason::HttpStatus(code) => ShellError::LoadFailed { status: Some(code) },
            FailureReason::CertificateRejected => ShellError::CertificateUntrusted,
            FailureReason::RendererCrashed => ShellError::RendererCrashed,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Loading,
    Loaded,
    Failed(FailureReason),
    /// Suspended on a certificate decision. Holds the state to resume into.
    Prompting { resume: ResumeState },
    Terminated,
}

/// States a certificate prompt can interrupt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResumeState {
    Loading,
    Loaded,
}

impl SessionState {
    pub fn is_loading(self) -> bool {
        matches!(self, SessionState::Loading)
    }
}

/// Callbacks from the renderer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RendererEvent {
    PageStarted,
    Progress(u8),
    PageFinished,
    /// Network-level failure for a request.
    ResourceError { main_frame: bool },
    /// HTTP error status for a request.
    HttpError { main_frame: bool, status: u16 },
    CertificateError,
    /// The page asked to navigate somewhere.
    NavigationRequested { url: String },
    ProcessGone,
}

/// What the hosting view should do after a transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionSignal {
    ShowProgress(u8),
    HideProgress,
    ShowError(FailureReason),
    HideError,
    CertificatePrompt,
    /// The renderer may load the requested navigation itself.
    AllowNavigation,
    /// The requested navigation was dropped without a hand-off.
    NavigationAbsorbed,
    /// The requested navigation was given to another application.
    HandedOff { url: String, dispatched: bool },
    RendererReplaced,
}

pub struct NavigationSession {
    state: SessionState,
    renderer: Option<Box<dyn Renderer>>,
    factory: Box<dyn RendererFactory>,
    connectivity: Box<dyn Connectivity>,
    dispatch: Box<dyn ExternalDispatch>,
    config: RendererConfig,
    target_url: String,
    current_host: Option<String>,
    preferred_app: Option<String>,
    generation: u64,
}

impl NavigationSession {
    /// Create a session for `target_url` and install its first renderer.
    /// Nothing is loaded until [`NavigationSession::start`].
    pub fn new(
        target_url: impl Into<String>,
        preferred_app: Option<String>,
        mut factory: Box<dyn RendererFactory>,
        connectivity: Box<dyn Connectivity>,
        dispatch: Box<dyn ExternalDispatch>,
        config: RendererConfig,
    ) -> Self {
        let mut renderer = factory.create();
        renderer.configure(&config);
        Self {
            state: SessionState::Idle,
            renderer: Some(renderer),
            factory,
            connectivity,
            dispatch,
            config,
            target_url: target_url.into(),
            current_host: None,
            preferred_app,
            generation: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current_token(&self) -> LoadToken {
        LoadToken(self.generation)
    }

    pub fn current_host(&self) -> Option<&str> {
        self.current_host.as_deref()
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }

    /// `Idle -> Loading`, or `Failed(NoConnectivity)` when offline.
    pub fn start(&mut self) -> Vec<SessionSignal> {
        if self.state != SessionState::Idle {
            debug!("Ignoring start for session in state {:?}", self.state);
            return Vec::new();
        }
        self.begin_load()
    }

    /// Re-issue the target load. Refused while a load is in flight, while a
    /// certificate prompt is open, and after teardown.
    pub fn retry(&mut self) -> Vec<SessionSignal> {
        match self.state {
            SessionState::Idle | SessionState::Loaded | SessionState::Failed(_) => {},
            SessionState::Loading | SessionState::Prompting { .. } | SessionState::Terminated => {
                debug!("Ignoring retry for session in state {:?}", self.state);
                return Vec::new();
            },
        }
        self.begin_load()
    }

    fn begin_load(&mut self) -> Vec<SessionSignal> {
        if !self.connectivity.is_network_available() {
            // The renderer is left alone; the error panel keeps offering retry.
            return self.fail(FailureReason::NoConnectivity);
        }
        let Some(renderer) = self.renderer.as_mut() else {
            return Vec::new();
        };
        renderer.stop();
        self.generation += 1;
        self.current_host = url_canon::host_of(&self.target_url);
        self.state = SessionState::Loading;
        renderer.load(&self.target_url, LoadToken(self.generation));
        info!("Session loading {} (token {})", self.target_url, self.generation);
        vec![SessionSignal::HideError]
    }

    fn fail(&mut self, reason: FailureReason) -> Vec<SessionSignal> {
        self.state = SessionState::Failed(reason);
        vec![SessionSignal::HideProgress, SessionSignal::ShowError(reason)]
    }

    /// Feed one renderer callback through the state machine.
    pub fn handle_event(&mut self, token: LoadToken, event: RendererEvent) -> Vec<SessionSignal> {
        if self.state == SessionState::Terminated || token != self.current_token() {
            debug!(
                "Dropping stale renderer event {:?} (token {}, current {})",
                event,
                token.0,
                self.generation
            );
            return match event {
                // The stale renderer still needs an answer; never let it navigate.
                RendererEvent::NavigationRequested { .. } => vec![SessionSignal::NavigationAbsorbed],
                _ => Vec::new(),
            };
        }

        match event {
            RendererEvent::PageStarted => {
                if self.state == SessionState::Loaded {
                    self.state = SessionState::Loading;
                }
                Vec::new()
            },
            RendererEvent::Progress(value) => {
                if !self.state.is_loading() {
                    return Vec::new();
                }
                if value < 100 {
                    vec![SessionSignal::ShowProgress(value)]
                } else {
                    vec![SessionSignal::HideProgress]
                }
            },
            RendererEvent::PageFinished => {
                if !self.state.is_loading() {
                    return Vec::new();
                }
                self.state = SessionState::Loaded;
                vec![SessionSignal::HideProgress]
            },
            RendererEvent::ResourceError { main_frame } => {
                if main_frame && self.state.is_loading() {
                    self.fail(FailureReason::LoadFailed)
                } else {
                    Vec::new()
                }
            },
            RendererEvent::HttpError { main_frame, status } => {
                // 4xx stays displayable: some origins serve interactive
                // challenge pages with those codes.
                if main_frame && (500..=599).contains(&status) && self.state.is_loading() {
                    self.fail(FailureReason::HttpStatus(status))
                } else {
                    Vec::new()
                }
            },
            RendererEvent::CertificateError => {
                let resume = match self.state {
                    SessionState::Loading => ResumeState::Loading,
                    SessionState::Loaded => ResumeState::Loaded,
                    _ => return Vec::new(),
                };
                self.state = SessionState::Prompting { resume };
                vec![SessionSignal::CertificatePrompt]
            },
            RendererEvent::NavigationRequested { url } => self.intercept(&url),
            RendererEvent::ProcessGone => self.recover_from_crash(),
        }
    }

    fn intercept(&mut self, url: &str) -> Vec<SessionSignal> {
        match classify_navigation(url, self.current_host.as_deref()) {
            NavigationDecision::Continue => vec![SessionSignal::AllowNavigation],
            NavigationDecision::Absorb => {
                debug!("Absorbed navigation to {url}");
                vec![SessionSignal::NavigationAbsorbed]
            },
            NavigationDecision::HandOff(parsed) => {
                let dispatched = self.hand_off(parsed.as_str(), parsed.scheme());
                vec![SessionSignal::HandedOff {
                    url: parsed.to_string(),
                    dispatched,
                }]
            },
        }
    }

    /// Best effort: the preferred application is only forced for web URLs,
    /// and failures never reach the session state.
    fn hand_off(&self, url: &str, scheme: &str) -> bool {
        let forced = match scheme {
            "http" | "https" => self.preferred_app.as_deref(),
            _ => None,
        };
        if self.dispatch.open_externally(url, forced) {
            return true;
        }
        if forced.is_some() && self.dispatch.open_externally(url, None) {
            return true;
        }
        debug!("No application accepted hand-off of {url}");
        false
    }

    fn recover_from_crash(&mut self) -> Vec<SessionSignal> {
        warn!("Renderer process gone while {:?}; replacing renderer", self.state);
        if let Some(mut dead) = self.renderer.take() {
            dead.release();
        }
        let mut fresh = self.factory.create();
        fresh.configure(&self.config);
        self.renderer = Some(fresh);
        self.generation += 1;

        let mut signals = vec![SessionSignal::RendererReplaced];
        signals.extend(self.fail(FailureReason::RendererCrashed));
        signals
    }

    /// Answer the open certificate prompt. "Proceed" resumes the interrupted
    /// load; "cancel" fails it.
    pub fn resolve_certificate(&mut self, proceed: bool) -> Vec<SessionSignal> {
        let SessionState::Prompting { resume } = self.state else {
            debug!("No certificate prompt open in state {:?}", self.state);
            return Vec::new();
        };
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.resolve_certificate(proceed);
        }
        if proceed {
            self.state = match resume {
                ResumeState::Loading => SessionState::Loading,
                ResumeState::Loaded => SessionState::Loaded,
            };
            Vec::new()
        } else {
            self.fail(FailureReason::CertificateRejected)
        }
    }

    /// Navigate back inside the renderer. Returns `false` when there is no
    /// history, so the host can close the view instead.
    pub fn go_back(&mut self) -> bool {
        if self.state == SessionState::Terminated {
            return false;
        }
        match self.renderer.as_mut() {
            Some(renderer) if renderer.can_go_back() => {
                renderer.go_back();
                true
            },
            _ => false,
        }
    }

    /// Release the renderer. Terminal and idempotent.
    pub fn terminate(&mut self) {
        if self.state == SessionState::Terminated {
            return;
        }
        if let Some(mut renderer) = self.renderer.take() {
            renderer.stop();
            renderer.release();
        }
        self.generation += 1;
        self.state = SessionState::Terminated;
    }
}

impl Drop for NavigationSession {
    fn drop(&mut self) {
        self.terminate();
    }
}
