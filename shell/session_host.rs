/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The hosting view around one [`NavigationSession`]: folds session signals
//! into what the view shows and maps view actions (retry, back, close,
//! certificate answer) onto the session.

use linkshell_core::host::{Connectivity, ExternalDispatch, RendererConfig, RendererFactory};
use linkshell_core::{
    LoadToken, NavigationSession, RendererEvent, SessionSignal, SessionState, ShellError,
};
use log::debug;

use crate::shell::launcher::SessionRequest;

/// What the hosting view currently displays.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewModel {
    /// `Some` while the progress indicator is visible.
    pub progress: Option<u8>,
    /// Error panel contents; the panel offers retry.
    pub error: Option<ShellError>,
    pub certificate_prompt: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackAction {
    /// The renderer navigated back.
    Consumed,
    /// Nothing to go back to; the view should close.
    CloseView,
}

pub struct SessionHost {
    session: NavigationSession,
    view: ViewModel,
}

impl SessionHost {
    /// Create the session for `request` and start loading.
    pub fn open(
        request: &SessionRequest,
        factory: Box<dyn RendererFactory>,
        connectivity: Box<dyn Connectivity>,
        dispatch: Box<dyn ExternalDispatch>,
    ) -> Self {
        let session = NavigationSession::new(
            request.url.clone(),
            request.preferred_app.clone(),
            factory,
            connectivity,
            dispatch,
            RendererConfig::default(),
        );
        let mut host = Self {
            session,
            view: ViewModel::default(),
        };
        let signals = host.session.start();
        host.apply(&signals);
        host
    }

    pub fn view(&self) -> &ViewModel {
        &self.view
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn current_token(&self) -> LoadToken {
        self.session.current_token()
    }

    /// Route a renderer callback. Returned signals are already applied to
    /// the view; the navigation verdicts among them are for the renderer.
    pub fn on_renderer_event(&mut self, token: LoadToken, event: RendererEvent) -> Vec<SessionSignal> {
        let signals = self.session.handle_event(token, event);
        self.apply(&signals);
        signals
    }

    /// Renderer question "should this navigation be overridden?". `true`
    /// means the renderer must not load it.
    pub fn should_override_navigation(&mut self, token: LoadToken, url: &str) -> bool {
        let signals = self.on_renderer_event(
            token,
            RendererEvent::NavigationRequested {
                url: url.to_string(),
            },
        );
        !signals.contains(&SessionSignal::AllowNavigation)
    }

    /// Retry button on the error panel.
    pub fn retry(&mut self) {
        let signals = self.session.retry();
        self.apply(&signals);
    }

    pub fn answer_certificate(&mut self, proceed: bool) {
        let signals = self.session.resolve_certificate(proceed);
        self.view.certificate_prompt = false;
        self.apply(&signals);
    }

    pub fn back(&mut self) -> BackAction {
        if self.session.go_back() {
            BackAction::Consumed
        } else {
            BackAction::CloseView
        }
    }

    /// Tear the view down.
    pub fn close(&mut self) {
        self.session.terminate();
        self.view = ViewModel::default();
    }

    fn apply(&mut self, signals: &[SessionSignal]) {
        for signal in signals {
            match signal {
                SessionSignal::ShowProgress(value) => self.view.progress = Some(*value),
                SessionSignal::HideProgress => self.view.progress = None,
                SessionSignal::ShowError(reason) => {
                    self.view.error = Some(reason.to_error());
                    self.view.certificate_prompt = false;
                },
                SessionSignal::HideError => self.view.error = None,
                SessionSignal::CertificatePrompt => self.view.certificate_prompt = true,
                SessionSignal::RendererReplaced => debug!("Hosting view got a fresh renderer"),
                SessionSignal::AllowNavigation
                | SessionSignal::NavigationAbsorbed
                | SessionSignal::HandedOff { .. } => {},
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkshell_core::host::testing::{RecordingDispatch, RecordingFactory, SwitchConnectivity};

    struct Fixture {
        host: SessionHost,
        factory: RecordingFactory,
        net: SwitchConnectivity,
        dispatch: RecordingDispatch,
    }

    fn open_with(url: &str, online: bool) -> Fixture {
        let factory = RecordingFactory::default();
        let net = SwitchConnectivity::online();
        net.set(online);
        let dispatch = RecordingDispatch::default();
        let host = SessionHost::open(
            &SessionRequest {
                url: url.into(),
                preferred_app: Some("firefox".into()),
            },
            Box::new(factory.clone()),
            Box::new(net.clone()),
            Box::new(dispatch.clone()),
        );
        Fixture {
            host,
            factory,
            net,
            dispatch,
        }
    }

    #[test]
    fn test_offline_open_shows_error_then_retry_recovers() {
        let mut fx = open_with("https://a.com", false);
        assert_eq!(fx.host.view().error, Some(ShellError::NoConnectivity));
        assert!(fx.factory.probe(0).loads().is_empty());

        fx.net.set(true);
        fx.host.retry();
        assert_eq!(fx.host.view().error, None);
        assert_eq!(fx.host.state(), SessionState::Loading);
        assert_eq!(fx.factory.probe(0).loads(), vec!["https://a.com"]);
    }

    #[test]
    fn test_progress_and_server_error_drive_view() {
        let mut fx = open_with("https://a.com", true);
        let token = fx.host.current_token();
        fx.host.on_renderer_event(token, RendererEvent::Progress(30));
        assert_eq!(fx.host.view().progress, Some(30));

        fx.host.on_renderer_event(
            token,
            RendererEvent::HttpError {
                main_frame: true,
                status: 502,
            },
        );
        assert_eq!(fx.host.view().progress, None);
        assert_eq!(
            fx.host.view().error,
            Some(ShellError::LoadFailed { status: Some(502) })
        );
    }

    #[test]
    fn test_crash_reports_load_failure() {
        let mut fx = open_with("https://a.com", true);
        let token = fx.host.current_token();
        fx.host.on_renderer_event(token, RendererEvent::ProcessGone);
        assert_eq!(fx.host.view().error, Some(ShellError::RendererCrashed));
        assert_eq!(fx.factory.created(), 2);
    }

    #[test]
    fn test_certificate_prompt_round_trip() {
        let mut fx = open_with("https://a.com", true);
        let token = fx.host.current_token();
        fx.host.on_renderer_event(token, RendererEvent::CertificateError);
        assert!(fx.host.view().certificate_prompt);

        fx.host.answer_certificate(false);
        assert!(!fx.host.view().certificate_prompt);
        assert_eq!(fx.host.view().error, Some(ShellError::CertificateUntrusted));
    }

    #[test]
    fn test_crash_during_certificate_prompt_closes_prompt() {
        let mut fx = open_with("https://a.com", true);
        let token = fx.host.current_token();
        fx.host.on_renderer_event(token, RendererEvent::CertificateError);
        assert!(fx.host.view().certificate_prompt);

        fx.host.on_renderer_event(token, RendererEvent::ProcessGone);
        assert!(!fx.host.view().certificate_prompt);
        assert_eq!(fx.host.view().error, Some(ShellError::RendererCrashed));
    }

    #[test]
    fn test_override_question_follows_interceptor() {
        let mut fx = open_with("https://a.com", true);
        let token = fx.host.current_token();
        assert!(!fx.host.should_override_navigation(token, "https://a.com/next"));
        assert!(fx.host.should_override_navigation(token, "https://b.com"));
        assert!(fx.host.should_override_navigation(token, "javascript:void(0)"));
        assert_eq!(
            fx.dispatch.opened(),
            vec![("https://b.com/".to_string(), Some("firefox".to_string()))]
        );
    }

    #[test]
    fn test_back_closes_view_without_history() {
        let mut fx = open_with("https://a.com", true);
        assert_eq!(fx.host.back(), BackAction::CloseView);
        fx.factory.probe(0).can_go_back.set(true);
        assert_eq!(fx.host.back(), BackAction::Consumed);

        fx.host.close();
        assert_eq!(fx.host.state(), SessionState::Terminated);
        assert_eq!(fx.host.back(), BackAction::CloseView);
    }
}
