/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Host-port traits the navigation session drives.
//!
//! The session owns no platform code: rendering, connectivity, and
//! external app launching are supplied by the embedding host through these
//! traits.

use crate::session::LoadToken;

/// Cache policy handed to the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheMode {
    Default,
    NoCache,
}

/// Mixed (http-in-https) content policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MixedContentMode {
    NeverAllow,
    AlwaysAllow,
}

/// Settings applied to every renderer instance, including replacements
/// created after a crash.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RendererConfig {
    pub javascript_enabled: bool,
    pub dom_storage_enabled: bool,
    pub allow_file_access: bool,
    pub allow_content_access: bool,
    pub mixed_content: MixedContentMode,
    pub cache_mode: CacheMode,
    pub accept_cookies: bool,
    pub accept_third_party_cookies: bool,
    /// Tokens removed from the renderer's stock user agent.
    pub user_agent_strip: Vec<&'static str>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            javascript_enabled: true,
            dom_storage_enabled: true,
            allow_file_access: false,
            allow_content_access: false,
            mixed_content: MixedContentMode::NeverAllow,
            cache_mode: CacheMode::Default,
            accept_cookies: true,
            accept_third_party_cookies: true,
            // Some sites refuse embedded views that advertise these markers.
            user_agent_strip: vec!["; wv", "Version/4.0 "],
        }
    }
}

impl RendererConfig {
    /// Derive the user agent to install from the renderer's stock one.
    pub fn user_agent_from(&self, stock: &str) -> String {
        self.user_agent_strip
            .iter()
            .fold(stock.to_string(), |ua, token| ua.replace(token, ""))
    }
}

/// The in-process web renderer.
///
/// Every asynchronous callback the renderer produces must be tagged with the
/// [`LoadToken`] it was handed in [`Renderer::load`]; the session drops
/// callbacks carrying a stale token.
pub trait Renderer {
    fn configure(&mut self, config: &RendererConfig);
    fn load(&mut self, url: &str, token: LoadToken);
    fn stop(&mut self);
    fn can_go_back(&self) -> bool;
    fn go_back(&mut self);
    /// Answer a pending certificate prompt for the current load.
    fn resolve_certificate(&mut self, proceed: bool);
    /// Tear the renderer down. No callbacks may follow.
    fn release(&mut self);
}

/// Produces fresh renderers, used on session start and crash recovery.
pub trait RendererFactory {
    fn create(&mut self) -> Box<dyn Renderer>;
}

impl<F> RendererFactory for F
where
    F: FnMut() -> Box<dyn Renderer>,
{
    fn create(&mut self) -> Box<dyn Renderer> {
        self()
    }
}

pub trait Connectivity {
    fn is_network_available(&self) -> bool;
}

impl<F> Connectivity for F
where
    F: Fn() -> bool,
{
    fn is_network_available(&self) -> bool {
        self()
    }
}

/// Best-effort hand-off of a URL to another application.
pub trait ExternalDispatch {
    /// Returns `false` when no application could take the URL.
    fn open_externally(&self, url: &str, preferred_app: Option<&str>) -> bool;
}

#[cfg(any(test, feature = "test-utils"))]
pub mod testing {
    //! Recording doubles for the host ports.

    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq)]
    pub enum RendererCall {
        Configure,
        Load(String, LoadToken),
        Stop,
        GoBack,
        ResolveCertificate(bool),
        Release,
    }

    /// Shared call log for one renderer instance.
    #[derive(Clone, Default)]
    pub struct RendererProbe {
        pub calls: Rc<RefCell<Vec<RendererCall>>>,
        pub can_go_back: Rc<Cell<bool>>,
    }

    impl RendererProbe {
        pub fn calls(&self) -> Vec<RendererCall> {
            self.calls.borrow().clone()
        }

        pub fn loads(&self) -> Vec<String> {
            self.calls
                .borrow()
                .iter()
                .filter_map(|call| match call {
                    RendererCall::Load(url, _) => Some(url.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    pub struct RecordingRenderer {
        probe: RendererProbe,
    }

    impl Renderer for RecordingRenderer {
        fn configure(&mut self, _config: &RendererConfig) {
            self.probe.calls.borrow_mut().push(RendererCall::Configure);
        }

        fn load(&mut self, url: &str, token: LoadToken) {
            self.probe
                .calls
                .borrow_mut()
                .push(RendererCall::Load(url.to_string(), token));
        }

        fn stop(&mut self) {
            self.probe.calls.borrow_mut().push(RendererCall::Stop);
        }

        fn can_go_back(&self) -> bool {
            self.probe.can_go_back.get()
        }

        fn go_back(&mut self) {
            self.probe.calls.borrow_mut().push(RendererCall::GoBack);
        }

        fn resolve_certificate(&mut self, proceed: bool) {
            self.probe
                .calls
                .borrow_mut()
                .push(RendererCall::ResolveCertificate(proceed));
        }

        fn release(&mut self) {
            self.probe.calls.borrow_mut().push(RendererCall::Release);
        }
    }

    /// Factory that hands out [`RecordingRenderer`]s and keeps a probe for
    /// every instance it created, oldest first.
    #[derive(Clone, Default)]
    pub struct RecordingFactory {
        pub probes: Rc<RefCell<Vec<RendererProbe>>>,
    }

    impl RecordingFactory {
        pub fn probe(&self, index: usize) -> RendererProbe {
            self.probes.borrow()[index].clone()
        }

        pub fn created(&self) -> usize {
            self.probes.borrow().len()
        }
    }

    impl RendererFactory for RecordingFactory {
        fn create(&mut self) -> Box<dyn Renderer> {
            let probe = RendererProbe::default();
            self.probes.borrow_mut().push(probe.clone());
            Box::new(RecordingRenderer { probe })
        }
    }

    /// Connectivity switch shared with the test body.
    #[derive(Clone)]
    pub struct SwitchConnectivity(pub Rc<Cell<bool>>);

    impl SwitchConnectivity {
        pub fn online() -> Self {
            Self(Rc::new(Cell::new(true)))
        }

        pub fn set(&self, online: bool) {
            self.0.set(online);
        }
    }

    impl Connectivity for SwitchConnectivity {
        fn is_network_available(&self) -> bool {
            self.0.get()
        }
    }

    /// Records hand-offs; succeeds unless `accept` is cleared.
    #[derive(Clone)]
    pub struct RecordingDispatch {
        pub opened: Rc<RefCell<Vec<(String, Option<String>)>>>,
        pub accept: Rc<Cell<bool>>,
    }

    impl Default for RecordingDispatch {
        fn default() -> Self {
            Self {
                opened: Rc::default(),
                accept: Rc::new(Cell::new(true)),
            }
        }
    }

    impl RecordingDispatch {
        pub fn opened(&self) -> Vec<(String, Option<String>)> {
            self.opened.borrow().clone()
        }
    }

    impl ExternalDispatch for RecordingDispatch {
        fn open_externally(&self, url: &str, preferred_app: Option<&str>) -> bool {
            self.opened
                .borrow_mut()
                .push((url.to_string(), preferred_app.map(str::to_string)));
            self.accept.get()
        }
    }
}
