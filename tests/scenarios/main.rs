/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::cell::RefCell;
use std::time::Duration;

use linkshell::VERSION;
use linkshell::app::{AppDirs, LinkshellApp};
use linkshell::core::host::testing::{RecordingDispatch, RecordingFactory, SwitchConnectivity};
use linkshell::core::{BookmarkDraft, OpenMode, RendererEvent, SessionState, ShellError};
use linkshell::services::dispatch::{DispatchError, Dispatcher, LaunchRoute, ProcessLauncher};
use linkshell::services::search::{SEARCH_DEBOUNCE, SearchController};
use linkshell::shell::editor::{self, SaveOutcome};
use linkshell::shell::launcher::{self, LaunchOutcome};
use linkshell::shell::session_host::SessionHost;
use tempfile::TempDir;

#[derive(Default)]
struct ScriptedLauncher {
    spawned: RefCell<Vec<(String, Vec<String>)>>,
    defaults: RefCell<Vec<String>>,
    refuse_spawn: bool,
}

impl ProcessLauncher for ScriptedLauncher {
    fn spawn(&self, program: &str, args: &[String]) -> Result<(), DispatchError> {
        self.spawned
            .borrow_mut()
            .push((program.to_string(), args.to_vec()));
        if self.refuse_spawn {
            Err(DispatchError::Launch(format!("{program} missing")))
        } else {
            Ok(())
        }
    }

    fn open_default(&self, url: &str) -> Result<(), DispatchError> {
        self.defaults.borrow_mut().push(url.to_string());
        Ok(())
    }
}

fn open_app(root: &TempDir) -> LinkshellApp {
    let dirs = AppDirs::resolve(
        Some(root.path().join("config")),
        Some(root.path().join("data")),
    )
    .unwrap();
    LinkshellApp::open(dirs).unwrap()
}

fn saved(outcome: SaveOutcome) -> linkshell::core::Bookmark {
    match outcome {
        SaveOutcome::Saved(bookmark) => bookmark,
        other => panic!("expected a save, got {other:?}"),
    }
}

#[test]
fn scenarios_binary_smoke_runs() {
    assert!(!VERSION.is_empty());
}

#[test]
fn blank_title_is_derived_from_host() {
    let root = TempDir::new().unwrap();
    let app = open_app(&root);

    let bookmark = saved(
        editor::submit(
            &app.store,
            None,
            &BookmarkDraft::new("", "https://Sub.Example.com/"),
            false,
        )
        .unwrap(),
    );
    assert_eq!(bookmark.title, "sub.example.com");
    assert_eq!(bookmark.url, "https://sub.example.com");
}

#[test]
fn catalogue_survives_restart_in_rank_order() {
    let root = TempDir::new().unwrap();
    {
        let app = open_app(&root);
        for url in ["a.example", "b.example", "c.example"] {
            editor::submit(&app.store, None, &BookmarkDraft::new("", url), false).unwrap();
        }
    }
    let app = open_app(&root);
    let urls: Vec<_> = app.store.list().into_iter().map(|b| b.url).collect();
    assert_eq!(
        urls,
        vec![
            "https://linux.do",
            "https://a.example",
            "https://b.example",
            "https://c.example",
        ]
    );
}

#[test]
fn insecure_bookmark_asks_on_save_and_open() {
    let root = TempDir::new().unwrap();
    let app = open_app(&root);
    let draft = BookmarkDraft::new("plain", "http://intranet.local/wiki");

    assert!(matches!(
        editor::submit(&app.store, None, &draft, false).unwrap(),
        SaveOutcome::NeedsConfirmation { .. }
    ));
    let bookmark = saved(editor::submit(&app.store, None, &draft, true).unwrap());

    let dispatcher = Dispatcher::new(ScriptedLauncher::default());
    assert_eq!(
        launcher::open_bookmark(&bookmark, app.prefs.prefs(), false, &dispatcher),
        Ok(LaunchOutcome::NeedsConfirmation {
            url: "http://intranet.local/wiki".into()
        })
    );
    assert!(dispatcher.launcher().defaults.borrow().is_empty());

    let outcome =
        launcher::open_bookmark(&bookmark, app.prefs.prefs(), true, &dispatcher).unwrap();
    assert!(matches!(
        outcome,
        LaunchOutcome::Dispatched {
            route: LaunchRoute::SystemDefault,
            ..
        }
    ));
    assert_eq!(
        *dispatcher.launcher().defaults.borrow(),
        vec!["http://intranet.local/wiki".to_string()]
    );
}

#[test]
fn global_preferred_app_routes_external_open_with_fallback() {
    let root = TempDir::new().unwrap();
    let mut app = open_app(&root);
    app.prefs.set_preferred_app_id(Some("firefox".into())).unwrap();
    app.prefs.set_default_open_mode(OpenMode::ExternalApp).unwrap();

    let bookmark = saved(
        editor::submit(&app.store, None, &BookmarkDraft::new("docs", "docs.rs"), false).unwrap(),
    );

    let working = Dispatcher::new(ScriptedLauncher::default());
    let outcome = launcher::open_bookmark(&bookmark, app.prefs.prefs(), false, &working).unwrap();
    assert!(matches!(
        outcome,
        LaunchOutcome::Dispatched {
            route: LaunchRoute::Primary,
            ..
        }
    ));
    assert_eq!(working.launcher().spawned.borrow()[0].0, "firefox");

    let broken = Dispatcher::new(ScriptedLauncher {
        refuse_spawn: true,
        ..ScriptedLauncher::default()
    });
    let outcome = launcher::open_bookmark(&bookmark, app.prefs.prefs(), false, &broken).unwrap();
    assert!(matches!(
        outcome,
        LaunchOutcome::Dispatched {
            route: LaunchRoute::SystemDefault,
            ..
        }
    ));
    assert_eq!(
        *broken.launcher().defaults.borrow(),
        vec!["https://docs.rs".to_string()]
    );
}

#[test]
fn in_session_bookmark_hands_foreign_links_to_preferred_app() {
    let root = TempDir::new().unwrap();
    let mut app = open_app(&root);
    app.prefs.set_preferred_app_id(Some("chromium".into())).unwrap();
    let bookmark = saved(
        editor::submit(
            &app.store,
            None,
            &BookmarkDraft::new("forum", "forum.example.org")
                .with_open_mode(Some(OpenMode::InSession)),
            false,
        )
        .unwrap(),
    );

    let dispatcher = Dispatcher::new(ScriptedLauncher::default());
    let LaunchOutcome::InSession(request) =
        launcher::open_bookmark(&bookmark, app.prefs.prefs(), false, &dispatcher).unwrap()
    else {
        panic!("expected an in-session open");
    };
    assert_eq!(request.preferred_app.as_deref(), Some("chromium"));

    let factory = RecordingFactory::default();
    let dispatch = RecordingDispatch::default();
    let mut host = SessionHost::open(
        &request,
        Box::new(factory.clone()),
        Box::new(SwitchConnectivity::online()),
        Box::new(dispatch.clone()),
    );
    let token = host.current_token();
    assert_eq!(factory.probe(0).loads(), vec!["https://forum.example.org"]);

    host.on_renderer_event(token, RendererEvent::PageStarted);
    host.on_renderer_event(token, RendererEvent::PageFinished);
    assert_eq!(host.state(), SessionState::Loaded);

    assert!(!host.should_override_navigation(token, "https://forum.example.org/t/42"));
    assert!(host.should_override_navigation(token, "https://github.com/x"));
    assert_eq!(
        dispatch.opened(),
        vec![(
            "https://github.com/x".to_string(),
            Some("chromium".to_string())
        )]
    );
}

#[test]
fn renderer_crash_recovers_with_retry() {
    let request = linkshell::shell::launcher::SessionRequest {
        url: "https://a.example".into(),
        preferred_app: None,
    };
    let factory = RecordingFactory::default();
    let mut host = SessionHost::open(
        &request,
        Box::new(factory.clone()),
        Box::new(SwitchConnectivity::online()),
        Box::new(RecordingDispatch::default()),
    );
    let stale = host.current_token();
    host.on_renderer_event(stale, RendererEvent::ProcessGone);
    assert_eq!(host.view().error, Some(ShellError::RendererCrashed));

    host.on_renderer_event(stale, RendererEvent::PageFinished);
    assert!(matches!(host.state(), SessionState::Failed(_)));

    host.retry();
    assert_eq!(host.state(), SessionState::Loading);
    assert_eq!(factory.probe(1).loads(), vec!["https://a.example"]);
}

#[tokio::test(start_paused = true)]
async fn debounced_search_sees_new_bookmarks() {
    let root = TempDir::new().unwrap();
    let app = open_app(&root);
    let (search, mut results) = SearchController::spawn(app.store.clone());

    search.set_query("rust");
    tokio::time::sleep(SEARCH_DEBOUNCE + Duration::from_millis(10)).await;
    let first = results.recv().await.unwrap();
    assert_eq!(first.query, "rust");
    assert!(first.bookmarks.is_empty());

    app.store
        .add(&BookmarkDraft::new("The Rust Book", "doc.rust-lang.org/book"))
        .unwrap();
    let next = results.recv().await.unwrap();
    assert_eq!(next.bookmarks.len(), 1);
    assert_eq!(next.bookmarks[0].title, "The Rust Book");

    search.shutdown();
}
