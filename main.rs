/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::path::PathBuf;
use std::process::ExitCode;

use bpaf::Bpaf;
use linkshell::app::{AppDirs, LinkshellApp};
use linkshell::core::{AppChoice, Bookmark, BookmarkDraft, BookmarkId, OpenMode};
use linkshell::services::app_registry::{AppRegistry, PathAppRegistry, choice_rows};
use linkshell::services::dispatch::Dispatcher;
use linkshell::shell::editor::{self, SaveOutcome};
use linkshell::shell::launcher::{self, LaunchOutcome};
use time::macros::format_description;

/// Bookmark catalogue with per-link open-mode routing.
#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version)]
struct Cli {
    /// Directory holding bookmarks.redb
    #[bpaf(long("data-dir"), argument("DIR"))]
    data_dir: Option<PathBuf>,
    /// Directory holding prefs.toml and the legacy url_config.toml
    #[bpaf(long("config-dir"), argument("DIR"))]
    config_dir: Option<PathBuf>,
    /// Log filter, e.g. `debug` or `linkshell=trace`; overrides RUST_LOG
    #[bpaf(long("log"), argument("FILTER"))]
    log: Option<String>,
    #[bpaf(external(command))]
    command: Command,
}

#[derive(Debug, Clone, Bpaf)]
struct EntryFields {
    /// Display title; derived from the host when omitted
    #[bpaf(long("title"), argument("TITLE"))]
    title: Option<String>,
    /// custom-view, external-app or in-session; global default when omitted
    #[bpaf(long("mode"), argument("MODE"))]
    mode: Option<OpenMode>,
    /// Application id to open with; global preference when omitted
    #[bpaf(long("app"), argument("APP_ID"))]
    app: Option<String>,
    /// Accept a plain-http URL without asking
    #[bpaf(short('y'), long("yes"), switch)]
    yes: bool,
}

#[derive(Debug, Clone, Bpaf)]
enum Command {
    /// List bookmarks in order
    #[bpaf(command("list"))]
    List {
        /// Only bookmarks whose title or URL contains QUERY
        #[bpaf(long("search"), argument("QUERY"))]
        search: Option<String>,
    },
    /// Add a bookmark
    #[bpaf(command("add"))]
    Add {
        #[bpaf(external(entry_fields))]
        fields: EntryFields,
        /// URL; https is assumed when no scheme is given
        #[bpaf(positional("URL"))]
        url: String,
    },
    /// Replace a bookmark's title, URL, and overrides
    #[bpaf(command("edit"))]
    Edit {
        #[bpaf(external(entry_fields))]
        fields: EntryFields,
        #[bpaf(positional("ID"))]
        id: String,
        #[bpaf(positional("URL"))]
        url: String,
    },
    /// Delete a bookmark
    #[bpaf(command("remove"))]
    Remove {
        #[bpaf(positional("ID"))]
        id: String,
    },
    /// Open a bookmark with its effective mode and application
    #[bpaf(command("open"))]
    Open {
        /// Open a plain-http URL without asking
        #[bpaf(short('y'), long("yes"), switch)]
        yes: bool,
        #[bpaf(positional("ID"))]
        id: String,
    },
    /// Show or change global preferences
    #[bpaf(command("settings"))]
    Settings {
        /// Global default open mode
        #[bpaf(long("default-mode"), argument("MODE"))]
        default_mode: Option<OpenMode>,
        /// Global preferred application id
        #[bpaf(long("app"), argument("APP_ID"))]
        app: Option<String>,
        /// Go back to the system default application
        #[bpaf(long("clear-app"), switch)]
        clear_app: bool,
        /// Ask before every plain-http open
        #[bpaf(long("confirm-http"), argument("BOOL"))]
        confirm_http: Option<bool>,
    },
    /// List applications bookmarks can be routed to
    #[bpaf(command("apps"))]
    Apps,
}

fn main() -> ExitCode {
    let cli = cli().run();
    linkshell::init_tracing(cli.log.as_deref());

    let dirs = match AppDirs::resolve(cli.config_dir, cli.data_dir) {
        Ok(dirs) => dirs,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        },
    };
    let mut app = match LinkshellApp::open(dirs) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        },
    };

    match run(&mut app, cli.command) {
        Ok(code) => code,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        },
    }
}

fn run(app: &mut LinkshellApp, command: Command) -> Result<ExitCode, String> {
    match command {
        Command::List { search } => {
            let mut subscription = app.store.observe_search(search.as_deref().unwrap_or(""));
            let bookmarks = subscription.current();
            if bookmarks.is_empty() {
                println!("No bookmarks.");
            }
            for bookmark in &bookmarks {
                print_bookmark(app, bookmark);
            }
            Ok(ExitCode::SUCCESS)
        },
        Command::Add { fields, url } => save(app, None, fields, url),
        Command::Edit { fields, id, url } => save(app, Some(BookmarkId::from(id)), fields, url),
        Command::Remove { id } => {
            let removed = app
                .store
                .delete(&BookmarkId::from(id.as_str()))
                .map_err(|e| e.to_string())?;
            if removed {
                println!("Removed {id}");
            } else {
                println!("No bookmark {id}");
            }
            Ok(ExitCode::SUCCESS)
        },
        Command::Open { yes, id } => {
            let bookmark = app
                .store
                .get(&BookmarkId::from(id.as_str()))
                .ok_or_else(|| format!("No bookmark {id}"))?;
            let dispatcher: Dispatcher = Dispatcher::default();
            match launcher::open_bookmark(&bookmark, app.prefs.prefs(), yes, &dispatcher)
                .map_err(|e| e.to_string())?
            {
                LaunchOutcome::NeedsConfirmation { url } => {
                    eprintln!("{url} is not encrypted. Re-run with --yes to open it anyway.");
                    Ok(ExitCode::from(2))
                },
                LaunchOutcome::Dispatched { target, route } => {
                    println!("Opened {} ({}, {route:?})", bookmark.url, target.mode);
                    Ok(ExitCode::SUCCESS)
                },
                LaunchOutcome::InSession(request) => {
                    eprintln!(
                        "{} opens in an embedded session, which needs a graphical host. \
                         Use `edit --mode custom-view` to open it in a browser instead.",
                        request.url
                    );
                    Ok(ExitCode::from(3))
                },
            }
        },
        Command::Settings {
            default_mode,
            app: app_id,
            clear_app,
            confirm_http,
        } => {
            if clear_app && app_id.is_some() {
                return Err("--app and --clear-app cannot be combined".to_string());
            }
            if let Some(mode) = default_mode {
                app.prefs
                    .set_default_open_mode(mode)
                    .map_err(|e| e.to_string())?;
            }
            if clear_app || app_id.is_some() {
                app.prefs
                    .set_preferred_app_id(app_id)
                    .map_err(|e| e.to_string())?;
            }
            if let Some(confirm) = confirm_http {
                app.prefs
                    .set_confirm_http_every_time(confirm)
                    .map_err(|e| e.to_string())?;
            }
            let prefs = app.prefs.prefs();
            println!("default mode:      {}", prefs.default_open_mode);
            println!(
                "preferred app:     {}",
                prefs.preferred_app().unwrap_or("(system default)")
            );
            println!("confirm http:      {}", prefs.confirm_http_every_time);
            println!("data directory:    {}", app.dirs().data_dir.display());
            println!("config directory:  {}", app.dirs().config_dir.display());
            Ok(ExitCode::SUCCESS)
        },
        Command::Apps => {
            for row in choice_rows("Follow global setting", PathAppRegistry.list()) {
                match row.app_id {
                    Some(app_id) => println!("{:<20} {}", app_id, row.label),
                    None => println!("{:<20} {}", "-", row.label),
                }
            }
            Ok(ExitCode::SUCCESS)
        },
    }
}

fn save(
    app: &LinkshellApp,
    editing: Option<BookmarkId>,
    fields: EntryFields,
    url: String,
) -> Result<ExitCode, String> {
    let draft = BookmarkDraft::new(fields.title.unwrap_or_default(), url)
        .with_open_mode(fields.mode)
        .with_app_id(fields.app);
    match editor::submit(&app.store, editing.as_ref(), &draft, fields.yes)
        .map_err(|e| e.to_string())?
    {
        SaveOutcome::NeedsConfirmation { url } => {
            eprintln!("{url} is not encrypted. Re-run with --yes to save it anyway.");
            Ok(ExitCode::from(2))
        },
        SaveOutcome::Saved(bookmark) => {
            print_bookmark(app, &bookmark);
            Ok(ExitCode::SUCCESS)
        },
        SaveOutcome::Gone => Err("That bookmark no longer exists".to_string()),
    }
}

fn print_bookmark(app: &LinkshellApp, bookmark: &Bookmark) {
    let prefs = app.prefs.prefs();
    let mode = match bookmark.open_mode {
        Some(mode) => mode.to_string(),
        None => format!("{} (default)", prefs.default_open_mode),
    };
    let application = if launcher::app_choice_applies(bookmark.open_mode, prefs) {
        match launcher::effective_app(bookmark, prefs) {
            AppChoice::Specific(app_id) => app_id,
            AppChoice::SystemDefault => "system default".to_string(),
        }
    } else {
        "-".to_string()
    };
    println!(
        "{:>3}  {}  {}  {}\n     {}  [{mode}, {application}]  added {}",
        bookmark.rank,
        bookmark.id,
        bookmark.title,
        if bookmark.url.starts_with("http://") {
            "(insecure)"
        } else {
            ""
        },
        bookmark.url,
        format_date(bookmark.created_at_ms),
    );
}

fn format_date(millis: i64) -> String {
    time::OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
        .ok()
        .and_then(|date| date.format(format_description!("[year]-[month]-[day]")).ok())
        .unwrap_or_else(|| "-".to_string())
}
