/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Linkshell: a bookmark catalogue whose entries open in an external
//! browser view, a full external application, or an embedded navigation
//! session.

pub mod app;
pub mod persistence;
pub mod prefs;
pub mod services;
pub mod shell;

pub use linkshell_core as core;

use tracing_subscriber::EnvFilter;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_TRACING_FILTER: &str = "warn";

/// Install the stderr subscriber. `filter` wins over `RUST_LOG`; with
/// neither, only warnings are shown. `log` records are bridged in.
pub fn init_tracing(filter: Option<&str>) {
    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_TRACING_FILTER)),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
