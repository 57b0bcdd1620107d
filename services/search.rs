/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Debounced bookmark search.
//!
//! Query edits are coalesced until input has been quiet for
//! [`SEARCH_DEBOUNCE`]; only then is the store subscription swapped. The
//! previous subscription is cancelled before the new one starts, so results
//! for an older query never follow results for a newer one.

use std::sync::Arc;
use std::time::Duration;

use linkshell_core::Bookmark;
use log::debug;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::persistence::{BookmarkStore, BookmarkSubscription};

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
const RESULTS_CAPACITY: usize = 16;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchResults {
    pub query: String,
    pub bookmarks: Vec<Bookmark>,
}

/// Handle to a running search task. Dropping it stops the task.
pub struct SearchController {
    queries: mpsc::UnboundedSender<String>,
    shutdown: CancellationToken,
}

impl SearchController {
    /// Start the search task on the current tokio runtime.
    pub fn spawn(store: Arc<BookmarkStore>) -> (Self, mpsc::Receiver<SearchResults>) {
        let (queries_tx, queries_rx) = mpsc::unbounded_channel();
        let (results_tx, results_rx) = mpsc::channel(RESULTS_CAPACITY);
        let shutdown = CancellationToken::new();
        tokio::spawn(run_search(
            store,
            queries_rx,
            results_tx,
            shutdown.clone(),
        ));
        (
            Self {
                queries: queries_tx,
                shutdown,
            },
            results_rx,
        )
    }

    pub fn set_query(&self, query: impl Into<String>) {
        if self.queries.send(query.into()).is_err() {
            debug!("Search task already stopped; query dropped");
        }
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run_search(
    store: Arc<BookmarkStore>,
    mut queries: mpsc::UnboundedReceiver<String>,
    results: mpsc::Sender<SearchResults>,
    shutdown: CancellationToken,
) {
    let mut pending: Option<String> = None;
    let mut active: Option<CancellationToken> = None;

    loop {
        // Re-armed on every loop turn, so each new query restarts the window.
        let armed = pending.is_some();
        let quiet = async move {
            if armed {
                tokio::time::sleep(SEARCH_DEBOUNCE).await;
            } else {
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            query = queries.recv() => match query {
                Some(query) => pending = Some(query),
                None => break,
            },
            _ = quiet => {
                let Some(query) = pending.take() else {
                    continue;
                };
                if let Some(previous) = active.take() {
                    previous.cancel();
                }
                let token = shutdown.child_token();
                active = Some(token.clone());
                debug!("Search subscription switched to {query:?}");
                tokio::spawn(forward_results(
                    store.observe_search(&query),
                    results.clone(),
                    token,
                ));
            },
        }
    }

    if let Some(previous) = active {
        previous.cancel();
    }
}

async fn forward_results(
    mut subscription: BookmarkSubscription,
    results: mpsc::Sender<SearchResults>,
    token: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => return,
            next = subscription.next() => next,
        };
        let Some(bookmarks) = next else {
            return;
        };
        let batch = SearchResults {
            query: subscription.query().to_string(),
            bookmarks,
        };
        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            sent = results.send(batch) => {
                if sent.is_err() {
                    return;
                }
            },
        }
    }
}
