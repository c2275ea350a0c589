//! Helper functions for UI operations.
//!
//! Background fetches are spawned here. Every task reports back through
//! `AppEvent`, and a panic inside a task becomes `AppEvent::TaskPanicked`
//! instead of a silently vanished task.

use crate::app::{App, AppEvent};
use crate::catalog::detail::{resolve_artwork, resolve_detail};
use crate::catalog::SourceRequest;
use anyhow::Result;
use futures::FutureExt;
use std::io::Write;
use std::panic::AssertUnwindSafe;
use tokio::sync::mpsc;

/// Wraps a future to catch panics and convert them to errors.
///
/// # Returns
///
/// - `Ok(result)` if the future completes normally
/// - `Err(panic_message)` if the future panics
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: std::future::Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

/// Spawn `future` and send its event, or `TaskPanicked` if it panics.
fn spawn_reporting<F>(task: &'static str, event_tx: &mpsc::Sender<AppEvent>, future: F) -> tokio::task::JoinHandle<()>
where
    F: std::future::Future<Output = AppEvent> + Send + 'static,
{
    let tx = event_tx.clone();
    tokio::spawn(async move {
        let event = match catch_task_panic(future).await {
            Ok(event) => event,
            Err(error) => {
                tracing::error!(task, error = %error, "Background task panicked");
                AppEvent::TaskPanicked { task, error }
            }
        };
        if let Err(e) = tx.send(event).await {
            tracing::warn!(task, error = %e, "Failed to send task result (receiver dropped)");
        }
    })
}

/// Start the listing fetches the aggregator asked for.
pub(super) fn spawn_source_requests(
    app: &App,
    requests: Vec<SourceRequest>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    for request in requests {
        let store = app.store.clone();
        match request {
            SourceRequest::FullListing => {
                tracing::debug!("Spawning full listing fetch");
                spawn_reporting("full_listing", event_tx, async move {
                    AppEvent::FullListingLoaded(store.full_listing().await)
                });
            }
            SourceRequest::Category(category) => {
                tracing::debug!(category = %category, "Spawning category fetch");
                spawn_reporting("category_listing", event_tx, async move {
                    let result = store.category(&category).await;
                    AppEvent::CategoryLoaded { category, result }
                });
            }
        }
    }
}

/// Start detail fetches for on-screen cards that have no state.
pub(super) fn spawn_card_loads(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    for name in app.pending_cards() {
        let store = app.store.clone();
        spawn_reporting("card_detail", event_tx, async move {
            let result = store.detail(&name).await;
            AppEvent::CardLoaded { name, result }
        });
    }
}

/// Spawn the fetches a filter or listing change requires, then the card
/// loads for whatever became visible.
pub(super) fn sync_catalog(
    app: &mut App,
    requests: Vec<SourceRequest>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    spawn_source_requests(app, requests, event_tx);
    spawn_card_loads(app, event_tx);
}

/// Load the detail view `app` just opened.
pub(super) fn spawn_detail_load(
    app: &mut App,
    name: String,
    generation: u64,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    let store = app.store.clone();
    tracing::debug!(name = %name, generation, "Spawning detail load");
    app.detail_handle = Some(spawn_reporting("detail", event_tx, async move {
        let resolution = resolve_detail(&store, &name).await;
        AppEvent::DetailResolved {
            name,
            generation,
            resolution,
        }
    }));
}

/// Resolve artwork for evolution nodes, one independent task per node.
pub(super) fn spawn_artwork_loads(
    app: &App,
    identifiers: Vec<String>,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    for identifier in identifiers {
        let store = app.store.clone();
        spawn_reporting("artwork", event_tx, async move {
            let locator = resolve_artwork(&store, &identifier).await;
            AppEvent::ArtworkLoaded {
                identifier,
                locator,
            }
        });
    }
}

/// Terminal bell, used as the favorite sound.
pub(super) fn ring_bell() {
    let mut stdout = std::io::stdout();
    if let Err(e) = stdout.write_all(b"\x07").and_then(|()| stdout.flush()) {
        tracing::debug!(error = %e, "Failed to ring bell");
    }
}
