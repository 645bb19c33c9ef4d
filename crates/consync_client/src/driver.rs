//! Session driver: sequential pagination, refresh scheduling, snapshots.
//!
//! One driver task owns one [`FetchSession`] and is its only writer. Pages
//! are requested strictly sequentially, the refresh deadline is armed by the
//! state machine on cursor exhaustion, and cancellation is cooperative:
//! the token is checked after every await, never preempted mid-request.
//! Dropping the [`SyncHandle`] signals the token; the task notices at its
//! next check and exits, clearing the pending refresh with it.

use crate::api::ApiClient;
use crate::error::ClientError;
use consync_core::cancel::CancelToken;
use consync_core::config::env_flag_enabled;
use consync_core::constants::{DEFAULT_PAGE_LIMIT, DEFAULT_REFRESH_INTERVAL_MS};
use consync_core::filter::LabelSelector;
use consync_core::models::{ResourceObject, ResourceRef};
use consync_core::session::{FetchSession, FilterFn, PruneFn};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How often the wait loop wakes up to re-check the cancellation token.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Env flag enabling per-page sync timing logs.
const PERF_LOG_ENV: &str = "CONSYNC_PERF_LOG";

/// Query identity and session parameters for one synchronized view.
pub struct SyncOptions {
    pub resource: ResourceRef,
    pub namespace: Option<String>,
    pub selector: Option<LabelSelector>,
    pub limit: usize,
    pub refresh_interval: Duration,
    pub filter: Option<FilterFn<ResourceObject>>,
    pub prune: Option<PruneFn<ResourceObject>>,
}

impl SyncOptions {
    pub fn new(resource: ResourceRef) -> Self {
        Self {
            resource,
            namespace: None,
            selector: None,
            limit: DEFAULT_PAGE_LIMIT,
            refresh_interval: Duration::from_millis(DEFAULT_REFRESH_INTERVAL_MS),
            filter: None,
            prune: None,
        }
    }
}

/// Point-in-time copy of the session's list state, published after every
/// merged page and every local mutation.
#[derive(Debug, Clone)]
pub struct ListSnapshot {
    pub items: Vec<ResourceObject>,
    pub filtered: Vec<ResourceObject>,
    pub finished: bool,
    pub refreshing: bool,
}

/// Events published by the driver task.
#[derive(Debug)]
pub enum SyncEvent {
    Snapshot(ListSnapshot),
    /// A page fetch failed; the session keeps its prior state and the next
    /// refresh cycle is the retry.
    PageError(ClientError),
}

/// View-issued commands applied by the driver between fetches.
pub enum SyncCommand {
    SetFilter(Option<FilterFn<ResourceObject>>),
    GrowLimit(usize),
    RemoveItems(Vec<String>),
    UpdateItems(Vec<ResourceObject>),
}

/// Handle for observing and steering a running sync task.
///
/// Dropping the handle cancels the session.
pub struct SyncHandle {
    pub events: mpsc::UnboundedReceiver<SyncEvent>,
    commands: mpsc::UnboundedSender<SyncCommand>,
    token: CancelToken,
    task: Option<JoinHandle<()>>,
}

impl SyncHandle {
    /// Replace the client-side filter predicate; recomputed over the full
    /// accumulated item set without a refetch.
    pub fn set_filter(&self, filter: Option<FilterFn<ResourceObject>>) {
        let _ = self.commands.send(SyncCommand::SetFilter(filter));
    }

    /// Grow the page size for "load more"; takes effect on the next cycle.
    pub fn grow_limit(&self, delta: usize) {
        let _ = self.commands.send(SyncCommand::GrowLimit(delta));
    }

    /// Drop rows locally after a delete succeeded.
    pub fn remove_items(&self, uids: Vec<String>) {
        let _ = self.commands.send(SyncCommand::RemoveItems(uids));
    }

    /// Replace rows locally after a patch succeeded.
    pub fn update_items(&self, records: Vec<ResourceObject>) {
        let _ = self.commands.send(SyncCommand::UpdateItems(records));
    }

    /// Handle to the session's cancellation token.
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Signal the session's token without waiting for the task to stop.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Cancel the session and wait for the driver task to exit.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Spawn the driver task for one view's query identity.
///
/// Starting a replacement sync for the same view requires cancelling the old
/// handle first; each call creates an independent session with a fresh token.
pub fn spawn_sync(client: ApiClient, options: SyncOptions) -> SyncHandle {
    let (evt_tx, evt_rx) = mpsc::unbounded_channel();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

    let session = FetchSession::start(options.filter, options.limit, options.prune);
    let token = session.token();
    let query = SyncQuery {
        resource: options.resource,
        namespace: options.namespace,
        selector: options.selector,
        refresh_interval: options.refresh_interval,
    };

    let task = tokio::spawn(run_sync(client, query, session, cmd_rx, evt_tx));

    SyncHandle {
        events: evt_rx,
        commands: cmd_tx,
        token,
        task: Some(task),
    }
}

struct SyncQuery {
    resource: ResourceRef,
    namespace: Option<String>,
    selector: Option<LabelSelector>,
    refresh_interval: Duration,
}

async fn run_sync(
    client: ApiClient,
    query: SyncQuery,
    mut session: FetchSession<ResourceObject>,
    mut commands: mpsc::UnboundedReceiver<SyncCommand>,
    events: mpsc::UnboundedSender<SyncEvent>,
) {
    let token = session.token();
    let perf_log_enabled = env_flag_enabled(PERF_LOG_ENV);
    loop {
        if token.is_canceled() {
            break;
        }

        while let Ok(command) = commands.try_recv() {
            apply_command(&mut session, command, &events);
        }

        if let Some(request) = session.begin_page() {
            let started = Instant::now();
            let result = client
                .list(
                    &query.resource,
                    query.namespace.as_deref(),
                    query.selector.as_ref(),
                    request.limit,
                    request.cursor.as_deref(),
                )
                .await;
            if token.is_canceled() {
                debug!(resource = %query.resource.plural, "dropping page response for canceled session");
                break;
            }
            match result {
                Ok(page) => {
                    let merged = page.items.len();
                    session.page_received(
                        page.items,
                        page.metadata.continue_token,
                        query.refresh_interval,
                    );
                    log_sync_perf(
                        perf_log_enabled,
                        &query.resource.plural,
                        merged,
                        session.items().len(),
                        session.finished(),
                        started.elapsed().as_secs_f64() * 1000.0,
                    );
                    if events
                        .send(SyncEvent::Snapshot(snapshot_of(&session)))
                        .is_err()
                    {
                        break;
                    }
                }
                Err(err) => {
                    warn!(
                        resource = %query.resource.plural,
                        error = %err,
                        "page fetch failed; retrying on next refresh cycle"
                    );
                    session.page_failed(query.refresh_interval);
                    if events.send(SyncEvent::PageError(err)).is_err() {
                        break;
                    }
                }
            }
            continue;
        }

        let Some(deadline) = session.next_refresh_at() else {
            break;
        };
        let now = Instant::now();
        if now >= deadline {
            session.start_refresh();
            continue;
        }

        let wait = deadline
            .saturating_duration_since(now)
            .min(CANCEL_POLL_INTERVAL);
        match tokio::time::timeout(wait, commands.recv()).await {
            Ok(Some(command)) => apply_command(&mut session, command, &events),
            // Sender dropped: the handle is gone, so the token is (or is
            // about to be) signaled; the top of the loop exits.
            Ok(None) => tokio::time::sleep(wait).await,
            Err(_) => {}
        }
    }
    debug!("sync driver stopped");
}

fn log_sync_perf(
    enabled: bool,
    resource: &str,
    merged: usize,
    total: usize,
    finished: bool,
    elapsed_ms: f64,
) {
    if !enabled {
        return;
    }
    debug!(
        target: "consync_client::sync_perf",
        resource,
        merged,
        total,
        finished,
        elapsed_ms,
        "page merged"
    );
}

fn apply_command(
    session: &mut FetchSession<ResourceObject>,
    command: SyncCommand,
    events: &mpsc::UnboundedSender<SyncEvent>,
) {
    match command {
        SyncCommand::SetFilter(filter) => session.set_filter(filter),
        SyncCommand::GrowLimit(delta) => {
            session.grow_limit(delta);
            // A larger window only materializes by refetching from page one.
            if session.finished() {
                session.start_refresh();
            }
            return;
        }
        SyncCommand::RemoveItems(uids) => {
            let uids: Vec<&str> = uids.iter().map(String::as_str).collect();
            session.remove_items(&uids);
        }
        SyncCommand::UpdateItems(records) => session.update_items(records),
    }
    let _ = events.send(SyncEvent::Snapshot(snapshot_of(session)));
}

fn snapshot_of(session: &FetchSession<ResourceObject>) -> ListSnapshot {
    ListSnapshot {
        items: session.items().to_vec(),
        filtered: session.filtered_items().to_vec(),
        finished: session.finished(),
        refreshing: session.refreshing(),
    }
}
