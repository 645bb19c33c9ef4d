//! The fetch state machine driving paginated, refreshing list views.
//!
//! One [`FetchSession`] exists per mounted view per query identity. All
//! mutation goes through the transition methods below; the consumer (the
//! driver in `consync_client`, or a test harness) observes the state and
//! performs the actual network I/O. Transitions are synchronous and atomic
//! with respect to each other; the single-writer discipline is the only
//! locking this design needs.

use crate::cancel::CancelToken;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

/// Items stored in a session must expose a stable unique identifier.
pub trait SessionItem {
    fn uid(&self) -> &str;
}

impl SessionItem for crate::models::ResourceObject {
    fn uid(&self) -> &str {
        crate::models::ResourceObject::uid(self)
    }
}

/// Client-side filter predicate; `None` on the session means "no filtering".
pub type FilterFn<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

/// Ingestion-time projection applied to each incoming item before storage.
pub type PruneFn<T> = Box<dyn Fn(T) -> T + Send + Sync>;

/// Parameters for the next authorized page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Continuation cursor; `None` requests the first page.
    pub cursor: Option<String>,
    /// Requested page size.
    pub limit: usize,
}

/// One logical fetch lifecycle for a specific query identity.
pub struct FetchSession<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
    filtered: Vec<T>,
    filter: Option<FilterFn<T>>,
    prune: Option<PruneFn<T>>,
    cursor: Option<String>,
    limit: usize,
    initial_limit: usize,
    can_continue: bool,
    refreshing: bool,
    finished: bool,
    next_refresh_at: Option<Instant>,
    token: CancelToken,
}

impl<T: SessionItem + Clone> FetchSession<T> {
    /// Start a new session: empty item set, no cursor, first page permitted.
    ///
    /// The caller must signal any previous session's token before starting a
    /// replacement session for the same view.
    pub fn start(filter: Option<FilterFn<T>>, limit: usize, prune: Option<PruneFn<T>>) -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
            filtered: Vec::new(),
            filter,
            prune,
            cursor: None,
            limit,
            initial_limit: limit,
            can_continue: true,
            refreshing: false,
            finished: false,
            next_refresh_at: None,
            token: CancelToken::new(),
        }
    }

    /// Handle to the session's cancellation token.
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Accumulated items, arrival order across pages.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Items satisfying the current filter, in the same relative order.
    pub fn filtered_items(&self) -> &[T] {
        &self.filtered
    }

    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Whether a fetch for the next page is permitted right now.
    pub fn can_continue(&self) -> bool {
        self.can_continue
    }

    /// Whether a background refresh cycle is active.
    pub fn refreshing(&self) -> bool {
        self.refreshing
    }

    /// Whether the query has reached cursor exhaustion and is not
    /// mid-refresh.
    pub fn finished(&self) -> bool {
        self.finished
    }

    /// Deadline for the next background refresh, armed on exhaustion.
    pub fn next_refresh_at(&self) -> Option<Instant> {
        self.next_refresh_at
    }

    pub fn is_canceled(&self) -> bool {
        self.token.is_canceled()
    }

    /// Authorize the next page request, or `None` when no fetch is permitted.
    ///
    /// Flips `can_continue` off while the request is outstanding, so the
    /// session can never authorize two concurrent page requests;
    /// [`page_received`](Self::page_received) or
    /// [`page_failed`](Self::page_failed) re-derives it.
    pub fn begin_page(&mut self) -> Option<PageRequest> {
        if self.token.is_canceled() || !self.can_continue {
            return None;
        }
        self.can_continue = false;
        Some(PageRequest {
            cursor: self.cursor.clone(),
            limit: self.limit,
        })
    }

    /// Apply a received page: prune and merge items (replace by uid, never
    /// duplicate), advance the cursor, and on exhaustion mark the query
    /// finished and arm one refresh deadline.
    ///
    /// A page arriving after the session's token was signaled is dropped
    /// without touching any state. This guards the race where teardown (or a
    /// superseding query) happened while the request was outstanding.
    pub fn page_received(
        &mut self,
        page: Vec<T>,
        next_cursor: Option<String>,
        refresh_interval: Duration,
    ) {
        if self.token.is_canceled() {
            debug!(items = page.len(), "dropping page for canceled session");
            return;
        }
        for item in page {
            let item = match &self.prune {
                Some(prune) => prune(item),
                None => item,
            };
            self.upsert(item);
        }
        self.cursor = next_cursor;
        self.can_continue = self.cursor.is_some();
        if !self.can_continue {
            self.finished = true;
            self.refreshing = false;
            self.next_refresh_at = Some(Instant::now() + refresh_interval);
        }
        self.refilter();
    }

    /// Apply a single-item fetch result, for detail views backed by a
    /// session.
    ///
    /// A present record merges like a one-item page. A missing record ("not
    /// yet created", surfaced as `None` rather than an error) carries no
    /// cursor either way, so the query is simply finished until the next
    /// refresh.
    pub fn item_received(&mut self, item: Option<T>, refresh_interval: Duration) {
        let page = match item {
            Some(item) => vec![item],
            None => Vec::new(),
        };
        self.page_received(page, None, refresh_interval);
    }

    /// Record a failed page request: state is left as it was, and the
    /// refresh deadline is armed so the next cycle is the retry mechanism.
    pub fn page_failed(&mut self, refresh_interval: Duration) {
        if self.token.is_canceled() {
            return;
        }
        self.next_refresh_at = Some(Instant::now() + refresh_interval);
    }

    /// Grow the page size for scroll-triggered "load more".
    ///
    /// Only valid while the query is finished; otherwise a page fetch is
    /// already in flight and the call is ignored. The limit never shrinks
    /// below its initial value.
    pub fn grow_limit(&mut self, delta: usize) {
        if !self.finished {
            debug!(delta, "ignoring grow_limit while fetch in progress");
            return;
        }
        self.limit = (self.limit + delta).max(self.initial_limit);
    }

    /// Replace the filter predicate and recompute the filtered view
    /// synchronously. Network state, items, and cursor are untouched.
    pub fn set_filter(&mut self, filter: Option<FilterFn<T>>) {
        self.filter = filter;
        self.refilter();
    }

    /// Begin a background refresh: force a first-page refetch while leaving
    /// accumulated items intact until the refreshed pages merge in.
    pub fn start_refresh(&mut self) {
        if self.token.is_canceled() {
            return;
        }
        self.refreshing = true;
        self.finished = false;
        self.can_continue = true;
        self.cursor = None;
        self.next_refresh_at = None;
    }

    /// Remove items locally after a client-issued delete succeeded, so the
    /// view reflects the mutation before the next poll confirms it.
    pub fn remove_items(&mut self, uids: &[&str]) {
        if uids.is_empty() {
            return;
        }
        self.items.retain(|item| !uids.contains(&item.uid()));
        self.reindex();
        self.refilter();
    }

    /// Replace items locally after a client-issued patch succeeded. Records
    /// whose uid is not currently present are ignored.
    pub fn update_items(&mut self, records: Vec<T>) {
        let mut touched = false;
        for record in records {
            let record = match &self.prune {
                Some(prune) => prune(record),
                None => record,
            };
            if let Some(&at) = self.index.get(record.uid()) {
                self.items[at] = record;
                touched = true;
            }
        }
        if touched {
            self.refilter();
        }
    }

    fn upsert(&mut self, item: T) {
        match self.index.get(item.uid()) {
            Some(&at) => self.items[at] = item,
            None => {
                self.index.insert(item.uid().to_string(), self.items.len());
                self.items.push(item);
            }
        }
    }

    fn reindex(&mut self) {
        self.index = self
            .items
            .iter()
            .enumerate()
            .map(|(at, item)| (item.uid().to_string(), at))
            .collect();
    }

    fn refilter(&mut self) {
        self.filtered = match &self.filter {
            Some(filter) => self.items.iter().filter(|item| filter(item)).cloned().collect(),
            None => self.items.clone(),
        };
    }
}
