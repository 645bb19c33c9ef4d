//! Aggregate-status fan-out over concurrent child lookups.
//!
//! Given a set of parent records each owning zero or more child-lookup keys,
//! issue one lookup per key, let them run concurrently, and derive a
//! per-parent "complete" flag from the conjunction of its children's
//! results. The aggregate is computed once, after every outstanding lookup
//! for the current parent set has settled; it is one fan-out/fan-in barrier
//! per parent-set change, not a streaming aggregation. Emission is
//! suppressed when the owning view's token was signaled in the meantime.

use consync_core::cancel::CancelToken;
use std::collections::HashMap;
use std::future::Future;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Result of one fan-out/fan-in pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateStatus {
    /// Per-parent readiness, in the order the parents were given.
    pub ready_by_parent: Vec<(String, bool)>,
    /// Number of parents whose children all settled successfully.
    pub ready_count: usize,
    pub total: usize,
}

/// Run one fan-out/fan-in pass over `parents`, a list of
/// `(parent uid, child lookup keys)` pairs.
///
/// A parent with no children counts as ready. Concurrency is bounded only by
/// the caller; the observed parent sets are small. Returns `None` when the
/// token was signaled before all lookups settled, so a torn-down view never
/// observes a late aggregate.
pub async fn aggregate_ready<F, Fut>(
    parents: &[(String, Vec<String>)],
    token: &CancelToken,
    lookup: F,
) -> Option<AggregateStatus>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = bool> + Send + 'static,
{
    let mut lookups = JoinSet::new();
    let mut parent_of_task = HashMap::new();
    for (at, (_, keys)) in parents.iter().enumerate() {
        for key in keys {
            let handle = lookups.spawn(lookup(key.clone()));
            parent_of_task.insert(handle.id(), at);
        }
    }

    let mut ready = vec![true; parents.len()];
    while let Some(joined) = lookups.join_next_with_id().await {
        match joined {
            Ok((id, complete)) => {
                if !complete {
                    if let Some(&at) = parent_of_task.get(&id) {
                        ready[at] = false;
                    }
                }
            }
            Err(err) => {
                // A crashed lookup counts as incomplete for its parent.
                warn!(error = %err, "child lookup task failed");
                if let Some(&at) = parent_of_task.get(&err.id()) {
                    ready[at] = false;
                }
            }
        }
    }

    if token.is_canceled() {
        debug!("suppressing aggregate emission after teardown");
        return None;
    }

    let ready_count = ready.iter().filter(|flag| **flag).count();
    Some(AggregateStatus {
        ready_by_parent: parents
            .iter()
            .map(|(uid, _)| uid.clone())
            .zip(ready)
            .collect(),
        ready_count,
        total: parents.len(),
    })
}
