//! Async client plumbing for Consync (API access, session driver, fan-out).

/// HTTP client for Kubernetes-style collection APIs.
pub mod api;
/// Session driver: sequential pagination, refresh scheduling, snapshots.
pub mod driver;
/// Client error types and HTTP error mapping.
pub mod error;
/// Aggregate-status fan-out over concurrent child lookups.
pub mod fanout;

pub use api::ApiClient;
pub use consync_core::{
    cancel, config, constants, filter, models, prune, selection, session, CancelToken,
    ClientConfig, FetchSession, SelectionSet, SyncError,
};
pub use driver::{spawn_sync, ListSnapshot, SyncCommand, SyncEvent, SyncHandle, SyncOptions};
pub use error::ClientError;
pub use fanout::{aggregate_ready, AggregateStatus};
