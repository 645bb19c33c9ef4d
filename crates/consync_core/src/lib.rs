//! Core list-synchronization engine for Consync (state machine, filters, selection).

/// One-way cancellation tokens for fetch sessions.
pub mod cancel;
/// Configuration loading and refresh-interval tables.
pub mod config;
/// Shared constants used across Consync crates.
pub mod constants;
/// Application error types (parsing/domain).
pub mod error;
/// Client-side keyword filtering and label selectors.
pub mod filter;
/// Wire-format models for collection APIs.
pub mod models;
/// Ingestion-time field pruning for long-lived lists.
pub mod prune;
/// Checkbox selection tracking, decoupled from fetch state.
pub mod selection;
/// The fetch state machine driving paginated, refreshing list views.
pub mod session;

#[cfg(test)]
mod tests;

pub use cancel::CancelToken;
pub use config::{ClientConfig, RefreshIntervals};
pub use error::SyncError;
pub use filter::{KeywordFilter, LabelSelector};
pub use models::{ListMeta, ObjectMeta, ResourceList, ResourceObject};
pub use selection::SelectionSet;
pub use session::{FetchSession, PageRequest, SessionItem};
