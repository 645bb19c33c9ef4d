//! Client error types and HTTP error mapping.

use thiserror::Error;

/// Errors surfaced by the API client and session driver.
///
/// Not-found on a single-item fetch is not represented here: it is recovered
/// locally as `Ok(None)` by the client. Canceled-session arrivals are dropped
/// silently and are not an error condition either.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid server URL: {0}")]
    BaseUrl(String),

    #[error(transparent)]
    Core(#[from] consync_core::SyncError),
}
