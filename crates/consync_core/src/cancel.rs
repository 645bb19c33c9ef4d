//! One-way cancellation tokens for fetch sessions.
//!
//! A token is created with its session and captured by every async page
//! fetch issued on the session's behalf. Signaling is one-way: once
//! canceled, a token never resets, and any response that arrives afterwards
//! must be dropped without touching session state. A logically new session
//! always gets a fresh token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag, cheap to clone into async closures.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    canceled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a fresh, unsignaled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the token. Idempotent; never un-signals.
    pub fn cancel(&self) {
        self.canceled.store(true, Ordering::SeqCst);
    }

    /// Whether the token has been signaled.
    ///
    /// Checked after every await point; an in-flight request cannot be
    /// aborted at the transport level, only ignored on arrival.
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_one_way_and_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!token.is_canceled());

        clone.cancel();
        assert!(token.is_canceled());

        // Signaling again changes nothing.
        token.cancel();
        assert!(clone.is_canceled());
    }
}
