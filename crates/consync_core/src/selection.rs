//! Checkbox selection tracking, decoupled from fetch state.
//!
//! Selection survives filter changes but not a session restart; consumers
//! clear or prune the set whenever items are removed so it never reports a
//! uid absent from the owning session for longer than one update cycle.

use std::collections::HashSet;

/// Set of selected item uids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    selected: HashSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the selection wholly ("select all").
    pub fn set<I, S>(&mut self, uids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected = uids.into_iter().map(Into::into).collect();
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Add uids to the selection; already-present uids are a no-op.
    pub fn add<I, S>(&mut self, uids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected.extend(uids.into_iter().map(Into::into));
    }

    /// Remove uids from the selection; absent uids are a no-op.
    pub fn remove(&mut self, uids: &[&str]) {
        for uid in uids {
            self.selected.remove(*uid);
        }
    }

    /// Drop any uid not present in the owning session's current items.
    pub fn retain_known<'a, I>(&mut self, known: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let known: HashSet<&str> = known.into_iter().collect();
        self.selected.retain(|uid| known.contains(uid.as_str()));
    }

    pub fn is_selected(&self, uid: &str) -> bool {
        self.selected.contains(uid)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected uids in arbitrary order.
    pub fn uids(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }
}
