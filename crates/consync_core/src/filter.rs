//! Client-side keyword filtering and server-side label selectors.
//!
//! Two filter sources compose on a list view: free-text keyword tokens are
//! evaluated client-side against the accumulated item set, while structural
//! selectors are pushed down to the server as a `labelSelector` query
//! parameter and never re-evaluated locally.

use crate::error::SyncError;
use crate::models::ResourceObject;
use crate::session::FilterFn;
use std::collections::BTreeMap;

/// Free-text keyword filter.
///
/// Every token must match at least one searchable field (AND across tokens,
/// OR across fields per token). Matching is case-insensitive substring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordFilter {
    tokens: Vec<String>,
}

impl KeywordFilter {
    /// Parse whitespace-separated tokens. Returns `None` for blank input,
    /// which callers treat as "no filtering".
    pub fn parse(input: &str) -> Option<Self> {
        let tokens: Vec<String> = input
            .split_whitespace()
            .map(|token| token.to_lowercase())
            .collect();
        if tokens.is_empty() {
            None
        } else {
            Some(Self { tokens })
        }
    }

    /// Whether every token matches at least one of the given fields.
    pub fn matches(&self, fields: &[&str]) -> bool {
        self.tokens.iter().all(|token| {
            fields
                .iter()
                .any(|field| field.to_lowercase().contains(token))
        })
    }

    /// Build a session predicate over the standard searchable fields of a
    /// resource record: name, namespace, uid, kind, and label values.
    pub fn into_predicate(self) -> FilterFn<ResourceObject> {
        Box::new(move |item: &ResourceObject| {
            let mut fields: Vec<&str> = vec![
                item.metadata.name.as_str(),
                item.metadata.namespace.as_deref().unwrap_or(""),
                item.uid(),
                item.kind.as_str(),
            ];
            fields.extend(item.metadata.labels.values().map(String::as_str));
            self.matches(&fields)
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SelectorOp {
    Eq,
    NotEq,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SelectorRequirement {
    key: String,
    op: SelectorOp,
    value: String,
}

/// Structural label selector, serialized onto list requests for server-side
/// evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    requirements: Vec<SelectorRequirement>,
}

impl LabelSelector {
    /// Parse a comma-separated selector such as `state=failed,pool!=shared`.
    ///
    /// # Errors
    /// Returns [`SyncError::InvalidSelector`] on an empty requirement, a
    /// missing operator, or an empty key.
    pub fn parse(input: &str) -> Result<Self, SyncError> {
        let mut requirements = Vec::new();
        for raw in input.split(',') {
            let raw = raw.trim();
            if raw.is_empty() {
                return Err(SyncError::InvalidSelector(
                    "empty requirement".to_string(),
                ));
            }
            let (key, op, value) = if let Some((key, value)) = raw.split_once("!=") {
                (key, SelectorOp::NotEq, value)
            } else if let Some((key, value)) = raw.split_once('=') {
                (key, SelectorOp::Eq, value)
            } else {
                return Err(SyncError::InvalidSelector(format!(
                    "missing operator in '{}'",
                    raw
                )));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(SyncError::InvalidSelector(format!(
                    "missing key in '{}'",
                    raw
                )));
            }
            requirements.push(SelectorRequirement {
                key: key.to_string(),
                op,
                value: value.trim().to_string(),
            });
        }
        Ok(Self { requirements })
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    /// Wire form for the `labelSelector` query parameter.
    pub fn to_query(&self) -> String {
        self.requirements
            .iter()
            .map(|req| match req.op {
                SelectorOp::Eq => format!("{}={}", req.key, req.value),
                SelectorOp::NotEq => format!("{}!={}", req.key, req.value),
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Evaluate the selector against a label map. The server is authoritative
    /// for list requests; this is used by tests and local tooling.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|req| match req.op {
            SelectorOp::Eq => labels.get(&req.key).map(String::as_str) == Some(&req.value),
            SelectorOp::NotEq => labels.get(&req.key).map(String::as_str) != Some(&req.value),
        })
    }
}
