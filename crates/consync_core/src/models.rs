//! Wire-format models for Kubernetes-style collection APIs.

use crate::error::SyncError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Standard object metadata carried by every resource record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
}

/// Collection metadata; absence of `continue` signals cursor exhaustion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListMeta {
    #[serde(
        rename = "continue",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub continue_token: Option<String>,
}

/// A single remote resource record.
///
/// Fields the engine does not model (`spec`, `status`, ...) are kept as a
/// flattened remainder so views and prune projections can inspect them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceObject {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,
    pub metadata: ObjectMeta,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One page of a collection response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceList {
    #[serde(default)]
    pub metadata: ListMeta,
    #[serde(default)]
    pub items: Vec<ResourceObject>,
}

impl ResourceObject {
    /// Stable identity for de-duplication; falls back to the object name for
    /// servers that omit `metadata.uid`.
    pub fn uid(&self) -> &str {
        self.metadata.uid.as_deref().unwrap_or(&self.metadata.name)
    }
}

/// Reference to a custom resource collection: API group, version, and the
/// plural collection name used in request paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub group: String,
    pub version: String,
    pub plural: String,
}

impl ResourceRef {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        plural: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            plural: plural.into(),
        }
    }

    /// Parse a `group/version/plural` reference string.
    ///
    /// # Errors
    /// Returns [`SyncError::InvalidResourceRef`] when the string does not
    /// have exactly three non-empty segments.
    pub fn parse(input: &str) -> Result<Self, SyncError> {
        let parts: Vec<&str> = input.split('/').collect();
        match parts.as_slice() {
            [group, version, plural]
                if !group.is_empty() && !version.is_empty() && !plural.is_empty() =>
            {
                Ok(Self::new(*group, *version, *plural))
            }
            _ => Err(SyncError::InvalidResourceRef(format!(
                "expected group/version/plural, got '{}'",
                input
            ))),
        }
    }

    /// Request path for the collection, optionally scoped to a namespace.
    pub fn collection_path(&self, namespace: Option<&str>) -> String {
        match namespace {
            Some(ns) => format!(
                "/apis/{}/{}/namespaces/{}/{}",
                self.group, self.version, ns, self.plural
            ),
            None => format!("/apis/{}/{}/{}", self.group, self.version, self.plural),
        }
    }

    /// Request path for a single named object.
    pub fn object_path(&self, namespace: Option<&str>, name: &str) -> String {
        format!("{}/{}", self.collection_path(namespace), name)
    }
}
