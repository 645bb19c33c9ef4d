//! HTTP client for Kubernetes-style collection APIs.

use crate::error::ClientError;
use consync_core::config::ClientConfig;
use consync_core::constants::DEFAULT_REQUEST_TIMEOUT_SECS;
use consync_core::filter::LabelSelector;
use consync_core::models::{ResourceList, ResourceObject, ResourceRef};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const MERGE_PATCH_CONTENT_TYPE: &str = "application/merge-patch+json";

/// Thin wrapper over `reqwest::Client` implementing the remote list,
/// single-item, and mutation contracts.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Construct a client with the default request timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    /// Construct a client with an explicit request timeout.
    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::BaseUrl("empty server URL".to_string()));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    /// Construct a client from environment-derived configuration.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::with_timeout(
            config.server_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch one page of a collection.
    ///
    /// The structural selector is evaluated server-side via the
    /// `labelSelector` parameter; `cursor` is the opaque continuation token
    /// from the previous page, omitted for the first page.
    pub async fn list(
        &self,
        resource: &ResourceRef,
        namespace: Option<&str>,
        selector: Option<&LabelSelector>,
        limit: usize,
        cursor: Option<&str>,
    ) -> Result<ResourceList, ClientError> {
        let url = format!("{}{}", self.base_url, resource.collection_path(namespace));
        let mut request = self.http.get(&url).query(&[("limit", limit.to_string())]);
        if let Some(selector) = selector {
            if !selector.is_empty() {
                request = request.query(&[("labelSelector", selector.to_query())]);
            }
        }
        if let Some(cursor) = cursor {
            request = request.query(&[("continue", cursor)]);
        }
        debug!(url = %url, limit, cursor = cursor.unwrap_or(""), "list page");
        let response = Self::check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    /// Fetch a single object by name.
    ///
    /// A 404 is translated to `Ok(None)`: views treat "not yet created" as a
    /// valid transient state, not an error.
    pub async fn get(
        &self,
        resource: &ResourceRef,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<ResourceObject>, ClientError> {
        let url = format!(
            "{}{}",
            self.base_url,
            resource.object_path(namespace, name)
        );
        let response = self.http.get(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check(response).await?;
        Ok(Some(response.json().await?))
    }

    /// Delete an object by name. Returns `false` when it was already gone.
    ///
    /// On success the caller applies `remove_items` to its session so the
    /// view reflects the deletion before the next poll confirms it.
    pub async fn delete(
        &self,
        resource: &ResourceRef,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<bool, ClientError> {
        let url = format!(
            "{}{}",
            self.base_url,
            resource.object_path(namespace, name)
        );
        let response = self.http.delete(&url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::check(response).await?;
        Ok(true)
    }

    /// Apply a JSON merge patch and return the updated object.
    ///
    /// On success the caller applies `update_items` to its session.
    pub async fn patch(
        &self,
        resource: &ResourceRef,
        namespace: Option<&str>,
        name: &str,
        body: &Value,
    ) -> Result<ResourceObject, ClientError> {
        let url = format!(
            "{}{}",
            self.base_url,
            resource.object_path(namespace, name)
        );
        let response = self
            .http
            .patch(&url)
            .header(reqwest::header::CONTENT_TYPE, MERGE_PATCH_CONTENT_TYPE)
            .json(body)
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Api {
            status: status.as_u16(),
            message: error_message_for_response(status, &body),
        })
    }
}

/// Extract a human-readable message from an error response body, falling
/// back to the HTTP reason phrase.
fn error_message_for_response(status: reqwest::StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(message) = value.get("message").and_then(|v| v.as_str()) {
            return message.to_string();
        }
        if let Some(message) = value.get("error").and_then(|v| v.as_str()) {
            return message.to_string();
        }
    }

    body.to_string()
}
