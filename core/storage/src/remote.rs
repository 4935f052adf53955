//! Remote bucket-service object store.
//!
//! Talks to a hosted object-storage HTTP API: one bucket per container,
//! bearer-key authentication, and a signing route for time-limited access
//! URLs. Route shapes follow the common hosted-storage convention of
//! `/object/{bucket}/{name}` for content and `/object/sign/{bucket}/{name}`
//! for URL signing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::{header, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::provider::{ObjectMeta, ObjectStore};
use stashpoint_common::{Error, Result};

/// Characters escaped in URL path segments.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'?')
    .add(b'%')
    .add(b'/');

/// Remote store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the storage endpoint.
    pub endpoint: String,
    /// Bearer access key for the endpoint.
    pub access_key: String,
}

/// Object metadata as returned by the bucket service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteObject {
    name: String,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    etag: Option<String>,
}

/// Response from the URL-signing route.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignResponse {
    signed_url: String,
}

/// Remote bucket-service object store.
pub struct RemoteStore {
    base: Url,
    access_key: String,
    http: Client,
}

impl RemoteStore {
    /// Create a new remote store against the given endpoint.
    ///
    /// # Errors
    /// - Invalid endpoint URL
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let base = Url::parse(&config.endpoint)
            .map_err(|e| Error::InvalidInput(format!("Invalid storage endpoint: {}", e)))?;

        let http = Client::builder()
            .user_agent("StashPoint/0.1")
            .build()
            .map_err(|e| Error::Storage(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base,
            access_key: config.access_key,
            http,
        })
    }

    fn route(&self, path: &str) -> String {
        format!("{}/{}", self.base.as_str().trim_end_matches('/'), path)
    }

    fn object_route(&self, prefix: &str, container: &str, object: &str) -> String {
        self.route(&format!(
            "{}/{}/{}",
            prefix,
            utf8_percent_encode(container, PATH_SEGMENT),
            utf8_percent_encode(object, PATH_SEGMENT)
        ))
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.access_key)
    }

    async fn check_status(
        &self,
        response: reqwest::Response,
        what: &str,
    ) -> Result<reqwest::Response> {
        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(Error::NotFound(format!("{} not found", what))),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::Storage(format!(
                    "{} failed with status {}: {}",
                    what, status, body
                )))
            }
        }
    }
}

#[async_trait]
impl ObjectStore for RemoteStore {
    fn name(&self) -> &str {
        "remote"
    }

    async fn ensure_container(&self, container: &str) -> Result<()> {
        let response = self
            .http
            .post(self.route("bucket"))
            .header(header::AUTHORIZATION, self.auth_header())
            .json(&serde_json::json!({ "name": container }))
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Failed to create container: {}", e)))?;

        // The bucket already existing is the expected steady state.
        if response.status() == StatusCode::CONFLICT {
            return Ok(());
        }
        self.check_status(response, "Container create").await?;
        Ok(())
    }

    async fn put(&self, container: &str, object: &str, data: Vec<u8>) -> Result<ObjectMeta> {
        debug!(container, object, size = data.len(), "Uploading object");
        let size = data.len() as u64;

        let response = self
            .http
            .post(self.object_route("object", container, object))
            .header(header::AUTHORIZATION, self.auth_header())
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .header("x-upsert", "true")
            .body(data)
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Upload failed: {}", e)))?;

        self.check_status(response, "Upload").await?;

        Ok(ObjectMeta {
            name: object.to_string(),
            size,
            modified: Utc::now(),
            etag: None,
        })
    }

    async fn get(&self, container: &str, object: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(self.object_route("object", container, object))
            .header(header::AUTHORIZATION, self.auth_header())
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Download failed: {}", e)))?;

        let response = self.check_status(response, "Object").await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Storage(format!("Download body failed: {}", e)))?;
        Ok(bytes.to_vec())
    }

    async fn exists(&self, container: &str, object: &str) -> Result<bool> {
        let response = self
            .http
            .head(self.object_route("object", container, object))
            .header(header::AUTHORIZATION, self.auth_header())
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Existence check failed: {}", e)))?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(Error::Storage(format!(
                "Existence check failed with status {}",
                status
            ))),
        }
    }

    async fn delete(&self, container: &str, object: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.object_route("object", container, object))
            .header(header::AUTHORIZATION, self.auth_header())
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Delete failed: {}", e)))?;

        self.check_status(response, "Object").await?;
        Ok(())
    }

    async fn list(&self, container: &str) -> Result<Vec<ObjectMeta>> {
        let response = self
            .http
            .get(self.route(&format!(
                "bucket/{}/objects",
                utf8_percent_encode(container, PATH_SEGMENT)
            )))
            .header(header::AUTHORIZATION, self.auth_header())
            .send()
            .await
            .map_err(|e| Error::Storage(format!("List failed: {}", e)))?;

        let response = self.check_status(response, "Container").await?;
        let objects: Vec<RemoteObject> = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("List response: {}", e)))?;

        Ok(objects
            .into_iter()
            .map(|obj| ObjectMeta {
                name: obj.name,
                size: obj.size.unwrap_or(0),
                modified: obj.updated_at.unwrap_or_else(Utc::now),
                etag: obj.etag,
            })
            .collect())
    }

    async fn signed_url(
        &self,
        container: &str,
        object: &str,
        expires_in: Duration,
    ) -> Result<String> {
        let response = self
            .http
            .post(self.object_route("object/sign", container, object))
            .header(header::AUTHORIZATION, self.auth_header())
            .json(&serde_json::json!({ "expiresIn": expires_in.as_secs() }))
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Signing failed: {}", e)))?;

        let response = self.check_status(response, "Signing").await?;
        let signed: SignResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(format!("Sign response: {}", e)))?;

        // The service returns a path relative to the endpoint.
        if signed.signed_url.starts_with("http") {
            Ok(signed.signed_url)
        } else {
            Ok(self.route(signed.signed_url.trim_start_matches('/')))
        }
    }

    fn public_url(&self, container: &str, object: &str) -> String {
        self.object_route("object/public", container, object)
    }
}
