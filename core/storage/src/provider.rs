//! Object store trait definition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use stashpoint_common::Result;

/// Metadata for a stored object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Object name within its container.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: DateTime<Utc>,
    /// ETag or revision ID, when the backend provides one.
    pub etag: Option<String>,
}

/// Object store trait for different blob backends.
///
/// A container holds the blobs of exactly one vault. All operations are
/// async; implementations handle their own authentication.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Get the backend name (e.g. "remote", "local", "memory").
    fn name(&self) -> &str;

    /// Create the container if it does not already exist.
    ///
    /// # Postconditions
    /// - Container exists; calling again is a no-op
    async fn ensure_container(&self, container: &str) -> Result<()>;

    /// Write a blob under the given object name.
    ///
    /// # Preconditions
    /// - Container must exist
    ///
    /// # Postconditions
    /// - Object is created or overwritten (last write wins)
    ///
    /// # Errors
    /// - Container not found
    /// - Network/I/O errors
    async fn put(&self, container: &str, object: &str, data: Vec<u8>) -> Result<ObjectMeta>;

    /// Read a blob's complete content.
    ///
    /// # Errors
    /// - Object not found
    /// - Network/I/O errors
    async fn get(&self, container: &str, object: &str) -> Result<Vec<u8>>;

    /// Check whether an object exists.
    async fn exists(&self, container: &str, object: &str) -> Result<bool>;

    /// Delete an object.
    ///
    /// # Errors
    /// - Object not found
    async fn delete(&self, container: &str, object: &str) -> Result<()>;

    /// List the objects in a container, in no particular order.
    ///
    /// # Errors
    /// - Container not found
    async fn list(&self, container: &str) -> Result<Vec<ObjectMeta>>;

    /// Issue a time-limited access URL for an object.
    ///
    /// # Errors
    /// - Backend does not support signing
    /// - Signing request failed
    async fn signed_url(
        &self,
        container: &str,
        object: &str,
        expires_in: Duration,
    ) -> Result<String>;

    /// Direct access URL pattern, used as the fallback when signing fails.
    fn public_url(&self, container: &str, object: &str) -> String;
}
