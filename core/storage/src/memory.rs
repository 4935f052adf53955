//! In-memory object store for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use uuid::Uuid;

use crate::provider::{ObjectMeta, ObjectStore};
use stashpoint_common::{Error, Result};

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    meta: ObjectMeta,
}

/// In-memory object store.
///
/// Useful for testing and development. All data is stored in memory
/// and lost on drop.
pub struct MemoryStore {
    containers: Arc<RwLock<HashMap<String, HashMap<String, StoredObject>>>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self {
            containers: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn ensure_container(&self, container: &str) -> Result<()> {
        self.containers
            .write()
            .unwrap()
            .entry(container.to_string())
            .or_default();
        Ok(())
    }

    async fn put(&self, container: &str, object: &str, data: Vec<u8>) -> Result<ObjectMeta> {
        let mut containers = self.containers.write().unwrap();
        let entries = containers
            .get_mut(container)
            .ok_or_else(|| Error::NotFound(format!("Container not found: {}", container)))?;

        let meta = ObjectMeta {
            name: object.to_string(),
            size: data.len() as u64,
            modified: Utc::now(),
            etag: Some(Uuid::new_v4().to_string()),
        };

        entries.insert(
            object.to_string(),
            StoredObject {
                data,
                meta: meta.clone(),
            },
        );

        Ok(meta)
    }

    async fn get(&self, container: &str, object: &str) -> Result<Vec<u8>> {
        let containers = self.containers.read().unwrap();
        containers
            .get(container)
            .and_then(|entries| entries.get(object))
            .map(|stored| stored.data.clone())
            .ok_or_else(|| Error::NotFound(format!("Object not found: {}/{}", container, object)))
    }

    async fn exists(&self, container: &str, object: &str) -> Result<bool> {
        let containers = self.containers.read().unwrap();
        Ok(containers
            .get(container)
            .is_some_and(|entries| entries.contains_key(object)))
    }

    async fn delete(&self, container: &str, object: &str) -> Result<()> {
        let mut containers = self.containers.write().unwrap();
        let entries = containers
            .get_mut(container)
            .ok_or_else(|| Error::NotFound(format!("Container not found: {}", container)))?;

        entries
            .remove(object)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("Object not found: {}/{}", container, object)))
    }

    async fn list(&self, container: &str) -> Result<Vec<ObjectMeta>> {
        let containers = self.containers.read().unwrap();
        let entries = containers
            .get(container)
            .ok_or_else(|| Error::NotFound(format!("Container not found: {}", container)))?;

        Ok(entries.values().map(|stored| stored.meta.clone()).collect())
    }

    async fn signed_url(
        &self,
        container: &str,
        object: &str,
        expires_in: Duration,
    ) -> Result<String> {
        if !self.exists(container, object).await? {
            return Err(Error::NotFound(format!(
                "Object not found: {}/{}",
                container, object
            )));
        }
        Ok(format!(
            "memory://{}/{}?expires={}",
            container,
            object,
            expires_in.as_secs()
        ))
    }

    fn public_url(&self, container: &str, object: &str) -> String {
        format!("memory://{}/{}", container, object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get() {
        let store = MemoryStore::new();
        store.ensure_container("band").await.unwrap();

        let data = b"Hello, World!".to_vec();
        store.put("band", "hello.txt", data.clone()).await.unwrap();

        let fetched = store.get("band", "hello.txt").await.unwrap();
        assert_eq!(fetched, data);
    }

    #[tokio::test]
    async fn test_put_without_container_fails() {
        let store = MemoryStore::new();
        let result = store.put("missing", "a.txt", vec![1]).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_ensure_container_is_idempotent() {
        let store = MemoryStore::new();
        store.ensure_container("band").await.unwrap();
        store.put("band", "a.txt", vec![1]).await.unwrap();

        // Ensuring again must not wipe existing objects.
        store.ensure_container("band").await.unwrap();
        assert!(store.exists("band", "a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_overwrite_is_last_write_wins() {
        let store = MemoryStore::new();
        store.ensure_container("band").await.unwrap();

        store.put("band", "a.txt", b"first".to_vec()).await.unwrap();
        store.put("band", "a.txt", b"second".to_vec()).await.unwrap();

        assert_eq!(store.get("band", "a.txt").await.unwrap(), b"second");
        assert_eq!(store.list("band").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        store.ensure_container("band").await.unwrap();
        store.put("band", "a.txt", vec![1]).await.unwrap();

        store.delete("band", "a.txt").await.unwrap();
        assert!(!store.exists("band", "a.txt").await.unwrap());

        // Second delete reports not found; idempotency lives in the catalog.
        assert!(store.delete("band", "a.txt").await.is_err());
    }

    #[tokio::test]
    async fn test_list() {
        let store = MemoryStore::new();
        store.ensure_container("band").await.unwrap();
        store.put("band", "a.txt", vec![1]).await.unwrap();
        store.put("band", "b.txt", vec![2]).await.unwrap();

        let listed = store.list("band").await.unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn test_signed_url_carries_expiry() {
        let store = MemoryStore::new();
        store.ensure_container("band").await.unwrap();
        store.put("band", "a.txt", vec![1]).await.unwrap();

        let url = store
            .signed_url("band", "a.txt", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(url.contains("expires=60"));
    }
}
