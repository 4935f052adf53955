//! Local filesystem object store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

use crate::provider::{ObjectMeta, ObjectStore};
use stashpoint_common::{Error, Result};

/// Characters escaped when building file:// URLs.
const PATH_SEGMENT: &AsciiSet = &CONTROLS.add(b' ').add(b'"').add(b'#').add(b'?').add(b'%');

/// Local filesystem object store.
///
/// Each container is a directory under the root path; objects are plain
/// files inside it. Does not issue signed URLs, so callers always fall back
/// to the file:// public URL pattern.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Create a new local store with the given root directory.
    ///
    /// # Postconditions
    /// - Root directory exists
    ///
    /// # Errors
    /// - Invalid path
    /// - Permission denied
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();

        // Create root if it doesn't exist (sync for constructor)
        if !root.exists() {
            std::fs::create_dir_all(&root)?;
        }

        Ok(Self { root })
    }

    fn container_path(&self, container: &str) -> PathBuf {
        self.root.join(container)
    }

    fn object_path(&self, container: &str, object: &str) -> PathBuf {
        self.root.join(container).join(object)
    }

    fn meta_from_fs(name: &str, fs_meta: &std::fs::Metadata) -> ObjectMeta {
        let modified: DateTime<Utc> = fs_meta
            .modified()
            .map(|t| t.into())
            .unwrap_or_else(|_| Utc::now());

        ObjectMeta {
            name: name.to_string(),
            size: fs_meta.len(),
            modified,
            etag: None,
        }
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn ensure_container(&self, container: &str) -> Result<()> {
        fs::create_dir_all(self.container_path(container)).await?;
        Ok(())
    }

    async fn put(&self, container: &str, object: &str, data: Vec<u8>) -> Result<ObjectMeta> {
        let dir = self.container_path(container);
        if !dir.is_dir() {
            return Err(Error::NotFound(format!(
                "Container not found: {}",
                container
            )));
        }

        let path = self.object_path(container, object);
        fs::write(&path, &data).await?;

        let fs_meta = fs::metadata(&path).await?;
        Ok(Self::meta_from_fs(object, &fs_meta))
    }

    async fn get(&self, container: &str, object: &str) -> Result<Vec<u8>> {
        match fs::read(self.object_path(container, object)).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::NotFound(format!(
                "Object not found: {}/{}",
                container, object
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, container: &str, object: &str) -> Result<bool> {
        Ok(self.object_path(container, object).is_file())
    }

    async fn delete(&self, container: &str, object: &str) -> Result<()> {
        match fs::remove_file(self.object_path(container, object)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::NotFound(format!(
                "Object not found: {}/{}",
                container, object
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, container: &str) -> Result<Vec<ObjectMeta>> {
        let dir = self.container_path(container);
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::NotFound(format!(
                    "Container not found: {}",
                    container
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let mut result = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let fs_meta = entry.metadata().await?;
            if fs_meta.is_file() {
                let name = entry.file_name().to_string_lossy().to_string();
                result.push(Self::meta_from_fs(&name, &fs_meta));
            }
        }
        Ok(result)
    }

    async fn signed_url(
        &self,
        _container: &str,
        _object: &str,
        _expires_in: Duration,
    ) -> Result<String> {
        Err(Error::Storage(
            "Local store does not issue signed URLs".to_string(),
        ))
    }

    fn public_url(&self, container: &str, object: &str) -> String {
        let path = self.container_path(container);
        format!(
            "file://{}/{}",
            path.display(),
            utf8_percent_encode(object, PATH_SEGMENT)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_store() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path()).unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let (_dir, store) = test_store();
        store.ensure_container("band").await.unwrap();

        let data = b"poster bytes".to_vec();
        store.put("band", "poster.png", data.clone()).await.unwrap();

        assert_eq!(store.get("band", "poster.png").await.unwrap(), data);
    }

    #[tokio::test]
    async fn test_put_without_container_fails() {
        let (_dir, store) = test_store();
        assert!(store.put("missing", "a.txt", vec![1]).await.is_err());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let (_dir, store) = test_store();
        store.ensure_container("band").await.unwrap();

        let err = store.get("band", "missing.txt").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_and_exists() {
        let (_dir, store) = test_store();
        store.ensure_container("band").await.unwrap();
        store.put("band", "a.txt", vec![1]).await.unwrap();

        assert!(store.exists("band", "a.txt").await.unwrap());
        store.delete("band", "a.txt").await.unwrap();
        assert!(!store.exists("band", "a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_skips_subdirectories() {
        let (_dir, store) = test_store();
        store.ensure_container("band").await.unwrap();
        store.put("band", "a.txt", vec![1]).await.unwrap();
        store.put("band", "b.txt", vec![2]).await.unwrap();
        fs::create_dir(store.container_path("band").join("nested"))
            .await
            .unwrap();

        let listed = store.list("band").await.unwrap();
        assert_eq!(listed.len(), 2);
    }

    #[tokio::test]
    async fn test_signed_url_unsupported() {
        let (_dir, store) = test_store();
        let result = store
            .signed_url("band", "a.txt", Duration::from_secs(60))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_public_url_escapes_spaces() {
        let (_dir, store) = test_store();
        let url = store.public_url("band", "set list.png");
        assert!(url.starts_with("file://"));
        assert!(url.ends_with("set%20list.png"));
    }
}
