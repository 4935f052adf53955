//! Per-vault file catalog.
//!
//! CRUD over named blobs scoped to one vault, plus the denormalized index
//! rows that mirror each live blob for search and audit.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::session::SessionClaims;
use stashpoint_common::{Error, Result};
use stashpoint_storage::ObjectStore;
use stashpoint_store::{Database, FileRow};

/// Names starting with this prefix are internal markers and never listed.
/// Early deployments stored vault secrets as dot-files in the same
/// container; filtering them here keeps credential files out of listings
/// if that layout is ever reused.
pub const RESERVED_PREFIX: char = '.';

fn validate_filename(filename: &str) -> Result<()> {
    if filename.trim().is_empty() {
        return Err(Error::InvalidInput("Filename cannot be empty".to_string()));
    }
    if filename.contains('/') || filename.contains('\\') {
        return Err(Error::InvalidInput(
            "Filename cannot contain path separators".to_string(),
        ));
    }
    if filename.starts_with(RESERVED_PREFIX) {
        return Err(Error::InvalidInput(
            "Filenames starting with '.' are reserved".to_string(),
        ));
    }
    Ok(())
}

/// Filename without its extension, the part the gallery search matches on.
fn stem(filename: &str) -> &str {
    filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename)
}

/// File catalog for one storage backend.
///
/// Every operation takes the caller's resolved session claims; the vault
/// is always the one the session is bound to.
pub struct Catalog<'a> {
    db: &'a Database,
    store: Arc<dyn ObjectStore>,
    url_ttl: Duration,
}

impl<'a> Catalog<'a> {
    /// Create a catalog with the default 60-second signed-URL window.
    pub fn new(db: &'a Database, store: Arc<dyn ObjectStore>) -> Self {
        Self::with_url_ttl(db, store, Duration::from_secs(60))
    }

    /// Create a catalog with an explicit signed-URL window.
    pub fn with_url_ttl(db: &'a Database, store: Arc<dyn ObjectStore>, url_ttl: Duration) -> Self {
        Self { db, store, url_ttl }
    }

    /// List filenames in the vault, case-insensitive lexicographic order,
    /// reserved names excluded.
    pub async fn list(&self, claims: &SessionClaims) -> Result<Vec<String>> {
        let container = claims.vault.container();
        self.store.ensure_container(&container).await?;

        let mut names: Vec<String> = self
            .store
            .list(&container)
            .await?
            .into_iter()
            .map(|meta| meta.name)
            .filter(|name| !name.starts_with(RESERVED_PREFIX))
            .collect();
        names.sort_by_key(|name| name.to_lowercase());
        Ok(names)
    }

    /// Case-insensitive substring search over filename stems.
    ///
    /// An empty query returns the full listing.
    pub async fn search(&self, claims: &SessionClaims, query: &str) -> Result<Vec<String>> {
        let names = self.list(claims).await?;
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(names);
        }
        Ok(names
            .into_iter()
            .filter(|name| stem(name).to_lowercase().contains(&query))
            .collect())
    }

    /// Upload a blob under the given filename.
    ///
    /// The container is created if missing. A colliding filename is
    /// overwritten, last write wins; the index row is upserted so the
    /// catalog never shows a stale URL.
    pub async fn upload(
        &self,
        claims: &SessionClaims,
        filename: &str,
        data: Vec<u8>,
    ) -> Result<()> {
        validate_filename(filename)?;

        let container = claims.vault.container();
        self.store.ensure_container(&container).await?;
        self.store.put(&container, filename, data).await?;

        self.db.upsert_file(&FileRow {
            vault_name: claims.vault.as_str().to_string(),
            filename: filename.to_string(),
            url: self.store.public_url(&container, filename),
            created_at: Utc::now().timestamp(),
        })?;

        info!(vault = %claims.vault, file = filename, "File uploaded");
        Ok(())
    }

    /// Read a blob's content.
    ///
    /// # Errors
    /// - `NotFound` if the vault has no such file
    pub async fn download(&self, claims: &SessionClaims, filename: &str) -> Result<Vec<u8>> {
        let container = claims.vault.container();
        self.store.get(&container, filename).await
    }

    /// Rename a file, copy-then-delete.
    ///
    /// The bytes are written under the new name first and the old name is
    /// removed only after that write is confirmed, so a failure mid-rename
    /// leaves the original file intact.
    ///
    /// # Errors
    /// - `NotPermitted` for member sessions
    /// - `NotFound` if `old` does not exist
    /// - `RenameConflict` if `new` already exists and differs from `old`
    pub async fn rename(&self, claims: &SessionClaims, old: &str, new: &str) -> Result<()> {
        claims.require_modify()?;
        validate_filename(new)?;

        if new == old {
            return Ok(());
        }

        let container = claims.vault.container();
        self.store.ensure_container(&container).await?;

        if !self.store.exists(&container, old).await? {
            return Err(Error::NotFound(format!("File not found: {}", old)));
        }
        if self.store.exists(&container, new).await? {
            return Err(Error::RenameConflict(new.to_string()));
        }

        let data = self.store.get(&container, old).await?;
        self.store.put(&container, new, data).await?;
        self.store.delete(&container, old).await?;

        self.db.rename_file(
            claims.vault.as_str(),
            old,
            new,
            &self.store.public_url(&container, new),
        )?;

        info!(vault = %claims.vault, from = old, to = new, "File renamed");
        Ok(())
    }

    /// Delete a file. Deleting an absent file is a no-op, not an error.
    ///
    /// # Errors
    /// - `NotPermitted` for member sessions
    pub async fn delete(&self, claims: &SessionClaims, filename: &str) -> Result<()> {
        claims.require_modify()?;

        let container = claims.vault.container();
        self.store.ensure_container(&container).await?;

        match self.store.delete(&container, filename).await {
            Ok(()) => {}
            Err(Error::NotFound(_)) => {
                debug!(vault = %claims.vault, file = filename, "Delete of absent file");
            }
            Err(e) => return Err(e),
        }

        self.db.delete_file(claims.vault.as_str(), filename)?;

        info!(vault = %claims.vault, file = filename, "File deleted");
        Ok(())
    }

    /// Resolve a time-limited access URL for a file.
    ///
    /// Falls back to the backend's direct URL pattern when signed-URL
    /// issuance fails for any reason.
    pub async fn resolve_url(&self, claims: &SessionClaims, filename: &str) -> Result<String> {
        let container = claims.vault.container();
        match self
            .store
            .signed_url(&container, filename, self.url_ttl)
            .await
        {
            Ok(url) => Ok(url),
            Err(e) => {
                debug!(vault = %claims.vault, file = filename, error = %e,
                       "Signed URL unavailable, falling back to public URL");
                Ok(self.store.public_url(&container, filename))
            }
        }
    }
}
