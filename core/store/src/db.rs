//! SQLite-backed tables for vaults, sessions, file index, and activity.

use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use stashpoint_common::{Error, Result};

/// A vault record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultRow {
    pub name: String,
    pub member_passkey: String,
    pub admin_passkey: String,
    pub creator: String,
    pub created_at: i64,
}

/// A session record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRow {
    pub token: String,
    pub vault_name: String,
    pub is_admin_internal: bool,
    pub is_ui_admin: bool,
    pub created_at: i64,
    pub host_identity: String,
}

/// A denormalized file index entry mirroring one stored blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRow {
    pub vault_name: String,
    pub filename: String,
    pub url: String,
    pub created_at: i64,
}

/// One activity log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRow {
    pub vault_name: String,
    pub actor: String,
    pub action: String,
    pub filename: String,
    pub details: Option<String>,
    pub created_at: i64,
}

fn table_err(e: rusqlite::Error) -> Error {
    Error::Table(e.to_string())
}

/// Table store over a SQLite database.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create or open the database at the given path.
    ///
    /// # Postconditions
    /// - Schema exists; opening an already-initialized database is a no-op
    ///
    /// # Errors
    /// - Database creation or migration failure
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(db_path).map_err(table_err)?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS vaults (
                name TEXT PRIMARY KEY COLLATE NOCASE,
                member_passkey TEXT NOT NULL,
                admin_passkey TEXT NOT NULL,
                creator TEXT NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                vault_name TEXT NOT NULL,
                is_admin_internal INTEGER NOT NULL,
                is_ui_admin INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                host_identity TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS file_index (
                vault_name TEXT NOT NULL COLLATE NOCASE,
                filename TEXT NOT NULL,
                url TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (vault_name, filename)
            );

            CREATE TABLE IF NOT EXISTS activity (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                vault_name TEXT NOT NULL COLLATE NOCASE,
                actor TEXT NOT NULL,
                action TEXT NOT NULL,
                filename TEXT NOT NULL,
                details TEXT,
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_activity_vault ON activity(vault_name, created_at);
            "#,
        )
        .map_err(table_err)?;

        info!("Table store opened");
        Ok(Self { conn })
    }

    /// Create an in-memory database (for testing and development).
    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    // --- vaults ---

    /// Insert a new vault record.
    ///
    /// # Errors
    /// - `DuplicateVaultName` if a vault with the same name (ignoring case)
    ///   already exists
    pub fn insert_vault(&self, row: &VaultRow) -> Result<()> {
        debug!(vault = %row.name, "Inserting vault record");
        let result = self.conn.execute(
            r#"
            INSERT INTO vaults (name, member_passkey, admin_passkey, creator, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                row.name,
                row.member_passkey,
                row.admin_passkey,
                row.creator,
                row.created_at,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(Error::DuplicateVaultName(row.name.clone()))
            }
            Err(e) => Err(table_err(e)),
        }
    }

    /// Find a vault by name, case-insensitively.
    pub fn find_vault(&self, name: &str) -> Result<Option<VaultRow>> {
        self.conn
            .query_row(
                r#"
                SELECT name, member_passkey, admin_passkey, creator, created_at
                FROM vaults WHERE name = ?1
                "#,
                [name],
                |row| {
                    Ok(VaultRow {
                        name: row.get(0)?,
                        member_passkey: row.get(1)?,
                        admin_passkey: row.get(2)?,
                        creator: row.get(3)?,
                        created_at: row.get(4)?,
                    })
                },
            )
            .optional()
            .map_err(table_err)
    }

    // --- sessions ---

    /// Insert a session record.
    ///
    /// Failure here must fail the login that triggered it, so errors are
    /// reported as `SessionPersist` rather than the generic table error.
    pub fn insert_session(&self, row: &SessionRow) -> Result<()> {
        debug!(vault = %row.vault_name, "Inserting session record");
        self.conn
            .execute(
                r#"
                INSERT INTO sessions
                (token, vault_name, is_admin_internal, is_ui_admin, created_at, host_identity)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    row.token,
                    row.vault_name,
                    row.is_admin_internal as i32,
                    row.is_ui_admin as i32,
                    row.created_at,
                    row.host_identity,
                ],
            )
            .map_err(|e| Error::SessionPersist(e.to_string()))?;
        Ok(())
    }

    /// Find a session by token.
    pub fn find_session(&self, token: &str) -> Result<Option<SessionRow>> {
        self.conn
            .query_row(
                r#"
                SELECT token, vault_name, is_admin_internal, is_ui_admin, created_at, host_identity
                FROM sessions WHERE token = ?1
                "#,
                [token],
                |row| {
                    Ok(SessionRow {
                        token: row.get(0)?,
                        vault_name: row.get(1)?,
                        is_admin_internal: row.get::<_, i32>(2)? != 0,
                        is_ui_admin: row.get::<_, i32>(3)? != 0,
                        created_at: row.get(4)?,
                        host_identity: row.get(5)?,
                    })
                },
            )
            .optional()
            .map_err(table_err)
    }

    /// Delete a session by token. Deleting a missing token is not an error.
    pub fn delete_session(&self, token: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM sessions WHERE token = ?1", params![token])
            .map_err(table_err)?;
        Ok(())
    }

    // --- file index ---

    /// Insert or update the index row for a stored blob.
    pub fn upsert_file(&self, row: &FileRow) -> Result<()> {
        debug!(vault = %row.vault_name, file = %row.filename, "Upserting file index row");
        self.conn
            .execute(
                r#"
                INSERT OR REPLACE INTO file_index (vault_name, filename, url, created_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![row.vault_name, row.filename, row.url, row.created_at],
            )
            .map_err(table_err)?;
        Ok(())
    }

    /// Get the index row for a file, if present.
    pub fn find_file(&self, vault_name: &str, filename: &str) -> Result<Option<FileRow>> {
        self.conn
            .query_row(
                r#"
                SELECT vault_name, filename, url, created_at
                FROM file_index WHERE vault_name = ?1 AND filename = ?2
                "#,
                params![vault_name, filename],
                |row| {
                    Ok(FileRow {
                        vault_name: row.get(0)?,
                        filename: row.get(1)?,
                        url: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(table_err)
    }

    /// Point an index row at a new filename and URL.
    pub fn rename_file(
        &self,
        vault_name: &str,
        old_name: &str,
        new_name: &str,
        new_url: &str,
    ) -> Result<()> {
        self.conn
            .execute(
                r#"
                UPDATE file_index SET filename = ?3, url = ?4
                WHERE vault_name = ?1 AND filename = ?2
                "#,
                params![vault_name, old_name, new_name, new_url],
            )
            .map_err(table_err)?;
        Ok(())
    }

    /// Remove the index row for a file. Missing rows are not an error.
    pub fn delete_file(&self, vault_name: &str, filename: &str) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM file_index WHERE vault_name = ?1 AND filename = ?2",
                params![vault_name, filename],
            )
            .map_err(table_err)?;
        Ok(())
    }

    /// List all index rows for a vault.
    pub fn list_files(&self, vault_name: &str) -> Result<Vec<FileRow>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT vault_name, filename, url, created_at
                FROM file_index WHERE vault_name = ?1
                "#,
            )
            .map_err(table_err)?;

        let rows = stmt
            .query_map([vault_name], |row| {
                Ok(FileRow {
                    vault_name: row.get(0)?,
                    filename: row.get(1)?,
                    url: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })
            .map_err(table_err)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(table_err)?);
        }
        Ok(result)
    }

    // --- activity ---

    /// Append one activity entry.
    pub fn append_activity(&self, row: &ActivityRow) -> Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO activity (vault_name, actor, action, filename, details, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
                params![
                    row.vault_name,
                    row.actor,
                    row.action,
                    row.filename,
                    row.details,
                    row.created_at,
                ],
            )
            .map_err(table_err)?;
        Ok(())
    }

    /// List activity for a vault, most recent first.
    pub fn list_activity(&self, vault_name: &str) -> Result<Vec<ActivityRow>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT vault_name, actor, action, filename, details, created_at
                FROM activity WHERE vault_name = ?1
                ORDER BY created_at DESC, id DESC
                "#,
            )
            .map_err(table_err)?;

        let rows = stmt
            .query_map([vault_name], |row| {
                Ok(ActivityRow {
                    vault_name: row.get(0)?,
                    actor: row.get(1)?,
                    action: row.get(2)?,
                    filename: row.get(3)?,
                    details: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })
            .map_err(table_err)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row.map_err(table_err)?);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault_row(name: &str) -> VaultRow {
        VaultRow {
            name: name.to_string(),
            member_passkey: "m1".to_string(),
            admin_passkey: "a1".to_string(),
            creator: "tester".to_string(),
            created_at: 1_700_000_000,
        }
    }

    #[test]
    fn test_vault_insert_and_find() {
        let db = Database::in_memory().unwrap();
        db.insert_vault(&vault_row("Youth Group")).unwrap();

        let found = db.find_vault("Youth Group").unwrap().unwrap();
        assert_eq!(found.name, "Youth Group");
        assert_eq!(found.member_passkey, "m1");
    }

    #[test]
    fn test_vault_lookup_is_case_insensitive() {
        let db = Database::in_memory().unwrap();
        db.insert_vault(&vault_row("Youth Group")).unwrap();

        assert!(db.find_vault("youth group").unwrap().is_some());
        assert!(db.find_vault("YOUTH GROUP").unwrap().is_some());
        assert!(db.find_vault("other").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_vault_name_rejected_ignoring_case() {
        let db = Database::in_memory().unwrap();
        db.insert_vault(&vault_row("Band")).unwrap();

        let err = db.insert_vault(&vault_row("BAND")).unwrap_err();
        assert!(matches!(err, Error::DuplicateVaultName(_)));
    }

    #[test]
    fn test_session_round_trip() {
        let db = Database::in_memory().unwrap();
        let row = SessionRow {
            token: "tok-1".to_string(),
            vault_name: "Band".to_string(),
            is_admin_internal: true,
            is_ui_admin: false,
            created_at: 1_700_000_000,
            host_identity: "host-a".to_string(),
        };
        db.insert_session(&row).unwrap();

        let found = db.find_session("tok-1").unwrap().unwrap();
        assert_eq!(found.vault_name, "Band");
        assert!(found.is_admin_internal);
        assert!(!found.is_ui_admin);

        db.delete_session("tok-1").unwrap();
        assert!(db.find_session("tok-1").unwrap().is_none());
        // Deleting again is a no-op.
        db.delete_session("tok-1").unwrap();
    }

    #[test]
    fn test_duplicate_session_token_is_persist_error() {
        let db = Database::in_memory().unwrap();
        let row = SessionRow {
            token: "tok-1".to_string(),
            vault_name: "Band".to_string(),
            is_admin_internal: false,
            is_ui_admin: false,
            created_at: 0,
            host_identity: String::new(),
        };
        db.insert_session(&row).unwrap();
        let err = db.insert_session(&row).unwrap_err();
        assert!(matches!(err, Error::SessionPersist(_)));
    }

    #[test]
    fn test_file_index_upsert_and_rename() {
        let db = Database::in_memory().unwrap();
        let row = FileRow {
            vault_name: "Band".to_string(),
            filename: "poster.png".to_string(),
            url: "local/band/poster.png".to_string(),
            created_at: 1,
        };
        db.upsert_file(&row).unwrap();

        // Upsert with the same key replaces, never duplicates.
        db.upsert_file(&row).unwrap();
        assert_eq!(db.list_files("Band").unwrap().len(), 1);

        db.rename_file("Band", "poster.png", "poster2.png", "local/band/poster2.png")
            .unwrap();
        assert!(db.find_file("Band", "poster.png").unwrap().is_none());
        let renamed = db.find_file("Band", "poster2.png").unwrap().unwrap();
        assert_eq!(renamed.url, "local/band/poster2.png");

        db.delete_file("Band", "poster2.png").unwrap();
        assert!(db.list_files("Band").unwrap().is_empty());
    }

    #[test]
    fn test_activity_is_most_recent_first() {
        let db = Database::in_memory().unwrap();
        for (i, file) in ["a.png", "b.png", "c.png"].iter().enumerate() {
            db.append_activity(&ActivityRow {
                vault_name: "Band".to_string(),
                actor: "VAULT_ADMIN".to_string(),
                action: "upload".to_string(),
                filename: file.to_string(),
                details: None,
                created_at: i as i64,
            })
            .unwrap();
        }

        let entries = db.list_activity("Band").unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].filename, "c.png");
        assert_eq!(entries[2].filename, "a.png");
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stashpoint.db");

        {
            let db = Database::open(&path).unwrap();
            db.insert_vault(&vault_row("Band")).unwrap();
        }

        // Reopening finds the persisted record.
        let db = Database::open(&path).unwrap();
        assert!(db.find_vault("Band").unwrap().is_some());
    }
}
