//! Best-effort activity log.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::session::SessionClaims;
use stashpoint_common::Result;
use stashpoint_store::{ActivityRow, Database};

/// Logged admin action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Upload,
    Rename,
    Delete,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Upload => "upload",
            ActionKind::Rename => "rename",
            ActionKind::Delete => "delete",
        }
    }
}

/// One entry read back from the log.
#[derive(Debug, Clone)]
pub struct ActivityRecord {
    pub actor: String,
    pub action: String,
    pub filename: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Append-only audit trail over the activity table.
///
/// Auditability is a nice-to-have, not a correctness requirement: user-facing
/// flows use [`ActivityLog::record_best_effort`], which is the only place in
/// the system where a failure is deliberately swallowed.
pub struct ActivityLog<'a> {
    db: &'a Database,
}

impl<'a> ActivityLog<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Append one entry, reporting failure to the caller.
    pub fn record(
        &self,
        claims: &SessionClaims,
        action: ActionKind,
        filename: &str,
        details: Option<&str>,
    ) -> Result<()> {
        self.db.append_activity(&ActivityRow {
            vault_name: claims.vault.as_str().to_string(),
            actor: claims.tier.label().to_string(),
            action: action.as_str().to_string(),
            filename: filename.to_string(),
            details: details.map(str::to_string),
            created_at: Utc::now().timestamp(),
        })
    }

    /// Append one entry, swallowing any failure so the triggering user
    /// action is never interrupted.
    pub fn record_best_effort(
        &self,
        claims: &SessionClaims,
        action: ActionKind,
        filename: &str,
        details: Option<&str>,
    ) {
        if let Err(e) = self.record(claims, action, filename, details) {
            debug!(error = %e, action = action.as_str(), "Activity append failed; continuing");
        }
    }

    /// Read the log for a vault, most recent first.
    pub fn read(&self, claims: &SessionClaims) -> Result<Vec<ActivityRecord>> {
        let rows = self.db.list_activity(claims.vault.as_str())?;
        Ok(rows
            .into_iter()
            .map(|row| ActivityRecord {
                actor: row.actor,
                action: row.action,
                filename: row.filename,
                details: row.details,
                created_at: DateTime::<Utc>::from_timestamp(row.created_at, 0)
                    .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stashpoint_common::{Tier, VaultName};

    fn admin_claims() -> SessionClaims {
        SessionClaims {
            vault: VaultName::new("Youth Group").unwrap(),
            tier: Tier::VaultAdmin,
            created_at: Utc::now(),
            host_identity: "host-a".to_string(),
        }
    }

    #[test]
    fn test_record_and_read_back() {
        let db = Database::in_memory().unwrap();
        let log = ActivityLog::new(&db);
        let claims = admin_claims();

        log.record(&claims, ActionKind::Upload, "poster.png", None)
            .unwrap();
        log.record(
            &claims,
            ActionKind::Rename,
            "poster.png",
            Some("-> poster2.png"),
        )
        .unwrap();

        let entries = log.read(&claims).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].action, "rename");
        assert_eq!(entries[0].actor, "VAULT_ADMIN");
        assert_eq!(entries[0].details.as_deref(), Some("-> poster2.png"));
        assert_eq!(entries[1].action, "upload");
    }

    #[test]
    fn test_best_effort_never_panics() {
        let db = Database::in_memory().unwrap();
        let log = ActivityLog::new(&db);
        log.record_best_effort(&admin_claims(), ActionKind::Delete, "poster.png", None);
        assert_eq!(log.read(&admin_claims()).unwrap().len(), 1);
    }

    #[test]
    fn test_log_is_scoped_per_vault() {
        let db = Database::in_memory().unwrap();
        let log = ActivityLog::new(&db);
        let claims = admin_claims();

        log.record(&claims, ActionKind::Upload, "poster.png", None)
            .unwrap();

        let other = SessionClaims {
            vault: VaultName::new("Band").unwrap(),
            ..claims
        };
        assert!(log.read(&other).unwrap().is_empty());
    }
}
