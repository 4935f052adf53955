//! Durable session tokens.
//!
//! A session is revocable proof of a successful login, reusable across
//! requests without re-entering the passkey. Expired rows are treated as
//! invalid on read and left in place for external cleanup.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use stashpoint_common::{Error, Result, SessionToken, Tier, VaultName};
use stashpoint_store::{Database, SessionRow};

/// Identity restored from a valid session token.
#[derive(Debug, Clone)]
pub struct SessionClaims {
    /// Vault the session is bound to.
    pub vault: VaultName,
    /// Tier granted at login.
    pub tier: Tier,
    /// When the session was issued.
    pub created_at: DateTime<Utc>,
    /// Identity of the host that created the session.
    pub host_identity: String,
}

impl SessionClaims {
    /// Require a tier allowed to rename or delete files.
    ///
    /// # Errors
    /// - `NotPermitted` for member sessions
    pub fn require_modify(&self) -> Result<()> {
        if self.tier.can_modify() {
            Ok(())
        } else {
            Err(Error::NotPermitted(
                "Renaming and deleting require an admin passkey".to_string(),
            ))
        }
    }
}

/// Session store over the sessions table.
pub struct SessionStore<'a> {
    db: &'a Database,
    ttl: Duration,
}

impl<'a> SessionStore<'a> {
    /// Create a session store with the standard 24-hour lifetime.
    pub fn new(db: &'a Database) -> Self {
        Self::with_ttl(db, Duration::hours(24))
    }

    /// Create a session store with an explicit lifetime.
    pub fn with_ttl(db: &'a Database, ttl: Duration) -> Self {
        Self { db, ttl }
    }

    /// Issue a new session for a resolved identity.
    ///
    /// # Postconditions
    /// - The row is durably written before the token is returned; no session
    ///   is usable without its record
    ///
    /// # Errors
    /// - `SessionPersist` if the write fails; the login must then be treated
    ///   as failed
    pub fn create(
        &self,
        vault: &VaultName,
        tier: Tier,
        host_identity: &str,
    ) -> Result<SessionToken> {
        let token = SessionToken::generate();
        let (is_admin_internal, is_ui_admin) = tier.flags();

        self.db.insert_session(&SessionRow {
            token: token.as_str().to_string(),
            vault_name: vault.as_str().to_string(),
            is_admin_internal,
            is_ui_admin,
            created_at: Utc::now().timestamp(),
            host_identity: host_identity.to_string(),
        })?;

        info!(vault = %vault, tier = %tier, "Session created");
        Ok(token)
    }

    /// Validate a token, returning the claims the caller should now trust.
    ///
    /// Returns `Ok(None)` for unknown tokens and for rows older than the
    /// session lifetime. Expired rows are not deleted here.
    pub fn validate(&self, token: &SessionToken) -> Result<Option<SessionClaims>> {
        let Some(row) = self.db.find_session(token.as_str())? else {
            return Ok(None);
        };

        let age = Utc::now().timestamp() - row.created_at;
        if age >= self.ttl.num_seconds() {
            debug!(vault = %row.vault_name, "Session expired");
            return Ok(None);
        }

        Ok(Some(SessionClaims {
            vault: VaultName::new(&row.vault_name)?,
            tier: Tier::from_flags(row.is_admin_internal, row.is_ui_admin),
            created_at: DateTime::<Utc>::from_timestamp(row.created_at, 0)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            host_identity: row.host_identity,
        }))
    }

    /// End a session. Ending an unknown or already-ended session is not an
    /// error; the caller must drop any cached identity state either way.
    pub fn end(&self, token: &SessionToken) -> Result<()> {
        self.db.delete_session(token.as_str())?;
        info!("Session ended");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vault() -> VaultName {
        VaultName::new("Youth Group").unwrap()
    }

    #[test]
    fn test_create_then_validate_round_trips_tier() {
        let db = Database::in_memory().unwrap();
        let sessions = SessionStore::new(&db);

        for tier in [Tier::Member, Tier::VaultAdmin, Tier::SuperAdmin] {
            let token = sessions.create(&vault(), tier, "host-a").unwrap();
            let claims = sessions.validate(&token).unwrap().unwrap();
            assert_eq!(claims.tier, tier);
            assert_eq!(claims.vault.as_str(), "Youth Group");
            assert_eq!(claims.host_identity, "host-a");
        }
    }

    #[test]
    fn test_unknown_token_is_invalid() {
        let db = Database::in_memory().unwrap();
        let sessions = SessionStore::new(&db);

        let token = SessionToken::parse("no-such-token").unwrap();
        assert!(sessions.validate(&token).unwrap().is_none());
    }

    #[test]
    fn test_ended_session_is_invalid() {
        let db = Database::in_memory().unwrap();
        let sessions = SessionStore::new(&db);

        let token = sessions.create(&vault(), Tier::Member, "host-a").unwrap();
        sessions.end(&token).unwrap();
        assert!(sessions.validate(&token).unwrap().is_none());

        // Ending again is a no-op.
        sessions.end(&token).unwrap();
    }

    #[test]
    fn test_expired_session_is_invalid_but_row_remains() {
        let db = Database::in_memory().unwrap();
        let sessions = SessionStore::with_ttl(&db, Duration::zero());

        let token = sessions.create(&vault(), Tier::VaultAdmin, "host-a").unwrap();
        assert!(sessions.validate(&token).unwrap().is_none());

        // Validation does not garbage-collect: the row is still present.
        assert!(db.find_session(token.as_str()).unwrap().is_some());

        // A store with a fresh lifetime sees the same row as valid again.
        let lenient = SessionStore::new(&db);
        assert!(lenient.validate(&token).unwrap().is_some());
    }

    #[test]
    fn test_member_claims_cannot_modify() {
        let db = Database::in_memory().unwrap();
        let sessions = SessionStore::new(&db);

        let token = sessions.create(&vault(), Tier::Member, "host-a").unwrap();
        let claims = sessions.validate(&token).unwrap().unwrap();
        assert!(matches!(
            claims.require_modify().unwrap_err(),
            Error::NotPermitted(_)
        ));

        let token = sessions.create(&vault(), Tier::VaultAdmin, "host-a").unwrap();
        let claims = sessions.validate(&token).unwrap().unwrap();
        assert!(claims.require_modify().is_ok());
    }
}
