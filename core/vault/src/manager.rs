//! Vault manager: the front door tying the services together.

use std::sync::Arc;
use tracing::info;

use crate::activity::ActivityLog;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::identity::IdentityResolver;
use crate::session::{SessionClaims, SessionStore};
use chrono::Utc;
use stashpoint_common::{Error, Passkey, Result, SessionToken, Tier, VaultName};
use stashpoint_storage::ObjectStore;
use stashpoint_store::{Database, VaultRow};

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct Login {
    /// Token to present on subsequent requests.
    pub token: SessionToken,
    /// Tier granted by the passkey.
    pub tier: Tier,
    /// Canonical vault name.
    pub vault: VaultName,
}

/// Vault manager over one table store and one storage backend.
pub struct VaultManager {
    db: Database,
    store: Arc<dyn ObjectStore>,
    config: Config,
}

impl VaultManager {
    /// Create a manager.
    pub fn new(db: Database, store: Arc<dyn ObjectStore>, config: Config) -> Self {
        Self { db, store, config }
    }

    /// Create a new vault.
    ///
    /// # Postconditions
    /// - Vault record exists and its storage container is created
    ///
    /// # Errors
    /// - `InvalidInput` if either passkey is empty
    /// - `DuplicateVaultName` if the name is taken, ignoring case
    pub async fn create_vault(
        &self,
        name: &VaultName,
        member_passkey: &Passkey,
        admin_passkey: &Passkey,
        creator: &str,
    ) -> Result<()> {
        if member_passkey.is_empty() || admin_passkey.is_empty() {
            return Err(Error::InvalidInput(
                "Member and admin passkeys are both required".to_string(),
            ));
        }

        if self.db.find_vault(name.as_str())?.is_some() {
            return Err(Error::DuplicateVaultName(name.as_str().to_string()));
        }

        self.db.insert_vault(&VaultRow {
            name: name.as_str().to_string(),
            member_passkey: member_passkey.expose().to_string(),
            admin_passkey: admin_passkey.expose().to_string(),
            creator: creator.to_string(),
            created_at: Utc::now().timestamp(),
        })?;

        self.store.ensure_container(&name.container()).await?;

        info!(vault = %name, "Vault created");
        Ok(())
    }

    /// Log into a vault: resolve the passkey to a tier, then issue a session.
    ///
    /// # Errors
    /// - `VaultNotFound`, `IncorrectPasskey` from resolution
    /// - `SessionPersist` if the session row cannot be written, in which
    ///   case no usable session exists
    pub fn login(
        &self,
        name: &VaultName,
        passkey: &Passkey,
        host_identity: &str,
    ) -> Result<Login> {
        let resolver = IdentityResolver::new(&self.db, &self.config);
        let identity = resolver.resolve(name, passkey)?;

        let token = self
            .sessions()
            .create(&identity.vault, identity.tier, host_identity)?;

        info!(vault = %identity.vault, tier = %identity.tier, "Login succeeded");
        Ok(Login {
            token,
            tier: identity.tier,
            vault: identity.vault,
        })
    }

    /// Restore identity from a session token.
    ///
    /// Returns `Ok(None)` for unknown or expired tokens.
    pub fn open(&self, token: &SessionToken) -> Result<Option<SessionClaims>> {
        self.sessions().validate(token)
    }

    /// End a session. Idempotent.
    pub fn logout(&self, token: &SessionToken) -> Result<()> {
        self.sessions().end(token)
    }

    /// Session store bound to the configured lifetime.
    pub fn sessions(&self) -> SessionStore<'_> {
        SessionStore::with_ttl(&self.db, self.config.session_ttl)
    }

    /// File catalog bound to the configured signed-URL window.
    pub fn catalog(&self) -> Catalog<'_> {
        Catalog::with_url_ttl(&self.db, self.store.clone(), self.config.url_ttl)
    }

    /// Activity log.
    pub fn activity(&self) -> ActivityLog<'_> {
        ActivityLog::new(&self.db)
    }
}
