//! Passkey-to-tier identity resolution.

use tracing::debug;

use crate::config::Config;
use stashpoint_common::{Error, Passkey, Result, Tier, VaultName};
use stashpoint_store::Database;

/// Result of a successful identity resolution.
#[derive(Debug, Clone)]
pub struct ResolvedIdentity {
    /// Canonical vault name, with the casing it was created under.
    pub vault: VaultName,
    /// Granted authorization tier.
    pub tier: Tier,
}

/// Resolves (vault name, passkey) pairs into authorization tiers.
///
/// Pure lookup with no side effects; session creation is a separate step.
pub struct IdentityResolver<'a> {
    db: &'a Database,
    master_key: Option<&'a Passkey>,
}

impl<'a> IdentityResolver<'a> {
    /// Create a resolver over the vault table.
    pub fn new(db: &'a Database, config: &'a Config) -> Self {
        Self {
            db,
            master_key: config.master_key.as_ref(),
        }
    }

    /// Resolve an entered passkey into a tier for the named vault.
    ///
    /// Tier checks run in strict priority order, highest first: the
    /// deployment-wide secret must win over a vault's own passkeys so that
    /// it stays indistinguishable from a wrong guess to vault owners.
    ///
    /// # Errors
    /// - `VaultNotFound` if no vault matches the name (ignoring case)
    /// - `IncorrectPasskey` if the passkey is empty or matches no tier
    pub fn resolve(&self, name: &VaultName, passkey: &Passkey) -> Result<ResolvedIdentity> {
        let record = self
            .db
            .find_vault(name.as_str())?
            .ok_or_else(|| Error::VaultNotFound(name.as_str().to_string()))?;

        if passkey.is_empty() {
            return Err(Error::IncorrectPasskey);
        }

        let vault = VaultName::new(&record.name)?;

        if let Some(master) = self.master_key {
            if passkey.matches(master.expose()) {
                debug!(vault = %vault, "Super-admin override accepted");
                return Ok(ResolvedIdentity {
                    vault,
                    tier: Tier::SuperAdmin,
                });
            }
        }

        if passkey.matches(&record.admin_passkey) {
            return Ok(ResolvedIdentity {
                vault,
                tier: Tier::VaultAdmin,
            });
        }

        if passkey.matches(&record.member_passkey) {
            return Ok(ResolvedIdentity {
                vault,
                tier: Tier::Member,
            });
        }

        Err(Error::IncorrectPasskey)
    }
}
