//! Common types used throughout StashPoint.

use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;
use uuid::Uuid;
use zeroize::Zeroize;

/// Human-entered name of a vault.
///
/// Names are unique case-insensitively across the whole system; two
/// `VaultName`s refer to the same vault when their lowercased forms match.
/// The original casing is preserved for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultName(String);

impl VaultName {
    /// Create a new VaultName from a string.
    ///
    /// # Preconditions
    /// - `name` must be non-empty after trimming
    ///
    /// # Errors
    /// - Returns error if name is empty or whitespace-only
    pub fn new(name: impl Into<String>) -> crate::Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(crate::Error::InvalidInput(
                "Vault name cannot be empty".to_string(),
            ));
        }
        Ok(Self(name))
    }

    /// Get the name as entered, with original casing.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased form used for case-insensitive comparison.
    pub fn normalized(&self) -> String {
        self.0.to_lowercase()
    }

    /// Check whether two names refer to the same vault.
    pub fn matches(&self, other: &VaultName) -> bool {
        self.normalized() == other.normalized()
    }

    /// Storage container name for this vault: lowercased, spaces
    /// replaced with hyphens.
    pub fn container(&self) -> String {
        self.0.to_lowercase().replace(' ', "-")
    }
}

impl fmt::Display for VaultName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authorization tier granted by a matching passkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    /// Read and upload only.
    Member,
    /// Full rights over the vault, admin controls visible.
    VaultAdmin,
    /// Deployment-wide override. Full rights, but admin controls stay
    /// hidden so the elevation is not discoverable by vault owners.
    SuperAdmin,
}

impl Tier {
    /// Whether this tier may rename or delete files.
    pub fn can_modify(&self) -> bool {
        matches!(self, Tier::VaultAdmin | Tier::SuperAdmin)
    }

    /// Label recorded in activity entries.
    pub fn label(&self) -> &'static str {
        match self {
            Tier::Member => "MEMBER",
            Tier::VaultAdmin => "VAULT_ADMIN",
            Tier::SuperAdmin => "SUPER_ADMIN",
        }
    }

    /// Session row flags: (is_admin_internal, is_ui_admin).
    pub fn flags(&self) -> (bool, bool) {
        match self {
            Tier::Member => (false, false),
            Tier::VaultAdmin => (true, true),
            Tier::SuperAdmin => (true, false),
        }
    }

    /// Reconstruct a tier from session row flags.
    pub fn from_flags(is_admin_internal: bool, is_ui_admin: bool) -> Self {
        match (is_admin_internal, is_ui_admin) {
            (true, true) => Tier::VaultAdmin,
            (true, false) => Tier::SuperAdmin,
            _ => Tier::Member,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Opaque session token proving a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(String);

impl SessionToken {
    /// Generate a new random token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wrap an existing token string, e.g. one presented by a client.
    ///
    /// # Errors
    /// - Returns error if the token is empty
    pub fn parse(token: impl Into<String>) -> crate::Result<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(crate::Error::InvalidInput(
                "Session token cannot be empty".to_string(),
            ));
        }
        Ok(Self(token))
    }

    /// Get the token string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Passkey material, zeroized on drop.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct Passkey(String);

impl Passkey {
    /// Wrap entered passkey material.
    pub fn new(passkey: impl Into<String>) -> Self {
        Self(passkey.into())
    }

    /// Whether the passkey is empty. Empty passkeys never authenticate.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Constant-time comparison against stored passkey material.
    pub fn matches(&self, stored: &str) -> bool {
        self.0.as_bytes().ct_eq(stored.as_bytes()).into()
    }

    /// Expose the raw material, e.g. for persisting at vault creation.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Passkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Passkey([REDACTED; {} bytes])", self.0.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_vault_name_creation() {
        let name = VaultName::new("Youth Group").unwrap();
        assert_eq!(name.as_str(), "Youth Group");
    }

    #[test]
    fn test_vault_name_empty_fails() {
        assert!(VaultName::new("").is_err());
        assert!(VaultName::new("   ").is_err());
    }

    #[test]
    fn test_vault_name_trims() {
        let name = VaultName::new("  Band  ").unwrap();
        assert_eq!(name.as_str(), "Band");
    }

    #[test]
    fn test_vault_name_matches_case_insensitive() {
        let a = VaultName::new("Youth Group").unwrap();
        let b = VaultName::new("YOUTH GROUP").unwrap();
        assert!(a.matches(&b));
    }

    #[test]
    fn test_container_normalization() {
        let name = VaultName::new("Youth Group").unwrap();
        assert_eq!(name.container(), "youth-group");
    }

    #[test]
    fn test_tier_flags_round_trip() {
        for tier in [Tier::Member, Tier::VaultAdmin, Tier::SuperAdmin] {
            let (internal, ui) = tier.flags();
            assert_eq!(Tier::from_flags(internal, ui), tier);
        }
    }

    #[test]
    fn test_tier_permissions() {
        assert!(!Tier::Member.can_modify());
        assert!(Tier::VaultAdmin.can_modify());
        assert!(Tier::SuperAdmin.can_modify());
    }

    #[test]
    fn test_session_token_unique() {
        assert_ne!(
            SessionToken::generate().as_str(),
            SessionToken::generate().as_str()
        );
    }

    #[test]
    fn test_session_token_parse_empty_fails() {
        assert!(SessionToken::parse("").is_err());
    }

    #[test]
    fn test_passkey_matches() {
        let passkey = Passkey::new("m1");
        assert!(passkey.matches("m1"));
        assert!(!passkey.matches("a1"));
        assert!(!passkey.matches("m1 "));
    }

    #[test]
    fn test_empty_passkey() {
        assert!(Passkey::new("").is_empty());
        assert!(!Passkey::new("x").is_empty());
    }

    proptest! {
        #[test]
        fn prop_vault_names_match_ignoring_case(name in "[a-zA-Z][a-zA-Z0-9 ]{0,30}") {
            let lower = VaultName::new(name.to_lowercase());
            let upper = VaultName::new(name.to_uppercase());
            if let (Ok(lower), Ok(upper)) = (lower, upper) {
                prop_assert!(lower.matches(&upper));
            }
        }

        #[test]
        fn prop_container_has_no_spaces(name in "[a-zA-Z][a-zA-Z0-9 ]{0,30}[a-zA-Z0-9]") {
            let name = VaultName::new(name).unwrap();
            prop_assert!(!name.container().contains(' '));
            prop_assert_eq!(name.container(), name.container().to_lowercase());
        }
    }
}
