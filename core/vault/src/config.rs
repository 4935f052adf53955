//! Deployment configuration.

use std::time::Duration;
use tracing::warn;

use stashpoint_common::Passkey;

/// Environment variable naming the remote storage endpoint URL.
pub const ENV_STORAGE_ENDPOINT: &str = "STASHPOINT_STORAGE_ENDPOINT";
/// Environment variable naming the storage access key.
pub const ENV_STORAGE_ACCESS_KEY: &str = "STASHPOINT_STORAGE_ACCESS_KEY";
/// Environment variable naming the deployment-wide super-admin secret.
pub const ENV_MASTER_KEY: &str = "STASHPOINT_MASTER_KEY";

/// Deployment configuration for the vault layer.
#[derive(Debug, Clone)]
pub struct Config {
    /// Remote object-storage endpoint, when one is configured.
    pub storage_endpoint: Option<String>,
    /// Access key for the remote endpoint.
    pub storage_access_key: Option<String>,
    /// Super-admin secret. `None` disables the override tier.
    pub master_key: Option<Passkey>,
    /// Lifetime of issued sessions.
    pub session_ttl: chrono::Duration,
    /// Expiry window for signed access URLs.
    pub url_ttl: Duration,
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// A missing super-admin secret disables the override tier with a
    /// warning; it never fails.
    pub fn from_env() -> Self {
        let master_key = match std::env::var(ENV_MASTER_KEY) {
            Ok(key) if !key.is_empty() => Some(Passkey::new(key)),
            _ => {
                warn!(
                    "{} is not set; the super-admin override tier is disabled",
                    ENV_MASTER_KEY
                );
                None
            }
        };

        Self {
            storage_endpoint: std::env::var(ENV_STORAGE_ENDPOINT).ok(),
            storage_access_key: std::env::var(ENV_STORAGE_ACCESS_KEY).ok(),
            master_key,
            ..Self::default()
        }
    }

    /// Set the super-admin secret.
    pub fn with_master_key(mut self, key: Passkey) -> Self {
        self.master_key = Some(key);
        self
    }

    /// Set the session lifetime.
    pub fn with_session_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Whether the super-admin override tier is available.
    pub fn has_super_admin(&self) -> bool {
        self.master_key.is_some()
    }

    /// Remote backend configuration, when both endpoint and key are set.
    pub fn remote_backend_config(&self) -> Option<serde_json::Value> {
        match (&self.storage_endpoint, &self.storage_access_key) {
            (Some(endpoint), Some(access_key)) => Some(serde_json::json!({
                "endpoint": endpoint,
                "access_key": access_key,
            })),
            _ => None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_endpoint: None,
            storage_access_key: None,
            master_key: None,
            session_ttl: chrono::Duration::hours(24),
            url_ttl: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(!config.has_super_admin());
        assert_eq!(config.session_ttl, chrono::Duration::hours(24));
        assert_eq!(config.url_ttl, Duration::from_secs(60));
        assert!(config.remote_backend_config().is_none());
    }

    #[test]
    fn test_with_master_key() {
        let config = Config::default().with_master_key(Passkey::new("S3CR3T"));
        assert!(config.has_super_admin());
    }

    #[test]
    fn test_remote_backend_config_requires_both() {
        let mut config = Config::default();
        config.storage_endpoint = Some("https://storage.example.com".to_string());
        assert!(config.remote_backend_config().is_none());

        config.storage_access_key = Some("key".to_string());
        let value = config.remote_backend_config().unwrap();
        assert_eq!(value["endpoint"], "https://storage.example.com");
    }
}
