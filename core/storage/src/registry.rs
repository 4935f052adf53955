//! Store registry for dynamic backend resolution.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::provider::ObjectStore;
use stashpoint_common::{Error, Result};

/// Factory function type for creating object stores.
pub type StoreFactory = Box<dyn Fn(Value) -> Result<Arc<dyn ObjectStore>> + Send + Sync>;

/// Registry for object-store factories.
///
/// Allows dynamic registration and resolution of storage backends
/// by name and configuration.
pub struct StoreRegistry {
    factories: HashMap<String, StoreFactory>,
}

impl StoreRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a store factory.
    ///
    /// # Preconditions
    /// - `name` must be unique within the registry
    ///
    /// # Errors
    /// - Returns error if name is already registered
    pub fn register(&mut self, name: impl Into<String>, factory: StoreFactory) -> Result<()> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(Error::InvalidInput(format!(
                "Backend '{}' is already registered",
                name
            )));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Resolve a backend by name and configuration.
    ///
    /// # Errors
    /// - Backend not found
    /// - Configuration invalid
    pub fn resolve(&self, name: &str, config: Value) -> Result<Arc<dyn ObjectStore>> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("Backend '{}' is not registered", name)))?;
        factory(config)
    }

    /// Get list of registered backend names.
    pub fn backends(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Check if a backend is registered.
    pub fn has_backend(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a registry with default backends.
pub fn create_default_registry() -> StoreRegistry {
    let mut registry = StoreRegistry::new();

    registry
        .register(
            "memory",
            Box::new(|_config| Ok(Arc::new(crate::memory::MemoryStore::new()))),
        )
        .expect("Failed to register memory backend");

    registry
        .register(
            "local",
            Box::new(|config| {
                let root = config
                    .get("root")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| {
                        Error::InvalidInput("Local backend requires 'root' path".to_string())
                    })?;
                Ok(Arc::new(crate::local::LocalStore::new(root)?))
            }),
        )
        .expect("Failed to register local backend");

    registry
        .register(
            "remote",
            Box::new(|config| {
                let config: crate::remote::RemoteConfig = serde_json::from_value(config)
                    .map_err(|e| {
                        Error::InvalidInput(format!("Invalid remote backend config: {}", e))
                    })?;
                Ok(Arc::new(crate::remote::RemoteStore::new(config)?))
            }),
        )
        .expect("Failed to register remote backend");

    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn test_register_and_resolve() {
        let mut registry = StoreRegistry::new();

        registry
            .register("test", Box::new(|_| Ok(Arc::new(MemoryStore::new()))))
            .unwrap();

        let store = registry.resolve("test", Value::Null).unwrap();
        assert_eq!(store.name(), "memory");
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = StoreRegistry::new();

        registry
            .register("test", Box::new(|_| Ok(Arc::new(MemoryStore::new()))))
            .unwrap();

        let result = registry.register("test", Box::new(|_| Ok(Arc::new(MemoryStore::new()))));
        assert!(result.is_err());
    }

    #[test]
    fn test_resolve_unknown_fails() {
        let registry = StoreRegistry::new();
        assert!(registry.resolve("unknown", Value::Null).is_err());
    }

    #[test]
    fn test_default_registry_backends() {
        let registry = create_default_registry();
        assert!(registry.has_backend("memory"));
        assert!(registry.has_backend("local"));
        assert!(registry.has_backend("remote"));
    }

    #[test]
    fn test_local_backend_requires_root() {
        let registry = create_default_registry();
        assert!(registry.resolve("local", Value::Null).is_err());

        let dir = tempfile::tempdir().unwrap();
        let config = serde_json::json!({ "root": dir.path().to_string_lossy() });
        let store = registry.resolve("local", config).unwrap();
        assert_eq!(store.name(), "local");
    }

    #[test]
    fn test_remote_backend_config() {
        let registry = create_default_registry();
        let config = serde_json::json!({
            "endpoint": "https://storage.example.com/v1",
            "access_key": "key"
        });
        let store = registry.resolve("remote", config).unwrap();
        assert_eq!(store.name(), "remote");
    }
}
