//! Plugin-based provider registry
//!
//! The registry maps provider type names to factories so the binary can
//! build a provider from configuration without hardcoding the choice.
//!
//! ## Registration
//!
//! Provider crates register themselves during initialization:
//!
//! ```rust,ignore
//! // In zonesync-provider-route53
//! pub fn register(registry: &ProviderRegistry) {
//!     registry.register_provider("route53", Box::new(Route53Factory));
//! }
//! ```

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::traits::{ZoneProvider, ZoneProviderFactory};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Registry of zone provider factories
///
/// Uses interior mutability, so registration works through a shared
/// reference.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, Box<dyn ZoneProviderFactory>>>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider factory under `name` (e.g. "route53")
    ///
    /// A later registration under the same name replaces the earlier one.
    pub fn register_provider(&self, name: impl Into<String>, factory: Box<dyn ZoneProviderFactory>) {
        let mut providers = self.providers.write().unwrap_or_else(PoisonError::into_inner);
        providers.insert(name.into(), factory);
    }

    /// Create a provider from configuration
    ///
    /// Fails with [`Error::Config`] when no factory is registered for the
    /// configured type.
    pub fn create_provider(&self, config: &ProviderConfig) -> Result<Box<dyn ZoneProvider>> {
        let provider_type = config.type_name();
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);

        let factory = providers
            .get(provider_type)
            .ok_or_else(|| Error::config(format!("Unknown provider type: {}", provider_type)))?;

        factory.create(config)
    }

    /// List all registered provider types, sorted
    pub fn list_providers(&self) -> Vec<String> {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = providers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a provider type is registered
    pub fn has_provider(&self, name: &str) -> bool {
        let providers = self.providers.read().unwrap_or_else(PoisonError::into_inner);
        providers.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockProviderFactory;

    impl ZoneProviderFactory for MockProviderFactory {
        fn create(&self, _config: &ProviderConfig) -> Result<Box<dyn ZoneProvider>> {
            Err(Error::not_found("Mock provider not implemented"))
        }
    }

    #[test]
    fn test_registry_registration() {
        let registry = ProviderRegistry::new();
        assert!(!registry.has_provider("mock"));

        registry.register_provider("mock", Box::new(MockProviderFactory));

        assert!(registry.has_provider("mock"));
        assert_eq!(registry.list_providers(), vec!["mock".to_string()]);
    }

    #[test]
    fn test_unknown_provider_is_config_error() {
        let registry = ProviderRegistry::new();
        let config = ProviderConfig::Custom {
            factory: "nope".to_string(),
            config: serde_json::json!({}),
        };
        assert!(matches!(
            registry.create_provider(&config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_factory_error_propagates() {
        let registry = ProviderRegistry::new();
        registry.register_provider("mock", Box::new(MockProviderFactory));
        let config = ProviderConfig::Custom {
            factory: "mock".to_string(),
            config: serde_json::json!({}),
        };
        assert!(matches!(
            registry.create_provider(&config),
            Err(Error::NotFound(_))
        ));
    }
}
