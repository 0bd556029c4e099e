use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use vigil_core::error::{Result, VigilError};
use vigil_core::traits::ProbeProvider;

/// Registry of available probe providers, keyed case-insensitively by name.
///
/// Built once per engine from an injected provider list. Two providers with
/// the same case-folded name is a caller error and is rejected at
/// registration rather than resolved last-wins.
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn ProbeProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Build a registry from a provider list, rejecting duplicates.
    pub fn from_providers(
        providers: impl IntoIterator<Item = Arc<dyn ProbeProvider>>,
    ) -> Result<Self> {
        let mut registry = Self::new();
        for provider in providers {
            registry.register_arc(provider)?;
        }
        Ok(registry)
    }

    /// Register a provider.
    pub fn register(&mut self, provider: impl ProbeProvider) -> Result<()> {
        self.register_arc(Arc::new(provider))
    }

    pub fn register_arc(&mut self, provider: Arc<dyn ProbeProvider>) -> Result<()> {
        let key = provider.name().to_lowercase();
        if self.providers.contains_key(&key) {
            return Err(VigilError::DuplicateProvider(provider.name().to_string()));
        }
        debug!(provider = %provider.name(), "Probe provider registered");
        self.providers.insert(key, provider);
        Ok(())
    }

    /// Look up a provider by name, case-insensitively.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ProbeProvider>> {
        self.providers.get(&name.to_lowercase()).cloned()
    }

    /// Names of all registered providers.
    pub fn list(&self) -> Vec<&str> {
        self.providers.values().map(|p| p.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_test_utils::ScriptedProbe;

    #[test]
    fn lookup_is_case_insensitive() {
        let mut registry = ProviderRegistry::new();
        registry.register(ScriptedProbe::new("Registry")).unwrap();

        assert!(registry.get("registry").is_some());
        assert!(registry.get("REGISTRY").is_some());
        assert!(registry.get("wmi").is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = ProviderRegistry::new();
        registry.register(ScriptedProbe::new("file")).unwrap();

        let err = registry.register(ScriptedProbe::new("FILE")).unwrap_err();
        assert!(matches!(err, VigilError::DuplicateProvider(name) if name == "FILE"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn from_providers_rejects_duplicates() {
        let providers: Vec<Arc<dyn ProbeProvider>> = vec![
            Arc::new(ScriptedProbe::new("env")),
            Arc::new(ScriptedProbe::new("Env")),
        ];
        assert!(ProviderRegistry::from_providers(providers).is_err());
    }
}
