//! Maps a workflow's `Agent::provider` name to a live [`ModelProvider`],
//! each behind its own [`ModelCatalogCache`].

use crate::cache::ModelCatalogCache;
use crate::provider::{ModelProvider, ProviderError};
use std::collections::HashMap;
use std::sync::Arc;

struct Entry {
    provider: Arc<dyn ModelProvider>,
    catalog: ModelCatalogCache,
}

/// Holds every provider configured for a run, keyed by name.
#[derive(Default)]
pub struct ProviderRegistry {
    entries: HashMap<String, Entry>,
}

impl ProviderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own [`ModelProvider::name`], eagerly
    /// fetching its model catalog so the `provider → set<model_id>`
    /// lookup `is_model_supported` reads is already populated rather than
    /// paying a network round-trip on first use. A registration that
    /// can't list its models fails outright rather than being silently
    /// deferred to the first step that needs it.
    pub async fn register(&mut self, provider: Arc<dyn ModelProvider>) -> Result<(), ProviderError> {
        let catalog = ModelCatalogCache::default();
        catalog.get_or_refresh(provider.as_ref()).await?;
        let name = provider.name().to_string();
        self.entries.insert(name, Entry { provider, catalog });
        Ok(())
    }

    /// Look up a provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn ModelProvider>> {
        self.entries.get(name).map(|e| e.provider.clone())
    }

    /// Whether `model_id` is in `provider_name`'s cached catalog,
    /// refreshing the cache first if it's never been populated or has
    /// expired.
    pub async fn is_model_supported(&self, provider_name: &str, model_id: &str) -> Result<bool, ProviderError> {
        let Some(entry) = self.entries.get(provider_name) else {
            return Ok(false);
        };
        entry.catalog.get_or_refresh(entry.provider.as_ref()).await?;
        Ok(entry.catalog.is_model_supported(model_id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lacquer_core::ModelRequest;

    struct FakeProvider;

    #[async_trait]
    impl ModelProvider for FakeProvider {
        async fn generate(
            &self,
            _request: &ModelRequest,
            _ctx: &lacquer_context::ExecutionContext,
            _step_id: &str,
            _sink: &dyn lacquer_core::ProgressSink,
        ) -> Result<crate::types::ModelResponse, ProviderError> {
            unimplemented!()
        }

        async fn list_models(&self) -> Result<Vec<crate::types::ModelInfo>, ProviderError> {
            Ok(vec![crate::types::ModelInfo {
                id: "fake-1".into(),
                display_name: "Fake One".into(),
                context_window: Some(128_000),
            }])
        }

        fn name(&self) -> &str {
            "fake"
        }
    }

    #[tokio::test]
    async fn registers_and_resolves_by_name() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(FakeProvider)).await.unwrap();
        assert!(registry.get("fake").is_some());
        assert!(registry.get("ghost").is_none());
    }

    #[tokio::test]
    async fn registration_eagerly_populates_the_catalog() {
        let mut registry = ProviderRegistry::new();
        registry.register(Arc::new(FakeProvider)).await.unwrap();
        // No further network call is needed here: `register` already
        // fetched the catalog, so this only exercises the cached lookup.
        assert!(registry.is_model_supported("fake", "fake-1").await.unwrap());
        assert!(!registry.is_model_supported("fake", "ghost-model").await.unwrap());
        assert!(!registry.is_model_supported("unregistered", "fake-1").await.unwrap());
    }

    struct FailingProvider;

    #[async_trait]
    impl ModelProvider for FailingProvider {
        async fn generate(
            &self,
            _request: &ModelRequest,
            _ctx: &lacquer_context::ExecutionContext,
            _step_id: &str,
            _sink: &dyn lacquer_core::ProgressSink,
        ) -> Result<crate::types::ModelResponse, ProviderError> {
            unimplemented!()
        }

        async fn list_models(&self) -> Result<Vec<crate::types::ModelInfo>, ProviderError> {
            Err(ProviderError::ServerError("502".into()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[tokio::test]
    async fn registration_fails_outright_when_the_catalog_cannot_be_listed() {
        let mut registry = ProviderRegistry::new();
        assert!(registry.register(Arc::new(FailingProvider)).await.is_err());
        assert!(registry.get("failing").is_none());
    }
}
