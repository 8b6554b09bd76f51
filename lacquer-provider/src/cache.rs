//! Centralized model-catalog cache (C6): one `ListModels` call per provider
//! is cached for 24 hours rather than hitting the vendor on every
//! `IsModelSupported` check.

use crate::provider::{ModelProvider, ProviderError};
use crate::types::ModelInfo;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

struct Cached {
    fetched_at: Instant,
    models: Vec<ModelInfo>,
}

/// Caches one provider's model catalog behind a TTL.
pub struct ModelCatalogCache {
    ttl: Duration,
    cached: RwLock<Option<Cached>>,
}

impl Default for ModelCatalogCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ModelCatalogCache {
    /// Build a cache with a custom TTL (tests use a short one).
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, cached: RwLock::new(None) }
    }

    /// Return the cached catalog if still fresh, otherwise call
    /// `provider.list_models()` and cache the result.
    pub async fn get_or_refresh(&self, provider: &dyn ModelProvider) -> Result<Vec<ModelInfo>, ProviderError> {
        {
            let guard = self.cached.read().await;
            if let Some(entry) = guard.as_ref() {
                if entry.fetched_at.elapsed() < self.ttl {
                    return Ok(entry.models.clone());
                }
            }
        }
        let models = provider.list_models().await?;
        let mut guard = self.cached.write().await;
        *guard = Some(Cached { fetched_at: Instant::now(), models: models.clone() });
        Ok(models)
    }

    /// O(1)-ish lookup against whatever's currently cached, without
    /// triggering a refresh. Returns `false` if nothing has been cached
    /// yet — callers should `get_or_refresh` at least once up front.
    pub async fn is_model_supported(&self, model_id: &str) -> bool {
        let guard = self.cached.read().await;
        guard
            .as_ref()
            .map(|entry| entry.models.iter().any(|m| m.id == model_id))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lacquer_core::ModelRequest;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    struct CountingProvider {
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl ModelProvider for CountingProvider {
        async fn generate(
            &self,
            _request: &ModelRequest,
            _ctx: &lacquer_context::ExecutionContext,
            _step_id: &str,
            _sink: &dyn lacquer_core::ProgressSink,
        ) -> Result<crate::types::ModelResponse, ProviderError> {
            unimplemented!()
        }

        async fn list_models(&self) -> Result<Vec<ModelInfo>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![ModelInfo { id: "m1".into(), display_name: "Model One".into(), context_window: None }])
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    #[tokio::test]
    async fn refreshes_once_then_serves_from_cache() {
        let calls = Arc::new(AtomicU32::new(0));
        let provider = CountingProvider { calls: calls.clone() };
        let cache = ModelCatalogCache::new(Duration::from_secs(60));

        cache.get_or_refresh(&provider).await.unwrap();
        cache.get_or_refresh(&provider).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.is_model_supported("m1").await);
        assert!(!cache.is_model_supported("ghost").await);
    }

    #[tokio::test]
    async fn refreshes_again_once_ttl_elapses() {
        let calls = Arc::new(AtomicU32::new(0));
        let provider = CountingProvider { calls: calls.clone() };
        let cache = ModelCatalogCache::new(Duration::from_millis(1));

        cache.get_or_refresh(&provider).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        cache.get_or_refresh(&provider).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
