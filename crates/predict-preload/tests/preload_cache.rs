use async_trait::async_trait;
use predict_core::{ComponentDescriptor, Prediction};
use predict_preload::{AssetFetcher, PreloadCache};
use predict_registry::ComponentRegistry;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct CountingFetcher {
    calls: AtomicUsize,
}

#[async_trait]
impl AssetFetcher for CountingFetcher {
    async fn fetch(&self, _component: &ComponentDescriptor) -> Result<(), predict_core::PredictError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn registry_with_one_component() -> Arc<ComponentRegistry> {
    let registry = ComponentRegistry::new();
    registry.track_component("dashboard", "page", serde_json::Map::new());
    Arc::new(registry)
}

#[tokio::test]
async fn repeated_preload_calls_fetch_at_most_once() {
    let registry = registry_with_one_component();
    let fetcher = Arc::new(CountingFetcher::default());
    let cache = PreloadCache::new(registry, fetcher.clone());

    cache.preload("dashboard").await;
    cache.preload("dashboard").await;
    cache.preload("dashboard").await;

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    assert!(cache.is_cached("dashboard"));
}

#[tokio::test]
async fn untracked_component_is_a_no_op() {
    let registry = registry_with_one_component();
    let fetcher = Arc::new(CountingFetcher::default());
    let cache = PreloadCache::new(registry, fetcher.clone());

    cache.preload("does-not-exist").await;

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn none_prediction_is_a_no_op() {
    let registry = registry_with_one_component();
    let fetcher = Arc::new(CountingFetcher::default());
    let cache = PreloadCache::new(registry, fetcher.clone());

    cache.preload_prediction(&Prediction::none()).await;

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn prediction_with_component_is_preloaded() {
    let registry = registry_with_one_component();
    let fetcher = Arc::new(CountingFetcher::default());
    let cache = PreloadCache::new(registry, fetcher.clone());

    let prediction = Prediction {
        action: Some("go-dashboard".to_string()),
        component_id: Some("dashboard".to_string()),
    };
    cache.preload_prediction(&prediction).await;

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
}
