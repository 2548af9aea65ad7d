//! Idempotent preload dispatch: at most one fetch per component per session.

use crate::fetcher::AssetFetcher;
use parking_lot::Mutex;
use predict_core::Prediction;
use predict_registry::ComponentRegistry;
use std::collections::HashSet;
use std::sync::Arc;

/// Tracks which components have already been preloaded this session and
/// dispatches to an [`AssetFetcher`] at most once per component.
pub struct PreloadCache {
    registry: Arc<ComponentRegistry>,
    fetcher: Arc<dyn AssetFetcher>,
    cached: Mutex<HashSet<String>>,
}

impl PreloadCache {
    /// Build a preload cache resolving component ids through `registry` and
    /// dispatching fetches to `fetcher`.
    pub fn new(registry: Arc<ComponentRegistry>, fetcher: Arc<dyn AssetFetcher>) -> Self {
        Self {
            registry,
            fetcher,
            cached: Mutex::new(HashSet::new()),
        }
    }

    /// Preload `component_id`'s asset. A no-op if already cached this
    /// session or if the component isn't tracked. Fetch failures are logged
    /// and swallowed — preloading is a best-effort optimization.
    pub async fn preload(&self, component_id: &str) {
        {
            let mut cached = self.cached.lock();
            if cached.contains(component_id) {
                return;
            }
            cached.insert(component_id.to_string());
        }

        let Some(descriptor) = self.registry.get_component(component_id) else {
            tracing::warn!(component_id, "preload requested for untracked component");
            return;
        };

        if let Err(err) = self.fetcher.fetch(&descriptor).await {
            tracing::warn!(component_id, error = %err, "preload fetch failed");
        }
    }

    /// Resolve `prediction`'s component (if any) and preload it. A `none`
    /// prediction is a no-op.
    pub async fn preload_prediction(&self, prediction: &Prediction) {
        if let Some(component_id) = &prediction.component_id {
            self.preload(component_id).await;
        }
    }

    /// Whether `component_id` has already been dispatched this session.
    pub fn is_cached(&self, component_id: &str) -> bool {
        self.cached.lock().contains(component_id)
    }
}
