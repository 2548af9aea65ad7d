//! The public engine: wires the tracker, interaction store, component
//! registry, prediction model, preload cache, and remote sync together
//! behind the small operation set applications actually call.

use predict_core::{EngineConfig, PredictError, Prediction};
use predict_crypto::CryptoService;
use predict_model::{ModelConfig, PredictionEngine};
use predict_preload::{AssetFetcher, NoopFetcher, PreloadCache};
use predict_registry::ComponentRegistry;
use predict_store::{InteractionStore, StoreIvMapPersistence};
use predict_sync::{HistorySource, RemoteSync};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::task::JoinHandle;

struct ModelHistorySource(Arc<PredictionEngine>);

impl HistorySource for ModelHistorySource {
    fn history_counts(&self) -> predict_core::GlobalActionCounter {
        self.0.history_counts()
    }
}

/// The predictive preloading engine. One instance per application session;
/// construction does the startup replay described for C4, and optionally
/// seeds a cold start from the remote global model.
pub struct Engine {
    crypto: Arc<CryptoService>,
    store: Arc<InteractionStore>,
    registry: Arc<ComponentRegistry>,
    model: Arc<PredictionEngine>,
    preload: Arc<PreloadCache>,
    sync: Option<Arc<RemoteSync>>,
    upload_handle: Option<JoinHandle<()>>,
}

impl Engine {
    /// Open the engine: load the encryption key, open the interaction
    /// store, replay history into the prediction model, and — if a server
    /// is configured and local history is thin — merge in the remote
    /// global model.
    pub async fn open(config: EngineConfig) -> Result<Self, PredictError> {
        Self::open_with_fetcher(config, Arc::new(NoopFetcher)).await
    }

    /// Like [`Self::open`], but with an application-supplied [`AssetFetcher`]
    /// instead of the no-op default.
    pub async fn open_with_fetcher(config: EngineConfig, fetcher: Arc<dyn AssetFetcher>) -> Result<Self, PredictError> {
        let key = config.encryption_key()?;
        let store = Arc::new(InteractionStore::open(&config.store_path).await?);
        let crypto = Arc::new(
            CryptoService::new(key, Arc::new(StoreIvMapPersistence::new(Arc::clone(&store)))).await?,
        );
        let registry = Arc::new(ComponentRegistry::new());
        let model = Arc::new(PredictionEngine::new(ModelConfig::from(&config)));
        let preload = Arc::new(PreloadCache::new(Arc::clone(&registry), fetcher));

        for record in store.list(&crypto).await? {
            model.update(&record.action_type, record.timestamp_ms);
        }

        {
            let model_for_updates = Arc::clone(&model);
            store.subscribe(move |record| {
                model_for_updates.update(&record.action_type, record.timestamp_ms);
            });
        }

        let sync = if let Some(server_url) = config.server_url.clone() {
            let sync = Arc::new(RemoteSync::new(server_url, Arc::clone(&store), Arc::clone(&crypto))?);
            sync.ensure_app_id(now_ms()).await?;

            if !model.should_skip_global_fetch() {
                match sync.fetch_global_model().await {
                    Ok(global) => model.install_global_model(global.global_action_counter, global.time_patterns),
                    Err(err) => tracing::warn!(error = %err, "global model fetch failed, continuing cold"),
                }
            }
            Some(sync)
        } else {
            None
        };

        let upload_handle = sync.clone().map(|sync| sync.spawn_daily_upload(Arc::new(ModelHistorySource(Arc::clone(&model)))));

        Ok(Self {
            crypto,
            store,
            registry,
            model,
            preload,
            sync,
            upload_handle,
        })
    }

    /// Register a preloadable component.
    pub fn track_component(&self, id: &str, kind: &str, metadata: Option<serde_json::Value>) {
        let metadata = metadata
            .and_then(|value| value.as_object().cloned())
            .unwrap_or_default();
        self.registry.track_component(id, kind, metadata);
    }

    /// Bind an action type to a previously registered component.
    pub fn associate_action(&self, action_type: &str, component_id: &str) {
        self.registry.associate_action_with_component(action_type, component_id);
    }

    /// Record a user interaction: persist it (triggering the model update
    /// via the store's save notification), recompute a prediction, and
    /// dispatch a preload for it. A no-op (with a warning) if `action_type`
    /// isn't bound to any tracked component.
    pub async fn track_interaction(&self, action_type: &str) -> Result<(), PredictError> {
        let Some(component_id) = self.registry.get_component_by_action(action_type) else {
            tracing::warn!(action_type, "track_interaction called for an unbound action");
            return Ok(());
        };
        let record = predict_core::InteractionRecord {
            component_id,
            action_type: action_type.to_string(),
            timestamp_ms: now_ms(),
        };
        self.store.save(&self.crypto, record).await?;

        let prediction = self.predict(now_ms());
        self.preload.preload_prediction(&prediction).await;
        Ok(())
    }

    /// Compute the current next-action prediction without side effects.
    pub fn predict(&self, now_ms: i64) -> Prediction {
        match self.model.predict_action(now_ms) {
            Some(action) => {
                let component_id = self.registry.get_component_by_action(&action);
                Prediction {
                    action: Some(action),
                    component_id,
                }
            }
            None => Prediction::none(),
        }
    }

    /// Force an immediate anonymized upload, bypassing the daily schedule.
    /// A no-op if no server is configured.
    pub async fn force_upload_data(&self) -> Result<(), PredictError> {
        let Some(sync) = &self.sync else {
            return Ok(());
        };
        sync.upload_now(self.model.history_counts()).await
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if let Some(handle) = self.upload_handle.take() {
            handle.abort();
        }
    }
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
