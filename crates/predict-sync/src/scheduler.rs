//! Wiring for the timer-driven parts of sync: the daily upload loop and the
//! cold-start global-model fetch, both built around small seam traits so
//! this crate never depends on the prediction engine directly.

use crate::global_model::{fetch_global_model, GlobalModel};
use crate::registrar::AppRegistrar;
use crate::upload::upload_anonymous_data;
use predict_core::{GlobalActionCounter, PredictError};
use predict_crypto::CryptoService;
use predict_store::InteractionStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Supplies the current per-action history counts for the daily upload.
/// Implemented by the engine facade over its `PredictionEngine`.
pub trait HistorySource: Send + Sync {
    fn history_counts(&self) -> GlobalActionCounter;
}

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Remote sync: app registration, the daily anonymized upload schedule, and
/// the on-demand global model fetch.
pub struct RemoteSync {
    client: reqwest::Client,
    server_url: String,
    store: Arc<InteractionStore>,
    crypto: Arc<CryptoService>,
    app_id: RwLock<Option<String>>,
}

impl RemoteSync {
    /// Build a sync client pointed at `server_url`, with the spec's default
    /// 10-second request timeout.
    pub fn new(server_url: String, store: Arc<InteractionStore>, crypto: Arc<CryptoService>) -> Result<Self, PredictError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| PredictError::network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            server_url,
            store,
            crypto,
            app_id: RwLock::new(None),
        })
    }

    /// Load the persisted app id, registering a fresh one if needed. Must
    /// be called before the first upload or global-model fetch.
    pub async fn ensure_app_id(&self, now_ms: i64) -> Result<(), PredictError> {
        if self.app_id.read().await.is_some() {
            return Ok(());
        }
        let registrar = AppRegistrar::new(Arc::clone(&self.store), self.client.clone(), self.server_url.clone());
        let app_id = registrar.load_or_register(now_ms).await?;
        *self.app_id.write().await = Some(app_id);
        Ok(())
    }

    /// The currently established app id, if any.
    pub async fn app_id(&self) -> Option<String> {
        self.app_id.read().await.clone()
    }

    /// Upload `counts` now. A no-op if there's no history or no app id yet.
    pub async fn upload_now(&self, counts: GlobalActionCounter) -> Result<(), PredictError> {
        let app_id = self.app_id().await;
        upload_anonymous_data(&self.client, &self.server_url, app_id.as_deref(), &self.crypto, counts).await
    }

    /// Fetch and decrypt the server's global model. Requires an app id to
    /// already be established.
    pub async fn fetch_global_model(&self) -> Result<GlobalModel, PredictError> {
        let app_id = self
            .app_id()
            .await
            .ok_or_else(|| PredictError::configuration("cannot fetch global model before app id is established"))?;
        fetch_global_model(&self.client, &self.server_url, &app_id, &self.crypto).await
    }

    /// Spawn the daily upload loop: a one-shot wait until the next UTC
    /// midnight, then a recurring 24-hour tick. `source` is sampled at each
    /// tick; upload failures are logged and never abort the loop. Drop or
    /// abort the returned handle to stop the schedule on teardown.
    pub fn spawn_daily_upload(self: Arc<Self>, source: Arc<dyn HistorySource>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let first_delay = duration_until_next_midnight_utc();
            tokio::time::sleep(first_delay).await;
            loop {
                let counts = source.history_counts();
                if let Err(err) = self.upload_now(counts).await {
                    tracing::warn!(error = %err, "daily upload failed");
                }
                tokio::time::sleep(DAY).await;
            }
        })
    }
}

/// Seconds until the next UTC midnight, as a `tokio::time` duration.
fn duration_until_next_midnight_utc() -> Duration {
    let now_s = time::OffsetDateTime::now_utc().unix_timestamp();
    let start_of_day = now_s - now_s.rem_euclid(86_400);
    let next_midnight = start_of_day + 86_400;
    Duration::from_secs((next_midnight - now_s).max(0) as u64)
}
