//! App registration against the remote aggregator.

use predict_core::PredictError;
use predict_store::InteractionStore;
use std::sync::Arc;

const APP_ID_KEY: &str = "prediction_model_app_id";

/// Loads or registers the application id the remote aggregator uses to key
/// uploaded data and the global model.
pub struct AppRegistrar {
    store: Arc<InteractionStore>,
    client: reqwest::Client,
    server_url: String,
}

impl AppRegistrar {
    pub fn new(store: Arc<InteractionStore>, client: reqwest::Client, server_url: String) -> Self {
        Self { store, client, server_url }
    }

    /// Load the persisted app id, registering a fresh one with the server
    /// if none is stored yet. On any HTTP failure a local fallback id is
    /// synthesized so sync operations can still run locally (the server
    /// will reject them, which is acceptable).
    pub async fn load_or_register(&self, now_ms: i64) -> Result<String, PredictError> {
        if let Some(bytes) = self.store.kv_get(APP_ID_KEY).await? {
            return String::from_utf8(bytes)
                .map_err(|e| PredictError::storage(format!("corrupt app id: {e}")));
        }

        let app_id = match self.register_remote().await {
            Ok(app_id) => app_id,
            Err(err) => {
                tracing::warn!(error = %err, "app registration failed, using local fallback id");
                format!("fallback-{now_ms}")
            }
        };

        self.store.kv_set(APP_ID_KEY, app_id.clone().into_bytes()).await?;
        Ok(app_id)
    }

    async fn register_remote(&self) -> Result<String, PredictError> {
        #[derive(serde::Deserialize)]
        struct RegisterResponse {
            #[serde(rename = "appId")]
            app_id: String,
        }

        let response = self
            .client
            .post(format!("{}/register-app", self.server_url))
            .header("Content-Type", "application/json")
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| PredictError::network(format!("register-app request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PredictError::network(format!(
                "register-app returned status {}",
                response.status()
            )));
        }

        let parsed: RegisterResponse = response
            .json()
            .await
            .map_err(|e| PredictError::network(format!("register-app response malformed: {e}")))?;
        Ok(parsed.app_id)
    }
}
