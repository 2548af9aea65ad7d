//! Bridges the durable key-value table to [`predict_crypto::IvMapPersistence`],
//! letting `CryptoService` persist the deterministic-IV map without the
//! crypto crate depending on the store crate directly.

use crate::store::InteractionStore;
use async_trait::async_trait;
use predict_core::PredictError;
use predict_crypto::IvMapPersistence;
use std::collections::BTreeMap;
use std::sync::Arc;

const IV_MAP_KEY: &str = "ivMap";

/// Thin wrapper handed to `CryptoService::new` so it can load/save the
/// deterministic-IV map through the same database as everything else.
pub struct StoreIvMapPersistence {
    store: Arc<InteractionStore>,
}

impl StoreIvMapPersistence {
    pub fn new(store: Arc<InteractionStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl IvMapPersistence for StoreIvMapPersistence {
    async fn load_iv_map(&self) -> Result<BTreeMap<String, String>, PredictError> {
        match self.store.kv_get(IV_MAP_KEY).await? {
            Some(bytes) => {
                let pairs: Vec<(String, String)> = serde_json::from_slice(&bytes)
                    .map_err(|e| PredictError::storage(format!("corrupt iv map: {e}")))?;
                Ok(pairs.into_iter().collect())
            }
            None => Ok(BTreeMap::new()),
        }
    }

    async fn save_iv_map(&self, map: &BTreeMap<String, String>) -> Result<(), PredictError> {
        let pairs: Vec<(&String, &String)> = map.iter().collect();
        let bytes = serde_json::to_vec(&pairs)
            .map_err(|e| PredictError::storage(format!("failed to encode iv map: {e}")))?;
        self.store.kv_set(IV_MAP_KEY, bytes).await
    }
}
