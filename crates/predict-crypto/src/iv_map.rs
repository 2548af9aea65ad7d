//! Persistence seam for the deterministic-IV map (plaintext action name →
//! base64-encoded IV), implemented by [`IvMapPersistence`] below.
//!
//! `predict-crypto` has no opinion on *where* the map lives — `predict-store`
//! owns the durable key-value table under the `ivMap` key and implements
//! this trait over it. Keeping the dependency pointed this direction (crypto
//! has no dependency on store) avoids the cycle a naive "store owns crypto,
//! crypto owns store" split would create.

use async_trait::async_trait;
use predict_core::PredictError;
use std::collections::BTreeMap;

/// Durable backing store for the plaintext-action → base64(IV) map.
#[async_trait]
pub trait IvMapPersistence: Send + Sync {
    /// Load the full map at startup. An empty map is a valid "fresh install" result.
    async fn load_iv_map(&self) -> Result<BTreeMap<String, String>, PredictError>;

    /// Persist the full map. Must complete before the ciphertext derived
    /// from a newly inserted IV is returned to the caller.
    async fn save_iv_map(&self, map: &BTreeMap<String, String>) -> Result<(), PredictError>;
}

/// An [`IvMapPersistence`] that never persists, for tests and callers that
/// only need deterministic ciphertexts within a single process lifetime.
#[derive(Debug, Default)]
pub struct InMemoryIvMapPersistence;

#[async_trait]
impl IvMapPersistence for InMemoryIvMapPersistence {
    async fn load_iv_map(&self) -> Result<BTreeMap<String, String>, PredictError> {
        Ok(BTreeMap::new())
    }

    async fn save_iv_map(&self, _map: &BTreeMap<String, String>) -> Result<(), PredictError> {
        Ok(())
    }
}
