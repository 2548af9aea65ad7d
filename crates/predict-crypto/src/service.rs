//! The crypto service itself.

use crate::iv_map::IvMapPersistence;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine as _;
use predict_core::PredictError;
use rand::RngCore;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::Mutex;

const IV_LEN: usize = 12;
const B64: base64::engine::general_purpose::GeneralPurpose = base64::engine::general_purpose::STANDARD;

/// AES-256-GCM encryption with two modes: fresh random IVs for confidential
/// at-rest fields, and a persisted deterministic IV per plaintext for fields
/// that must be joinable by the remote aggregator.
pub struct CryptoService {
    cipher: Aes256Gcm,
    iv_map: Mutex<BTreeMap<String, String>>,
    persistence: Arc<dyn IvMapPersistence>,
}

impl CryptoService {
    /// Build the service from a raw 32-byte key and load any persisted
    /// deterministic IVs. That only happens at the construction
    /// layer (key parsing); this constructor assumes a well-formed key.
    pub async fn new(key: [u8; 32], persistence: Arc<dyn IvMapPersistence>) -> Result<Self, PredictError> {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key));
        let iv_map = persistence.load_iv_map().await?;
        Ok(Self {
            cipher,
            iv_map: Mutex::new(iv_map),
            persistence,
        })
    }

    /// Draw a fresh 12-byte IV from a cryptographically secure RNG. The one
    /// place in the service randomness is actually generated.
    fn fresh_iv() -> [u8; IV_LEN] {
        let mut iv = [0u8; IV_LEN];
        rand::rngs::OsRng.fill_bytes(&mut iv);
        iv
    }

    /// Encrypt with a fresh random IV. Output is base64 ciphertext + base64 IV.
    pub fn encrypt(&self, plaintext: &str) -> Result<(String, String), PredictError> {
        let iv = Self::fresh_iv();
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
            .map_err(|_| PredictError::crypto("AES-GCM encryption failed"))?;
        Ok((B64.encode(ciphertext), B64.encode(iv)))
    }

    /// Encrypt `plaintext` with a per-plaintext IV that is stable across
    /// calls and across process restarts, once persisted. This is the
    /// joinability primitive for server-side aggregation.
    pub async fn encrypt_deterministic(&self, plaintext: &str) -> Result<(String, String), PredictError> {
        let iv_b64 = {
            let mut map = self.iv_map.lock().await;
            match map.get(plaintext) {
                Some(existing) => existing.clone(),
                None => {
                    let iv = Self::fresh_iv();
                    let iv_b64 = B64.encode(iv);
                    map.insert(plaintext.to_string(), iv_b64.clone());
                    self.persistence.save_iv_map(&map).await?;
                    iv_b64
                }
            }
        };
        let iv = B64
            .decode(&iv_b64)
            .map_err(|e| PredictError::crypto(format!("corrupt stored IV: {e}")))?;
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
            .map_err(|_| PredictError::crypto("AES-GCM encryption failed"))?;
        Ok((B64.encode(ciphertext), iv_b64))
    }

    /// Decrypt a ciphertext/IV pair produced by either [`Self::encrypt`] or
    /// [`Self::encrypt_deterministic`]. Fails with [`PredictError::Crypto`]
    /// on tag mismatch.
    pub fn decrypt(&self, ciphertext_b64: &str, iv_b64: &str) -> Result<String, PredictError> {
        let ciphertext = B64
            .decode(ciphertext_b64)
            .map_err(|e| PredictError::crypto(format!("invalid base64 ciphertext: {e}")))?;
        let iv = B64
            .decode(iv_b64)
            .map_err(|e| PredictError::crypto(format!("invalid base64 IV: {e}")))?;
        if iv.len() != IV_LEN {
            return Err(PredictError::crypto("IV must be 12 bytes"));
        }
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&iv), ciphertext.as_slice())
            .map_err(|_| PredictError::crypto("AES-GCM decryption failed (tag mismatch)"))?;
        String::from_utf8(plaintext).map_err(|e| PredictError::crypto(format!("decrypted bytes are not UTF-8: {e}")))
    }
}
