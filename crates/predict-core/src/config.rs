//! Configuration loading.
//!
//! Layered the way `aura_core::config::loader` layers `ConfigSource`s, but
//! collapsed to the two layers this engine actually needs: defaults, then an
//! optional TOML file.

use crate::error::PredictError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// All recognized configuration options and their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base URL of the remote aggregator, e.g. `https://predict.example.com`.
    /// `None` disables C6 entirely.
    pub server_url: Option<String>,
    /// Bounded size of `UserHistory`.
    pub history_length: usize,
    /// `λ` in the exponential decay term, per millisecond.
    pub decay_lambda: f64,
    /// Laplace smoothing factor `α`.
    pub smoothing_factor: f64,
    /// Sequence-distribution weight `w_seq`.
    pub weight_sequence: f64,
    /// Time-distribution weight `w_time`.
    pub weight_time: f64,
    /// `maxLen` for the transition matrix.
    pub max_pattern_length: u8,
    /// Minimum local history before skipping the global-model fetch.
    pub min_actions_threshold: usize,
    /// Path to the `redb` database file backing the interaction store.
    pub store_path: PathBuf,
    /// Name of the environment variable holding the 64-hex-char encryption key.
    pub encryption_key_env: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            server_url: None,
            history_length: 100,
            decay_lambda: 5e-4,
            smoothing_factor: 0.1,
            weight_sequence: 0.7,
            weight_time: 0.3,
            max_pattern_length: 5,
            min_actions_threshold: 50,
            store_path: PathBuf::from("predict-engine.redb"),
            encryption_key_env: "ENCRYPTION_KEY".to_string(),
        }
    }
}

impl EngineConfig {
    /// Load configuration starting from [`EngineConfig::default`], then
    /// overlaying a TOML file if `path` exists. A missing file is not an
    /// error — defaults stand alone for an embedded library.
    pub fn load(path: &Path) -> Result<Self, PredictError> {
        let mut config = Self::default();
        if path.exists() {
            let contents = std::fs::read_to_string(path).map_err(|e| {
                PredictError::configuration(format!(
                    "failed to read config file {}: {e}",
                    path.display()
                ))
            })?;
            config = toml::from_str(&contents).map_err(|e| {
                PredictError::configuration(format!(
                    "failed to parse config file {}: {e}",
                    path.display()
                ))
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would violate an invariant ("weights
    /// need not be normalized; scores remain monotone", but they must be
    /// non-negative).
    pub fn validate(&self) -> Result<(), PredictError> {
        if self.weight_sequence < 0.0 || self.weight_time < 0.0 {
            return Err(PredictError::configuration(
                "weight_sequence and weight_time must be non-negative",
            ));
        }
        if self.max_pattern_length == 0 {
            return Err(PredictError::configuration(
                "max_pattern_length must be at least 1",
            ));
        }
        if self.history_length == 0 {
            return Err(PredictError::configuration(
                "history_length must be at least 1",
            ));
        }
        Ok(())
    }

    /// Read the 64-hex-char encryption key named by [`Self::encryption_key_env`].
    /// Fails fast with [`PredictError::Configuration`] if the key is absent or
    /// ill-formed.
    pub fn encryption_key(&self) -> Result<[u8; 32], PredictError> {
        let raw = std::env::var(&self.encryption_key_env).map_err(|_| {
            PredictError::configuration(format!(
                "{} is not set",
                self.encryption_key_env
            ))
        })?;
        parse_hex_key(&raw)
    }
}

/// Parse a 64-character hex string into a 32-byte AES-256 key.
pub fn parse_hex_key(raw: &str) -> Result<[u8; 32], PredictError> {
    if raw.len() != 64 {
        return Err(PredictError::configuration(format!(
            "encryption key must be 64 hex characters, got {}",
            raw.len()
        )));
    }
    let bytes = hex::decode(raw)
        .map_err(|e| PredictError::configuration(format!("encryption key is not valid hex: {e}")))?;
    let mut key = [0u8; 32];
    key.copy_from_slice(&bytes);
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        EngineConfig::default().validate().unwrap();
    }

    #[test]
    fn negative_weight_rejected() {
        let mut config = EngineConfig::default();
        config.weight_sequence = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_valid_hex_key() {
        let hex = "a".repeat(64);
        let key = parse_hex_key(&hex).unwrap();
        assert_eq!(key.len(), 32);
    }

    #[test]
    fn rejects_short_key() {
        assert!(parse_hex_key("abcd").is_err());
    }

    #[test]
    fn rejects_non_hex_key() {
        let bad = "z".repeat(64);
        assert!(parse_hex_key(&bad).is_err());
    }
}
