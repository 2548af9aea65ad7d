//! Unified error type for the predict engine.

use thiserror::Error;

/// Unified error type shared by every predict engine component.
///
/// Configuration errors are fatal at
/// startup, crypto/storage failures surface to the caller, network failures
/// are logged and never fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PredictError {
    /// Missing or malformed key, or an unreachable persistent store, at startup.
    #[error("configuration error: {message}")]
    Configuration {
        /// What was missing or malformed.
        message: String,
    },

    /// AES-GCM tag mismatch or key import failure.
    #[error("crypto failure: {message}")]
    Crypto {
        /// Description of the cryptographic failure.
        message: String,
    },

    /// Transaction open/commit error in the interaction store.
    #[error("storage failure: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
    },

    /// Remote sync error (registration, upload, global model fetch).
    #[error("network failure: {message}")]
    Network {
        /// Description of the network failure.
        message: String,
    },

    /// Unexpected response shape from the remote aggregator.
    #[error("protocol mismatch: {message}")]
    ProtocolMismatch {
        /// Description of the mismatch.
        message: String,
    },
}

impl PredictError {
    /// Build a [`PredictError::Configuration`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Build a [`PredictError::Crypto`].
    pub fn crypto(message: impl Into<String>) -> Self {
        Self::Crypto {
            message: message.into(),
        }
    }

    /// Build a [`PredictError::Storage`].
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Build a [`PredictError::Network`].
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Build a [`PredictError::ProtocolMismatch`]. Treated as [`PredictError::Network`]
    /// by callers that only distinguish fatal-vs-not.
    pub fn protocol_mismatch(message: impl Into<String>) -> Self {
        Self::ProtocolMismatch {
            message: message.into(),
        }
    }

    /// True for kinds that must never abort an already-running engine once it has started.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Configuration { .. })
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, PredictError>;
