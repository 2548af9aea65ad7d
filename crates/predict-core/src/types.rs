//! Data model shared across the predict engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single user interaction, as handed to and returned from the interaction
/// store. Plaintext — the store is responsible for at-rest encryption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Component resolved for this action at save time.
    pub component_id: String,
    /// Application-defined action type, e.g. `"click-login"`.
    pub action_type: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

/// A bounded, order-preserving in-memory item used by the prediction engine.
/// Carries only what C4 needs — the decrypted action type and its timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionData {
    /// Action type for this step of history.
    pub action_type: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

impl From<&InteractionRecord> for InteractionData {
    fn from(record: &InteractionRecord) -> Self {
        Self {
            action_type: record.action_type.clone(),
            timestamp_ms: record.timestamp_ms,
        }
    }
}

/// In-memory descriptor for a preloadable UI component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    /// Unique id across the registry.
    pub id: String,
    /// Application-defined component kind, e.g. `"page"`.
    pub kind: String,
    /// Free-form metadata the application attaches to the component.
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// The result of a prediction query.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Prediction {
    /// Predicted next action type, if any.
    pub action: Option<String>,
    /// Component the predicted action resolves to, if the binding exists.
    pub component_id: Option<String>,
}

impl Prediction {
    /// The `{none, none}` prediction.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether this prediction carries an action to preload.
    pub fn is_some(&self) -> bool {
        self.action.is_some()
    }
}

/// Per-action hour-of-day histogram, `action -> (hour -> count)`.
pub type TimePatterns = BTreeMap<String, BTreeMap<u8, u64>>;

/// `action -> count`, monotonic over the session.
pub type GlobalActionCounter = BTreeMap<String, u64>;

/// `length L -> pattern string -> action -> count`.
pub type TransitionMatrix = BTreeMap<u8, BTreeMap<String, BTreeMap<String, u64>>>;
