//! `redb` table layout for the interaction store.

use redb::TableDefinition;

/// Auto-increment id → bincode-encoded [`PersistedInteraction`].
pub const INTERACTIONS: TableDefinition<u64, &[u8]> = TableDefinition::new("interactions");

/// Single-row metadata table; currently only holds `"next_id"`.
pub const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

/// Generic key-value side table backing `prediction_model_app_id` and `ivMap`.
pub const KV: TableDefinition<&str, &[u8]> = TableDefinition::new("kv");

/// The on-disk shape of one interaction row: both sensitive fields carry
/// their own ciphertext and IV ("persisted form additionally carries
/// per-field IVs").
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PersistedInteraction {
    pub action_type_ct: String,
    pub action_type_iv: String,
    pub component_id_ct: String,
    pub component_id_iv: String,
    pub timestamp_ms: i64,
}
