//! The interaction store itself.

use crate::schema::{PersistedInteraction, INTERACTIONS, KV, META};
use parking_lot::Mutex as SyncMutex;
use predict_core::{InteractionRecord, PredictError};
use predict_crypto::CryptoService;
use redb::{Database, ReadableTable};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

type SaveListener = Box<dyn Fn(&InteractionRecord) + Send + Sync>;

/// Durable, append-only, encrypted-at-rest interaction log fronting a save
/// notification bus that drives C4's incremental updates.
///
/// The store takes a [`CryptoService`] per call rather than owning one: the
/// deterministic-IV map crypto needs to persist lives in this store's own
/// key-value table, so a constructor-owned crypto service would make
/// `InteractionStore::open` and `CryptoService::new` depend on each other's
/// output. Passing it in at each call keeps the dependency one-directional.
pub struct InteractionStore {
    db: Arc<Database>,
    subscribers: SyncMutex<Vec<SaveListener>>,
    // Serializes the save critical section (encrypt -> open txn -> commit ->
    // notify) across concurrent callers.
    save_lock: AsyncMutex<()>,
}

impl InteractionStore {
    /// Open (creating if absent) the `redb` database at `path`.
    pub async fn open(path: &Path) -> Result<Self, PredictError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| PredictError::storage(format!("failed to create store directory: {e}")))?;
            }
        }
        let path = path.to_path_buf();
        let db = tokio::task::spawn_blocking(move || -> Result<Database, PredictError> {
            let db = Database::create(&path)
                .map_err(|e| PredictError::storage(format!("failed to open interaction store: {e}")))?;
            let write_txn = db
                .begin_write()
                .map_err(|e| PredictError::storage(format!("failed to begin init transaction: {e}")))?;
            {
                write_txn
                    .open_table(INTERACTIONS)
                    .map_err(|e| PredictError::storage(e.to_string()))?;
                write_txn
                    .open_table(META)
                    .map_err(|e| PredictError::storage(e.to_string()))?;
                write_txn
                    .open_table(KV)
                    .map_err(|e| PredictError::storage(e.to_string()))?;
            }
            write_txn
                .commit()
                .map_err(|e| PredictError::storage(format!("failed to init store tables: {e}")))?;
            Ok(db)
        })
        .await
        .map_err(|e| PredictError::storage(format!("store init task panicked: {e}")))??;

        Ok(Self {
            db: Arc::new(db),
            subscribers: SyncMutex::new(Vec::new()),
            save_lock: AsyncMutex::new(()),
        })
    }

    /// Encrypt both fields (random IV each), append the row, commit, then
    /// notify subscribers with the plaintext record. Notification only
    /// happens after a successful commit.
    pub async fn save(&self, crypto: &CryptoService, record: InteractionRecord) -> Result<(), PredictError> {
        let _guard = self.save_lock.lock().await;

        let (action_type_ct, action_type_iv) = crypto.encrypt(&record.action_type)?;
        let (component_id_ct, component_id_iv) = crypto.encrypt(&record.component_id)?;
        let persisted = PersistedInteraction {
            action_type_ct,
            action_type_iv,
            component_id_ct,
            component_id_iv,
            timestamp_ms: record.timestamp_ms,
        };
        let bytes = bincode::serialize(&persisted)
            .map_err(|e| PredictError::storage(format!("failed to encode interaction row: {e}")))?;

        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || -> Result<(), PredictError> {
            let write_txn = db
                .begin_write()
                .map_err(|e| PredictError::storage(format!("failed to begin save transaction: {e}")))?;
            {
                let next_id = {
                    let meta = write_txn.open_table(META).map_err(|e| PredictError::storage(e.to_string()))?;
                    meta.get("next_id")
                        .map_err(|e| PredictError::storage(e.to_string()))?
                        .map(|v| v.value())
                        .unwrap_or(0)
                };
                let mut interactions = write_txn
                    .open_table(INTERACTIONS)
                    .map_err(|e| PredictError::storage(e.to_string()))?;
                interactions
                    .insert(next_id, bytes.as_slice())
                    .map_err(|e| PredictError::storage(e.to_string()))?;
                let mut meta = write_txn.open_table(META).map_err(|e| PredictError::storage(e.to_string()))?;
                meta.insert("next_id", next_id + 1)
                    .map_err(|e| PredictError::storage(e.to_string()))?;
            }
            write_txn
                .commit()
                .map_err(|e| PredictError::storage(format!("failed to commit save transaction: {e}")))?;
            Ok(())
        })
        .await
        .map_err(|e| PredictError::storage(format!("save task panicked: {e}")))??;

        for listener in self.subscribers.lock().iter() {
            listener(&record);
        }
        Ok(())
    }

    /// All records, decrypted, ordered by insertion.
    pub async fn list(&self, crypto: &CryptoService) -> Result<Vec<InteractionRecord>, PredictError> {
        let db = Arc::clone(&self.db);
        let rows = tokio::task::spawn_blocking(move || -> Result<Vec<PersistedInteraction>, PredictError> {
            let read_txn = db.begin_read().map_err(|e| PredictError::storage(e.to_string()))?;
            let table = read_txn
                .open_table(INTERACTIONS)
                .map_err(|e| PredictError::storage(e.to_string()))?;
            let mut rows = Vec::new();
            for entry in table.iter().map_err(|e| PredictError::storage(e.to_string()))? {
                let (_, value) = entry.map_err(|e| PredictError::storage(e.to_string()))?;
                let persisted: PersistedInteraction = bincode::deserialize(value.value())
                    .map_err(|e| PredictError::storage(format!("corrupt interaction row: {e}")))?;
                rows.push(persisted);
            }
            Ok(rows)
        })
        .await
        .map_err(|e| PredictError::storage(format!("list task panicked: {e}")))??;

        rows.into_iter().map(|row| decrypt_row(crypto, row)).collect()
    }

    /// Scan-and-decrypt lookup by component id (the secondary
    /// index on encrypted `componentId` is unusable for equality lookup
    /// under random IVs, so this is a linear scan by design — see DESIGN.md).
    pub async fn lookup_by_component(
        &self,
        crypto: &CryptoService,
        component_id: &str,
    ) -> Result<Option<InteractionRecord>, PredictError> {
        for record in self.list(crypto).await? {
            if record.component_id == component_id {
                return Ok(Some(record));
            }
        }
        Ok(None)
    }

    /// Drop all records and reset the auto-increment counter.
    pub async fn clear(&self) -> Result<(), PredictError> {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || -> Result<(), PredictError> {
            let write_txn = db
                .begin_write()
                .map_err(|e| PredictError::storage(format!("failed to begin clear transaction: {e}")))?;
            {
                write_txn
                    .delete_table(INTERACTIONS)
                    .map_err(|e| PredictError::storage(e.to_string()))?;
                write_txn
                    .open_table(INTERACTIONS)
                    .map_err(|e| PredictError::storage(e.to_string()))?;
                let mut meta = write_txn.open_table(META).map_err(|e| PredictError::storage(e.to_string()))?;
                meta.insert("next_id", 0u64).map_err(|e| PredictError::storage(e.to_string()))?;
            }
            write_txn
                .commit()
                .map_err(|e| PredictError::storage(format!("failed to commit clear transaction: {e}")))?;
            Ok(())
        })
        .await
        .map_err(|e| PredictError::storage(format!("clear task panicked: {e}")))?
    }

    /// Append a save listener, invoked in registration order.
    pub fn subscribe(&self, listener: impl Fn(&InteractionRecord) + Send + Sync + 'static) {
        self.subscribers.lock().push(Box::new(listener));
    }

    /// Read a raw value from the generic key-value side table.
    pub async fn kv_get(&self, key: &str) -> Result<Option<Vec<u8>>, PredictError> {
        let db = Arc::clone(&self.db);
        let key = key.to_string();
        tokio::task::spawn_blocking(move || -> Result<Option<Vec<u8>>, PredictError> {
            let read_txn = db.begin_read().map_err(|e| PredictError::storage(e.to_string()))?;
            let table = read_txn.open_table(KV).map_err(|e| PredictError::storage(e.to_string()))?;
            Ok(table
                .get(key.as_str())
                .map_err(|e| PredictError::storage(e.to_string()))?
                .map(|guard| guard.value().to_vec()))
        })
        .await
        .map_err(|e| PredictError::storage(format!("kv_get task panicked: {e}")))?
    }

    /// Write a raw value into the generic key-value side table.
    pub async fn kv_set(&self, key: &str, value: Vec<u8>) -> Result<(), PredictError> {
        let db = Arc::clone(&self.db);
        let key = key.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), PredictError> {
            let write_txn = db
                .begin_write()
                .map_err(|e| PredictError::storage(format!("failed to begin kv_set transaction: {e}")))?;
            {
                let mut table = write_txn.open_table(KV).map_err(|e| PredictError::storage(e.to_string()))?;
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(|e| PredictError::storage(e.to_string()))?;
            }
            write_txn
                .commit()
                .map_err(|e| PredictError::storage(format!("failed to commit kv_set transaction: {e}")))?;
            Ok(())
        })
        .await
        .map_err(|e| PredictError::storage(format!("kv_set task panicked: {e}")))?
    }
}

fn decrypt_row(crypto: &CryptoService, row: PersistedInteraction) -> Result<InteractionRecord, PredictError> {
    let action_type = crypto.decrypt(&row.action_type_ct, &row.action_type_iv)?;
    let component_id = crypto.decrypt(&row.component_id_ct, &row.component_id_iv)?;
    Ok(InteractionRecord {
        component_id,
        action_type,
        timestamp_ms: row.timestamp_ms,
    })
}
