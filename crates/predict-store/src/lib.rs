//! Durable, encrypted interaction log over an embedded `redb` database, with
//! a save-notification bus and a key-value side table shared with the
//! deterministic-IV map and the registered app id.

pub mod iv_bridge;
pub mod schema;
pub mod store;

pub use iv_bridge::StoreIvMapPersistence;
pub use schema::PersistedInteraction;
pub use store::InteractionStore;
