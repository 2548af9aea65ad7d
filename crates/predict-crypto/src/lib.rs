//! AES-256-GCM crypto service for the predict engine.

pub mod iv_map;
pub mod service;

pub use iv_map::{InMemoryIvMapPersistence, IvMapPersistence};
pub use service::CryptoService;
