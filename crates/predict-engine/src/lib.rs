//! Public facade for the predictive preloading engine: wires the
//! interaction tracker, encrypted store, component registry, prediction
//! model, preload cache, and remote sync into the small operation set
//! applications call directly.

pub mod engine;
pub mod tracing_init;

pub use engine::Engine;
pub use predict_core::{ComponentDescriptor, EngineConfig, InteractionRecord, PredictError, Prediction};
pub use predict_preload::{AssetFetcher, NoopFetcher};
pub use tracing_init::init_tracing;
