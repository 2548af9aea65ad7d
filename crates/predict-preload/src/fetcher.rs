//! The pluggable fetch seam. Network fetching of component resources is an
//! application concern; the core only guarantees idempotent dispatch.

use async_trait::async_trait;
use predict_core::{ComponentDescriptor, PredictError};

/// Fetches and caches a component's asset. Implemented by the application
/// embedding the engine (a bundler-aware loader, an HTTP client, a
/// service-worker bridge); `predict-preload` only calls it at most once per
/// component per session.
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    /// Fetch and place `component`'s asset into whatever session-level cache
    /// backs the implementation. Errors are logged by the caller and treated
    /// as non-fatal.
    async fn fetch(&self, component: &ComponentDescriptor) -> Result<(), PredictError>;
}

/// An [`AssetFetcher`] that does nothing, for embedders that only want
/// prediction without an actual resource-loading side effect, and for tests.
#[derive(Debug, Default)]
pub struct NoopFetcher;

#[async_trait]
impl AssetFetcher for NoopFetcher {
    async fn fetch(&self, _component: &ComponentDescriptor) -> Result<(), PredictError> {
        Ok(())
    }
}
