//! Remote sync: app registration, the daily anonymized-data upload, and the
//! cold-start global model fetch.

pub mod global_model;
pub mod registrar;
pub mod scheduler;
pub mod upload;

pub use global_model::GlobalModel;
pub use registrar::AppRegistrar;
pub use scheduler::{HistorySource, RemoteSync};
