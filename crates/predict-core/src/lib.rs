//! Shared types, error enum, and configuration loading for the predict engine.
//!
//! Every other crate in the workspace depends on this one for
//! [`error::PredictError`] and the data model types.

pub mod config;
pub mod error;
pub mod types;

pub use config::EngineConfig;
pub use error::{PredictError, Result};
pub use types::{
    ComponentDescriptor, GlobalActionCounter, InteractionData, InteractionRecord, Prediction,
    TimePatterns, TransitionMatrix,
};
