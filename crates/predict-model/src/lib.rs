//! Variable-order Markov sequence model fused with a time-of-day
//! distribution, with exponential decay and Laplace smoothing.

pub mod config;
pub mod engine;

pub use config::ModelConfig;
pub use engine::{hour_of_day, PredictionEngine};
