//! Tunables for the prediction engine.

use predict_core::EngineConfig;

/// The subset of [`EngineConfig`] the prediction engine needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelConfig {
    /// Bounded size of `UserHistory`. Default 100.
    pub history_length: usize,
    /// `λ` in the exponential decay term, per millisecond. Default 5e-4.
    pub decay_lambda: f64,
    /// Laplace smoothing factor `α`. Default 0.1.
    pub smoothing_factor: f64,
    /// Sequence-distribution weight `w_seq`. Default 0.7.
    pub weight_sequence: f64,
    /// Time-distribution weight `w_time`. Default 0.3.
    pub weight_time: f64,
    /// `maxLen` for the transition matrix. Default 5.
    pub max_pattern_length: u8,
    /// Minimum local history before a cold-start global-model fetch is skipped. Default 50.
    pub min_actions_threshold: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            history_length: 100,
            decay_lambda: 5e-4,
            smoothing_factor: 0.1,
            weight_sequence: 0.7,
            weight_time: 0.3,
            max_pattern_length: 5,
            min_actions_threshold: 50,
        }
    }
}

impl From<&EngineConfig> for ModelConfig {
    fn from(config: &EngineConfig) -> Self {
        Self {
            history_length: config.history_length,
            decay_lambda: config.decay_lambda,
            smoothing_factor: config.smoothing_factor,
            weight_sequence: config.weight_sequence,
            weight_time: config.weight_time,
            max_pattern_length: config.max_pattern_length,
            min_actions_threshold: config.min_actions_threshold,
        }
    }
}
