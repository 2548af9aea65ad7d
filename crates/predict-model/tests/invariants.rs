//! Property tests for the core invariants: the global counter sums to
//! the number of updates, and history length is bounded.

use predict_model::{ModelConfig, PredictionEngine};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn counters_and_history_bound_hold(
        actions in prop::collection::vec("[A-C]", 0..200),
        history_length in 1usize..20,
    ) {
        let mut config = ModelConfig::default();
        config.history_length = history_length;
        let engine = PredictionEngine::new(config);

        for (i, action) in actions.iter().enumerate() {
            engine.update(action, i as i64);
        }

        prop_assert_eq!(engine.history_len(), actions.len().min(history_length));

        let counts = engine.history_counts();
        let sum: u64 = counts.values().sum();
        prop_assert_eq!(sum as usize, actions.len().min(history_length));
    }

    #[test]
    fn predict_is_deterministic_for_fixed_state(
        actions in prop::collection::vec("[A-C]", 0..50),
        now_ms in 0i64..1_000_000,
    ) {
        let engine = PredictionEngine::new(ModelConfig::default());
        for (i, action) in actions.iter().enumerate() {
            engine.update(action, i as i64);
        }
        prop_assert_eq!(engine.predict_action(now_ms), engine.predict_action(now_ms));
    }
}
