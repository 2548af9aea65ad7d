//! The prediction engine itself.

use crate::config::ModelConfig;
use parking_lot::Mutex;
use predict_core::types::{GlobalActionCounter, TimePatterns, TransitionMatrix};
use predict_core::InteractionData;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use time::OffsetDateTime;

/// A fractional next-action distribution, keyed by action type.
type Distribution = BTreeMap<String, f64>;

/// Ties closer than this are considered equal for the stable tie-break.
const TIE_EPSILON: f64 = 1e-6;

/// Maintains bounded user history, variable-order transition counts, global
/// action counts, and per-action hour-of-day counts; computes a next-action
/// distribution on demand.
///
/// Update and query are serialized behind one lock: the query path
/// must never observe a half-applied update.
pub struct PredictionEngine {
    config: ModelConfig,
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    history: VecDeque<InteractionData>,
    transitions: TransitionMatrix,
    global_counts: GlobalActionCounter,
    time_patterns: TimePatterns,
}

impl PredictionEngine {
    /// Create an empty engine with the given tunables.
    pub fn new(config: ModelConfig) -> Self {
        Self {
            config,
            state: Mutex::new(State::default()),
        }
    }

    /// The configuration this engine was built with.
    pub fn config(&self) -> ModelConfig {
        self.config
    }

    /// Apply one observed interaction. `history` is read *before*
    /// the new item is appended — the transition is *from* the prior window
    /// *to* the new action (step 3 must run before step 4).
    pub fn update(&self, action: &str, timestamp_ms: i64) {
        let hour = hour_of_day(timestamp_ms);
        let mut state = self.state.lock();

        *state
            .time_patterns
            .entry(action.to_string())
            .or_default()
            .entry(hour)
            .or_insert(0) += 1;

        *state.global_counts.entry(action.to_string()).or_insert(0) += 1;

        let max_l = self.config.max_pattern_length.min(state.history.len() as u8);
        for l in 1..=max_l {
            let pattern = join_last_n(&state.history, l as usize);
            *state
                .transitions
                .entry(l)
                .or_default()
                .entry(pattern)
                .or_default()
                .entry(action.to_string())
                .or_insert(0) += 1;
        }

        state.history.push_back(InteractionData {
            action_type: action.to_string(),
            timestamp_ms,
        });
        while state.history.len() > self.config.history_length {
            state.history.pop_front();
        }
    }

    /// Compute the next-action distribution and return the single best
    /// action, or `None` if there's no signal at all.
    pub fn predict_action(&self, now_ms: i64) -> Option<String> {
        let state = self.state.lock();
        if state.history.is_empty() && state.global_counts.is_empty() {
            return None;
        }

        let p_seq = sequence_distribution(&state.history, &state.transitions, &self.config, now_ms);
        let p_time = time_distribution(&state.time_patterns, now_ms);

        let mut candidates: BTreeSet<&str> = BTreeSet::new();
        candidates.extend(p_seq.keys().map(String::as_str));
        candidates.extend(p_time.keys().map(String::as_str));

        let scored = candidates.into_iter().map(|action| {
            let score = self.config.weight_sequence * p_seq.get(action).copied().unwrap_or(0.0)
                + self.config.weight_time * p_time.get(action).copied().unwrap_or(0.0);
            (action, score)
        });

        if let Some(action) = argmax_stable(scored) {
            return Some(action.to_string());
        }

        // Fall back to the global action counter.
        argmax_stable(state.global_counts.iter().map(|(k, v)| (k.as_str(), *v as f64))).map(|a| a.to_string())
    }

    /// Snapshot of `{action -> count}` over the currently retained history,
    /// used by C6's daily upload.
    pub fn history_counts(&self) -> GlobalActionCounter {
        let state = self.state.lock();
        let mut counts = GlobalActionCounter::new();
        for item in &state.history {
            *counts.entry(item.action_type.clone()).or_insert(0) += 1;
        }
        counts
    }

    /// Current history length.
    pub fn history_len(&self) -> usize {
        self.state.lock().history.len()
    }

    /// Whether the transition matrix has ever been populated.
    pub fn has_transitions(&self) -> bool {
        !self.state.lock().transitions.is_empty()
    }

    /// Whether the global-model fetch should be skipped: local history
    /// meets the threshold *and* the transition matrix is non-empty.
    pub fn should_skip_global_fetch(&self) -> bool {
        self.history_len() >= self.config.min_actions_threshold && self.has_transitions()
    }

    /// Install a server-supplied global model wholesale, overriding local
    /// empties. The transition matrix is never seeded from the
    /// server.
    pub fn install_global_model(&self, global_counts: GlobalActionCounter, time_patterns: TimePatterns) {
        let mut state = self.state.lock();
        state.global_counts = global_counts;
        state.time_patterns = time_patterns;
    }
}

/// Hour-of-day (UTC, 0..23) for a millisecond timestamp.
pub fn hour_of_day(timestamp_ms: i64) -> u8 {
    OffsetDateTime::from_unix_timestamp(timestamp_ms.div_euclid(1000))
        .map(|dt| dt.hour())
        .unwrap_or(0)
}

fn join_last_n(history: &VecDeque<InteractionData>, n: usize) -> String {
    let skip = history.len() - n;
    history
        .iter()
        .skip(skip)
        .map(|item| item.action_type.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

fn sequence_distribution(
    history: &VecDeque<InteractionData>,
    transitions: &TransitionMatrix,
    config: &ModelConfig,
    now_ms: i64,
) -> Distribution {
    let mut accumulated: Distribution = BTreeMap::new();
    let max_l = config.max_pattern_length.min(history.len() as u8);

    for l in 1..=max_l {
        let pattern = join_last_n(history, l as usize);
        let Some(row) = transitions.get(&l).and_then(|rows| rows.get(&pattern)) else {
            continue;
        };
        let total: u64 = row.values().sum();
        if total == 0 {
            continue;
        }
        let row_len = row.len() as f64;
        // H[|H|-L] — the timestamp of the item that starts the L-window.
        let window_start = &history[history.len() - l as usize];
        let delta_t = (now_ms - window_start.timestamp_ms).max(0) as f64;
        let decay = (-config.decay_lambda * delta_t).exp();

        for (action, &count) in row {
            let smoothed =
                (count as f64 + config.smoothing_factor) / (total as f64 + config.smoothing_factor * row_len);
            *accumulated.entry(action.clone()).or_insert(0.0) += smoothed * decay;
        }
    }

    let sum: f64 = accumulated.values().sum();
    if sum > 0.0 {
        for value in accumulated.values_mut() {
            *value /= sum;
        }
    }
    accumulated
}

fn time_distribution(time_patterns: &TimePatterns, now_ms: i64) -> Distribution {
    let hour = hour_of_day(now_ms);
    let total: u64 = time_patterns
        .values()
        .filter_map(|by_hour| by_hour.get(&hour))
        .sum();
    if total == 0 {
        return Distribution::new();
    }
    time_patterns
        .iter()
        .filter_map(|(action, by_hour)| {
            by_hour
                .get(&hour)
                .map(|&count| (action.clone(), count as f64 / total as f64))
        })
        .collect()
}

/// Pick the highest-scoring item, breaking ties by keeping the earliest
/// candidate in iteration order (the source's
/// entropy-based tie-break is a no-op; this is a plain stable first-match).
/// Callers drive a deterministic iteration order (sorted action names) so
/// repeated calls with identical state are reproducible.
fn argmax_stable<'a>(items: impl Iterator<Item = (&'a str, f64)>) -> Option<&'a str> {
    let mut best: Option<(&str, f64)> = None;
    for (action, score) in items {
        best = match best {
            Some((_, best_score)) if score > best_score + TIE_EPSILON => Some((action, score)),
            Some(existing) => Some(existing),
            None => Some((action, score)),
        };
    }
    best.map(|(action, _)| action)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_start_returns_none() {
        let engine = PredictionEngine::new(ModelConfig::default());
        assert_eq!(engine.predict_action(0), None);
    }

    #[test]
    fn single_action_falls_back_to_global_counter() {
        let engine = PredictionEngine::new(ModelConfig::default());
        engine.update("go-c1", 1);
        assert_eq!(engine.predict_action(2), Some("go-c1".to_string()));
    }

    #[test]
    fn sequence_learning_predicts_b_after_a() {
        let engine = PredictionEngine::new(ModelConfig::default());
        for (action, t) in [("A", 1), ("B", 2), ("A", 3), ("B", 4), ("A", 5)] {
            engine.update(action, t);
        }
        assert_eq!(engine.predict_action(6), Some("B".to_string()));
    }

    #[test]
    fn time_fallback_with_empty_history() {
        // After a restart that only seeds counters
        // (no replayed history, e.g. from a cold-start global-model merge),
        // only TimePatterns carries a signal.
        let engine = PredictionEngine::new(ModelConfig::default());
        let global_counts = BTreeMap::from([("X".to_string(), 5), ("Y".to_string(), 5)]);
        let time_patterns = BTreeMap::from([
            ("X".to_string(), BTreeMap::from([(3u8, 5u64)])),
            ("Y".to_string(), BTreeMap::from([(14u8, 5u64)])),
        ]);
        engine.install_global_model(global_counts, time_patterns);
        assert_eq!(engine.history_len(), 0);

        let now_at_hour_14 = 14 * 3_600_000;
        assert_eq!(engine.predict_action(now_at_hour_14), Some("Y".to_string()));
    }

    #[test]
    fn tie_break_is_stable_and_deterministic() {
        let engine = PredictionEngine::new(ModelConfig::default());
        engine.update("A", 1);
        engine.update("B", 2);
        let now_ms = 1_000;
        let first = engine.predict_action(now_ms);
        let second = engine.predict_action(now_ms);
        assert_eq!(first, second);
    }

    #[test]
    fn predict_is_pure() {
        let engine = PredictionEngine::new(ModelConfig::default());
        for (action, t) in [("A", 1), ("B", 2), ("A", 3)] {
            engine.update(action, t);
        }
        assert_eq!(engine.predict_action(10), engine.predict_action(10));
    }

    #[test]
    fn history_truncates_to_configured_length() {
        let mut config = ModelConfig::default();
        config.history_length = 3;
        let engine = PredictionEngine::new(config);
        for i in 0..10 {
            engine.update("A", i);
        }
        assert_eq!(engine.history_len(), 3);
    }

    #[test]
    fn global_counter_sums_to_update_count() {
        let engine = PredictionEngine::new(ModelConfig::default());
        for i in 0..7 {
            engine.update(if i % 2 == 0 { "A" } else { "B" }, i);
        }
        let counts = engine.history_counts();
        let sum: u64 = counts.values().sum();
        assert_eq!(sum, 7);
    }
}
