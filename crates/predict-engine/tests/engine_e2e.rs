use predict_core::EngineConfig;
use predict_engine::Engine;
use std::sync::Once;

static ENV_KEY: &str = "PREDICT_ENGINE_TEST_KEY";
static INIT: Once = Once::new();

fn set_test_key() {
    INIT.call_once(|| {
        std::env::set_var(ENV_KEY, "a".repeat(64));
    });
}

fn config_in(dir: &std::path::Path) -> EngineConfig {
    set_test_key();
    let mut config = EngineConfig::default();
    config.store_path = dir.join("engine.redb");
    config.encryption_key_env = ENV_KEY.to_string();
    config
}

#[tokio::test]
async fn cold_start_predicts_none() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = Engine::open(config_in(dir.path())).await.expect("open engine");
    let prediction = engine.predict(0);
    assert!(prediction.action.is_none());
    assert!(prediction.component_id.is_none());
}

#[tokio::test]
async fn single_action_falls_back_to_global_counter_and_resolves_component() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = Engine::open(config_in(dir.path())).await.expect("open engine");

    engine.track_component("c1", "page", None);
    engine.associate_action("go-c1", "c1");
    engine.track_interaction("go-c1").await.expect("track");

    let prediction = engine.predict(2);
    assert_eq!(prediction.action, Some("go-c1".to_string()));
    assert_eq!(prediction.component_id, Some("c1".to_string()));
}

#[tokio::test]
async fn sequence_learning_predicts_b_after_alternating_history() {
    let dir = tempfile::tempdir().expect("tempdir");
    let engine = Engine::open(config_in(dir.path())).await.expect("open engine");

    engine.track_component("c-a", "page", None);
    engine.track_component("c-b", "page", None);
    engine.associate_action("A", "c-a");
    engine.associate_action("B", "c-b");

    for action in ["A", "B", "A", "B", "A"] {
        engine.track_interaction(action).await.expect("track");
    }

    let prediction = engine.predict(6);
    assert_eq!(prediction.action, Some("B".to_string()));
    assert_eq!(prediction.component_id, Some("c-b".to_string()));
}

#[tokio::test]
async fn history_survives_a_restart_via_replay() {
    let dir = tempfile::tempdir().expect("tempdir");
    {
        let engine = Engine::open(config_in(dir.path())).await.expect("open engine");
        engine.track_component("c1", "page", None);
        engine.associate_action("go-c1", "c1");
        engine.track_interaction("go-c1").await.expect("track");
    }

    let engine = Engine::open(config_in(dir.path())).await.expect("reopen engine");
    let prediction = engine.predict(1_000);
    assert_eq!(prediction.action, Some("go-c1".to_string()));
}
