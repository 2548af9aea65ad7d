use predict_crypto::{CryptoService, InMemoryIvMapPersistence};
use predict_store::InteractionStore;
use predict_sync::RemoteSync;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn fresh_store() -> (Arc<InteractionStore>, tempfile::TempDir, Arc<CryptoService>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let crypto = Arc::new(
        CryptoService::new([9u8; 32], Arc::new(InMemoryIvMapPersistence))
            .await
            .expect("crypto"),
    );
    let store = Arc::new(
        InteractionStore::open(&dir.path().join("sync.redb"))
            .await
            .expect("store"),
    );
    (store, dir, crypto)
}

#[tokio::test]
async fn registers_app_id_on_first_use_and_persists_it() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register-app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "appId": "app-123" })))
        .expect(1)
        .mount(&server)
        .await;

    let (store, _dir, crypto) = fresh_store().await;
    let sync = RemoteSync::new(server.uri(), Arc::clone(&store), Arc::clone(&crypto)).expect("build sync");

    sync.ensure_app_id(1_000).await.expect("register");
    assert_eq!(sync.app_id().await, Some("app-123".to_string()));

    // A second ensure_app_id should not hit the server again (it's loaded
    // from the already-persisted value, not re-registered).
    sync.ensure_app_id(2_000).await.expect("idempotent");
    assert_eq!(sync.app_id().await, Some("app-123".to_string()));
}

#[tokio::test]
async fn registration_failure_falls_back_to_local_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register-app"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (store, _dir, crypto) = fresh_store().await;
    let sync = RemoteSync::new(server.uri(), store, crypto).expect("build sync");

    sync.ensure_app_id(42_000).await.expect("fallback never errors");
    assert_eq!(sync.app_id().await, Some("fallback-42000".to_string()));
}

#[tokio::test]
async fn upload_is_a_no_op_without_history() {
    let server = MockServer::start().await;
    // No mock registered for /upload-anonymous-data: if the client posts
    // anyway, wiremock's unmatched-request panic on drop will fail the test.
    let (store, _dir, crypto) = fresh_store().await;
    let sync = RemoteSync::new(server.uri(), store, crypto).expect("build sync");
    sync.ensure_app_id(0)
        .await
        .unwrap_or_else(|_| panic!("unreachable: no register-app mock needed for this assertion"));

    sync.upload_now(BTreeMap::new()).await.expect("no-op upload");
}

#[tokio::test]
async fn upload_posts_deterministically_encrypted_counts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register-app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "appId": "app-xyz" })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/upload-anonymous-data"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let (store, _dir, crypto) = fresh_store().await;
    let sync = RemoteSync::new(server.uri(), store, crypto).expect("build sync");
    sync.ensure_app_id(0).await.expect("register");

    let mut counts = BTreeMap::new();
    counts.insert("click-login".to_string(), 3u64);
    sync.upload_now(counts).await.expect("upload");
}

#[tokio::test]
async fn fetch_global_model_decrypts_server_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register-app"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "appId": "app-fetch" })))
        .mount(&server)
        .await;

    let (store, _dir, crypto) = fresh_store().await;
    let (ct, iv) = crypto.encrypt("go-dashboard").expect("encrypt");

    Mock::given(method("GET"))
        .and(path("/global-model/app-fetch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "globalActionCounter": { ct.clone(): 42 },
            "globalActionCounterIVs": { ct.clone(): iv.clone() },
            "timePatterns": { ct.clone(): { "9": 10 } },
            "timePatternsIVs": { ct: iv },
        })))
        .mount(&server)
        .await;

    let sync = RemoteSync::new(server.uri(), store, crypto).expect("build sync");
    sync.ensure_app_id(0).await.expect("register");

    let model = sync.fetch_global_model().await.expect("fetch");
    assert_eq!(model.global_action_counter.get("go-dashboard"), Some(&42));
    assert_eq!(
        model.time_patterns.get("go-dashboard").and_then(|by_hour| by_hour.get(&9)),
        Some(&10)
    );
}

#[tokio::test]
async fn fetch_global_model_requires_app_id() {
    let server = MockServer::start().await;
    let (store, _dir, crypto) = fresh_store().await;
    let sync = RemoteSync::new(server.uri(), store, crypto).expect("build sync");
    assert!(sync.fetch_global_model().await.is_err());
}
