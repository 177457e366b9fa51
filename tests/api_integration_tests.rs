// End-to-end tests for the HTTP surface: train/predict endpoints, error
// bodies, artifact persistence across restarts, and static file fallback.

use presagio::model_store::ModelStore;
use presagio::server::router;
use presagio::syscalls::SYSCALLS;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;

/// Spawn the service on an ephemeral port, persisting into `dir`
async fn spawn_app(dir: &TempDir) -> String {
    let store = Arc::new(ModelStore::new(dir.path().join("forest.apr")));
    store.load_if_present();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(store)).await.unwrap();
    });

    format!("http://{addr}")
}

async fn train_small(client: &reqwest::Client, base: &str) -> Value {
    let resp = client
        .post(format!("{base}/train"))
        .json(&json!({ "num_seq": 50, "seq_len": 20, "n_estimators": 20 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    resp.json().await.unwrap()
}

#[tokio::test]
async fn test_predict_before_training_returns_client_error() {
    let dir = TempDir::new().unwrap();
    let base = spawn_app(&dir).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/predict"))
        .json(&json!({ "history": ["read", "write"] }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "model not trained yet");
}

#[tokio::test]
async fn test_predict_rejects_non_list_history() {
    let dir = TempDir::new().unwrap();
    let base = spawn_app(&dir).await;
    let client = reqwest::Client::new();

    for bad_history in [json!(7), json!("read"), json!({ "a": 1 })] {
        let resp = client
            .post(format!("{base}/predict"))
            .json(&json!({ "history": bad_history }))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "history must be a list of syscall names");
    }
}

#[tokio::test]
async fn test_train_then_predict_end_to_end() {
    let dir = TempDir::new().unwrap();
    let base = spawn_app(&dir).await;
    let client = reqwest::Client::new();

    let trained = train_small(&client, &base).await;
    assert_eq!(trained["status"], "trained");
    assert!(trained["samples"].as_u64().unwrap() > 0);
    assert_eq!(trained["classes"].as_array().unwrap().len(), SYSCALLS.len());

    let resp = client
        .post(format!("{base}/predict"))
        .json(&json!({ "history": ["read", "read", "write", "open", "stat", "read"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();

    let prediction = body["prediction"].as_str().unwrap();
    assert!(SYSCALLS.contains(&prediction), "prediction {prediction} not in vocabulary");

    let proba = body["proba"].as_array().unwrap();
    assert_eq!(proba.len(), SYSCALLS.len());
    let sum: f64 = proba.iter().map(|v| v.as_f64().unwrap()).sum();
    assert!((sum - 1.0).abs() < 1e-6, "proba sums to {sum}");

    let all_syscalls: Vec<&str> = body["all_syscalls"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(all_syscalls, SYSCALLS);
}

#[tokio::test]
async fn test_train_rejects_out_of_range_parameters() {
    let dir = TempDir::new().unwrap();
    let base = spawn_app(&dir).await;
    let client = reqwest::Client::new();

    for bad_body in [
        json!({ "num_seq": 0 }),
        json!({ "num_seq": -10 }),
        json!({ "seq_len": 3 }),
        json!({ "n_estimators": 0 }),
    ] {
        let resp = client
            .post(format!("{base}/train"))
            .json(&bad_body)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "expected rejection for {bad_body}");
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_model_survives_restart() {
    let dir = TempDir::new().unwrap();
    let client = reqwest::Client::new();

    let base = spawn_app(&dir).await;
    train_small(&client, &base).await;

    // A fresh instance over the same artifact path serves predictions
    // without retraining
    let restarted = spawn_app(&dir).await;
    let resp = client
        .post(format!("{restarted}/predict"))
        .json(&json!({ "history": ["read"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn test_static_root_and_spa_fallback() {
    let dir = TempDir::new().unwrap();
    let base = spawn_app(&dir).await;
    let client = reqwest::Client::new();

    let index = client.get(format!("{base}/")).send().await.unwrap();
    assert_eq!(index.status(), 200);
    let index_body = index.text().await.unwrap();
    assert!(index_body.contains("Presagio"));

    // Unknown paths fall back to the index document
    let fallback = client
        .get(format!("{base}/no/such/page"))
        .send()
        .await
        .unwrap();
    assert_eq!(fallback.status(), 200);
    assert_eq!(fallback.text().await.unwrap(), index_body);
}
