//! HTTP service: train/predict endpoints plus static frontend serving
//!
//! Exposes the generator, forest, and model store over JSON-over-HTTP.
//! The model store is injected as shared axum state; there is no global
//! model reference. Training runs synchronously inside the request
//! handler, which is acceptable at this scope.

use crate::encoder::encode_history;
use crate::forest::RandomForestClassifier;
use crate::generator::generate_sequences;
use crate::model_persistence::{ModelMetadata, PersistedModel};
use crate::model_store::{ModelStore, ModelStoreError};
use crate::syscalls::{vocabulary, HISTORY_LEN, SYSCALLS};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{error, info};

/// Fixed bind address; the service takes no network configuration.
pub const BIND_ADDR: &str = "0.0.0.0:8000";

/// Root directory for the single-page frontend.
pub const STATIC_DIR: &str = "static";

/// Parameter bounds for `/train`. The reference behavior passed values
/// through unchecked; degenerate inputs (empty training sets, zero trees)
/// are rejected here instead.
const MAX_NUM_SEQ: i64 = 100_000;
const MAX_SEQ_LEN: i64 = 10_000;
const MAX_ESTIMATORS: i64 = 1_000;

/// Body of `POST /train`; every field is optional
#[derive(Debug, Deserialize)]
pub struct TrainRequest {
    #[serde(default = "default_num_seq")]
    pub num_seq: i64,
    #[serde(default = "default_seq_len")]
    pub seq_len: i64,
    #[serde(default = "default_n_estimators")]
    pub n_estimators: i64,
}

fn default_num_seq() -> i64 {
    1500
}

fn default_seq_len() -> i64 {
    30
}

fn default_n_estimators() -> i64 {
    100
}

impl Default for TrainRequest {
    fn default() -> Self {
        TrainRequest {
            num_seq: default_num_seq(),
            seq_len: default_seq_len(),
            n_estimators: default_n_estimators(),
        }
    }
}

impl TrainRequest {
    /// Bounds-check the training parameters
    fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_NUM_SEQ).contains(&self.num_seq) {
            return Err(format!("num_seq must be between 1 and {MAX_NUM_SEQ}"));
        }
        // A sequence must hold a full history window plus the label
        let min_seq_len = (HISTORY_LEN + 1) as i64;
        if !(min_seq_len..=MAX_SEQ_LEN).contains(&self.seq_len) {
            return Err(format!(
                "seq_len must be between {min_seq_len} and {MAX_SEQ_LEN}"
            ));
        }
        if !(1..=MAX_ESTIMATORS).contains(&self.n_estimators) {
            return Err(format!("n_estimators must be between 1 and {MAX_ESTIMATORS}"));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct TrainResponse {
    status: &'static str,
    samples: usize,
    classes: Vec<String>,
}

#[derive(Debug, Serialize)]
struct PredictResponse {
    prediction: String,
    proba: Vec<f64>,
    all_syscalls: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// `POST /train`: generate synthetic data, fit a fresh forest, store it
async fn train(
    State(store): State<Arc<ModelStore>>,
    body: Option<Json<TrainRequest>>,
) -> Response {
    let req = body.map(|Json(b)| b).unwrap_or_default();
    if let Err(message) = req.validate() {
        return json_error(StatusCode::BAD_REQUEST, message);
    }

    let set = generate_sequences(req.num_seq as usize, req.seq_len as usize);
    let samples = set.len();

    let n_estimators = req.n_estimators as usize;
    let mut forest = RandomForestClassifier::new(n_estimators, SYSCALLS.len());
    forest.fit(&set.features, &set.labels);

    let model = PersistedModel {
        forest,
        metadata: ModelMetadata::new(samples, n_estimators),
    };

    if let Err(e) = store.set(model) {
        error!(error = %e, "failed to persist trained model");
        return json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
    }

    info!(samples, n_estimators, "trained new model");
    Json(TrainResponse {
        status: "trained",
        samples,
        classes: vocabulary(),
    })
    .into_response()
}

/// `POST /predict`: encode the history and run inference
async fn predict(State(store): State<Arc<ModelStore>>, Json(body): Json<Value>) -> Response {
    // `history` must be a list; a missing key means the empty history.
    // Non-string elements fall through as unknown names (all-zero blocks).
    let history: Vec<String> = match body.get("history") {
        None => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().unwrap_or("").to_string())
            .collect(),
        Some(_) => {
            return json_error(
                StatusCode::BAD_REQUEST,
                "history must be a list of syscall names",
            )
        }
    };

    let model = match store.get() {
        Ok(model) => model,
        Err(ModelStoreError::NotTrained) => {
            return json_error(StatusCode::BAD_REQUEST, "model not trained yet")
        }
        Err(ModelStoreError::Persistence(e)) => {
            error!(error = %e, "model load failed during predict");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };

    let features = encode_history(&history);
    let proba = model.forest.predict_proba(&features);
    let pred_idx = model.forest.predict(&features);

    Json(PredictResponse {
        prediction: SYSCALLS[pred_idx].to_string(),
        proba,
        all_syscalls: vocabulary(),
    })
    .into_response()
}

/// Build the application router around a shared model store
///
/// Unmatched paths are served from [`STATIC_DIR`], falling back to
/// `index.html` for the single-page frontend.
pub fn router(store: Arc<ModelStore>) -> Router {
    let static_files = ServeDir::new(STATIC_DIR)
        .fallback(ServeFile::new(Path::new(STATIC_DIR).join("index.html")));

    Router::new()
        .route("/train", post(train))
        .route("/predict", post(predict))
        .fallback_service(static_files)
        .layer(CorsLayer::permissive())
        .with_state(store)
}
