//! Model persistence for the trained forest
//!
//! Persists the classifier to disk using aprender's `.apr` format so a
//! restarted process can serve predictions without retraining. The
//! artifact embeds metadata (vocabulary, history length, estimator count)
//! that is checked at load time; an artifact written under a different
//! vocabulary or window size fails with a typed mismatch error instead of
//! silently producing garbage predictions.

use crate::forest::RandomForestClassifier;
use crate::syscalls::{vocabulary, HISTORY_LEN};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during model persistence operations
#[derive(Error, Debug)]
pub enum ModelPersistenceError {
    #[error("Failed to save model: {0}")]
    SaveError(String),

    #[error("Failed to load model: {0}")]
    LoadError(String),

    #[error("Model file not found: {0}")]
    FileNotFound(String),

    #[error("Model vocabulary mismatch: expected {expected:?}, found {found:?}")]
    VocabularyMismatch {
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Model history length mismatch: expected {expected}, found {found}")]
    HistoryLenMismatch { expected: usize, found: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for model persistence operations
pub type Result<T> = std::result::Result<T, ModelPersistenceError>;

/// Metadata stored alongside a persisted model
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ModelMetadata {
    /// Presagio version that created this model
    pub presagio_version: String,
    /// When the model was trained (unix seconds)
    pub trained_at: String,
    /// Number of samples used for training
    pub training_samples: usize,
    /// Vocabulary the model was trained against, in label order
    pub vocabulary: Vec<String>,
    /// History window length at training time
    pub history_len: usize,
    /// Number of trees in the forest
    pub n_estimators: usize,
}

impl ModelMetadata {
    /// Create metadata for a model trained now, under the current
    /// vocabulary and window constants
    pub fn new(training_samples: usize, n_estimators: usize) -> Self {
        Self {
            presagio_version: env!("CARGO_PKG_VERSION").to_string(),
            trained_at: chrono_lite_timestamp(),
            training_samples,
            vocabulary: vocabulary(),
            history_len: HISTORY_LEN,
            n_estimators,
        }
    }
}

/// Lightweight timestamp without chrono dependency
fn chrono_lite_timestamp() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("{}", duration.as_secs())
}

/// The full persisted artifact: classifier plus metadata
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PersistedModel {
    /// The trained classifier
    pub forest: RandomForestClassifier,
    /// Model metadata
    pub metadata: ModelMetadata,
}

/// Save a trained model to `.apr` format
pub fn save_model(model: &PersistedModel, path: impl AsRef<Path>) -> Result<()> {
    use aprender::format::{save, Compression, ModelType, SaveOptions};

    let options = SaveOptions::new()
        .with_compression(Compression::ZstdDefault)
        .with_name("presagio-forest")
        .with_description("Next-syscall Random Forest");

    save(model, ModelType::Custom, path.as_ref(), options)
        .map_err(|e| ModelPersistenceError::SaveError(e.to_string()))
}

/// Load a model from `.apr` format and verify it is compatible with the
/// current vocabulary and history length
pub fn load_model(path: impl AsRef<Path>) -> Result<PersistedModel> {
    use aprender::format::{load, ModelType};

    if !path.as_ref().exists() {
        return Err(ModelPersistenceError::FileNotFound(
            path.as_ref().display().to_string(),
        ));
    }

    let model = load::<PersistedModel>(path.as_ref(), ModelType::Custom)
        .map_err(|e| ModelPersistenceError::LoadError(e.to_string()))?;

    validate_compatibility(&model.metadata)?;
    Ok(model)
}

/// Check artifact metadata against the process constants
fn validate_compatibility(metadata: &ModelMetadata) -> Result<()> {
    let expected = vocabulary();
    if metadata.vocabulary != expected {
        return Err(ModelPersistenceError::VocabularyMismatch {
            expected,
            found: metadata.vocabulary.clone(),
        });
    }
    if metadata.history_len != HISTORY_LEN {
        return Err(ModelPersistenceError::HistoryLenMismatch {
            expected: HISTORY_LEN,
            found: metadata.history_len,
        });
    }
    Ok(())
}

/// Generate a status line for model information
pub fn model_status_line(metadata: &ModelMetadata) -> String {
    format!(
        "model: presagio v{}, {} trees, trained with {} samples",
        metadata.presagio_version, metadata.n_estimators, metadata.training_samples
    )
}
