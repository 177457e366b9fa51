//! Shared model store
//!
//! Holds zero or one trained classifier behind a read/write lock, with
//! best-effort persistence to a fixed-path `.apr` artifact. The store is
//! an explicitly owned handle injected into request handlers rather than
//! process-global state.
//!
//! Locking contract: `set` holds the write lock across both the in-memory
//! replacement and the disk write, so a slow disk can stall concurrent
//! predictions for the duration. `get` serves from memory and falls back
//! to a one-time disk load, caching the loaded model back into the slot.

use crate::model_persistence::{
    load_model, model_status_line, save_model, ModelPersistenceError, PersistedModel,
};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{info, warn};

/// Default artifact location, relative to the working directory.
pub const DEFAULT_MODEL_PATH: &str = "model.apr";

/// Errors surfaced by the store
#[derive(Error, Debug)]
pub enum ModelStoreError {
    #[error("model not trained yet")]
    NotTrained,

    #[error(transparent)]
    Persistence(#[from] ModelPersistenceError),
}

/// Thread-safe holder for the single trained classifier instance
pub struct ModelStore {
    slot: RwLock<Option<Arc<PersistedModel>>>,
    path: PathBuf,
}

impl ModelStore {
    /// Create a store persisting to `path`; no load is attempted here
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ModelStore {
            slot: RwLock::new(None),
            path: path.into(),
        }
    }

    /// Artifact path this store reads and writes
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Eager startup load: populate the slot if an artifact exists
    ///
    /// Load failures are logged and non-fatal; the model stays absent
    /// until a successful train.
    pub fn load_if_present(&self) {
        match load_model(&self.path) {
            Ok(model) => {
                info!(
                    path = %self.path.display(),
                    "loaded persisted model ({})",
                    model_status_line(&model.metadata)
                );
                *self.write_slot() = Some(Arc::new(model));
            }
            Err(ModelPersistenceError::FileNotFound(_)) => {
                info!(path = %self.path.display(), "no persisted model, starting untrained");
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "persisted model load failed");
            }
        }
    }

    /// Replace the held model and persist it to disk
    ///
    /// The write lock is held across both the memory update and the disk
    /// write; a failed disk write leaves the new model in memory and is
    /// reported to the caller.
    pub fn set(&self, model: PersistedModel) -> Result<(), ModelPersistenceError> {
        let mut slot = self.write_slot();
        let model = Arc::new(model);
        *slot = Some(model.clone());
        save_model(&model, &self.path)
    }

    /// Current model, loading from disk once if memory is empty
    ///
    /// On-demand loads are cached back into the slot so later calls stay
    /// in memory. Fails with [`ModelStoreError::NotTrained`] when neither
    /// memory nor disk has a model.
    pub fn get(&self) -> Result<Arc<PersistedModel>, ModelStoreError> {
        if let Some(model) = self.read_slot().clone() {
            return Ok(model);
        }

        // Upgrade to a write lock for the load-and-cache path; re-check
        // the slot since a trainer may have beaten us here
        let mut slot = self.write_slot();
        if let Some(model) = slot.clone() {
            return Ok(model);
        }

        match load_model(&self.path) {
            Ok(model) => {
                let model = Arc::new(model);
                *slot = Some(model.clone());
                Ok(model)
            }
            Err(ModelPersistenceError::FileNotFound(_)) => Err(ModelStoreError::NotTrained),
            Err(e) => Err(e.into()),
        }
    }

    fn read_slot(&self) -> std::sync::RwLockReadGuard<'_, Option<Arc<PersistedModel>>> {
        // A poisoned lock only means a panicking writer; the slot itself
        // stays usable
        self.slot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_slot(&self) -> std::sync::RwLockWriteGuard<'_, Option<Arc<PersistedModel>>> {
        self.slot.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::RandomForestClassifier;
    use crate::generator::generate_sequences;
    use crate::model_persistence::ModelMetadata;
    use crate::syscalls::SYSCALLS;
    use tempfile::TempDir;

    fn trained_model() -> PersistedModel {
        let set = generate_sequences(10, 15);
        let mut forest = RandomForestClassifier::new(5, SYSCALLS.len());
        forest.fit(&set.features, &set.labels);
        PersistedModel {
            forest,
            metadata: ModelMetadata::new(set.len(), 5),
        }
    }

    #[test]
    fn test_fresh_store_reports_not_trained() {
        let temp_dir = TempDir::new().unwrap();
        let store = ModelStore::new(temp_dir.path().join("forest.apr"));

        match store.get() {
            Err(ModelStoreError::NotTrained) => {}
            other => panic!("Expected NotTrained, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_set_then_get_returns_model() {
        let temp_dir = TempDir::new().unwrap();
        let store = ModelStore::new(temp_dir.path().join("forest.apr"));

        store.set(trained_model()).unwrap();
        let model = store.get().expect("model should be held");
        assert_eq!(model.metadata.n_estimators, 5);
    }

    #[test]
    fn test_set_persists_to_disk() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("forest.apr");

        let store = ModelStore::new(&path);
        store.set(trained_model()).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_get_loads_on_demand_and_caches() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("forest.apr");

        let writer = ModelStore::new(&path);
        writer.set(trained_model()).unwrap();

        // A second store over the same path starts with an empty slot and
        // must fall back to disk
        let reader = ModelStore::new(&path);
        let loaded = reader.get().expect("disk fallback should succeed");
        assert_eq!(loaded.metadata.n_estimators, 5);

        // The on-demand load is cached back into the slot
        assert!(reader.read_slot().is_some());
    }

    #[test]
    fn test_eager_load_populates_slot() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("forest.apr");

        let writer = ModelStore::new(&path);
        writer.set(trained_model()).unwrap();

        let restarted = ModelStore::new(&path);
        restarted.load_if_present();
        assert!(restarted.read_slot().is_some());
    }

    #[test]
    fn test_eager_load_with_missing_file_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let store = ModelStore::new(temp_dir.path().join("missing.apr"));

        store.load_if_present();
        assert!(store.read_slot().is_none());
    }

    #[test]
    fn test_corrupt_artifact_surfaces_persistence_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("forest.apr");
        std::fs::write(&path, b"not an apr file").unwrap();

        let store = ModelStore::new(&path);
        match store.get() {
            Err(ModelStoreError::Persistence(_)) => {}
            other => panic!("Expected Persistence error, got {:?}", other.map(|_| ())),
        }
    }
}
