//! Model Loader
//!
//! Lazily loads the classifier on first use and hands out shared handles.
//! The state mutex is held for the whole load, so concurrent first callers
//! wait for a single load instead of racing. A failed load is remembered for
//! the health report only; the next request tries again, so dropping the
//! artifact into place recovers the service without a restart.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use thiserror::Error;

use super::inference::{Classifier, OnnxClassifier};

#[derive(Debug, Clone, Error)]
pub enum LoadError {
    #[error("Model file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{0}")]
    Session(String),
}

/// Loads a classifier from a filesystem path
pub type LoadFn = dyn Fn(&Path) -> Result<Arc<dyn Classifier>, LoadError> + Send + Sync;

enum LoadState {
    NotLoaded,
    Loaded(Arc<dyn Classifier>),
    Failed(LoadError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelState {
    NotLoaded,
    Loading,
    Loaded,
    Failed,
}

/// Model status for the health endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub state: ModelState,
    pub model_path: String,
    pub last_error: Option<String>,
}

pub struct ModelLoader {
    model_path: PathBuf,
    load_fn: Box<LoadFn>,
    state: Mutex<LoadState>,
}

impl ModelLoader {
    /// Loader backed by ONNX Runtime
    pub fn onnx(model_path: impl Into<PathBuf>) -> Self {
        Self::with_loader(model_path, |path| {
            let model = OnnxClassifier::load(path)?;
            Ok(Arc::new(model) as Arc<dyn Classifier>)
        })
    }

    pub fn with_loader<F>(model_path: impl Into<PathBuf>, load_fn: F) -> Self
    where
        F: Fn(&Path) -> Result<Arc<dyn Classifier>, LoadError> + Send + Sync + 'static,
    {
        Self {
            model_path: model_path.into(),
            load_fn: Box::new(load_fn),
            state: Mutex::new(LoadState::NotLoaded),
        }
    }

    /// Return the cached model, loading it on the first successful call.
    pub fn get(&self) -> Result<Arc<dyn Classifier>, LoadError> {
        let mut state = self.state.lock();

        match &*state {
            LoadState::Loaded(model) => return Ok(Arc::clone(model)),
            LoadState::Failed(_) => {
                tracing::warn!(
                    path = %self.model_path.display(),
                    "Retrying previously failed model load"
                );
            }
            LoadState::NotLoaded => {}
        }

        tracing::info!(path = %self.model_path.display(), "Loading model");

        match (self.load_fn)(&self.model_path) {
            Ok(model) => {
                tracing::info!(path = %self.model_path.display(), "Model loaded successfully");
                *state = LoadState::Loaded(Arc::clone(&model));
                Ok(model)
            }
            Err(err) => {
                tracing::error!(
                    path = %self.model_path.display(),
                    error = ?err,
                    "Critical error loading model: {}", err
                );
                *state = LoadState::Failed(err.clone());
                Err(err)
            }
        }
    }

    /// Snapshot of the load state. Never waits on an in-flight load.
    pub fn status(&self) -> ModelStatus {
        let (state, last_error) = match self.state.try_lock().as_deref() {
            None => (ModelState::Loading, None),
            Some(LoadState::NotLoaded) => (ModelState::NotLoaded, None),
            Some(LoadState::Loaded(_)) => (ModelState::Loaded, None),
            Some(LoadState::Failed(err)) => (ModelState::Failed, Some(err.to_string())),
        };

        ModelStatus {
            state,
            model_path: self.model_path.display().to_string(),
            last_error,
        }
    }
}
