//! ML Module - skin lesion classification pipeline
//!
//! bytes -> preprocess::transform -> inference::run -> result::build

pub mod taxonomy;
pub mod preprocess;
pub mod loader;
pub mod inference;
pub mod result;

use std::time::Instant;

pub use inference::{Classifier, InferenceStats, OnnxClassifier, PredictError};
pub use loader::{LoadError, ModelLoader, ModelState, ModelStatus};
pub use preprocess::ImageTensor;
pub use result::{ClassProbabilities, PredictionResult};
pub use taxonomy::{ClassCode, MedicalReference};

/// Full pipeline for one uploaded image
pub fn predict(
    model: &dyn Classifier,
    image_bytes: &[u8],
    stats: &InferenceStats,
) -> Result<PredictionResult, PredictError> {
    let tensor = preprocess::transform(image_bytes)?;

    let started = Instant::now();
    let probabilities = inference::run(model, &tensor)?;
    stats.record(started.elapsed());

    Ok(result::build(&probabilities))
}
