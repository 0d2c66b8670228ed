//! Inference Runner - ONNX Runtime Integration
//!
//! `Classifier` is the seam between the HTTP pipeline and the model backend.
//! `OnnxClassifier` is the production backend.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use once_cell::sync::OnceCell;
use ort::environment::Environment;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{Tensor, ValueType};
use parking_lot::Mutex;
use thiserror::Error;

use crate::constants::NUM_CLASSES;
use super::loader::LoadError;
use super::preprocess::ImageTensor;

// ============================================================================
// ERROR HANDLING
// ============================================================================

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Input shape mismatch! Expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<Option<usize>>,
        actual: Vec<usize>,
    },

    #[error("Model returned {actual} scores, expected {expected}")]
    OutputMismatch { expected: usize, actual: usize },

    #[error("Inference failed: {0}")]
    Inference(String),
}

// ============================================================================
// CLASSIFIER TRAIT
// ============================================================================

/// A loaded image classifier
pub trait Classifier: Send + Sync {
    /// Declared input dims without the batch dim. `None` marks a dynamic dim.
    fn input_shape(&self) -> &[Option<usize>];

    /// Single forward pass in inference mode; returns the raw scores of the batch
    fn forward(&self, tensor: &ImageTensor) -> Result<Vec<f32>, PredictError>;
}

/// Run the classifier on one preprocessed image and return its class probabilities
pub fn run(
    model: &dyn Classifier,
    tensor: &ImageTensor,
) -> Result<[f32; NUM_CLASSES], PredictError> {
    let expected = model.input_shape();
    let actual = tensor.shape().get(1..).unwrap_or_default();

    let compatible = expected.len() == actual.len()
        && expected
            .iter()
            .zip(actual)
            .all(|(want, got)| want.map_or(true, |w| w == *got));

    if !compatible {
        return Err(PredictError::ShapeMismatch {
            expected: expected.to_vec(),
            actual: tensor.shape().to_vec(),
        });
    }

    let scores = model.forward(tensor)?;
    tracing::debug!(?scores, "Raw predictions");

    let actual_len = scores.len();
    scores.try_into().map_err(|_| PredictError::OutputMismatch {
        expected: NUM_CLASSES,
        actual: actual_len,
    })
}

// ============================================================================
// STATS
// ============================================================================

/// Latency stats, shared by all requests
#[derive(Debug, Default)]
pub struct InferenceStats {
    latency_sum_us: AtomicU64,
    count: AtomicU64,
}

impl InferenceStats {
    pub fn record(&self, elapsed: Duration) {
        self.latency_sum_us.fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn avg_latency_ms(&self) -> f32 {
        let sum = self.latency_sum_us.load(Ordering::Relaxed);
        let count = self.count();
        if count > 0 { (sum as f32 / count as f32) / 1000.0 } else { 0.0 }
    }
}

// ============================================================================
// ONNX IMPLEMENTATION
// ============================================================================

/// ONNX Runtime allows a single environment per process
static ORT_ENVIRONMENT: OnceCell<Environment> = OnceCell::new();

fn environment() -> Result<&'static Environment, LoadError> {
    ORT_ENVIRONMENT.get_or_try_init(|| {
        ort::init()
            .with_name("dermalens")
            .build()
            .map_err(|e| LoadError::Session(format!("Failed to create ort environment: {}", e)))
    })
}

pub struct OnnxClassifier {
    session: Mutex<Session>,
    input_shape: Vec<Option<usize>>,
    output_name: String,
}

impl std::fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("input_shape", &self.input_shape)
            .field("output_name", &self.output_name)
            .finish()
    }
}

impl OnnxClassifier {
    /// Load ONNX model from file
    pub fn load(model_path: &Path) -> Result<Self, LoadError> {
        if !model_path.exists() {
            return Err(LoadError::NotFound(model_path.to_path_buf()));
        }

        let mut builder = Session::builder(environment()?)
            .map_err(|e| LoadError::Session(format!("Failed to create session builder: {}", e)))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| LoadError::Session(format!("Failed to set optimization: {}", e)))?;

        let session = builder
            .commit_from_file(model_path)
            .map_err(|e| LoadError::Session(format!("Failed to load model: {}", e)))?;

        let input = session.inputs().first()
            .ok_or_else(|| LoadError::Session("Model declares no inputs".to_string()))?;

        let input_shape: Vec<Option<usize>> = match input.dtype() {
            ValueType::Tensor { shape, .. } => shape
                .iter()
                .skip(1)
                .map(|&dim| usize::try_from(dim).ok())
                .collect(),
            other => {
                let msg = format!("Model input is not a tensor: {:?}", other);
                return Err(LoadError::Session(msg));
            }
        };

        let output_name = session.outputs().first()
            .map(|o| o.name().to_string())
            .ok_or_else(|| LoadError::Session("No output defined".to_string()))?;

        tracing::info!(?input_shape, output = %output_name, "ONNX session ready");

        Ok(Self {
            session: Mutex::new(session),
            input_shape,
            output_name,
        })
    }
}

impl Classifier for OnnxClassifier {
    fn input_shape(&self) -> &[Option<usize>] {
        &self.input_shape
    }

    fn forward(&self, tensor: &ImageTensor) -> Result<Vec<f32>, PredictError> {
        let (batch, height, width, channels) = tensor.view().dim();
        let data: Vec<f32> = tensor.view().iter().copied().collect();

        let input_tensor = Tensor::from_array(([batch, height, width, channels], data))
            .map_err(|e| PredictError::Inference(format!("Tensor error: {}", e)))?;

        let mut session = self.session.lock();
        let outputs = session
            .run(ort::inputs![input_tensor])
            .map_err(|e| PredictError::Inference(e.to_string()))?;

        let output = outputs.get(&self.output_name)
            .ok_or_else(|| PredictError::Inference("No output".to_string()))?;

        let (_, scores) = output.try_extract_tensor::<f32>()
            .map_err(|e| PredictError::Inference(format!("Extract error: {}", e)))?;

        Ok(scores.to_vec())
    }
}
