//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.

/// Default path of the serialized classifier (ONNX)
pub const DEFAULT_MODEL_PATH: &str = "ml_models/skin_disease_model.onnx";

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8000;

/// Default prediction log file
pub const DEFAULT_PREDICTION_LOG_PATH: &str = "prediction_log.txt";

/// Default maximum upload size (10 MiB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Default number of inferences allowed to run at once
pub const DEFAULT_INFERENCE_CONCURRENCY: usize = 2;

/// Number of diagnostic classes the model was trained on
pub const NUM_CLASSES: usize = 10;

/// Side length the model expects (images are resized to IMAGE_SIDE x IMAGE_SIDE)
pub const IMAGE_SIDE: u32 = 100;

/// Channels per pixel after grayscale conversion
pub const IMAGE_CHANNELS: usize = 1;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
