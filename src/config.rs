//! Configuration module

use std::env;
use std::path::PathBuf;

use crate::constants::{
    DEFAULT_INFERENCE_CONCURRENCY, DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_MODEL_PATH,
    DEFAULT_PORT, DEFAULT_PREDICTION_LOG_PATH,
};

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the ONNX model artifact
    pub model_path: PathBuf,

    /// Server port
    pub port: u16,

    /// Append-only prediction log
    pub prediction_log_path: PathBuf,

    /// Maximum accepted request body
    pub max_upload_bytes: usize,

    /// Concurrent inference permits
    pub inference_concurrency: usize,

    /// Load the model at startup instead of on the first request
    pub preload_model: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            port: DEFAULT_PORT,
            prediction_log_path: PathBuf::from(DEFAULT_PREDICTION_LOG_PATH),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            inference_concurrency: DEFAULT_INFERENCE_CONCURRENCY,
            preload_model: false,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            model_path: env::var("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),

            port: parse_var("PORT").unwrap_or(defaults.port),

            prediction_log_path: env::var("PREDICTION_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.prediction_log_path),

            max_upload_bytes: parse_var("MAX_UPLOAD_BYTES").unwrap_or(defaults.max_upload_bytes),

            inference_concurrency: parse_var("INFERENCE_CONCURRENCY")
                .unwrap_or(defaults.inference_concurrency)
                .max(1),

            preload_model: flag_var("MODEL_PRELOAD"),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn flag_var(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}
