//! Dermalens - skin lesion classification service
//!
//! # Architecture
//!
//! ```text
//! POST /api/predict/skin-disease/ (multipart "image")
//!        │
//!        ▼
//!  ModelLoader::get()          lazy, single-flight, cached
//!        │
//!        ▼
//!  preprocess::transform()     grayscale → 100x100 → row L2 norm → [1,100,100,1]
//!        │
//!        ▼
//!  inference::run()            shape check → forward pass → 10 probabilities
//!        │
//!        ▼
//!  result::build()             argmax → label, confidence, medical reference
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod ml;
pub mod prediction_log;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    routing::{get, post},
    Router,
};
use tokio::sync::Semaphore;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use config::Config;
pub use error::{AppError, AppResult};

use ml::{InferenceStats, ModelLoader};
use prediction_log::PredictionLog;

/// Prediction route, as exposed by the original service
pub const PREDICT_PATH: &str = "/api/predict/skin-disease/";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub model: Arc<ModelLoader>,
    pub stats: Arc<InferenceStats>,
    pub inference_permits: Arc<Semaphore>,
    pub prediction_log: PredictionLog,
}

impl AppState {
    pub fn new(config: Config, model: ModelLoader) -> Self {
        Self {
            model: Arc::new(model),
            stats: Arc::new(InferenceStats::default()),
            inference_permits: Arc::new(Semaphore::new(config.inference_concurrency.max(1))),
            prediction_log: PredictionLog::new(config.prediction_log_path.clone()),
            config,
        }
    }
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health::check))
        .route(
            PREDICT_PATH,
            post(handlers::predict::predict).fallback(handlers::predict::method_not_allowed),
        )
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors),
        )
        .with_state(state)
}
