//! Error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ml::{LoadError, PredictError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    // Request errors
    #[error("Image not provided")]
    MissingImage { received_files: Vec<String> },

    #[error("{0}")]
    BadRequest(String),

    #[error("Only POST allowed")]
    MethodNotAllowed,

    // Model errors
    #[error("Failed to load model: {0}")]
    ModelLoad(#[from] LoadError),

    #[error("Prediction failed: {0}")]
    Prediction(#[from] PredictError),

    // Generic errors
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::MissingImage { received_files } => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Image not provided",
                    "received_files": received_files,
                }),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "error": "Only POST allowed" }),
            ),
            AppError::ModelLoad(err) => {
                tracing::error!(error = ?err, "Failed to load model: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Failed to load model", "details": err.to_string() }),
                )
            }
            AppError::Prediction(err) => {
                tracing::error!(error = ?err, "Prediction failed: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Prediction failed", "details": err.to_string() }),
                )
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(format!("Worker task failed: {}", err))
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::BadRequest(format!("Invalid multipart body: {}", err))
    }
}
