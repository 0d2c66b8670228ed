//! Skin disease prediction handler

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};

use crate::ml::{self, PredictionResult};
use crate::{AppError, AppResult, AppState};

/// Multipart field carrying the image
pub const IMAGE_FIELD: &str = "image";

#[derive(Default)]
struct Upload {
    image: Option<Bytes>,
    received_files: Vec<String>,
}

/// Classify an uploaded skin image
pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<PredictionResult>> {
    let upload = match multipart {
        Ok(multipart) => read_upload(multipart).await?,
        Err(rejection) => {
            tracing::warn!("Request is not multipart: {}", rejection);
            Upload::default()
        }
    };

    let Some(image) = upload.image else {
        return Err(AppError::MissingImage {
            received_files: upload.received_files,
        });
    };

    let _permit = state
        .inference_permits
        .acquire()
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    let loader = Arc::clone(&state.model);
    let model = tokio::task::spawn_blocking(move || loader.get()).await??;

    let stats = Arc::clone(&state.stats);
    let result =
        tokio::task::spawn_blocking(move || ml::predict(model.as_ref(), &image, &stats)).await??;

    state.prediction_log.record(&result).await;

    Ok(Json(result))
}

/// Any method other than POST (OPTIONS is answered by the CORS layer)
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

async fn read_upload(mut multipart: Multipart) -> AppResult<Upload> {
    let mut upload = Upload::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        // Plain form fields are not uploads, even when named "image"
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        upload.received_files.push(name.clone());

        if name == IMAGE_FIELD && upload.image.is_none() {
            let data = field.bytes().await?;
            tracing::info!(bytes = data.len(), file = %file_name, "Received image upload");
            upload.image = Some(data);
        }
    }

    Ok(upload)
}
