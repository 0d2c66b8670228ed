//! Append-only plain-text log of successful predictions

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::ml::PredictionResult;

#[derive(Debug, Clone)]
pub struct PredictionLog {
    path: PathBuf,
}

impl PredictionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format_line(result: &PredictionResult, at: DateTime<Utc>) -> String {
        format!(
            "{} label={} disease=\"{}\" confidence={:.2}%\n",
            at.to_rfc3339_opts(SecondsFormat::Secs, true),
            result.predicted_label,
            result.predicted_disease,
            result.confidence_percent,
        )
    }

    pub async fn append(&self, result: &PredictionResult) -> std::io::Result<()> {
        let line = Self::format_line(result, Utc::now());

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }

    /// Append, logging failures instead of returning them
    pub async fn record(&self, result: &PredictionResult) {
        if let Err(e) = self.append(result).await {
            tracing::warn!(path = %self.path.display(), "Failed to write prediction log: {}", e);
        }
    }
}
