//! Resume text loading with an optional plain-text cache next to the PDF.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("Failed to extract text from {path}: {message}")]
    Extraction { path: PathBuf, message: String },

    #[error("Failed to access resume cache {path}: {error}")]
    Cache {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },
}

/// Returns the resume text. An existing cache file is used verbatim; otherwise the
/// PDF is extracted and, when `cache_path` is set, the text is written there.
pub async fn load_resume_text(
    resume_path: &Path,
    cache_path: Option<&Path>,
) -> Result<String, ResumeError> {
    if let Some(cache) = cache_path {
        if tokio::fs::try_exists(cache).await.unwrap_or(false) {
            info!("Using cached resume text from {}", cache.display());
            return tokio::fs::read_to_string(cache)
                .await
                .map_err(|error| ResumeError::Cache {
                    path: cache.to_path_buf(),
                    error,
                });
        }
    }

    let text = extract_text_from_pdf(resume_path).await?;
    info!(
        "Extracted {} characters from {}",
        text.len(),
        resume_path.display()
    );

    if let Some(cache) = cache_path {
        tokio::fs::write(cache, &text)
            .await
            .map_err(|error| ResumeError::Cache {
                path: cache.to_path_buf(),
                error,
            })?;
    }
    Ok(text)
}

/// PDF parsing is CPU-bound, so it runs on the blocking pool.
async fn extract_text_from_pdf(path: &Path) -> Result<String, ResumeError> {
    let owned = path.to_path_buf();
    let result = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned))
        .await
        .map_err(|e| ResumeError::Extraction {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    result.map_err(|e| ResumeError::Extraction {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
