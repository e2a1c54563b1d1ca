use thiserror::Error;

use crate::automation::AutomationError;
use crate::resume::ResumeError;
use crate::sources::SourceError;

/// Application-level error type.
/// Everything that reaches `main` as fatal goes through this enum.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Resume error: {0}")]
    Resume(#[from] ResumeError),

    #[error("Job source error: {0}")]
    Source(#[from] SourceError),

    #[error("Automation error: {0}")]
    Automation(#[from] AutomationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn config(message: impl Into<String>) -> Self {
        AppError::Config(message.into())
    }
}
