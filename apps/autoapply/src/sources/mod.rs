//! Job sources: anything that turns a `JobQuery` into postings.
//!
//! Discovery only sees `dyn JobSource`; concrete sources are picked by name
//! from the CLI via `create_sources`.

use async_trait::async_trait;
use thiserror::Error;

use crate::errors::AppError;
use crate::models::{JobPosting, JobQuery};

pub mod remotive;

pub use remotive::RemotiveJobSource;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error from {source_name}: {error}")]
    Http {
        source_name: String,
        #[source]
        error: reqwest::Error,
    },

    #[error("{source_name} returned status {status}")]
    Status { source_name: String, status: u16 },

    #[error("Failed to parse {source_name} payload: {message}")]
    Parse {
        source_name: String,
        message: String,
    },
}

/// A searchable job board.
#[async_trait]
pub trait JobSource: Send + Sync {
    /// Stable name, also used as the `source` field of returned postings.
    fn name(&self) -> &str;

    /// Returns at most `limit` postings matching `query`.
    async fn search(&self, query: &JobQuery, limit: usize) -> Result<Vec<JobPosting>, SourceError>;
}

/// Builds sources from CLI names (case-insensitive).
pub fn create_sources(names: &[String]) -> Result<Vec<Box<dyn JobSource>>, AppError> {
    names
        .iter()
        .map(|name| match name.to_lowercase().as_str() {
            "remotive" => RemotiveJobSource::new()
                .map(|source| Box::new(source) as Box<dyn JobSource>),
            other => Err(AppError::config(format!("Unsupported job source: {other}"))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_sources_known_name() {
        let sources = create_sources(&["Remotive".to_string()]).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name(), "remotive");
    }

    #[test]
    fn test_create_sources_unknown_name() {
        let err = create_sources(&["monster".to_string()]).err().unwrap();
        assert!(err.to_string().contains("Unsupported job source: monster"));
    }
}
