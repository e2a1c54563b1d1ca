//! Automation backends: the collaborator that actually submits applications.
//!
//! A factory acquires one session per batch; the orchestrator drives every job
//! through it and releases it at the end. Per-job problems come back as an
//! unsuccessful `ApplyOutcome`; an `Err` means the session itself is unusable.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::{AutomationSettings, UserProfile};
use crate::models::JobPosting;

pub mod delay;
pub mod forms;
pub mod http_form;
pub mod locator;

pub use delay::{Delay, TokioDelay};
pub use http_form::HttpFormAutomation;

#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("Failed to start automation session: {0}")]
    Acquire(String),

    #[error("Navigation to {url} failed: {error}")]
    Navigation {
        url: String,
        #[source]
        error: reqwest::Error,
    },

    #[error("Automation session already released")]
    SessionClosed,

    #[error("Automation backend failure: {0}")]
    Backend(String),
}

/// Result of a single `apply_to_job` attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub success: bool,
    pub message: String,
}

impl ApplyOutcome {
    pub fn submitted(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// One live automation session. Jobs are driven through it strictly one at a time.
#[async_trait]
pub trait AutomationSession: Send {
    async fn apply_to_job(
        &mut self,
        job: &JobPosting,
        user: &UserProfile,
        resume_path: &Path,
    ) -> Result<ApplyOutcome, AutomationError>;

    /// Frees the session. Called exactly once, also after a failed batch.
    async fn release(&mut self) -> Result<(), AutomationError>;
}

/// Produces sessions; injected into the orchestrator so tests can substitute fakes.
#[async_trait]
pub trait AutomationFactory: Send + Sync {
    async fn acquire(
        &self,
        settings: &AutomationSettings,
    ) -> Result<Box<dyn AutomationSession>, AutomationError>;
}
