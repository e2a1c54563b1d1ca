//! High-level workflow: discover → rank → apply.

use std::sync::Arc;

use tracing::info;

use crate::automation::{AutomationFactory, Delay, HttpFormAutomation, TokioDelay};
use crate::config::AgentConfig;
use crate::discovery::discover;
use crate::errors::AppError;
use crate::models::{ApplicationResult, JobPosting};
use crate::orchestrator::ApplicationOrchestrator;
use crate::resume::load_resume_text;
use crate::scoring::{JobScore, ResumeScorer};
use crate::sources::JobSource;

pub struct AutoApplyAgent {
    config: AgentConfig,
    sources: Vec<Box<dyn JobSource>>,
    orchestrator: ApplicationOrchestrator,
    resume_text: Option<String>,
    scorer: Option<ResumeScorer>,
}

impl AutoApplyAgent {
    /// Agent backed by the HTTP form automation and real sleeps.
    pub fn new(config: AgentConfig, sources: Vec<Box<dyn JobSource>>) -> Self {
        let delay: Arc<dyn Delay> = Arc::new(TokioDelay);
        let factory = Arc::new(HttpFormAutomation::new(Arc::clone(&delay)));
        Self::with_automation(config, sources, factory, delay)
    }

    pub fn with_automation(
        config: AgentConfig,
        sources: Vec<Box<dyn JobSource>>,
        factory: Arc<dyn AutomationFactory>,
        delay: Arc<dyn Delay>,
    ) -> Self {
        let orchestrator = ApplicationOrchestrator::new(&config, factory, delay);
        Self {
            config,
            sources,
            orchestrator,
            resume_text: None,
            scorer: None,
        }
    }

    /// Skips PDF extraction by supplying the resume text up front.
    #[cfg(test)]
    pub fn with_resume_text(mut self, text: impl Into<String>) -> Self {
        self.resume_text = Some(text.into());
        self.scorer = None;
        self
    }

    /// Resume text, extracted (or read from cache) on first use.
    pub async fn resume_text(&mut self) -> Result<&str, AppError> {
        if self.resume_text.is_none() {
            let text = load_resume_text(
                &self.config.resume.path,
                self.config.resume.parsed_text_cache.as_deref(),
            )
            .await?;
            self.resume_text = Some(text);
        }
        Ok(self.resume_text.as_deref().unwrap_or_default())
    }

    pub async fn scorer(&mut self) -> Result<&ResumeScorer, AppError> {
        if self.scorer.is_none() {
            self.resume_text().await?;
        }
        let text = self.resume_text.as_deref().unwrap_or_default();
        let skills = &self.config.user.skills;
        Ok(self
            .scorer
            .get_or_insert_with(|| ResumeScorer::new(text, skills)))
    }

    pub async fn discover_jobs(&self) -> Vec<JobPosting> {
        discover(&self.sources, &self.config.search).await
    }

    pub async fn rank_jobs(&mut self, jobs: &[JobPosting]) -> Result<Vec<JobScore>, AppError> {
        let scorer = self.scorer().await?;
        Ok(scorer.rank(jobs))
    }

    /// Full run. Returns early, without loading the resume or opening a
    /// session, when discovery finds nothing.
    pub async fn apply(&mut self, limit: Option<usize>) -> Result<Vec<ApplicationResult>, AppError> {
        let jobs = self.discover_jobs().await;
        if jobs.is_empty() {
            info!("No postings discovered");
            return Ok(Vec::new());
        }

        let ranked = self.rank_jobs(&jobs).await?;
        let results = self.orchestrator.apply(&ranked, limit).await?;
        info!(
            "Batch finished: {} results, {} jobs processed by this agent",
            results.len(),
            self.orchestrator.applied_ids().len()
        );
        Ok(results)
    }
}
