//! Application Orchestrator: drives ranked postings through one automation
//! session with a bounded retry loop, a per-job cooldown and an optional cap.
//!
//! Per job: `PENDING → (ATTEMPTING)* → {SUCCEEDED | EXHAUSTED}`. Both terminal
//! states land in the applied-id set, which lives as long as the orchestrator.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::automation::{AutomationError, AutomationFactory, AutomationSession, Delay};
use crate::config::{AgentConfig, AutomationSettings, UserProfile};
use crate::errors::AppError;
use crate::models::ApplicationResult;
use crate::scoring::JobScore;

/// Pause between a failed attempt and the next one.
pub const RETRY_PAUSE: Duration = Duration::from_millis(500);

pub struct ApplicationOrchestrator {
    factory: Arc<dyn AutomationFactory>,
    delay: Arc<dyn Delay>,
    settings: AutomationSettings,
    user: UserProfile,
    resume_path: PathBuf,
    applied: HashSet<String>,
}

impl ApplicationOrchestrator {
    pub fn new(
        config: &AgentConfig,
        factory: Arc<dyn AutomationFactory>,
        delay: Arc<dyn Delay>,
    ) -> Self {
        Self {
            factory,
            delay,
            settings: config.automation.clone(),
            user: config.user.clone(),
            resume_path: config.resume.path.clone(),
            applied: HashSet::new(),
        }
    }

    /// Ids attempted so far by this instance.
    pub fn applied_ids(&self) -> &HashSet<String> {
        &self.applied
    }

    /// Applies to `ranked` in order, stopping once `limit` results exist.
    ///
    /// The session is released on every path. A backend `Err` aborts the rest of
    /// the batch and is returned after release.
    pub async fn apply(
        &mut self,
        ranked: &[JobScore],
        limit: Option<usize>,
    ) -> Result<Vec<ApplicationResult>, AppError> {
        if ranked.is_empty() || limit == Some(0) {
            return Ok(Vec::new());
        }

        let mut session = self.factory.acquire(&self.settings).await?;
        let outcome = self.run_batch(session.as_mut(), ranked, limit).await;

        if let Err(e) = session.release().await {
            warn!("Failed to release automation session: {}", e);
        }
        Ok(outcome?)
    }

    async fn run_batch(
        &mut self,
        session: &mut dyn AutomationSession,
        ranked: &[JobScore],
        limit: Option<usize>,
    ) -> Result<Vec<ApplicationResult>, AutomationError> {
        let max_attempts = self.settings.max_attempts_per_job.max(1);
        let mut results = Vec::new();

        for score in ranked {
            if limit.is_some_and(|cap| results.len() >= cap) {
                break;
            }
            let job = &score.job;
            if self.applied.contains(&job.id) {
                info!("Skipping already processed job {}", job.id);
                continue;
            }

            info!(
                "Applying to {} at {} (score {:.3})",
                job.title, job.company, score.composite
            );
            let mut attempts = 0;
            let mut success = false;
            let mut message = String::new();

            while attempts < max_attempts {
                attempts += 1;
                let outcome = session
                    .apply_to_job(job, &self.user, &self.resume_path)
                    .await?;
                success = outcome.success;
                message = outcome.message;
                if success {
                    break;
                }
                warn!(
                    "Attempt {}/{} for {} failed: {}",
                    attempts, max_attempts, job.id, message
                );
                if attempts < max_attempts {
                    self.delay.pause(RETRY_PAUSE).await;
                }
            }

            self.applied.insert(job.id.clone());
            results.push(ApplicationResult {
                job: job.clone(),
                success,
                attempts,
                message,
            });
            self.delay.pause(self.settings.cooldown()).await;
        }

        Ok(results)
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::automation::{
        ApplyOutcome, AutomationError, AutomationFactory, AutomationSession,
    };
    use crate::config::{AutomationSettings, UserProfile};
    use crate::models::JobPosting;

    /// Scripted backend behaviour for one job id.
    #[derive(Debug, Clone)]
    pub enum Script {
        Succeed,
        /// Fails this many times, then succeeds.
        FailTimes(u32),
        AlwaysFail,
        Broken,
    }

    #[derive(Debug, Default)]
    pub struct Ledger {
        pub acquired: usize,
        pub released: usize,
        pub calls: Vec<String>,
    }

    /// Factory whose sessions follow a per-job script and log every call.
    #[derive(Clone, Default)]
    pub struct FakeFactory {
        pub scripts: HashMap<String, Script>,
        pub ledger: Arc<Mutex<Ledger>>,
    }

    impl FakeFactory {
        pub fn with(scripts: &[(&str, Script)]) -> Self {
            Self {
                scripts: scripts
                    .iter()
                    .map(|(id, s)| (id.to_string(), s.clone()))
                    .collect(),
                ledger: Arc::default(),
            }
        }

        pub fn calls_for(&self, id: &str) -> usize {
            self.ledger
                .lock()
                .unwrap()
                .calls
                .iter()
                .filter(|c| c.as_str() == id)
                .count()
        }
    }

    struct FakeSession {
        scripts: HashMap<String, Script>,
        ledger: Arc<Mutex<Ledger>>,
    }

    #[async_trait]
    impl AutomationFactory for FakeFactory {
        async fn acquire(
            &self,
            _settings: &AutomationSettings,
        ) -> Result<Box<dyn AutomationSession>, AutomationError> {
            self.ledger.lock().unwrap().acquired += 1;
            Ok(Box::new(FakeSession {
                scripts: self.scripts.clone(),
                ledger: Arc::clone(&self.ledger),
            }))
        }
    }

    #[async_trait]
    impl AutomationSession for FakeSession {
        async fn apply_to_job(
            &mut self,
            job: &JobPosting,
            _user: &UserProfile,
            _resume_path: &Path,
        ) -> Result<ApplyOutcome, AutomationError> {
            let previous = {
                let mut ledger = self.ledger.lock().unwrap();
                let previous = ledger.calls.iter().filter(|c| **c == job.id).count() as u32;
                ledger.calls.push(job.id.clone());
                previous
            };
            match self.scripts.get(&job.id).cloned().unwrap_or(Script::Succeed) {
                Script::Succeed => Ok(ApplyOutcome::submitted("Application submitted")),
                Script::FailTimes(n) if previous < n => {
                    Ok(ApplyOutcome::failed(format!("failure {}", previous + 1)))
                }
                Script::FailTimes(_) => Ok(ApplyOutcome::submitted("Application submitted")),
                Script::AlwaysFail => Ok(ApplyOutcome::failed("Form not submitted")),
                Script::Broken => Err(AutomationError::Backend("page crashed".to_string())),
            }
        }

        async fn release(&mut self) -> Result<(), AutomationError> {
            self.ledger.lock().unwrap().released += 1;
            Ok(())
        }
    }
}
