use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;

/// Candidate resume location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeConfig {
    pub path: PathBuf,
    /// Extracted text is cached here so the PDF is parsed once.
    #[serde(default)]
    pub parsed_text_cache: Option<PathBuf>,
}

/// Preferences used to discover and filter postings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchPreferences {
    pub keywords: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub remote_only: bool,
    #[serde(default = "default_max_age_days")]
    pub max_age_days: Option<u32>,
    /// Rolling windows (days), tightest first after validation.
    #[serde(default = "default_freshness_buckets")]
    pub freshness_buckets: Vec<i64>,
    #[serde(default = "default_limit_per_bucket")]
    pub limit_per_bucket: usize,
    #[serde(default)]
    pub exclude_companies: Vec<String>,
}

/// Settings for the automation backend and the application loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationSettings {
    #[serde(default = "default_headless")]
    pub headless: bool,
    /// Seconds to wait after each navigation.
    #[serde(default = "default_wait_after_navigation")]
    pub wait_after_navigation: f64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts_per_job: u32,
    /// Seconds to pause after every job.
    #[serde(default = "default_cooldown")]
    pub cooldown_between_jobs: f64,
}

impl Default for AutomationSettings {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            wait_after_navigation: default_wait_after_navigation(),
            max_attempts_per_job: default_max_attempts(),
            cooldown_between_jobs: default_cooldown(),
        }
    }
}

impl AutomationSettings {
    pub fn navigation_wait(&self) -> Duration {
        Duration::from_secs_f64(self.wait_after_navigation)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs_f64(self.cooldown_between_jobs)
    }
}

/// Candidate details used to fill application forms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    /// Portfolio or social links.
    #[serde(default)]
    pub links: Vec<String>,
}

/// Top-level configuration for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    pub user: UserProfile,
    pub resume: ResumeConfig,
    pub search: SearchPreferences,
    #[serde(default)]
    pub automation: AutomationSettings,
}

fn default_max_age_days() -> Option<u32> {
    Some(7)
}

fn default_freshness_buckets() -> Vec<i64> {
    vec![1, 3, 7]
}

fn default_limit_per_bucket() -> usize {
    25
}

fn default_headless() -> bool {
    true
}

fn default_wait_after_navigation() -> f64 {
    2.0
}

fn default_max_attempts() -> u32 {
    3
}

fn default_cooldown() -> f64 {
    1.0
}

impl AgentConfig {
    /// Loads configuration from a JSON or YAML file (chosen by extension) and validates it.
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let path = expand_home(path);
        if !path.exists() {
            return Err(AppError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(&path)?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| matches!(ext.to_lowercase().as_str(), "yaml" | "yml"))
            .unwrap_or(false);

        let config = if is_yaml {
            Self::from_yaml_str(&content)?
        } else {
            Self::from_json_str(&content)?
        };
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_json_str(content: &str) -> Result<Self, AppError> {
        let config: AgentConfig = serde_json::from_str(content)
            .map_err(|e| AppError::config(format!("Invalid JSON configuration: {e}")))?;
        config.validate()
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, AppError> {
        let config: AgentConfig = serde_yaml::from_str(content)
            .map_err(|e| AppError::config(format!("Invalid YAML configuration: {e}")))?;
        config.validate()
    }

    /// Checks every constraint and normalises freshness buckets (sorted, deduplicated).
    pub fn validate(mut self) -> Result<Self, AppError> {
        let resume = &self.resume.path;
        if !resume.is_file() {
            return Err(AppError::config(format!(
                "Resume file does not exist: {}",
                resume.display()
            )));
        }
        let is_pdf = resume
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if !is_pdf {
            return Err(AppError::config("Resume file must be a PDF"));
        }

        let buckets = &mut self.search.freshness_buckets;
        if buckets.is_empty() {
            return Err(AppError::config(
                "freshness_buckets must contain at least one value",
            ));
        }
        if buckets.iter().any(|&b| b <= 0) {
            return Err(AppError::config(
                "freshness_buckets must only contain positive integers",
            ));
        }
        buckets.sort_unstable();
        buckets.dedup();

        let automation = &self.automation;
        if automation.max_attempts_per_job < 1 {
            return Err(AppError::config("max_attempts_per_job must be at least 1"));
        }
        for (name, value) in [
            ("wait_after_navigation", automation.wait_after_navigation),
            ("cooldown_between_jobs", automation.cooldown_between_jobs),
        ] {
            if Duration::try_from_secs_f64(value).is_err() {
                return Err(AppError::config(format!(
                    "{name} must be a non-negative number of seconds within range, got {value}"
                )));
            }
        }

        Ok(self)
    }
}

/// Process-level settings read from the environment (`.env` honoured).
#[derive(Debug, Clone)]
pub struct EnvSettings {
    pub rust_log: String,
}

impl EnvSettings {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        EnvSettings {
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }
}

fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}
