//! Remotive public API source (`GET /api/remote-jobs`).

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{JobSource, SourceError};
use crate::errors::AppError;
use crate::models::{filter_jobs_by_age, parse_published, JobPosting, JobQuery};

const REMOTIVE_API_URL: &str = "https://remotive.com/api/remote-jobs";
const SOURCE_NAME: &str = "remotive";
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct RemotivePayload {
    #[serde(default)]
    jobs: Vec<RemotiveJob>,
}

#[derive(Debug, Deserialize)]
struct RemotiveJob {
    id: Value,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    company_name: Option<String>,
    #[serde(default)]
    candidate_required_location: Option<String>,
    publication_date: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    salary: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    job_type: Option<Value>,
    #[serde(default)]
    category: Option<Value>,
}

/// Fetches postings from the Remotive public API.
#[derive(Clone)]
pub struct RemotiveJobSource {
    client: Client,
    api_url: String,
}

impl RemotiveJobSource {
    pub fn new() -> Result<Self, AppError> {
        Self::with_api_url(REMOTIVE_API_URL)
    }

    /// Points the source at another endpoint (mirrors, tests).
    pub fn with_api_url(api_url: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }

    fn http_error(error: reqwest::Error) -> SourceError {
        SourceError::Http {
            source_name: SOURCE_NAME.to_string(),
            error,
        }
    }
}

#[async_trait]
impl JobSource for RemotiveJobSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn search(&self, query: &JobQuery, limit: usize) -> Result<Vec<JobPosting>, SourceError> {
        let mut params = vec![
            ("search", query.to_keywords()),
            ("limit", limit.to_string()),
        ];
        if let Some(location) = &query.location {
            params.push(("location", location.clone()));
        }

        debug!("Querying Remotive: {:?}", params);
        let response = self
            .client
            .get(&self.api_url)
            .query(&params)
            .send()
            .await
            .map_err(Self::http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                source_name: SOURCE_NAME.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(Self::http_error)?;
        let payload: RemotivePayload =
            serde_json::from_str(&body).map_err(|e| SourceError::Parse {
                source_name: SOURCE_NAME.to_string(),
                message: e.to_string(),
            })?;

        Ok(convert_jobs(payload.jobs, query, Utc::now()))
    }
}

/// Maps API rows to postings, applying the query's age and remote filters.
fn convert_jobs(jobs: Vec<RemotiveJob>, query: &JobQuery, now: DateTime<Utc>) -> Vec<JobPosting> {
    let mut postings = Vec::with_capacity(jobs.len());

    for job in jobs {
        let id = match &job.id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let Some(published) = parse_published(&job.publication_date) else {
            warn!(
                "Skipping Remotive job {} with unparseable publication_date '{}'",
                id, job.publication_date
            );
            continue;
        };

        let location = job
            .candidate_required_location
            .unwrap_or_else(|| "Remote".to_string());
        if query.remote_only && !location.to_lowercase().contains("remote") {
            continue;
        }

        let mut metadata = HashMap::new();
        metadata.insert("job_type".to_string(), job.job_type.unwrap_or(Value::Null));
        metadata.insert("category".to_string(), job.category.unwrap_or(Value::Null));

        let url = job.url.unwrap_or_default();
        postings.push(JobPosting {
            id: format!("{SOURCE_NAME}-{id}"),
            title: job.title.unwrap_or_default(),
            company: job.company_name.unwrap_or_else(|| "Unknown".to_string()),
            location,
            apply_url: Some(url.clone()).filter(|u| !u.is_empty()),
            url,
            source: SOURCE_NAME.to_string(),
            published_at: published,
            description: job.description,
            salary: job.salary,
            tags: job.tags,
            metadata,
        });
    }

    filter_jobs_by_age(postings, query.posted_within_days.filter(|&d| d > 0), now)
}
