use std::collections::HashMap;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Search parameters handed to every job source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobQuery {
    pub keywords: Vec<String>,
    pub location: Option<String>,
    pub remote_only: bool,
    pub posted_within_days: Option<u32>,
}

impl JobQuery {
    pub fn new(keywords: Vec<String>) -> Self {
        Self {
            keywords,
            location: None,
            remote_only: false,
            posted_within_days: None,
        }
    }

    /// Keyword string for HTTP APIs.
    pub fn to_keywords(&self) -> String {
        self.keywords.join(" ")
    }
}

/// A job returned by a source. Identity is `id`, which sources namespace
/// (`remotive-1234`) so it stays unique across sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub apply_url: Option<String>,
    pub description: Option<String>,
    pub salary: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl JobPosting {
    /// URL the automation backend navigates to.
    pub fn target_url(&self) -> &str {
        self.apply_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .unwrap_or(&self.url)
    }

    /// Whole days elapsed since publication, relative to `now`.
    pub fn age_in_days(&self, now: DateTime<Utc>) -> i64 {
        (now - self.published_at).num_days()
    }

    pub fn is_within_age(&self, max_age_days: Option<u32>, now: DateTime<Utc>) -> bool {
        match max_age_days {
            None => true,
            Some(max) => self.age_in_days(now) <= i64::from(max),
        }
    }
}

impl PartialEq for JobPosting {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for JobPosting {}

/// Keeps postings at most `max_age_days` whole days old, in their original order.
pub fn filter_jobs_by_age(
    mut jobs: Vec<JobPosting>,
    max_age_days: Option<u32>,
    now: DateTime<Utc>,
) -> Vec<JobPosting> {
    if max_age_days.is_some() {
        jobs.retain(|job| job.is_within_age(max_age_days, now));
    }
    jobs
}

/// Parses a publication timestamp. Values without an offset are taken as UTC.
pub fn parse_published(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::Duration;

    /// Minimal posting published `hours_ago` hours before `now`.
    pub fn posting(id: &str, company: &str, hours_ago: i64, now: DateTime<Utc>) -> JobPosting {
        JobPosting {
            id: id.to_string(),
            title: format!("Job {id}"),
            company: company.to_string(),
            location: "Remote".to_string(),
            url: format!("https://example.com/{id}"),
            source: "fake".to_string(),
            published_at: now - Duration::hours(hours_ago),
            apply_url: None,
            description: None,
            salary: None,
            tags: vec![],
            metadata: HashMap::new(),
        }
    }
}
