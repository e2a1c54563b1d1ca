//! Discovery: queries every source across freshness buckets and locations,
//! keeping the first occurrence of each posting id.
//!
//! Buckets run tightest first so sources with a hard per-call cap surface the
//! freshest postings early; wider buckets only add ids not seen yet.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::SearchPreferences;
use crate::models::{JobPosting, JobQuery};
use crate::sources::JobSource;

/// Runs discovery with the current time as the age reference.
pub async fn discover(sources: &[Box<dyn JobSource>], prefs: &SearchPreferences) -> Vec<JobPosting> {
    discover_at(sources, prefs, Utc::now()).await
}

/// Discovery against an explicit `now`. Postings come back in first-seen order.
pub async fn discover_at(
    sources: &[Box<dyn JobSource>],
    prefs: &SearchPreferences,
    now: DateTime<Utc>,
) -> Vec<JobPosting> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut collected: Vec<JobPosting> = Vec::new();
    let excluded: HashSet<String> = prefs
        .exclude_companies
        .iter()
        .map(|company| company.to_lowercase())
        .collect();

    let locations: Vec<Option<&str>> = if prefs.locations.is_empty() {
        vec![None]
    } else {
        prefs.locations.iter().map(|l| Some(l.as_str())).collect()
    };

    for &bucket in &prefs.freshness_buckets {
        let bucket = u32::try_from(bucket).unwrap_or(u32::MAX);
        let effective_age = match prefs.max_age_days {
            Some(max) => bucket.min(max),
            None => bucket,
        };

        for location in &locations {
            let query = JobQuery {
                location: location.map(String::from),
                remote_only: prefs.remote_only,
                posted_within_days: Some(effective_age),
                ..JobQuery::new(prefs.keywords.clone())
            };

            for source in sources {
                let jobs = match source.search(&query, prefs.limit_per_bucket).await {
                    Ok(jobs) => jobs,
                    Err(e) => {
                        warn!("Failed to fetch jobs from {}: {}", source.name(), e);
                        continue;
                    }
                };
                debug!(
                    "{} returned {} postings (bucket={}d, location={:?})",
                    source.name(),
                    jobs.len(),
                    effective_age,
                    location
                );

                for job in jobs {
                    if seen.contains(&job.id) {
                        continue;
                    }
                    if excluded.contains(&job.company.to_lowercase()) {
                        debug!("Skipping {} from excluded company {}", job.id, job.company);
                        continue;
                    }
                    if !job.is_within_age(prefs.max_age_days, now) {
                        continue;
                    }
                    seen.insert(job.id.clone());
                    collected.push(job);
                }
            }
        }
    }

    info!("Discovered {} unique postings", collected.len());
    collected
}
