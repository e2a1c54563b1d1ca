//! Resume scoring: measures how much of a resume's vocabulary a posting reuses.
//!
//! The resume is tokenised once at construction; `score` is pure after that.
//! `rank` orders postings for the application loop.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::JobPosting;

/// Weight of the keyword overlap in the composite score.
const KEYWORD_WEIGHT: f64 = 0.7;
/// Weight of the skills overlap in the composite score.
const SKILLS_WEIGHT: f64 = 0.3;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "that", "this", "have", "your", "will", "into", "such",
];

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// A posting with its relevance against the resume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobScore {
    pub job: JobPosting,
    pub skills_overlap: f64,
    pub keyword_overlap: f64,
    /// 0.7 × keyword_overlap + 0.3 × skills_overlap, in [0, 1].
    pub composite: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// Scorer
// ────────────────────────────────────────────────────────────────────────────

/// Token-overlap scorer built once per resume.
#[derive(Debug, Clone)]
pub struct ResumeScorer {
    resume_counts: HashMap<String, usize>,
    resume_total: usize,
    skills: HashSet<String>,
}

impl ResumeScorer {
    pub fn new(resume_text: &str, skills: &[String]) -> Self {
        let resume_counts = count_tokens(tokenise(resume_text));
        let resume_total = resume_counts.values().sum();
        Self {
            resume_counts,
            resume_total,
            skills: skills.iter().map(|s| s.trim().to_lowercase()).collect(),
        }
    }

    /// Scores one posting against the cached resume tokens.
    ///
    /// keyword_overlap = Σ min(resume_count[t], posting_count[t]) / resume token total
    /// skills_overlap  = |posting tokens ∩ skills| / |skills|
    pub fn score(&self, job: &JobPosting) -> JobScore {
        let text = format!(
            "{} {} {}",
            job.title,
            job.description.as_deref().unwrap_or(""),
            job.tags.join(" ")
        );
        let job_counts = count_tokens(tokenise(&text));

        let intersection: usize = job_counts
            .iter()
            .map(|(token, &count)| count.min(self.resume_counts.get(token).copied().unwrap_or(0)))
            .sum();
        let keyword_overlap = intersection as f64 / self.resume_total.max(1) as f64;

        let skills_overlap = if self.skills.is_empty() {
            0.0
        } else {
            let matched = self
                .skills
                .iter()
                .filter(|skill| job_counts.contains_key(skill.as_str()))
                .count();
            matched as f64 / self.skills.len() as f64
        };

        JobScore {
            job: job.clone(),
            skills_overlap,
            keyword_overlap,
            composite: KEYWORD_WEIGHT * keyword_overlap + SKILLS_WEIGHT * skills_overlap,
        }
    }

    /// Scores every posting and sorts by composite, newest first on ties.
    pub fn rank<'a, I>(&self, jobs: I) -> Vec<JobScore>
    where
        I: IntoIterator<Item = &'a JobPosting>,
    {
        let mut scores: Vec<JobScore> = jobs.into_iter().map(|job| self.score(job)).collect();
        sort_scores(&mut scores);
        scores
    }
}

/// Descending by `(composite, published_at)`. `sort_by` is stable.
pub fn sort_scores(scores: &mut [JobScore]) {
    scores.sort_by(|a, b| {
        b.composite
            .partial_cmp(&a.composite)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.job.published_at.cmp(&a.job.published_at))
    });
}

fn tokenise(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(|word| word.trim().to_lowercase())
        .filter(|word| !word.is_empty() && !STOP_WORDS.contains(&word.as_str()))
}

fn count_tokens(tokens: impl Iterator<Item = String>) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for token in tokens {
        *counts.entry(token).or_insert(0) += 1;
    }
    counts
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
