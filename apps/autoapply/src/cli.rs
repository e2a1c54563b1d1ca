use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use crate::agent::AutoApplyAgent;
use crate::config::AgentConfig;
use crate::models::ApplicationResult;
use crate::sources::create_sources;

#[derive(Debug, Parser)]
#[command(name = "autoapply")]
#[command(about = "Discover fresh job postings, rank them against your resume and apply")]
pub struct Cli {
    /// Path to the agent configuration file (JSON or YAML)
    pub config: PathBuf,

    /// Maximum number of applications
    #[arg(long)]
    pub limit: Option<usize>,

    /// Job sources to use (repeatable; currently only "remotive")
    #[arg(long = "source", default_value = "remotive")]
    pub sources: Vec<String>,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AgentConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    let sources = create_sources(&cli.sources).context("Failed to set up job sources")?;

    let mut agent = AutoApplyAgent::new(config, sources);
    let results = agent
        .apply(cli.limit)
        .await
        .context("Application run aborted")?;

    for line in render_summary(&results) {
        println!("{line}");
    }
    Ok(())
}

/// Lines printed after a run.
pub fn render_summary(results: &[ApplicationResult]) -> Vec<String> {
    if results.is_empty() {
        return vec!["No applications were submitted.".to_string()];
    }

    let successes = results.iter().filter(|r| r.success).count();
    let mut lines = vec![
        format!("Applications attempted: {}", results.len()),
        format!("Successful submissions: {}", successes),
    ];
    lines.extend(results.iter().map(|r| {
        format!(
            "{} {} at {} - {}",
            r.status_marker(),
            r.job.title,
            r.job.company,
            r.message
        )
    }));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::posting::fixtures::posting;
    use chrono::Utc;

    fn result(id: &str, success: bool, message: &str) -> ApplicationResult {
        let mut job = posting(id, "Acme", 1, Utc::now());
        job.title = "Rust Engineer".to_string();
        ApplicationResult {
            job,
            success,
            attempts: 1,
            message: message.to_string(),
        }
    }

    #[test]
    fn test_empty_summary() {
        assert_eq!(render_summary(&[]), vec!["No applications were submitted."]);
    }

    #[test]
    fn test_summary_counts_and_lines() {
        let lines = render_summary(&[
            result("a", true, "Application submitted"),
            result("b", false, "Form not submitted"),
        ]);
        assert_eq!(
            lines,
            vec![
                "Applications attempted: 2",
                "Successful submissions: 1",
                "✅ Rust Engineer at Acme - Application submitted",
                "⚠️ Rust Engineer at Acme - Form not submitted",
            ]
        );
    }

    #[test]
    fn test_parse_arguments() {
        let cli = Cli::parse_from([
            "autoapply",
            "config.yaml",
            "--limit",
            "5",
            "--source",
            "remotive",
            "--source",
            "Remotive",
        ]);
        assert_eq!(cli.config, PathBuf::from("config.yaml"));
        assert_eq!(cli.limit, Some(5));
        assert_eq!(cli.sources, vec!["remotive", "Remotive"]);
    }

    #[test]
    fn test_default_source() {
        let cli = Cli::parse_from(["autoapply", "config.json"]);
        assert_eq!(cli.limit, None);
        assert_eq!(cli.sources, vec!["remotive"]);
    }

    #[test]
    fn test_config_path_required() {
        assert!(Cli::try_parse_from(["autoapply"]).is_err());
    }

    #[tokio::test]
    async fn test_run_fails_on_missing_config() {
        let cli = Cli::parse_from(["autoapply", "/nonexistent/autoapply.yaml"]);
        let err = run(cli).await.unwrap_err();
        assert!(err.to_string().contains("Failed to load configuration"));
    }
}
