use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use trailmark_common::{TrailmarkError, TrailmarkResult};
use trailmark_config::window::parse_date;
use trailmark_config::{AppConfig, DateWindow};

pub const DEFAULT_ISSUE_EXPORT: &str = "jira_issues.csv";

#[derive(Parser)]
#[command(name = "trailmark-ingest")]
#[command(about = "Join GitLab commits with the Jira issues their titles reference")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract every commit of a group and enrich it with Jira issue data
    Extract(ExtractArgs),

    /// Export the Jira issues of one assignee in one status
    Assignee {
        /// Assignee as shown in Jira (e.g. "Lee, Ann, Acme")
        #[arg(long)]
        name: String,

        #[arg(long, default_value = "Done")]
        status: String,

        #[arg(short, long, default_value = DEFAULT_ISSUE_EXPORT)]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// GitLab group id or full path
    #[arg(long, env = "GITLAB_GROUP")]
    pub group: String,

    #[arg(long)]
    pub include_subgroups: bool,

    /// First commit date included (YYYY-MM-DD)
    #[arg(long)]
    pub since: Option<String>,

    /// Last commit date included (YYYY-MM-DD)
    #[arg(long)]
    pub until: Option<String>,

    /// Concurrent commit enrichments
    #[arg(long)]
    pub workers: Option<usize>,

    /// Output CSV path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Keep one row per commit when it is reachable from several branches
    #[arg(long)]
    pub dedup_commits: bool,
}

impl ExtractArgs {
    /// Flags take precedence over the environment.
    pub fn apply(&self, config: &mut AppConfig) -> TrailmarkResult<()> {
        let since = match &self.since {
            Some(raw) => parse_date("--since", raw)?,
            None => config.window.since,
        };
        let until = match &self.until {
            Some(raw) => parse_date("--until", raw)?,
            None => config.window.until,
        };
        config.window = DateWindow::new(since, until)?;

        if let Some(workers) = self.workers {
            if workers == 0 {
                return Err(TrailmarkError::Config(
                    "--workers must be at least 1".to_owned(),
                ));
            }
            config.workers = workers;
        }
        if let Some(output) = &self.output {
            config.output_path = output.clone();
        }
        Ok(())
    }
}
