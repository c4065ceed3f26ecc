mod cache;
mod cli;
mod connector;
mod gitlab;
mod jira;
mod pipeline;
mod summary;
#[cfg(test)]
mod testing;
mod ticket;
mod timer;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use trailmark_common::RunInfo;
use trailmark_config::{init_tracing, AppConfig};
use trailmark_store::commits::csv_repository::CsvCommitTable;
use trailmark_store::commits::repositories::EnrichedCommitRepository;
use trailmark_store::issues::csv_repository::CsvIssueExport;

use crate::cli::{Cli, Commands, ExtractArgs};
use crate::gitlab::client::{GitLabClient, GitLabClientConfig};
use crate::jira::client::{JiraClient, JiraClientConfig};
use crate::jira::export::AssigneeExport;
use crate::jira::resolver::IssueResolver;
use crate::pipeline::{EnrichmentPipeline, PipelineConfig};
use crate::ticket::TicketFilter;
use crate::timer::StatusTimer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing("info");

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("failed to load config")?;

    let run = RunInfo::new("trailmark-ingest");
    tracing::info!(
        service = %run.service,
        version = %run.version,
        run_id = %run.run_id,
        "starting"
    );

    let jira_config = JiraClientConfig::from_env()
        .map_err(anyhow::Error::msg)?
        .context("jira is not configured: set JIRA_BASE_URL, JIRA_EMAIL and JIRA_API_TOKEN")?;
    tracing::info!(
        projects = ?jira_config.project_keys,
        story_points_field = %jira_config.story_points_field,
        "jira connector configured"
    );
    let jira = JiraClient::new(jira_config).context("failed to create jira client")?;
    let me = jira
        .verify_auth()
        .await
        .context("jira authentication failed")?;
    tracing::info!(account = %me.account_id, "jira authentication ok");

    match cli.command {
        Commands::Extract(args) => run_extract(args, config, jira).await,
        Commands::Assignee {
            name,
            status,
            output,
        } => run_assignee(&name, &status, output, config, jira).await,
    }
}

async fn run_extract(args: ExtractArgs, mut config: AppConfig, jira: JiraClient) -> anyhow::Result<()> {
    args.apply(&mut config).context("invalid extract options")?;

    let gitlab_config = GitLabClientConfig::from_env()
        .context("gitlab is not configured: set GITLAB_BASE_URL and GITLAB_PRIVATE_TOKEN")?;
    let gitlab = GitLabClient::new(gitlab_config).context("failed to create gitlab client")?;
    let user = gitlab
        .verify_auth()
        .await
        .context("gitlab authentication failed")?;
    tracing::info!(user = %user.username, "gitlab authentication ok");

    let ticket_filter = TicketFilter::new(jira.config().project_keys.clone());
    let resolver = IssueResolver::new(jira, StatusTimer::new(config.tracked_states.clone()));
    let pipeline_config = PipelineConfig {
        group: args.group.clone(),
        include_subgroups: args.include_subgroups,
        window: config.window,
        workers: config.workers,
        dedup_commits: args.dedup_commits,
        ticket_filter,
    };
    tracing::info!(
        group = %pipeline_config.group,
        since = %config.window.since,
        until = %config.window.until,
        workers = config.workers,
        "starting extraction"
    );

    let output = EnrichmentPipeline::new(gitlab, resolver, pipeline_config)
        .run()
        .await
        .context("extraction failed")?;

    let table = CsvCommitTable::new(&config.output_path, config.tracked_states.clone());
    let written = table
        .write_all(&output.rows)
        .with_context(|| format!("failed to write {}", config.output_path.display()))?;

    let summary = &output.summary;
    tracing::info!(
        path = %config.output_path.display(),
        rows = written,
        commits = summary.commits_processed,
        with_ticket = summary.commits_with_ticket,
        without_ticket = summary.commits_without_ticket,
        commit_errors = summary.commit_errors,
        distinct_tickets = summary.distinct_tickets,
        tickets_resolved = summary.tickets_resolved,
        tickets_errored = summary.tickets_errored,
        cache_hits = summary.cache_hits,
        elapsed_secs = summary.elapsed.as_secs_f64(),
        "extraction completed"
    );
    Ok(())
}

async fn run_assignee(
    name: &str,
    status: &str,
    output: PathBuf,
    config: AppConfig,
    jira: JiraClient,
) -> anyhow::Result<()> {
    let resolver = IssueResolver::new(jira, StatusTimer::new(config.tracked_states.clone()));
    let export = CsvIssueExport::new(&output, config.tracked_states);

    let summary = AssigneeExport::new(resolver, export, config.workers)
        .run(name, status)
        .await
        .with_context(|| format!("assignee export for {name} failed"))?;

    tracing::info!(
        path = %output.display(),
        issues = summary.issues_found,
        rows = summary.rows_written,
        "wrote assignee export"
    );
    Ok(())
}
