use std::collections::HashSet;
use std::time::Instant;

use futures::stream::{self, StreamExt};
use trailmark_common::{TrailmarkError, TrailmarkResult};
use trailmark_config::DateWindow;
use trailmark_store::{CommitRecord, CommitStats, EnrichedCommit, IssueRecord};

use crate::cache::IssueCache;
use crate::connector::{CommitSource, IssueSource};
use crate::gitlab::models::{summarize_diffs, GitLabCommit, GitLabProject};
use crate::jira::resolver::IssueResolver;
use crate::summary::RunSummary;
use crate::ticket::{extract_ticket, TicketFilter};

const COMMIT_DETAIL_ERROR: &str = "Error extracting changes";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub group: String,
    pub include_subgroups: bool,
    pub window: DateWindow,
    pub workers: usize,
    /// Drop repeats of a commit reachable from several branches.
    pub dedup_commits: bool,
    pub ticket_filter: TicketFilter,
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub rows: Vec<EnrichedCommit>,
    pub summary: RunSummary,
}

/// Walks a GitLab group and joins every commit with the Jira issue its title references.
pub struct EnrichmentPipeline<C, I> {
    commits: C,
    resolver: IssueResolver<I>,
    cache: IssueCache,
    config: PipelineConfig,
}

impl<C, I> EnrichmentPipeline<C, I>
where
    C: CommitSource,
    I: IssueSource,
{
    pub fn new(commits: C, resolver: IssueResolver<I>, config: PipelineConfig) -> Self {
        Self {
            commits,
            resolver,
            cache: IssueCache::new(),
            config,
        }
    }

    pub async fn run(&self) -> TrailmarkResult<PipelineOutput> {
        let started = Instant::now();
        let mut summary = RunSummary::default();
        let window = &self.config.window;
        let workers = self.config.workers.max(1);

        let projects = self
            .commits
            .list_group_projects(&self.config.group, self.config.include_subgroups)
            .await
            .map_err(|e| {
                TrailmarkError::Upstream(format!(
                    "failed to list projects of group {}: {e}",
                    self.config.group
                ))
            })?;
        summary.projects_seen = projects.len();
        tracing::info!(group = %self.config.group, projects = projects.len(), "listed group projects");

        let mut seen: HashSet<(u64, String)> = HashSet::new();
        let mut rows = Vec::new();

        for project in &projects {
            let branches = match self.commits.list_branches(project.id).await {
                Ok(branches) => branches,
                Err(e) => {
                    tracing::warn!(project = %project.name, error = %e, "failed to list branches, skipping project");
                    summary.projects_skipped += 1;
                    continue;
                }
            };

            for branch in &branches {
                summary.branches_seen += 1;
                let listed = match self
                    .commits
                    .list_commits(project.id, &branch.name, window)
                    .await
                {
                    Ok(listed) => listed,
                    Err(e) => {
                        tracing::warn!(
                            project = %project.name,
                            branch = %branch.name,
                            error = %e,
                            "failed to list commits, skipping branch"
                        );
                        summary.branches_skipped += 1;
                        continue;
                    }
                };

                let mut batch = Vec::with_capacity(listed.len());
                for commit in listed {
                    if !commit.committed_date.is_none_or(|at| window.contains(&at)) {
                        summary.commits_outside_window += 1;
                        continue;
                    }
                    if self.config.dedup_commits && !seen.insert((project.id, commit.id.clone())) {
                        summary.duplicates_dropped += 1;
                        continue;
                    }
                    batch.push(commit);
                }

                tracing::debug!(
                    project = %project.name,
                    branch = %branch.name,
                    commits = batch.len(),
                    "enriching branch commits"
                );
                let enriched: Vec<EnrichedCommit> = stream::iter(batch)
                    .map(|commit| self.enrich(project, commit))
                    .buffer_unordered(workers)
                    .collect()
                    .await;
                rows.extend(enriched);
            }
        }

        rows.sort_by(|a, b| {
            (&a.commit.project_name, a.commit.committed_at, &a.commit.short_id).cmp(&(
                &b.commit.project_name,
                b.commit.committed_at,
                &b.commit.short_id,
            ))
        });

        summary.record_rows(&rows);
        summary.record_cache(self.cache.stats().await);
        summary.elapsed = started.elapsed();
        tracing::info!(?summary, "enrichment completed");

        Ok(PipelineOutput { rows, summary })
    }

    async fn enrich(&self, project: &GitLabProject, listed: GitLabCommit) -> EnrichedCommit {
        let detail = match self.commits.fetch_commit(project.id, &listed.id).await {
            Ok(detail) => detail,
            Err(e) => {
                tracing::warn!(project = %project.name, commit = %listed.short_id, error = %e, "failed to fetch commit");
                return EnrichedCommit {
                    commit: commit_record(project, &listed, COMMIT_DETAIL_ERROR.to_string()),
                    extracted_ticket: None,
                    issue: None,
                    error: Some(e.to_string()),
                };
            }
        };

        let changes = match self.commits.fetch_commit_diff(project.id, &detail.id).await {
            Ok(diffs) => summarize_diffs(&diffs),
            Err(e) => {
                tracing::warn!(project = %project.name, commit = %detail.short_id, error = %e, "failed to fetch diff");
                format!("Error extracting diff: {e}")
            }
        };

        let commit = commit_record(project, &detail, changes);
        let extracted_ticket = extract_ticket(&commit.title).map(str::to_owned);
        let issue = match &extracted_ticket {
            Some(key) => self.lookup_issue(key).await,
            None => None,
        };
        tracing::debug!(commit = %commit.short_id, ticket = ?extracted_ticket, "enriched commit");

        EnrichedCommit {
            commit,
            extracted_ticket,
            issue,
            error: None,
        }
    }

    async fn lookup_issue(&self, key: &str) -> Option<IssueRecord> {
        if !self.config.ticket_filter.allows(key) {
            tracing::debug!(key, "ticket project not allowed, not resolving");
            return None;
        }
        Some(self.cache.get_or_fetch(key, || self.resolver.resolve(key)).await)
    }
}

fn commit_record(project: &GitLabProject, commit: &GitLabCommit, changes: String) -> CommitRecord {
    CommitRecord {
        project_name: project.name.clone(),
        short_id: commit.short_id.clone(),
        author_name: commit.author_name.clone(),
        author_email: commit.author_email.clone(),
        committed_at: commit.committed_date,
        title: commit.title.clone(),
        stats: commit.stats.map(|s| CommitStats {
            additions: s.additions,
            deletions: s.deletions,
            total: s.total,
        }),
        changes,
    }
}
