mod cli;
mod report;

use std::io::Write;

use anyhow::Context;
use clap::Parser;
use trailmark_common::RunInfo;
use trailmark_config::{init_tracing, AppConfig};
use trailmark_matching::{AliasTable, MatchingConfig, NameReconciler};
use trailmark_store::commits::csv_repository::CsvCommitTable;
use trailmark_store::commits::repositories::EnrichedCommitRepository;

use crate::cli::{Cli, OutputFormat};
use crate::report::{build_report, render_table, ReportOptions};

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing("info");

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("failed to load config")?;

    let run = RunInfo::new("trailmark-report");
    tracing::info!(service = %run.service, run_id = %run.run_id, "starting");

    let input = cli.input.clone().unwrap_or(config.output_path.clone());
    let rows = CsvCommitTable::new(&input, config.tracked_states.clone())
        .read_all()
        .with_context(|| format!("failed to read {}", input.display()))?;
    tracing::info!(path = %input.display(), rows = rows.len(), "loaded joined table");

    let aliases = match &config.alias_file {
        Some(path) => AliasTable::load(path).context("failed to load alias table")?,
        None => AliasTable::default(),
    };
    let reconciler = NameReconciler::build(
        MatchingConfig {
            similarity_threshold: config.similarity_threshold,
        },
        aliases,
        rows.iter().map(|r| r.commit.author_name.as_str()),
    );

    let options = ReportOptions {
        user: cli.user.clone(),
        show_mapping: cli.show_mapping,
        activity: cli.activity,
        days: cli.days,
        breakdown: cli.breakdown,
    };
    let report = build_report(&rows, &reconciler, &options)?;

    let text = match cli.format {
        OutputFormat::Table => render_table(&report).context("failed to render table")?,
        OutputFormat::Json => serde_json::to_string_pretty(&report)?,
    };
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{text}")?;
    Ok(())
}
