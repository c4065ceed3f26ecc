use std::path::PathBuf;

use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "trailmark-report")]
#[command(about = "Per-person delivery metrics from a joined commit/issue table")]
#[command(version)]
pub struct Cli {
    /// Joined table written by trailmark-ingest (default: TRAILMARK_OUTPUT)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Restrict the report to one person (raw or canonical name)
    #[arg(short, long)]
    pub user: Option<String>,

    /// Print how every raw author name was mapped
    #[arg(long)]
    pub show_mapping: bool,

    /// Include commit activity per author
    #[arg(long)]
    pub activity: bool,

    /// Daily commit counts shown with --user --activity
    #[arg(long, default_value_t = 30)]
    pub days: usize,

    /// Include ticket-type, category and project breakdowns
    #[arg(long)]
    pub breakdown: bool,
}
