pub mod file;
pub mod repo;
pub mod symbols;

use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;

use timelapse_core::config::{COLLECTOR_VERSION, SCHEMA_VERSION};
use timelapse_core::types::{PromptEvent, TimeWindow, parse_ts};
use timelapse_core::{GitCli, RepoEntry, SymbolPipeline, TimelapseConfig};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Throughput, mix and churn summary across configured repositories
    Repo(repo::RepoArgs),
    /// Churn, coupling and velocity of one file
    File(file::FileArgs),
    /// Symbol-level churn of one file
    Symbols(symbols::SymbolsArgs),
}

pub fn run(cmd: Command, config: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(config)?;
    match cmd {
        Command::Repo(args) => repo::run(args, config),
        Command::File(args) => file::run(args, config),
        Command::Symbols(args) => symbols::run(args, config),
    }
}

// ── Shared arguments ───────────────────────────────────────────────

/// The analysis window: `--days` ending at `--until`.
#[derive(Args, Debug)]
pub struct WindowArgs {
    /// Number of days to look back
    #[arg(long, default_value_t = 30)]
    pub days: i64,

    /// End of the window as an ISO-8601 timestamp (default: now)
    #[arg(long)]
    pub until: Option<String>,
}

impl WindowArgs {
    pub fn window(&self) -> anyhow::Result<TimeWindow> {
        if self.days <= 0 {
            anyhow::bail!("--days must be positive, got {}", self.days);
        }
        let end = match &self.until {
            Some(raw) => parse_ts(raw)
                .with_context(|| format!("Invalid --until timestamp: {raw}"))?,
            None => Utc::now(),
        };
        TimeWindow::last_days(end, self.days).with_context(|| {
            format!("--days {} reaches outside the supported date range", self.days)
        })
    }
}

// ── Helpers ────────────────────────────────────────────────────────

fn load_config(path: Option<&Path>) -> anyhow::Result<TimelapseConfig> {
    match path {
        Some(path) => TimelapseConfig::load(path)
            .with_context(|| format!("Cannot load config {}", path.display())),
        None => Ok(TimelapseConfig::default()),
    }
}

pub fn pipeline(config: TimelapseConfig) -> SymbolPipeline<GitCli> {
    SymbolPipeline::new(GitCli::from_config(&config.history), config)
}

/// Look up a configured repository and check it exists on disk.
pub fn resolve_repo(config: &TimelapseConfig, name: &str) -> anyhow::Result<RepoEntry> {
    Ok(config.resolve_repo(name)?.clone())
}

/// Read a JSON array of `{repo, ts, source, text, session_id?}` events.
pub fn load_events(path: Option<&Path>) -> anyhow::Result<Vec<PromptEvent>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read events file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Cannot parse events file {}", path.display()))
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    schema_version: &'static str,
    collector_version: &'static str,
    generated_at: DateTime<Utc>,
    source_system: &'static str,
    #[serde(flatten)]
    body: &'a T,
}

/// Print `body` as pretty JSON wrapped in the versioned report envelope.
pub fn print_report<T: Serialize>(source_system: &'static str, body: &T) -> anyhow::Result<()> {
    let envelope = Envelope {
        schema_version: SCHEMA_VERSION,
        collector_version: COLLECTOR_VERSION,
        generated_at: Utc::now(),
        source_system,
        body,
    };
    let json = serde_json::to_string_pretty(&envelope).context("Failed to serialize report")?;
    println!("{json}");
    Ok(())
}
