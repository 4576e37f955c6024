use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tracing::info;

use timelapse_core::analyze::RepoSummary;
use timelapse_core::{ConfigError, RepoEntry, TimelapseConfig};

use super::WindowArgs;

#[derive(Args, Debug)]
pub struct RepoArgs {
    /// Restrict to these configured repositories (repeatable; default: all)
    #[arg(long = "repo")]
    pub repos: Vec<String>,

    /// JSON array of prompt events used for prompt-to-commit lag
    #[arg(long)]
    pub events: Option<PathBuf>,

    /// Emit one summary per repository instead of a combined one
    #[arg(long)]
    pub per_repo: bool,

    #[command(flatten)]
    pub window: WindowArgs,
}

#[derive(Serialize)]
struct PerRepo {
    repos: Vec<RepoSummary>,
}

pub fn run(args: RepoArgs, config: TimelapseConfig) -> anyhow::Result<()> {
    let window = args.window.window()?;
    let events = super::load_events(args.events.as_deref())?;

    let repos: Vec<RepoEntry> = if args.repos.is_empty() {
        config.repos.clone()
    } else {
        args.repos
            .iter()
            .map(|name| super::resolve_repo(&config, name))
            .collect::<anyhow::Result<_>>()?
    };
    if repos.is_empty() {
        return Err(ConfigError::Invalid(
            "No repositories configured; add [[repos]] entries to the config file".to_string(),
        )
        .into());
    }

    info!(
        repos = repos.len(),
        events = events.len(),
        "Summarizing repository activity"
    );

    let source_system = if events.is_empty() { "git" } else { "git+events" };
    let pipeline = super::pipeline(config);
    if args.per_repo {
        let summaries = pipeline.analyze_repos(&repos, &window, &events);
        super::print_report(source_system, &PerRepo { repos: summaries })
    } else {
        let summary = pipeline.summarize(&repos, &window, &events);
        super::print_report(source_system, &summary)
    }
}
