use clap::Args;

use timelapse_core::TimelapseConfig;

use super::WindowArgs;

#[derive(Args, Debug)]
pub struct SymbolsArgs {
    /// Configured repository name
    #[arg(long)]
    pub repo: String,

    /// Repository-relative file path
    #[arg(long)]
    pub file: String,

    /// Only print the per-symbol roll-up, not every touch row
    #[arg(long)]
    pub summary_only: bool,

    #[command(flatten)]
    pub window: WindowArgs,
}

pub fn run(args: SymbolsArgs, config: TimelapseConfig) -> anyhow::Result<()> {
    let window = args.window.window()?;
    let repo = super::resolve_repo(&config, &args.repo)?;

    let mut report = super::pipeline(config).analyze_file(&repo, &args.file, &window);
    if args.summary_only {
        report.symbol_touches.clear();
    }
    super::print_report("git", &report)
}
