use clap::Args;

use timelapse_core::TimelapseConfig;

use super::WindowArgs;

#[derive(Args, Debug)]
pub struct FileArgs {
    /// Configured repository name
    #[arg(long)]
    pub repo: String,

    /// Repository-relative file path
    #[arg(long)]
    pub file: String,

    #[command(flatten)]
    pub window: WindowArgs,
}

pub fn run(args: FileArgs, config: TimelapseConfig) -> anyhow::Result<()> {
    let window = args.window.window()?;
    let repo = super::resolve_repo(&config, &args.repo)?;

    let report = super::pipeline(config).file_report(&repo, &args.file, &window);
    super::print_report("git", &report)
}
