use std::path::PathBuf;

use clap::Parser;
use timelapse_core::{ConfigError, RepoError};

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "timelapse",
    version,
    about = "Attribute repository churn to files and symbols over time"
)]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,

    /// Path to timelapse.toml (default: built-in settings, no repositories)
    #[arg(short, long, global = true, env = "TIMELAPSE_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,
}

/// Classify an error into an exit code.
///
///   0  success
///   1  general/unknown error
///   2  configuration error
///   3  repository not found / unknown repository
fn classify_exit_code(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if cause.is::<RepoError>() {
            return 3;
        }
        if cause.is::<ConfigError>() {
            return 2;
        }
    }
    1
}

fn main() {
    let cli = Cli::parse();

    let filter = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (_, 0) => "warn",
        (_, 1) => "info",
        (_, 2) => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    match commands::run(cli.command, cli.config.as_deref()) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(classify_exit_code(&e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_unknown_repo() {
        let err = anyhow::Error::from(RepoError::Unknown {
            name: "bot".into(),
            known: String::new(),
        });
        assert_eq!(classify_exit_code(&err), 3);
    }

    #[test]
    fn exit_code_repository_not_found() {
        let err = anyhow::Error::from(RepoError::NotFound("/srv/bot".into()));
        assert_eq!(classify_exit_code(&err), 3);
    }

    #[test]
    fn exit_code_config_through_context() {
        let err = anyhow::Error::from(ConfigError::Parse("expected `]`".into()))
            .context("Cannot load config t.toml");
        assert_eq!(classify_exit_code(&err), 2);
    }

    #[test]
    fn exit_code_general_even_when_message_mentions_config() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied");
        let err = anyhow::Error::from(io).context("Cannot read events file config/events.json");
        assert_eq!(classify_exit_code(&err), 1);

        let err = anyhow::anyhow!("Unknown repo mentioned in a plain message");
        assert_eq!(classify_exit_code(&err), 1);
    }

    #[test]
    fn cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "timelapse", "symbols", "--repo", "bot", "--file", "app.py", "-vv", "--config",
            "t.toml",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("t.toml")));
        assert!(matches!(cli.command, commands::Command::Symbols(_)));
    }
}
