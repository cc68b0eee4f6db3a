//! DOH CLI - Main entry point

mod commands;
mod display;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// DOH - auto-commit monitoring for git directories
#[derive(Parser, Debug)]
#[command(name = "doh")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Settings directory (default: $DOH_CONFIG_DIR or ~/.doh)
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add a directory to monitoring
    Add {
        /// Directory to monitor (default: current directory)
        dir: Option<PathBuf>,

        /// Line-change threshold (default: global defaultThreshold)
        #[arg(short, long)]
        threshold: Option<u64>,

        /// Display name (default: directory name)
        #[arg(short, long)]
        name: Option<String>,

        /// Commit pending changes before adding
        #[arg(short, long)]
        force: bool,
    },
    /// Stop monitoring a directory (also clears an exclusion)
    #[command(alias = "rm")]
    Remove {
        dir: Option<PathBuf>,
    },
    /// List monitored directories
    #[command(alias = "ls")]
    List,
    /// Show status of a directory, or of every monitored directory
    Status {
        dir: Option<PathBuf>,

        /// Show every monitored directory
        #[arg(short, long)]
        global: bool,
    },
    /// Manage excluded directories
    Exclusions {
        #[command(subcommand)]
        action: Option<ExclusionAction>,
    },
    /// Show or change global settings
    Config {
        /// Set a value, e.g. --set defaultThreshold=50 (repeatable)
        #[arg(long, value_name = "KEY=VALUE")]
        set: Vec<String>,
    },
    /// Check every monitored directory once and commit where needed
    Run {
        /// Also report directories below their threshold
        #[arg(short, long)]
        verbose: bool,
    },
    /// Commit pending changes now, regardless of threshold
    Commit {
        dir: Option<PathBuf>,
    },
    /// Squash the temp branch into a target branch
    #[command(alias = "s")]
    Squash {
        /// Message for the squash commit
        message: String,

        /// Target branch (default: main, else master)
        #[arg(short, long)]
        target: Option<String>,

        /// Temp branch to squash (default: current, else newest)
        #[arg(short, long)]
        branch: Option<String>,

        dir: Option<PathBuf>,
    },
    /// Delete temp branches older than a number of days
    Cleanup {
        /// Age in days (default: maxTempBranchAgeDays, else 7)
        #[arg(short, long)]
        days: Option<u32>,

        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,

        dir: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum ExclusionAction {
    /// Exclude a directory and everything below it
    Add { dir: Option<PathBuf> },
    /// Remove an exclusion
    #[command(alias = "rm")]
    Remove { dir: Option<PathBuf> },
    /// List exclusions
    #[command(alias = "ls")]
    List,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    doh_core::ensure_git_available()?;
    let store = commands::open_store(args.config_dir)?;

    match args.command {
        None => commands::default_action(&store),
        Some(Command::Add {
            dir,
            threshold,
            name,
            force,
        }) => commands::add(&store, dir, threshold, name, force),
        Some(Command::Remove { dir }) => commands::remove(&store, dir),
        Some(Command::List) => commands::list(&store),
        Some(Command::Status { dir, global }) => {
            if global {
                commands::status_all(&store)
            } else {
                commands::status(&store, dir)
            }
        }
        Some(Command::Exclusions { action }) => match action.unwrap_or(ExclusionAction::List) {
            ExclusionAction::Add { dir } => commands::exclude(&store, dir),
            ExclusionAction::Remove { dir } => commands::unexclude(&store, dir),
            ExclusionAction::List => commands::list_exclusions(&store),
        },
        Some(Command::Config { set }) => commands::config(&store, &set),
        Some(Command::Run { verbose }) => commands::run(&store, verbose),
        Some(Command::Commit { dir }) => commands::commit(&store, dir),
        Some(Command::Squash {
            message,
            target,
            branch,
            dir,
        }) => commands::squash(&store, &message, target, branch, dir),
        Some(Command::Cleanup { days, force, dir }) => commands::cleanup(&store, days, force, dir),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_squash_alias() {
        let args = Args::try_parse_from(["doh", "s", "Feature done", "-t", "develop"]).unwrap();
        match args.command {
            Some(Command::Squash { message, target, .. }) => {
                assert_eq!(message, "Feature done");
                assert_eq!(target.as_deref(), Some("develop"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let args = Args::try_parse_from(["doh", "cleanup", "-d", "14", "--force", "--debug"]).unwrap();
        assert!(args.debug);
        assert!(matches!(
            args.command,
            Some(Command::Cleanup { days: Some(14), force: true, .. })
        ));
    }

    #[test]
    fn test_parse_config_set() {
        let args = Args::try_parse_from([
            "doh",
            "config",
            "--set",
            "defaultThreshold=50",
            "--set",
            "useTempBranches=false",
        ])
        .unwrap();
        match args.command {
            Some(Command::Config { set }) => assert_eq!(set.len(), 2),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
