//! Command handlers

use anyhow::{bail, Context, Result};
use doh_core::{
    resolve_path, CleanupPlanner, GitOps, Monitor, MonitorSettings, Registry, RegistryError,
    Reporter, SquashCoordinator, DEFAULT_MAX_AGE_DAYS,
};
use doh_foundation::{JsonSettingsStore, SettingsStore};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::display::{self, ConsoleReporter};

/// Settings store in `dir`, else `$DOH_CONFIG_DIR`, else `~/.doh`
pub fn open_store(dir: Option<PathBuf>) -> Result<JsonSettingsStore> {
    let store = match dir {
        Some(dir) => JsonSettingsStore::new(dir),
        None => JsonSettingsStore::global().context("Could not locate the DOH settings directory")?,
    };
    debug!("Settings: {}", store.path().display());
    Ok(store)
}

/// Absolute form of `dir`, defaulting to the working directory
fn target_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    let dir = match dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Could not read the current directory")?,
    };
    Ok(resolve_path(&dir))
}

/// Git access for a directory with the configured profile and prefix
fn repository(store: &JsonSettingsStore, dir: &Path) -> Result<(GitOps, MonitorSettings)> {
    let settings = MonitorSettings::from(&store.load()?.global_settings);
    let git = GitOps::open(dir)?.with_profile(settings.git_profile.clone());
    Ok((git, settings))
}

/// `doh` without a subcommand: check the current directory if it is
/// monitored, otherwise start monitoring it
pub fn default_action(store: &JsonSettingsStore) -> Result<()> {
    let dir = target_dir(None)?;
    let monitor = Monitor::new(store);

    match monitor.check(&dir)? {
        Some(outcome) => {
            println!("Directory already monitored.");
            let name = Registry::new(store)
                .directory(&dir)?
                .map(|entry| entry.display_name(&dir))
                .unwrap_or_default();
            ConsoleReporter::new(false).directory(&dir, &name, &outcome);
            display::print_status(&monitor.status(&dir)?);
            Ok(())
        }
        None => add(store, Some(dir), None, None, false),
    }
}

pub fn add(
    store: &JsonSettingsStore,
    dir: Option<PathBuf>,
    threshold: Option<u64>,
    name: Option<String>,
    force: bool,
) -> Result<()> {
    let dir = target_dir(dir)?;

    if force {
        match Monitor::new(store).force_commit(&dir) {
            Ok(outcome) => display::print_commit_outcome(&outcome),
            Err(e) => println!("✗ Commit before adding failed: {}", e),
        }
    }

    let entry = Registry::new(store)
        .add_directory(&dir, threshold, name)
        .map_err(with_hint)?;

    println!("✓ Added '{}' to monitoring", entry.name);
    println!("  Path: {}", dir.display());
    println!("  Threshold: {} lines", entry.threshold);
    display::print_status(&Monitor::new(store).status(&dir)?);
    Ok(())
}

/// Attach the command that resolves an exclusion
fn with_hint(err: RegistryError) -> anyhow::Error {
    match &err {
        RegistryError::Excluded { excluded_by, .. } => {
            let hint = format!(
                "Run 'doh exclusions remove {}' to monitor it",
                excluded_by.display()
            );
            anyhow::Error::new(err).context(hint)
        }
        _ => err.into(),
    }
}

pub fn remove(store: &JsonSettingsStore, dir: Option<PathBuf>) -> Result<()> {
    let dir = target_dir(dir)?;
    if Registry::new(store).remove_directory(&dir)? {
        println!("✓ Removed {} from monitoring", dir.display());
    } else {
        println!("{} was not monitored", dir.display());
    }
    Ok(())
}

pub fn list(store: &JsonSettingsStore) -> Result<()> {
    display::print_directories(&Registry::new(store).directories()?);
    Ok(())
}

pub fn status(store: &JsonSettingsStore, dir: Option<PathBuf>) -> Result<()> {
    let dir = target_dir(dir)?;
    let status = Monitor::new(store).status(&dir)?;
    display::print_status(&status);
    if !status.monitored {
        println!("Use 'doh add' to start monitoring this directory.");
    }
    Ok(())
}

pub fn status_all(store: &JsonSettingsStore) -> Result<()> {
    let directories = Registry::new(store).directories()?;
    if directories.is_empty() {
        display::print_directories(&directories);
        return Ok(());
    }

    let monitor = Monitor::new(store);
    println!();
    for (path, entry) in &directories {
        match monitor.status(path) {
            Ok(status) => display::print_status_line(&status),
            Err(e) => display::print_status_error(path, &entry.display_name(path), &e),
        }
    }
    println!();
    Ok(())
}

pub fn exclude(store: &JsonSettingsStore, dir: Option<PathBuf>) -> Result<()> {
    let dir = target_dir(dir)?;
    let registry = Registry::new(store);
    let was_monitored = registry.is_monitored(&dir)?;

    let excluded = registry.add_exclusion(&dir)?;
    println!("✓ Excluded {}", excluded.display());
    if was_monitored {
        println!("  (it is no longer monitored)");
    }
    Ok(())
}

pub fn unexclude(store: &JsonSettingsStore, dir: Option<PathBuf>) -> Result<()> {
    let dir = target_dir(dir)?;
    let registry = Registry::new(store);
    if registry.remove_exclusion(&dir)? {
        println!("✓ Removed exclusion for {}", dir.display());
    } else if let Some(parent) = registry.find_excluded_parent(&dir)? {
        println!(
            "{} is not excluded itself; it is inside excluded {}",
            dir.display(),
            parent.display()
        );
    } else {
        println!("{} was not excluded", dir.display());
    }
    Ok(())
}

pub fn list_exclusions(store: &JsonSettingsStore) -> Result<()> {
    display::print_exclusions(&Registry::new(store).exclusions()?);
    Ok(())
}

pub fn config(store: &JsonSettingsStore, assignments: &[String]) -> Result<()> {
    let registry = Registry::new(store);
    let settings = if assignments.is_empty() {
        registry.settings()?
    } else {
        let updated = registry.update_settings(|settings| {
            for assignment in assignments {
                settings.apply_assignment(assignment)?;
            }
            Ok(())
        })?;
        println!("✓ Settings updated");
        updated
    };

    println!("{}", serde_json::to_string_pretty(&settings)?);
    println!("\nStored in {}", store.path().display());
    Ok(())
}

pub fn run(store: &JsonSettingsStore, verbose: bool) -> Result<()> {
    let mut reporter = ConsoleReporter::new(verbose);
    let report = Monitor::new(store).run_cycle(&mut reporter)?;
    if report.directories.is_empty() {
        println!("No directories are being monitored.");
    }
    Ok(())
}

pub fn commit(store: &JsonSettingsStore, dir: Option<PathBuf>) -> Result<()> {
    let dir = target_dir(dir)?;
    let outcome = Monitor::new(store).force_commit(&dir)?;
    display::print_commit_outcome(&outcome);
    Ok(())
}

pub fn squash(
    store: &JsonSettingsStore,
    message: &str,
    target: Option<String>,
    branch: Option<String>,
    dir: Option<PathBuf>,
) -> Result<()> {
    if message.trim().is_empty() {
        bail!("Squash message cannot be empty");
    }

    let dir = target_dir(dir)?;
    let (git, settings) = repository(store, &dir)?;
    let coordinator = SquashCoordinator::new(git, settings.temp_branch_prefix);

    let target = match target {
        Some(target) => target,
        None => coordinator.default_target()?,
    };
    let report = coordinator
        .squash(&target, message, branch.as_deref())
        .with_context(|| format!("Squash failed in {}", dir.display()))?;

    println!(
        "✓ Squashed {} into {} ({})",
        report.temp_branch, report.target_branch, report.commit
    );
    Ok(())
}

pub fn cleanup(
    store: &JsonSettingsStore,
    days: Option<u32>,
    force: bool,
    dir: Option<PathBuf>,
) -> Result<()> {
    let dir = target_dir(dir)?;
    let (git, settings) = repository(store, &dir)?;
    let days = match days {
        Some(days) => days,
        None => store
            .load()?
            .global_settings
            .max_temp_branch_age_days
            .unwrap_or(DEFAULT_MAX_AGE_DAYS),
    };

    let planner = CleanupPlanner::new(git, settings.temp_branch_prefix);
    let plan = planner.plan(days)?;
    if plan.is_empty() {
        println!("No temp branches older than {} days.", days);
        return Ok(());
    }

    display::print_cleanup_plan(&plan);
    let question = match plan.unmerged().count() {
        0 => format!("Delete {} branches?", plan.candidates.len()),
        unmerged => format!(
            "Delete {} branches, {} of them unmerged?",
            plan.candidates.len(),
            unmerged
        ),
    };

    let report = planner.execute(&plan, force, |_| display::confirm(&question))?;
    display::print_cleanup_report(&report);
    Ok(())
}
