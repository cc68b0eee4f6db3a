//! Global Settings - behaviour shared by every monitored directory
//!
//! Every field carries its own serde default, so a settings block written by an
//! older version (or edited by hand) loads field-by-field instead of failing.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Line-change threshold used when a directory is added without one
pub const DEFAULT_THRESHOLD: u64 = 30;

/// Prefix of the ephemeral branches that collect automatic commits
pub const DEFAULT_TEMP_BRANCH_PREFIX: &str = "doh-auto-commits";

/// Settings applied to every monitored directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    /// Threshold for newly added directories
    #[serde(default = "default_threshold")]
    pub default_threshold: u64,

    /// Git config file included for every invocation (`-c include.path=...`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_profile: Option<String>,

    /// Run `git init` when adding a directory that is not a repository
    #[serde(default = "default_true")]
    pub auto_init_git: bool,

    /// Group automatic commits on a temporary branch
    #[serde(default = "default_true")]
    pub use_temp_branches: bool,

    /// Temporary branch prefix
    #[serde(default = "default_temp_branch_prefix")]
    pub temp_branch_prefix: String,

    /// Age after which temporary branches are cleanup candidates
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_temp_branch_age_days: Option<u32>,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            default_threshold: DEFAULT_THRESHOLD,
            git_profile: None,
            auto_init_git: true,
            use_temp_branches: true,
            temp_branch_prefix: DEFAULT_TEMP_BRANCH_PREFIX.to_string(),
            max_temp_branch_age_days: None,
        }
    }
}

impl GlobalSettings {
    /// Git profile path with `~` expanded, `None` when unset or blank
    pub fn git_profile_path(&self) -> Option<PathBuf> {
        let raw = self.git_profile.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        Some(expand_home(raw))
    }

    /// Prefix actually used for branch names; a blank prefix falls back to the default
    pub fn temp_branch_prefix(&self) -> &str {
        let prefix = self.temp_branch_prefix.trim();
        if prefix.is_empty() {
            DEFAULT_TEMP_BRANCH_PREFIX
        } else {
            prefix
        }
    }

    /// Validate and store a new temporary branch prefix
    pub fn set_temp_branch_prefix(&mut self, prefix: &str) -> Result<()> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(Error::InvalidInput(
                "temporary branch prefix cannot be empty".to_string(),
            ));
        }
        if prefix
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '*' | '?' | '[' | '~' | '^' | ':' | '\\'))
        {
            return Err(Error::InvalidInput(format!(
                "temporary branch prefix is not a valid branch name: {}",
                prefix
            )));
        }
        self.temp_branch_prefix = prefix.to_string();
        Ok(())
    }

    /// Set one field by its JSON key. Optional fields are cleared by an empty
    /// value or `none`.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key.trim() {
            "defaultThreshold" => self.default_threshold = parse_value(key, value)?,
            "gitProfile" => self.git_profile = optional(value).map(str::to_string),
            "autoInitGit" => self.auto_init_git = parse_bool(key, value)?,
            "useTempBranches" => self.use_temp_branches = parse_bool(key, value)?,
            "tempBranchPrefix" => self.set_temp_branch_prefix(value)?,
            "maxTempBranchAgeDays" => {
                self.max_temp_branch_age_days = match optional(value) {
                    Some(days) => Some(parse_value(key, days)?),
                    None => None,
                }
            }
            other => {
                return Err(Error::InvalidInput(format!("unknown setting: {}", other)));
            }
        }
        Ok(())
    }

    /// Apply a `key=value` assignment
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            Error::InvalidInput(format!("expected KEY=VALUE, got: {}", assignment))
        })?;
        self.apply(key, value)
    }
}

fn optional(value: &str) -> Option<&str> {
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(value)
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::InvalidInput(format!("invalid value for {}: {}", key, value)))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(Error::InvalidInput(format!(
            "invalid value for {}: {} (expected true or false)",
            key, value
        ))),
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

fn default_threshold() -> u64 {
    DEFAULT_THRESHOLD
}

fn default_true() -> bool {
    true
}

fn default_temp_branch_prefix() -> String {
    DEFAULT_TEMP_BRANCH_PREFIX.to_string()
}
