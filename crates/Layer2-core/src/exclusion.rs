//! Exclusion resolution
//!
//! An excluded directory opts itself and every descendant out of monitoring.
//! Lookups check the path first, then each ancestor nearest to farthest.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

/// A set of excluded directories
pub trait ExclusionSet {
    fn contains_path(&self, path: &Path) -> bool;
}

impl<V> ExclusionSet for BTreeMap<PathBuf, V> {
    fn contains_path(&self, path: &Path) -> bool {
        self.contains_key(path)
    }
}

impl<V> ExclusionSet for HashMap<PathBuf, V> {
    fn contains_path(&self, path: &Path) -> bool {
        self.contains_key(path)
    }
}

impl ExclusionSet for BTreeSet<PathBuf> {
    fn contains_path(&self, path: &Path) -> bool {
        self.contains(path)
    }
}

impl ExclusionSet for HashSet<PathBuf> {
    fn contains_path(&self, path: &Path) -> bool {
        self.contains(path)
    }
}

impl ExclusionSet for [PathBuf] {
    fn contains_path(&self, path: &Path) -> bool {
        self.iter().any(|excluded| excluded == path)
    }
}

/// How a path is excluded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionMatch {
    /// The path itself is in the set
    Direct,
    /// The nearest excluded ancestor
    Ancestor(PathBuf),
}

/// Answers exclusion questions against one set
pub struct ExclusionResolver<'a, E: ExclusionSet + ?Sized> {
    exclusions: &'a E,
}

impl<'a, E: ExclusionSet + ?Sized> ExclusionResolver<'a, E> {
    pub fn new(exclusions: &'a E) -> Self {
        Self { exclusions }
    }

    pub fn is_excluded(&self, path: &Path) -> bool {
        self.find_excluded_parent(path).is_some()
    }

    /// The path itself if excluded, else its nearest excluded ancestor
    pub fn find_excluded_parent<'p>(&self, path: &'p Path) -> Option<&'p Path> {
        path.ancestors()
            .take_while(|candidate| !is_sentinel(candidate))
            .find(|candidate| self.exclusions.contains_path(candidate))
    }

    pub fn match_path(&self, path: &Path) -> Option<ExclusionMatch> {
        self.find_excluded_parent(path).map(|found| {
            if found == path {
                ExclusionMatch::Direct
            } else {
                ExclusionMatch::Ancestor(found.to_path_buf())
            }
        })
    }
}

/// Where an upward walk stops for relative paths
fn is_sentinel(path: &Path) -> bool {
    path.as_os_str().is_empty() || path == Path::new(".")
}

/// Whether `path` or one of its ancestors is excluded
pub fn is_excluded<E: ExclusionSet + ?Sized>(path: &Path, exclusions: &E) -> bool {
    ExclusionResolver::new(exclusions).is_excluded(path)
}

/// The path itself if excluded, else the nearest excluded ancestor
pub fn find_excluded_parent<E: ExclusionSet + ?Sized>(path: &Path, exclusions: &E) -> Option<PathBuf> {
    ExclusionResolver::new(exclusions)
        .find_excluded_parent(path)
        .map(Path::to_path_buf)
}
