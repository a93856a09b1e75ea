//! Defines the `Config` struct and its implementation.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_RULE_PREFIX;

/// Persisted settings and the list of project roots to keep in sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whether the daemon watches instruction files for changes
    pub auto_sync: bool,
    /// Stem of the generated rule file
    pub rule_prefix: String,
    /// Whether `~/.claude/CLAUDE.md` is included in every root's rules
    pub include_global: bool,
    /// Project roots synced by `sync-all` and the daemon
    pub roots: BTreeSet<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auto_sync: true,
            rule_prefix: DEFAULT_RULE_PREFIX.to_string(),
            include_global: true,
            roots: BTreeSet::new(),
        }
    }
}

fn canonical(path: &Path) -> PathBuf {
    match path.canonicalize() {
        Ok(path) => path,
        Err(_) => path.to_path_buf(),
    }
}

impl Config {
    /// Creates a configuration with default settings and no roots
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a project root
    ///
    /// Returns `true` if the root was added, `false` if it was already present
    pub fn add_root<P: AsRef<Path>>(&mut self, root: P) -> bool {
        self.roots.insert(canonical(root.as_ref()))
    }

    /// Removes a project root
    ///
    /// Returns `true` if the root was removed, `false` if it wasn't present
    pub fn remove_root<P: AsRef<Path>>(&mut self, root: P) -> bool {
        self.roots.remove(&canonical(root.as_ref()))
    }

    /// Checks if a root is configured
    pub fn contains_root<P: AsRef<Path>>(&self, root: P) -> bool {
        self.roots.contains(&canonical(root.as_ref()))
    }

    /// Gets the configured roots in sorted order
    pub fn roots(&self) -> &BTreeSet<PathBuf> {
        &self.roots
    }

    /// Gets the count of configured roots
    pub fn root_count(&self) -> usize {
        self.roots.len()
    }

    /// Sets the rule prefix after validating it
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the prefix is empty, is `.` or `..`, or
    /// contains a path separator
    pub fn set_rule_prefix(&mut self, prefix: &str) -> io::Result<()> {
        validate_rule_prefix(prefix)?;
        self.rule_prefix = prefix.to_string();
        Ok(())
    }

    /// True when settings that change a pass's output differ from `other`
    pub fn sync_settings_differ(&self, other: &Config) -> bool {
        self.rule_prefix != other.rule_prefix
            || self.include_global != other.include_global
            || self.roots != other.roots
    }
}

/// Checks that a rule prefix names a single file inside `.continue/rules`
pub fn validate_rule_prefix(prefix: &str) -> io::Result<()> {
    let invalid = prefix.trim().is_empty()
        || prefix == "."
        || prefix == ".."
        || prefix.contains('/')
        || prefix.contains('\\');

    if invalid {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("Invalid rule prefix '{}': must be a plain file name", prefix),
        ));
    }
    Ok(())
}
