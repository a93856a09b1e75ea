//! Classification of file system events into sync triggers.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use notify::{Event, EventKind};
use std::path::{Path, PathBuf};

use crate::constants::{CLAUDE_FILES_PATTERN, INSTRUCTIONS_PATTERN};

/// Which watcher delivered an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchSource {
    /// `CLAUDE*.md` files below the roots
    ClaudeFiles,
    /// `.claude/instructions.md` files below the roots
    Instructions,
    /// The global `~/.claude/CLAUDE.md`
    Global,
    /// The daemon's configuration file
    Config,
}

/// An event tagged with the watcher that produced it
#[derive(Debug)]
pub struct TaggedEvent {
    pub source: WatchSource,
    pub result: notify::Result<Event>,
}

fn build_globset(pattern: &str) -> Result<GlobSet, globset::Error> {
    let glob = GlobBuilder::new(pattern).literal_separator(true).build()?;
    GlobSetBuilder::new().add(glob).build()
}

/// Decides whether an event should schedule a sync pass
#[derive(Debug, Clone)]
pub struct TriggerMatcher {
    claude_files: GlobSet,
    instructions: GlobSet,
    global_path: Option<PathBuf>,
    global_dir: Option<PathBuf>,
}

impl TriggerMatcher {
    /// Builds a matcher for the fixed instruction patterns and the given
    /// global instructions path.
    ///
    /// # Errors
    ///
    /// Returns an error if a pattern fails to compile
    pub fn new(global_path: Option<PathBuf>) -> Result<Self, globset::Error> {
        let global_dir = global_path
            .as_deref()
            .and_then(Path::parent)
            .map(canonical_file_path);
        Ok(Self {
            claude_files: build_globset(CLAUDE_FILES_PATTERN)?,
            instructions: build_globset(INSTRUCTIONS_PATTERN)?,
            global_path: global_path.map(|path| canonical_file_path(&path)),
            global_dir,
        })
    }

    /// Checks a single path against the pattern of the watcher it came from
    pub fn matches(&self, source: WatchSource, path: &Path) -> bool {
        match source {
            WatchSource::ClaudeFiles => self.claude_files.is_match(path),
            WatchSource::Instructions => self.instructions.is_match(path),
            WatchSource::Global => self
                .global_path
                .as_deref()
                .is_some_and(|global| canonical_file_path(path) == global),
            WatchSource::Config => false,
        }
    }

    /// True for create, modify and remove events touching a matching path
    pub fn is_trigger(&self, source: WatchSource, event: &Event) -> bool {
        is_content_event(event) && event.paths.iter().any(|path| self.matches(source, path))
    }

    /// True when a global watcher event creates or removes the directory
    /// holding the global instructions file
    pub fn is_global_dir_event(&self, event: &Event) -> bool {
        let Some(global_dir) = self.global_dir.as_deref() else {
            return false;
        };
        matches!(event.kind, EventKind::Create(_) | EventKind::Remove(_))
            && event
                .paths
                .iter()
                .any(|path| canonical_file_path(path) == global_dir)
    }
}

/// Events that may change the content or existence of a file
pub fn is_content_event(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

/// Canonicalizes the parent directory so a path compares equal to the paths
/// the watcher reports, even when the file itself no longer exists.
fn canonical_file_path(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => match parent.canonicalize() {
            Ok(parent) => parent.join(name),
            Err(_) => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}
