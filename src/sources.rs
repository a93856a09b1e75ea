//! Discovery and reading of instruction documents.
//!
//! Sources are described by a static, ordered table. Every readable source is
//! included in the output; earlier rows appear first, none replaces another.

use std::fs;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use tracing::{debug, error};

use crate::constants::{
    CLAUDE_FILENAME, CLAUDE_INSTRUCTIONS_PATH, CLAUDE_LOCAL_FILENAME, GLOBAL_CLAUDE_PATH,
};

/// Where a source's relative path is anchored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceScope {
    /// Relative to the user's home directory, shared by every root
    Global,
    /// Relative to the project root being synced
    Project,
}

/// One row of the source table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpec {
    pub label: &'static str,
    pub scope: SourceScope,
    pub relative_path: &'static str,
}

/// Instruction sources in output order.
pub const SOURCE_TABLE: [SourceSpec; 4] = [
    SourceSpec {
        label: "Global CLAUDE.md Rules",
        scope: SourceScope::Global,
        relative_path: GLOBAL_CLAUDE_PATH,
    },
    SourceSpec {
        label: "Project CLAUDE.md Rules",
        scope: SourceScope::Project,
        relative_path: CLAUDE_FILENAME,
    },
    SourceSpec {
        label: "Local CLAUDE.md Rules",
        scope: SourceScope::Project,
        relative_path: CLAUDE_LOCAL_FILENAME,
    },
    SourceSpec {
        label: "Claude Instructions",
        scope: SourceScope::Project,
        relative_path: CLAUDE_INSTRUCTIONS_PATH,
    },
];

/// A candidate instruction document for one root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub label: &'static str,
    pub absolute_path: PathBuf,
    pub exists: bool,
    pub content: Option<String>,
}

/// Resolves the source table against a project root and a home directory.
#[derive(Debug, Clone, Default)]
pub struct SourceResolver {
    home_dir: Option<PathBuf>,
}

impl SourceResolver {
    /// Uses the current user's home directory for global sources
    pub fn from_env() -> Self {
        Self {
            home_dir: BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf()),
        }
    }

    /// Uses `home` as the home directory for global sources
    pub fn with_home<P: AsRef<Path>>(home: P) -> Self {
        Self {
            home_dir: Some(home.as_ref().to_path_buf()),
        }
    }

    /// Never yields global sources
    pub fn without_home() -> Self {
        Self { home_dir: None }
    }

    /// Path of the global instructions file, if a home directory is known
    pub fn global_path(&self) -> Option<PathBuf> {
        self.home_dir
            .as_ref()
            .map(|home| home.join(GLOBAL_CLAUDE_PATH))
    }

    /// Lists every applicable candidate for `root` in table order, with
    /// `exists` filled in and no content read.
    pub fn candidates(&self, root: &Path, include_global: bool) -> Vec<SourceDocument> {
        SOURCE_TABLE
            .iter()
            .filter_map(|spec| {
                let base = match spec.scope {
                    SourceScope::Global if !include_global => return None,
                    SourceScope::Global => self.home_dir.as_deref()?,
                    SourceScope::Project => root,
                };
                let absolute_path = base.join(spec.relative_path);
                Some(SourceDocument {
                    label: spec.label,
                    exists: absolute_path.exists(),
                    absolute_path,
                    content: None,
                })
            })
            .collect()
    }

    /// Reads every existing candidate for `root`.
    ///
    /// Returns only documents that exist and could be read, in table order.
    /// A read failure is logged and the document is skipped; the remaining
    /// candidates are still read.
    pub fn resolve(&self, root: &Path, include_global: bool) -> Vec<SourceDocument> {
        self.candidates(root, include_global)
            .into_iter()
            .filter(|doc| doc.exists)
            .filter_map(|mut doc| match fs::read_to_string(&doc.absolute_path) {
                Ok(content) => {
                    debug!(path = %doc.absolute_path.display(), label = doc.label, "read source");
                    doc.content = Some(content);
                    Some(doc)
                }
                Err(e) => {
                    error!(
                        path = %doc.absolute_path.display(),
                        error = %e,
                        "failed to read instruction file, skipping"
                    );
                    None
                }
            })
            .collect()
    }
}
