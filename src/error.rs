//! Error types for sync passes and the watch daemon.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single root's sync pass.
///
/// Source read failures are not represented here: an unreadable source is
/// logged and skipped by the resolver.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("project root {} is not a directory", path.display())]
    MissingRoot { path: PathBuf },

    #[error("invalid rule prefix for {}: {source}", path.display())]
    InvalidPrefix {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to create rules directory {}: {source}", path.display())]
    CreateRulesDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write rule file {}: {source}", path.display())]
    WriteRule {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove rule file {}: {source}", path.display())]
    RemoveRule {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SyncError {
    /// Path of the file or directory the failed operation targeted. For
    /// root-level failures this is the root itself.
    pub fn path(&self) -> &PathBuf {
        match self {
            SyncError::MissingRoot { path }
            | SyncError::InvalidPrefix { path, .. }
            | SyncError::CreateRulesDir { path, .. }
            | SyncError::WriteRule { path, .. }
            | SyncError::RemoveRule { path, .. } => path,
        }
    }
}

/// Errors that stop the watch daemon from starting.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("configuration error: {0}")]
    Config(#[from] io::Error),

    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("invalid trigger pattern: {0}")]
    Pattern(#[from] globset::Error),
}
