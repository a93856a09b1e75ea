//! File watcher setup and management for the daemon.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::{debug, info, warn};

use super::triggers::{TaggedEvent, WatchSource};

/// Creates a watcher whose events are tagged with `source` and forwarded to `tx`.
fn tagged_watcher(
    source: WatchSource,
    tx: &mpsc::Sender<TaggedEvent>,
) -> notify::Result<RecommendedWatcher> {
    let tx = tx.clone();
    RecommendedWatcher::new(
        move |result: notify::Result<Event>| {
            // The receiver only goes away when the daemon is shutting down
            let _ = tx.send(TaggedEvent { source, result });
        },
        Config::default(),
    )
}

/// The three instruction watchers, created and disposed together.
///
/// Dropping the bundle stops every watcher. [`WatcherBundle::dispose`]
/// consumes the bundle, so a bundle can only be disposed once.
pub struct WatcherBundle {
    claude_files: RecommendedWatcher,
    instructions: RecommendedWatcher,
    global: RecommendedWatcher,
    watched_roots: Vec<PathBuf>,
    global_watched: bool,
    awaiting_global_dir: bool,
}

impl WatcherBundle {
    /// Creates the watchers for `roots` and the global instructions file.
    ///
    /// Roots that do not exist are skipped with a warning. The global file is
    /// watched through its parent directory. When that directory does not
    /// exist yet, its own parent (the home directory) is watched instead so
    /// its creation can be noticed and the bundle rebuilt.
    ///
    /// # Errors
    ///
    /// Returns an error if a watcher cannot be created or an existing root
    /// cannot be watched
    pub fn create(
        roots: &BTreeSet<PathBuf>,
        global_path: Option<&Path>,
        tx: &mpsc::Sender<TaggedEvent>,
    ) -> notify::Result<Self> {
        let mut bundle = WatcherBundle {
            claude_files: tagged_watcher(WatchSource::ClaudeFiles, tx)?,
            instructions: tagged_watcher(WatchSource::Instructions, tx)?,
            global: tagged_watcher(WatchSource::Global, tx)?,
            watched_roots: Vec::new(),
            global_watched: false,
            awaiting_global_dir: false,
        };

        for root in roots {
            if !root.is_dir() {
                warn!(root = %root.display(), "root not found, skipping");
                continue;
            }
            bundle.claude_files.watch(root, RecursiveMode::Recursive)?;
            bundle.instructions.watch(root, RecursiveMode::Recursive)?;
            bundle.watched_roots.push(root.clone());
        }

        if let Some(global_dir) = global_path.and_then(Path::parent) {
            if global_dir.is_dir() {
                bundle.global.watch(global_dir, RecursiveMode::NonRecursive)?;
                bundle.global_watched = true;
            } else if let Some(home) = global_dir.parent().filter(|home| home.is_dir()) {
                bundle.global.watch(home, RecursiveMode::NonRecursive)?;
                bundle.awaiting_global_dir = true;
                info!(
                    dir = %global_dir.display(),
                    "global instructions directory not found, waiting for it to be created"
                );
            } else {
                warn!(
                    dir = %global_dir.display(),
                    "global instructions directory not found, not watching it"
                );
            }
        }

        info!(
            roots = bundle.watched_roots.len(),
            global = bundle.global_watched,
            "file watchers started"
        );
        Ok(bundle)
    }

    /// Roots currently being watched
    pub fn watched_roots(&self) -> &[PathBuf] {
        &self.watched_roots
    }

    /// Whether the global instructions directory is being watched
    pub fn is_watching_global(&self) -> bool {
        self.global_watched
    }

    /// Whether the home directory is watched for the global instructions
    /// directory to appear
    pub fn is_awaiting_global_dir(&self) -> bool {
        self.awaiting_global_dir
    }

    /// Stops every watcher in the bundle
    pub fn dispose(self) {
        drop(self);
    }
}

impl Drop for WatcherBundle {
    fn drop(&mut self) {
        debug!(roots = self.watched_roots.len(), "file watchers disposed");
    }
}

/// Watches the directory holding the configuration file.
///
/// The directory is created first so the file can be watched before it is
/// ever written.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or watched
pub fn watch_config_file(
    config_path: &Path,
    tx: &mpsc::Sender<TaggedEvent>,
) -> notify::Result<Option<RecommendedWatcher>> {
    let Some(config_dir) = config_path.parent() else {
        return Ok(None);
    };
    fs::create_dir_all(config_dir).map_err(notify::Error::io)?;

    let mut watcher = tagged_watcher(WatchSource::Config, tx)?;
    watcher.watch(config_dir, RecursiveMode::NonRecursive)?;
    info!(path = %config_path.display(), "watching configuration file for changes");
    Ok(Some(watcher))
}
