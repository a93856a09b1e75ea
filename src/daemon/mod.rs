//! Watch daemon that keeps Continue rule files in sync with instruction files.

pub mod config_event;
pub mod events;
pub mod triggers;
pub mod watchers;

use std::path::Path;
use std::sync::mpsc;

use tracing::info;

use crate::config::{get_config_file_path, load_config_from_file};
use crate::error::DaemonError;
use crate::sources::SourceResolver;

pub use events::{run_daemon_event_loop, DaemonState};
pub use triggers::{TaggedEvent, TriggerMatcher, WatchSource};
pub use watchers::{watch_config_file, WatcherBundle};

/// Starts the daemon with the default configuration file and the current
/// user's home directory.
///
/// # Behavior
///
/// - Runs one sync pass over every configured root on startup
/// - When `auto_sync` is enabled, watches `CLAUDE*.md`, `.claude/instructions.md`
///   and `~/.claude/CLAUDE.md` and re-syncs after changes settle
/// - Watches the configuration file and applies changes to `auto_sync`,
///   the root list and the sync settings without a restart
/// - Runs until a message arrives on `shutdown_rx`
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the watchers
/// cannot be created. Sync failures are logged and never stop the daemon.
pub fn start_daemon(shutdown_rx: mpsc::Receiver<()>) -> Result<(), DaemonError> {
    let config_path = get_config_file_path()?;
    run_daemon(shutdown_rx, &config_path, SourceResolver::from_env())
}

/// Runs the daemon against a specific configuration file and resolver.
///
/// # Errors
///
/// See [`start_daemon`]
pub fn run_daemon(
    shutdown_rx: mpsc::Receiver<()>,
    config_path: &Path,
    resolver: SourceResolver,
) -> Result<(), DaemonError> {
    let config = load_config_from_file(config_path)?;

    if config.roots().is_empty() {
        info!("no roots configured yet; use `claude-md-sync add` in a project to add one");
    }

    let (tx, event_rx) = mpsc::channel();
    let _config_watcher = watch_config_file(config_path, &tx)?;

    let mut state = DaemonState::new(config, config_path, resolver, tx)?;
    state.run_pass();
    state.apply_auto_sync()?;

    info!(
        roots = state.config().root_count(),
        auto_sync = state.config().auto_sync,
        "daemon started"
    );

    run_daemon_event_loop(&shutdown_rx, &mut state, &event_rx);
    state.shutdown();

    info!("daemon stopped");
    Ok(())
}
