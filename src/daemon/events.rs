//! Event handling and the main loop of the daemon.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use super::config_event::is_config_file_event;
use super::triggers::{TaggedEvent, TriggerMatcher, WatchSource};
use super::watchers::WatcherBundle;
use crate::config::{load_config_from_file, Config};
use crate::constants::{DEBOUNCE_WINDOW, EVENT_POLL_INTERVAL, MAX_DEBOUNCE_DELAY};
use crate::error::DaemonError;
use crate::sources::SourceResolver;
use crate::sync::{sync_all, SyncOptions, SyncReport};

/// A scheduled pass: when the first unserved event arrived and when the
/// pass is due
#[derive(Debug, Clone, Copy)]
struct PendingPass {
    first_event: Instant,
    due: Instant,
}

/// Mutable state owned by the daemon loop.
pub struct DaemonState {
    config: Config,
    config_path: PathBuf,
    resolver: SourceResolver,
    matcher: TriggerMatcher,
    bundle: Option<WatcherBundle>,
    pending_pass: Option<PendingPass>,
    tx: mpsc::Sender<TaggedEvent>,
}

impl DaemonState {
    /// Creates the daemon state. No watchers are started yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the trigger patterns fail to compile
    pub fn new(
        config: Config,
        config_path: &Path,
        resolver: SourceResolver,
        tx: mpsc::Sender<TaggedEvent>,
    ) -> Result<Self, DaemonError> {
        let matcher = TriggerMatcher::new(resolver.global_path())?;
        Ok(Self {
            config,
            config_path: config_path.to_path_buf(),
            resolver,
            matcher,
            bundle: None,
            pending_pass: None,
            tx,
        })
    }

    /// The configuration currently in effect
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether the instruction watchers are running
    pub fn is_watching(&self) -> bool {
        self.bundle.is_some()
    }

    /// Whether a pass is scheduled but has not run yet
    pub fn has_pending_pass(&self) -> bool {
        self.pending_pass.is_some()
    }

    /// Runs a sync pass over every configured root.
    pub fn run_pass(&self) -> SyncReport {
        let options = SyncOptions::from(&self.config);
        let report = sync_all(self.config.roots(), &options, &self.resolver);
        let failures = report.failures().count();
        if failures == 0 {
            debug!(roots = report.roots.len(), "sync pass finished");
        } else {
            warn!(
                roots = report.roots.len(),
                failures, "sync pass finished with errors"
            );
        }
        report
    }

    /// Starts or stops the instruction watchers to match `auto_sync`.
    ///
    /// # Errors
    ///
    /// Returns an error if the watchers cannot be created
    pub fn apply_auto_sync(&mut self) -> Result<(), DaemonError> {
        match (self.config.auto_sync, self.bundle.is_some()) {
            (true, false) => {
                let global = self.resolver.global_path();
                let bundle =
                    WatcherBundle::create(self.config.roots(), global.as_deref(), &self.tx)?;
                self.bundle = Some(bundle);
            }
            (false, true) => self.stop_watching(),
            _ => {}
        }
        Ok(())
    }

    /// Disposes the instruction watchers, if running
    pub fn stop_watching(&mut self) {
        if let Some(bundle) = self.bundle.take() {
            bundle.dispose();
            info!("auto sync disabled, file watchers stopped");
        }
    }

    /// Schedules a pass after the debounce window, restarting the window if
    /// a pass is already pending.
    ///
    /// A pending pass is never pushed later than `MAX_DEBOUNCE_DELAY` after
    /// the first event it serves.
    pub fn schedule_pass(&mut self, now: Instant) {
        let first_event = self.pending_pass.map_or(now, |pending| pending.first_event);
        let due = (now + DEBOUNCE_WINDOW).min(first_event + MAX_DEBOUNCE_DELAY);
        self.pending_pass = Some(PendingPass { first_event, due });
    }

    /// When the pending pass will run, if one is scheduled
    pub fn pending_pass_due(&self) -> Option<Instant> {
        self.pending_pass.map(|pending| pending.due)
    }

    /// Runs the pending pass once its debounce window has elapsed.
    pub fn run_due_pass(&mut self, now: Instant) -> Option<SyncReport> {
        match self.pending_pass {
            Some(pending) if pending.due <= now => {
                self.pending_pass = None;
                Some(self.run_pass())
            }
            _ => None,
        }
    }

    /// Handles one event delivered by a watcher.
    pub fn handle_event(&mut self, tagged: TaggedEvent, now: Instant) {
        let event = match tagged.result {
            Ok(event) => event,
            Err(e) => {
                error!(source = ?tagged.source, error = %e, "watch error");
                return;
            }
        };

        if tagged.source == WatchSource::Config {
            if is_config_file_event(&event, &self.config_path) {
                self.reload_config(now);
            }
            return;
        }

        if tagged.source == WatchSource::Global && self.matcher.is_global_dir_event(&event) {
            self.refresh_global_watch(now);
        }

        if self.bundle.is_some() && self.matcher.is_trigger(tagged.source, &event) {
            debug!(source = ?tagged.source, paths = ?event.paths, "instruction file changed");
            self.schedule_pass(now);
        }
    }

    /// Rebuilds the watchers when the global instructions directory appeared
    /// or disappeared since they were created, then schedules a pass.
    fn refresh_global_watch(&mut self, now: Instant) {
        let Some(bundle) = self.bundle.as_ref() else {
            return;
        };
        let global_dir_exists = self
            .resolver
            .global_path()
            .as_deref()
            .and_then(Path::parent)
            .is_some_and(Path::is_dir);
        if bundle.is_watching_global() == global_dir_exists {
            return;
        }

        info!(
            exists = global_dir_exists,
            "global instructions directory changed, restarting file watchers"
        );
        if let Some(bundle) = self.bundle.take() {
            bundle.dispose();
        }
        if let Err(e) = self.apply_auto_sync() {
            error!(error = %e, "failed to start file watchers");
        }
        self.schedule_pass(now);
    }

    /// Reloads the configuration file and reconciles watchers with it.
    ///
    /// A configuration that cannot be loaded is logged and the previous one
    /// stays in effect.
    pub fn reload_config(&mut self, now: Instant) {
        let new_config = match load_config_from_file(&self.config_path) {
            Ok(config) => config,
            Err(e) => {
                error!(error = %e, "failed to reload configuration");
                return;
            }
        };

        if new_config == self.config {
            return;
        }
        info!("configuration changed, reloading");

        let roots_changed = new_config.roots() != self.config.roots();
        let resync = new_config.sync_settings_differ(&self.config);
        self.config = new_config;

        if roots_changed {
            // Rebuilt below with the new root set
            if let Some(bundle) = self.bundle.take() {
                bundle.dispose();
            }
        }
        if let Err(e) = self.apply_auto_sync() {
            error!(error = %e, "failed to start file watchers");
        }
        if resync {
            self.schedule_pass(now);
        }
    }

    /// Disposes every watcher owned by the state
    pub fn shutdown(&mut self) {
        if let Some(bundle) = self.bundle.take() {
            bundle.dispose();
        }
    }
}

/// Runs the main daemon event loop until a shutdown signal arrives.
pub fn run_daemon_event_loop(
    shutdown_rx: &mpsc::Receiver<()>,
    state: &mut DaemonState,
    event_rx: &mpsc::Receiver<TaggedEvent>,
) {
    loop {
        if let Ok(()) = shutdown_rx.try_recv() {
            info!("daemon shutdown requested");
            break;
        }

        match event_rx.recv_timeout(EVENT_POLL_INTERVAL) {
            Ok(tagged) => state.handle_event(tagged, Instant::now()),
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                info!("watchers disconnected, stopping daemon");
                break;
            }
        }

        state.run_due_pass(Instant::now());
    }
}
