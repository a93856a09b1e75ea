//! Keeps Continue rule files in sync with Claude instruction files.
//!
//! For each project root, the global `~/.claude/CLAUDE.md`, the project's
//! `CLAUDE.md`, `CLAUDE.local.md` and `.claude/instructions.md` are
//! concatenated in that order under labeled headings and written to
//! `.continue/rules/<prefix>.md` with a fixed front matter. When none of the
//! sources exist the rule file is removed.

pub mod config;
pub mod constants;
pub mod daemon;
pub mod error;
pub mod logging;
pub mod render;
pub mod sources;
pub mod sync;

pub use config::{
    add_root_to_config, get_config_file_path, load_config, remove_root_from_config, update_settings,
    Config, SettingsUpdate,
};
pub use daemon::start_daemon;
pub use error::{DaemonError, SyncError};
pub use render::{aggregate_body, render};
pub use sources::{SourceDocument, SourceResolver, SOURCE_TABLE};
pub use sync::{
    rule_file_path, sync_all, sync_root, SyncOptions, SyncOutcome, SyncReport,
};
