//! Configuration file management for sync settings and project roots.
//!
//! The configuration file records the settings that shape a sync pass
//! (`rule_prefix`, `include_global`), whether the daemon watches for changes
//! (`auto_sync`), and the project roots that `sync-all` and the daemon cover.

pub mod io;
pub mod path;
pub mod structure;

pub use io::{
    add_root_to_config, add_root_to_config_file, load_config, load_config_from_file,
    modify_config_file, remove_root_from_config, remove_root_from_config_file, save_config_to_file,
    update_settings, update_settings_in_file, SettingsUpdate,
};
pub use path::get_config_file_path;
pub use structure::{validate_rule_prefix, Config};
