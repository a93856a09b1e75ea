//! Handles all file input/output operations for the configuration.

use super::path::get_config_file_path;
use super::structure::{validate_rule_prefix, Config};
use std::fs;
use std::io;
use std::path::Path;

/// Loads configuration from the default configuration file
///
/// # Errors
///
/// Returns an error if:
/// - The configuration directory cannot be determined
/// - File reading fails
/// - JSON parsing fails
pub fn load_config() -> io::Result<Config> {
    let config_path = get_config_file_path()?;
    load_config_from_file(config_path)
}

/// Loads configuration from a specific file path
///
/// A missing or empty file yields the default configuration. Fields absent
/// from the file take their default values.
///
/// # Errors
///
/// Returns an error if file reading or JSON parsing fails, or `InvalidData`
/// if the file holds an invalid rule prefix
pub fn load_config_from_file<P: AsRef<Path>>(config_path: P) -> io::Result<Config> {
    let config_path = config_path.as_ref();

    if !config_path.exists() {
        return Ok(Config::default());
    }

    let config_content = fs::read_to_string(config_path)?;
    parse_config(&config_content, config_path)
}

fn parse_config(content: &str, config_path: &Path) -> io::Result<Config> {
    // Trim any trailing whitespace or newlines that might cause parsing issues
    let trimmed_content = content.trim();

    if trimmed_content.is_empty() {
        return Ok(Config::default());
    }

    let config: Config = serde_json::from_str(trimmed_content).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "Failed to parse configuration file at {}: {} (content length: {} chars)",
                config_path.display(),
                e,
                trimmed_content.len()
            ),
        )
    })?;

    validate_rule_prefix(&config.rule_prefix).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Invalid configuration file at {}: {}", config_path.display(), e),
        )
    })?;

    Ok(config)
}

fn serialize_config(config: &Config) -> io::Result<String> {
    let mut config_content = serde_json::to_string_pretty(config).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Failed to serialize configuration: {}", e),
        )
    })?;

    // Ensure the file ends with a newline
    if !config_content.ends_with('\n') {
        config_content.push('\n');
    }

    Ok(config_content)
}

/// Saves configuration to a specific file path using an atomic write
///
/// # Errors
///
/// Returns an error if directory creation, JSON serialization, or file writing fails
pub fn save_config_to_file<P: AsRef<Path>>(config: &Config, config_path: P) -> io::Result<()> {
    let config_path = config_path.as_ref();

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let config_content = serialize_config(config)?;

    // Write to a temporary file and rename so readers never see a partial file
    let temp_path = config_path.with_extension("json.tmp");
    fs::write(&temp_path, config_content)?;
    fs::rename(&temp_path, config_path)?;
    Ok(())
}

/// Loads, modifies and saves a configuration file
///
/// The file is only rewritten when `modifier` reports a change. Returns the
/// modifier's result.
///
/// # Errors
///
/// Returns an error if file operations fail
pub fn modify_config_file<P, F>(config_path: P, modifier: F) -> io::Result<bool>
where
    P: AsRef<Path>,
    F: FnOnce(&mut Config) -> io::Result<bool>,
{
    let config_path = config_path.as_ref();
    let mut config = load_config_from_file(config_path)?;

    let changed = modifier(&mut config)?;
    if changed {
        save_config_to_file(&config, config_path)?;
    }

    Ok(changed)
}

/// Adds a root to the default configuration file
///
/// # Errors
///
/// Returns an error if loading or saving the configuration fails
pub fn add_root_to_config<P: AsRef<Path>>(root: P) -> io::Result<bool> {
    add_root_to_config_file(root, get_config_file_path()?)
}

/// Removes a root from the default configuration file
///
/// # Errors
///
/// Returns an error if loading or saving the configuration fails
pub fn remove_root_from_config<P: AsRef<Path>>(root: P) -> io::Result<bool> {
    remove_root_from_config_file(root, get_config_file_path()?)
}

/// Adds a root to a specific configuration file
///
/// # Errors
///
/// Returns an error if loading or saving the configuration fails
pub fn add_root_to_config_file<P: AsRef<Path>, C: AsRef<Path>>(
    root: P,
    config_path: C,
) -> io::Result<bool> {
    let root = root.as_ref().to_path_buf();
    modify_config_file(config_path, |config| Ok(config.add_root(&root)))
}

/// Removes a root from a specific configuration file
///
/// # Errors
///
/// Returns an error if loading or saving the configuration fails
pub fn remove_root_from_config_file<P: AsRef<Path>, C: AsRef<Path>>(
    root: P,
    config_path: C,
) -> io::Result<bool> {
    let root = root.as_ref().to_path_buf();
    modify_config_file(config_path, |config| Ok(config.remove_root(&root)))
}

/// Settings that can be changed from the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub auto_sync: Option<bool>,
    pub rule_prefix: Option<String>,
    pub include_global: Option<bool>,
}

impl SettingsUpdate {
    /// True when no setting is being changed
    pub fn is_empty(&self) -> bool {
        self.auto_sync.is_none() && self.rule_prefix.is_none() && self.include_global.is_none()
    }

    /// Applies the update, returning whether anything changed
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the new rule prefix is invalid; the
    /// configuration is left untouched in that case
    pub fn apply(&self, config: &mut Config) -> io::Result<bool> {
        let before = config.clone();

        if let Some(prefix) = &self.rule_prefix {
            config.set_rule_prefix(prefix)?;
        }
        if let Some(auto_sync) = self.auto_sync {
            config.auto_sync = auto_sync;
        }
        if let Some(include_global) = self.include_global {
            config.include_global = include_global;
        }

        Ok(*config != before)
    }
}

/// Applies a settings update to a specific configuration file and returns
/// the resulting configuration
///
/// # Errors
///
/// Returns an error if the update is invalid or file operations fail
pub fn update_settings_in_file<P: AsRef<Path>>(
    update: &SettingsUpdate,
    config_path: P,
) -> io::Result<Config> {
    let config_path = config_path.as_ref();
    modify_config_file(config_path, |config| update.apply(config))?;
    load_config_from_file(config_path)
}

/// Applies a settings update to the default configuration file
///
/// # Errors
///
/// Returns an error if the update is invalid or file operations fail
pub fn update_settings(update: &SettingsUpdate) -> io::Result<Config> {
    update_settings_in_file(update, get_config_file_path()?)
}
