use notify::Event;
use std::path::Path;

use super::triggers::is_content_event;

/// Checks if the file event changed the configuration file
///
/// Matches on file name and parent directory so the temporary file used for
/// atomic writes is ignored while the final rename is picked up.
pub fn is_config_file_event(event: &Event, config_file_path: &Path) -> bool {
    is_content_event(event)
        && event.paths.iter().any(|path| {
            path.file_name() == config_file_path.file_name()
                && same_directory(path.parent(), config_file_path.parent())
        })
}

fn same_directory(a: Option<&Path>, b: Option<&Path>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => {
            a == b
                || matches!(
                    (a.canonicalize(), b.canonicalize()),
                    (Ok(a), Ok(b)) if a == b
                )
        }
        (None, None) => true,
        _ => false,
    }
}
