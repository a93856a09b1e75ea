//! Shared constants used across the application.

use std::time::Duration;

/// The directory, relative to a project root, that receives Continue rule files
pub const CONTINUE_RULES_DIR: &str = ".continue/rules";

/// Default stem of the generated rule file
pub const DEFAULT_RULE_PREFIX: &str = "00-claude-md";

/// Extension appended to the rule prefix
pub const RULE_FILE_EXTENSION: &str = "md";

/// The project-level claude instruction file
pub const CLAUDE_FILENAME: &str = "CLAUDE.md";

/// The project-level local override file
pub const CLAUDE_LOCAL_FILENAME: &str = "CLAUDE.local.md";

/// Nested instructions file, relative to a project root
pub const CLAUDE_INSTRUCTIONS_PATH: &str = ".claude/instructions.md";

/// Global instructions file, relative to the user's home directory
pub const GLOBAL_CLAUDE_PATH: &str = ".claude/CLAUDE.md";

/// Separator placed between aggregated blocks
pub const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

/// `name` field of the rule front matter
pub const RULE_NAME: &str = "CLAUDE.md Project Rules";

/// `description` field of the rule front matter
pub const RULE_DESCRIPTION: &str =
    "Auto-synced rules from CLAUDE.md files (Claude Code compatibility)";

/// Glob matching CLAUDE.md and its variants anywhere below a root
pub const CLAUDE_FILES_PATTERN: &str = "**/CLAUDE*.md";

/// Glob matching nested instruction files anywhere below a root
pub const INSTRUCTIONS_PATTERN: &str = "**/.claude/instructions.md";

/// Quiet period the daemon waits for before running a pass
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(250);

/// Longest a pending pass can be pushed back by a steady stream of events
pub const MAX_DEBOUNCE_DELAY: Duration = Duration::from_millis(1000);

/// Poll interval of the daemon event loop
pub const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(100);
