//! Per-root reconciliation of the derived rule file.
//!
//! A pass walks `ensure dir -> resolve -> write | delete`. Any failure ends
//! the pass for that root only; [`sync_all`] never propagates errors.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info};

use crate::config::{validate_rule_prefix, Config};
use crate::constants::{CONTINUE_RULES_DIR, DEFAULT_RULE_PREFIX, RULE_FILE_EXTENSION};
use crate::error::SyncError;
use crate::render::render;
use crate::sources::SourceResolver;

/// Settings that shape a sync pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// Stem of the rule file written inside `.continue/rules`
    pub rule_prefix: String,
    /// Whether the global `~/.claude/CLAUDE.md` is aggregated
    pub include_global: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            rule_prefix: DEFAULT_RULE_PREFIX.to_string(),
            include_global: true,
        }
    }
}

impl From<&Config> for SyncOptions {
    fn from(config: &Config) -> Self {
        Self {
            rule_prefix: config.rule_prefix.clone(),
            include_global: config.include_global,
        }
    }
}

/// What a successful pass did for a root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The rule file was created or overwritten
    Written(PathBuf),
    /// The rule file already held the rendered content
    Unchanged(PathBuf),
    /// No sources exist and the stale rule file was deleted
    Removed(PathBuf),
    /// No sources exist and there was no rule file
    NothingToSync,
}

/// Result of one pass for one root
#[derive(Debug)]
pub struct RootReport {
    pub root: PathBuf,
    pub result: Result<SyncOutcome, SyncError>,
}

/// Results of a pass over several roots, in the order they were processed
#[derive(Debug, Default)]
pub struct SyncReport {
    pub roots: Vec<RootReport>,
}

impl SyncReport {
    /// True when no root failed
    pub fn is_success(&self) -> bool {
        self.roots.iter().all(|report| report.result.is_ok())
    }

    /// Roots whose pass failed, with their errors
    pub fn failures(&self) -> impl Iterator<Item = (&Path, &SyncError)> {
        self.roots.iter().filter_map(|report| match &report.result {
            Err(e) => Some((report.root.as_path(), e)),
            Ok(_) => None,
        })
    }

    /// Roots whose pass succeeded, with their outcomes
    pub fn outcomes(&self) -> impl Iterator<Item = (&Path, &SyncOutcome)> {
        self.roots.iter().filter_map(|report| match &report.result {
            Ok(outcome) => Some((report.root.as_path(), outcome)),
            Err(_) => None,
        })
    }
}

/// Directory that holds the generated rule file for `root`
pub fn rules_dir(root: &Path) -> PathBuf {
    root.join(CONTINUE_RULES_DIR)
}

/// Path of the generated rule file for `root`
pub fn rule_file_path(root: &Path, rule_prefix: &str) -> PathBuf {
    rules_dir(root).join(format!("{}.{}", rule_prefix, RULE_FILE_EXTENSION))
}

/// Runs one sync pass for a single root.
///
/// # Behavior
///
/// 1. Checks that `root` is an existing directory and that the rule prefix
///    is a plain file name
/// 2. Creates `<root>/.continue/rules` if missing
/// 3. Resolves the instruction sources
/// 4. With at least one source, renders and writes the rule file, skipping
///    the write when the file already holds identical content
/// 5. With no sources, deletes the rule file if present
///
/// # Errors
///
/// Returns an error if the root is not a directory, the prefix is invalid,
/// the rules directory cannot be created or the rule file cannot be written
/// or removed. Unreadable sources are not errors.
pub fn sync_root(
    root: &Path,
    options: &SyncOptions,
    resolver: &SourceResolver,
) -> Result<SyncOutcome, SyncError> {
    if !root.is_dir() {
        return Err(SyncError::MissingRoot {
            path: root.to_path_buf(),
        });
    }
    validate_rule_prefix(&options.rule_prefix).map_err(|source| SyncError::InvalidPrefix {
        path: root.to_path_buf(),
        source,
    })?;

    let dir = rules_dir(root);
    fs::create_dir_all(&dir).map_err(|source| SyncError::CreateRulesDir {
        path: dir.clone(),
        source,
    })?;

    let documents = resolver.resolve(root, options.include_global);
    let rule_file = rule_file_path(root, &options.rule_prefix);

    if documents.is_empty() {
        if !rule_file.exists() {
            debug!(root = %root.display(), "no instruction files found, nothing to sync");
            return Ok(SyncOutcome::NothingToSync);
        }
        fs::remove_file(&rule_file).map_err(|source| SyncError::RemoveRule {
            path: rule_file.clone(),
            source,
        })?;
        info!(path = %rule_file.display(), "removed rule file (no CLAUDE.md found)");
        return Ok(SyncOutcome::Removed(rule_file));
    }

    let rendered = render(&documents);

    if let Ok(existing) = fs::read_to_string(&rule_file) {
        if existing == rendered {
            debug!(path = %rule_file.display(), "rule file already up to date");
            return Ok(SyncOutcome::Unchanged(rule_file));
        }
    }

    fs::write(&rule_file, rendered).map_err(|source| SyncError::WriteRule {
        path: rule_file.clone(),
        source,
    })?;
    info!(
        path = %rule_file.display(),
        sources = documents.len(),
        "synced CLAUDE.md to Continue rule file"
    );
    Ok(SyncOutcome::Written(rule_file))
}

/// Runs [`sync_root`] for every root independently.
///
/// A failure in one root is logged and recorded in the report; the remaining
/// roots are still processed.
pub fn sync_all<I, P>(roots: I, options: &SyncOptions, resolver: &SourceResolver) -> SyncReport
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut report = SyncReport::default();
    for root in roots {
        let root = root.as_ref();
        let result = sync_root(root, options, resolver);
        if let Err(e) = &result {
            error!(root = %root.display(), error = %e, "CLAUDE.md sync error");
        }
        report.roots.push(RootReport {
            root: root.to_path_buf(),
            result,
        });
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{
        CLAUDE_FILENAME, CLAUDE_INSTRUCTIONS_PATH, CLAUDE_LOCAL_FILENAME, GLOBAL_CLAUDE_PATH,
    };
    use tempfile::tempdir;

    const FRONT_MATTER: &str = "---\nname: CLAUDE.md Project Rules\nalwaysApply: true\ndescription: Auto-synced rules from CLAUDE.md files (Claude Code compatibility)\n---\n\n";

    fn options(include_global: bool) -> SyncOptions {
        SyncOptions {
            include_global,
            ..SyncOptions::default()
        }
    }

    fn read_rule(root: &Path) -> String {
        fs::read_to_string(rule_file_path(root, DEFAULT_RULE_PREFIX)).unwrap()
    }

    #[test]
    fn test_no_sources_leaves_no_rule_file() {
        let root = tempdir().unwrap();
        let resolver = SourceResolver::without_home();

        let outcome = sync_root(root.path(), &options(true), &resolver).unwrap();

        assert_eq!(outcome, SyncOutcome::NothingToSync);
        assert!(rules_dir(root.path()).is_dir());
        assert!(!rule_file_path(root.path(), DEFAULT_RULE_PREFIX).exists());
    }

    #[test]
    fn test_scenario_project_and_instructions() {
        let root = tempdir().unwrap();
        let home = tempdir().unwrap();
        fs::write(root.path().join(CLAUDE_FILENAME), "Use tabs.").unwrap();
        fs::create_dir_all(root.path().join(".claude")).unwrap();
        fs::write(
            root.path().join(CLAUDE_INSTRUCTIONS_PATH),
            "Run tests before commit.",
        )
        .unwrap();

        let resolver = SourceResolver::with_home(home.path());
        let outcome = sync_root(root.path(), &options(false), &resolver).unwrap();

        let rule_file = rule_file_path(root.path(), DEFAULT_RULE_PREFIX);
        assert_eq!(outcome, SyncOutcome::Written(rule_file));
        assert_eq!(
            read_rule(root.path()),
            format!(
                "{}# Project CLAUDE.md Rules\n\nUse tabs.\n\n---\n\n# Claude Instructions\n\nRun tests before commit.\n",
                FRONT_MATTER
            )
        );
    }

    #[test]
    fn test_second_pass_is_byte_identical() {
        let root = tempdir().unwrap();
        fs::write(root.path().join(CLAUDE_FILENAME), "Use tabs.").unwrap();
        let resolver = SourceResolver::without_home();

        let first = sync_root(root.path(), &options(true), &resolver).unwrap();
        let first_content = read_rule(root.path());
        let second = sync_root(root.path(), &options(true), &resolver).unwrap();
        let second_content = read_rule(root.path());

        assert!(matches!(first, SyncOutcome::Written(_)));
        assert!(matches!(second, SyncOutcome::Unchanged(_)));
        assert_eq!(first_content, second_content);
    }

    #[test]
    fn test_toggling_include_global() {
        let root = tempdir().unwrap();
        let home = tempdir().unwrap();
        fs::create_dir_all(home.path().join(".claude")).unwrap();
        fs::write(home.path().join(GLOBAL_CLAUDE_PATH), "Be concise.").unwrap();
        fs::write(root.path().join(CLAUDE_FILENAME), "Use tabs.").unwrap();
        fs::write(root.path().join(CLAUDE_LOCAL_FILENAME), "My local.").unwrap();
        let resolver = SourceResolver::with_home(home.path());

        sync_root(root.path(), &options(true), &resolver).unwrap();
        assert_eq!(
            read_rule(root.path()),
            format!(
                "{}# Global CLAUDE.md Rules\n\nBe concise.\n\n---\n\n# Project CLAUDE.md Rules\n\nUse tabs.\n\n---\n\n# Local CLAUDE.md Rules\n\nMy local.\n",
                FRONT_MATTER
            )
        );

        sync_root(root.path(), &options(false), &resolver).unwrap();
        assert_eq!(
            read_rule(root.path()),
            format!(
                "{}# Project CLAUDE.md Rules\n\nUse tabs.\n\n---\n\n# Local CLAUDE.md Rules\n\nMy local.\n",
                FRONT_MATTER
            )
        );
    }

    #[test]
    fn test_rule_file_removed_when_sources_disappear() {
        let root = tempdir().unwrap();
        let claude_md = root.path().join(CLAUDE_FILENAME);
        fs::write(&claude_md, "Use tabs.").unwrap();
        let resolver = SourceResolver::without_home();

        sync_root(root.path(), &options(true), &resolver).unwrap();
        let rule_file = rule_file_path(root.path(), DEFAULT_RULE_PREFIX);
        assert!(rule_file.exists());

        fs::remove_file(&claude_md).unwrap();
        let outcome = sync_root(root.path(), &options(true), &resolver).unwrap();

        assert_eq!(outcome, SyncOutcome::Removed(rule_file.clone()));
        assert!(!rule_file.exists());
    }

    #[test]
    fn test_custom_rule_prefix() {
        let root = tempdir().unwrap();
        fs::write(root.path().join(CLAUDE_FILENAME), "Use tabs.").unwrap();
        let resolver = SourceResolver::without_home();
        let options = SyncOptions {
            rule_prefix: "10-team".to_string(),
            include_global: false,
        };

        sync_root(root.path(), &options, &resolver).unwrap();

        assert!(root.path().join(".continue/rules/10-team.md").exists());
        assert!(!rule_file_path(root.path(), DEFAULT_RULE_PREFIX).exists());
    }

    #[test]
    fn test_existing_rule_file_is_overwritten() {
        let root = tempdir().unwrap();
        fs::write(root.path().join(CLAUDE_FILENAME), "Use tabs.").unwrap();
        fs::create_dir_all(rules_dir(root.path())).unwrap();
        let rule_file = rule_file_path(root.path(), DEFAULT_RULE_PREFIX);
        fs::write(&rule_file, "stale content that is much longer than the new one").unwrap();

        let resolver = SourceResolver::without_home();
        let outcome = sync_root(root.path(), &options(false), &resolver).unwrap();

        assert_eq!(outcome, SyncOutcome::Written(rule_file));
        assert_eq!(
            read_rule(root.path()),
            format!("{}# Project CLAUDE.md Rules\n\nUse tabs.\n", FRONT_MATTER)
        );
    }

    #[test]
    fn test_unreadable_local_file_does_not_abort_pass() {
        let root = tempdir().unwrap();
        fs::write(root.path().join(CLAUDE_FILENAME), "Use tabs.").unwrap();
        fs::write(root.path().join(CLAUDE_LOCAL_FILENAME), [0xc3, 0x28]).unwrap();

        let resolver = SourceResolver::without_home();
        let outcome = sync_root(root.path(), &options(false), &resolver).unwrap();

        assert!(matches!(outcome, SyncOutcome::Written(_)));
        let content = read_rule(root.path());
        assert!(content.contains("# Project CLAUDE.md Rules\n\nUse tabs."));
        assert!(!content.contains("Local CLAUDE.md Rules"));
    }

    #[cfg(unix)]
    #[test]
    fn test_permission_denied_local_file() {
        use std::os::unix::fs::PermissionsExt;

        let root = tempdir().unwrap();
        fs::write(root.path().join(CLAUDE_FILENAME), "Use tabs.").unwrap();
        let local = root.path().join(CLAUDE_LOCAL_FILENAME);
        fs::write(&local, "secret").unwrap();
        fs::set_permissions(&local, fs::Permissions::from_mode(0o000)).unwrap();

        let resolver = SourceResolver::without_home();
        let result = sync_root(root.path(), &options(false), &resolver);
        assert!(result.is_ok());

        // Privileged users can still read the file, so only check the
        // project block when access was actually denied
        let content = read_rule(root.path());
        assert!(content.contains("# Project CLAUDE.md Rules\n\nUse tabs."));
        if fs::read_to_string(&local).is_err() {
            assert!(!content.contains("secret"));
        }

        fs::set_permissions(&local, fs::Permissions::from_mode(0o644)).unwrap();
    }

    #[test]
    fn test_rules_dir_creation_failure() {
        let root = tempdir().unwrap();
        fs::write(root.path().join(CLAUDE_FILENAME), "Use tabs.").unwrap();
        // A file where the .continue directory should be
        fs::write(root.path().join(".continue"), "not a directory").unwrap();

        let resolver = SourceResolver::without_home();
        let result = sync_root(root.path(), &options(false), &resolver);

        match result {
            Err(SyncError::CreateRulesDir { path, .. }) => {
                assert_eq!(path, rules_dir(root.path()));
            }
            other => panic!("expected CreateRulesDir error, got {:?}", other),
        }
    }

    #[test]
    fn test_write_failure_is_reported() {
        let root = tempdir().unwrap();
        fs::write(root.path().join(CLAUDE_FILENAME), "Use tabs.").unwrap();
        fs::create_dir_all(rule_file_path(root.path(), DEFAULT_RULE_PREFIX)).unwrap();

        let resolver = SourceResolver::without_home();
        let result = sync_root(root.path(), &options(false), &resolver);

        assert!(matches!(result, Err(SyncError::WriteRule { .. })));
    }

    #[test]
    fn test_remove_failure_is_reported() {
        let root = tempdir().unwrap();
        fs::create_dir_all(rule_file_path(root.path(), DEFAULT_RULE_PREFIX)).unwrap();

        let resolver = SourceResolver::without_home();
        let result = sync_root(root.path(), &options(false), &resolver);

        assert!(matches!(result, Err(SyncError::RemoveRule { .. })));
    }

    #[test]
    fn test_missing_root_is_not_created() {
        let parent = tempdir().unwrap();
        let root = parent.path().join("typo");
        let resolver = SourceResolver::with_home(parent.path());

        let result = sync_root(&root, &options(true), &resolver);

        match result {
            Err(SyncError::MissingRoot { path }) => assert_eq!(path, root),
            other => panic!("expected MissingRoot error, got {:?}", other),
        }
        assert!(!root.exists());
    }

    #[test]
    fn test_file_as_root_is_rejected() {
        let parent = tempdir().unwrap();
        let root = parent.path().join("CLAUDE.md");
        fs::write(&root, "Use tabs.").unwrap();

        let resolver = SourceResolver::without_home();
        let result = sync_root(&root, &options(false), &resolver);

        assert!(matches!(result, Err(SyncError::MissingRoot { .. })));
    }

    #[test]
    fn test_escaping_rule_prefix_writes_nothing() {
        let outer = tempdir().unwrap();
        let root = outer.path().join("a").join("b");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join(CLAUDE_FILENAME), "Use tabs.").unwrap();
        let resolver = SourceResolver::without_home();

        for prefix in ["../../escaped", "", ".."] {
            let options = SyncOptions {
                rule_prefix: prefix.to_string(),
                include_global: false,
            };

            let result = sync_root(&root, &options, &resolver);

            match result {
                Err(SyncError::InvalidPrefix { path, source }) => {
                    assert_eq!(path, root);
                    assert_eq!(source.kind(), std::io::ErrorKind::InvalidInput);
                }
                other => panic!("expected InvalidPrefix error, got {:?}", other),
            }
        }

        assert!(!root.join("escaped.md").exists());
        assert!(!root.join(".continue/escaped.md").exists());
        assert!(!rules_dir(&root).exists());
    }

    #[test]
    fn test_sync_all_isolates_failures() {
        let broken = tempdir().unwrap();
        let healthy = tempdir().unwrap();
        let missing = broken.path().join("missing");
        fs::write(broken.path().join(CLAUDE_FILENAME), "broken").unwrap();
        fs::write(broken.path().join(".continue"), "not a directory").unwrap();
        fs::write(healthy.path().join(CLAUDE_FILENAME), "healthy").unwrap();

        let resolver = SourceResolver::without_home();
        let report = sync_all(
            [broken.path(), missing.as_path(), healthy.path()],
            &options(false),
            &resolver,
        );

        assert!(!report.is_success());
        assert_eq!(report.roots.len(), 3);

        let failures: Vec<_> = report.failures().map(|(root, _)| root.to_path_buf()).collect();
        assert_eq!(failures, vec![broken.path().to_path_buf(), missing.clone()]);
        assert!(!missing.exists());

        let outcomes: Vec<_> = report.outcomes().collect();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].0, healthy.path());
        assert!(read_rule(healthy.path()).contains("healthy"));
    }

    #[test]
    fn test_sync_all_with_no_roots() {
        let resolver = SourceResolver::without_home();
        let report = sync_all(Vec::<PathBuf>::new(), &SyncOptions::default(), &resolver);
        assert!(report.is_success());
        assert!(report.roots.is_empty());
    }

    #[test]
    fn test_options_from_config() {
        let mut config = Config::default();
        config.rule_prefix = "05-rules".to_string();
        config.include_global = false;

        let options = SyncOptions::from(&config);
        assert_eq!(options.rule_prefix, "05-rules");
        assert!(!options.include_global);
    }
}
