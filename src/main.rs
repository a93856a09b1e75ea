use clap::{Parser, Subcommand};
use claude_md_sync::logging::init_logging;
use claude_md_sync::{
    add_root_to_config, get_config_file_path, load_config, remove_root_from_config, start_daemon,
    sync_all, update_settings, Config, SettingsUpdate, SourceResolver, SyncOptions, SyncReport,
};
use std::path::PathBuf;
use std::process;
use std::sync::mpsc;

#[derive(Parser)]
#[command(name = "claude-md-sync")]
#[command(about = "Sync CLAUDE.md instruction files into Continue rules")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sync the given project roots (defaults to the current directory)
    Sync {
        /// Project roots to sync
        paths: Vec<PathBuf>,
    },
    /// Sync every configured project root
    SyncAll,
    /// Watch configured roots and sync whenever instruction files change
    Watch,
    /// Add a project root to the configuration (defaults to the current directory)
    Add { path: Option<PathBuf> },
    /// Remove a project root from the configuration (defaults to the current directory)
    Remove { path: Option<PathBuf> },
    /// List configured project roots and settings
    List,
    /// Change sync settings
    Config {
        /// Watch for changes while the daemon runs
        #[arg(long)]
        auto_sync: Option<bool>,
        /// Stem of the generated rule file
        #[arg(long)]
        rule_prefix: Option<String>,
        /// Include ~/.claude/CLAUDE.md in every root's rules
        #[arg(long)]
        include_global: Option<bool>,
    },
}

fn current_dir_or_exit() -> PathBuf {
    match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Error getting current directory: {}", e);
            process::exit(1);
        }
    }
}

fn load_config_or_exit() -> Config {
    match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    }
}

/// Prints a one-line notice for the pass and the details of any failure.
fn report_and_exit(report: &SyncReport, success_message: &str) {
    if report.is_success() {
        println!("{}", success_message);
        return;
    }
    for (root, e) in report.failures() {
        eprintln!("CLAUDE.md sync error in {}: {}", root.display(), e);
    }
    process::exit(1);
}

fn print_config(config: &Config) {
    println!("auto_sync: {}", config.auto_sync);
    println!("rule_prefix: {}", config.rule_prefix);
    println!("include_global: {}", config.include_global);
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    if let Err(e) = init_logging(level) {
        eprintln!("Error initializing logging: {}", e);
    }

    match cli.command {
        Commands::Sync { paths } => {
            let roots = if paths.is_empty() {
                vec![current_dir_or_exit()]
            } else {
                paths
            };
            let config = load_config_or_exit();
            let report = sync_all(
                &roots,
                &SyncOptions::from(&config),
                &SourceResolver::from_env(),
            );
            report_and_exit(&report, "CLAUDE.md synced to Continue rules");
        }
        Commands::SyncAll => {
            let config = load_config_or_exit();
            if config.roots().is_empty() {
                println!("No project roots configured. Use 'claude-md-sync add' in a project to add one.");
                return;
            }
            let report = sync_all(
                config.roots(),
                &SyncOptions::from(&config),
                &SourceResolver::from_env(),
            );
            report_and_exit(&report, "All CLAUDE.md files synced");
        }
        Commands::Watch => {
            // Kept alive for the lifetime of the daemon; interrupting the process stops it
            let (_shutdown_tx, shutdown_rx) = mpsc::channel();

            match start_daemon(shutdown_rx) {
                Ok(()) => println!("Daemon stopped"),
                Err(e) => {
                    eprintln!("Error running daemon: {}", e);
                    process::exit(1);
                }
            }
        }
        Commands::Add { path } => {
            let root = path.unwrap_or_else(current_dir_or_exit);
            if !root.is_dir() {
                eprintln!("Error: '{}' is not a directory", root.display());
                process::exit(1);
            }

            match add_root_to_config(&root) {
                Ok(true) => println!("Successfully added '{}' to synced roots", root.display()),
                Ok(false) => println!(
                    "Directory '{}' is already in the synced roots list",
                    root.display()
                ),
                Err(e) => {
                    eprintln!("Error adding directory to configuration: {}", e);
                    process::exit(1);
                }
            }
        }
        Commands::Remove { path } => {
            let root = path.unwrap_or_else(current_dir_or_exit);

            match remove_root_from_config(&root) {
                Ok(true) => println!(
                    "Successfully removed '{}' from synced roots",
                    root.display()
                ),
                Ok(false) => println!(
                    "Directory '{}' is not in the synced roots list",
                    root.display()
                ),
                Err(e) => {
                    eprintln!("Error removing directory from configuration: {}", e);
                    process::exit(1);
                }
            }
        }
        Commands::List => {
            let config = load_config_or_exit();
            if let Ok(path) = get_config_file_path() {
                println!("config: {}", path.display());
            }
            print_config(&config);
            if config.roots().is_empty() {
                println!("No project roots configured");
            } else {
                println!("roots:");
                for root in config.roots() {
                    println!("  - {}", root.display());
                }
            }
        }
        Commands::Config {
            auto_sync,
            rule_prefix,
            include_global,
        } => {
            let update = SettingsUpdate {
                auto_sync,
                rule_prefix,
                include_global,
            };
            let config = if update.is_empty() {
                load_config_or_exit()
            } else {
                match update_settings(&update) {
                    Ok(config) => config,
                    Err(e) => {
                        eprintln!("Error updating configuration: {}", e);
                        process::exit(1);
                    }
                }
            };
            print_config(&config);
        }
    }
}
