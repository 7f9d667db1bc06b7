// ChatKeeper - main.rs
//
// CLI entry point and composition root. Handles:
// 1. CLI argument parsing
// 2. Settings loading with CLI overrides
// 3. Logging initialisation (debug mode support)
// 4. Wiring the pipeline services and dispatching the subcommand

use chatkeeper::app::process::SystemProcessProbe;
use chatkeeper::app::runner::BackupRunner;
use chatkeeper::app::scheduler::BackupScheduler;
use chatkeeper::core::classify::{filter_log, FilterOptions};
use chatkeeper::core::extract::extract;
use chatkeeper::core::locate;
use chatkeeper::core::model::CriteriaSet;
use chatkeeper::platform::config::{PlatformPaths, Settings, SettingsStore};
use chatkeeper::util::{constants, logging};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// ChatKeeper - chat log extraction, filtering, and rotating backup.
///
/// Point ChatKeeper at a RAGE:MP installation to pull the embedded chat log
/// out of the client's storage file, filter it by message category, and keep
/// dated backups while the game runs.
#[derive(Parser, Debug)]
#[command(name = "chatkeeper", version, about)]
struct Cli {
    /// Configuration file (defaults to the platform config directory).
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Override the configured RAGE:MP installation directory.
    #[arg(long = "directory")]
    directory: Option<PathBuf>,

    /// Override the configured backup root directory.
    #[arg(long = "backup-dir")]
    backup_dir: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the current chat log and print it.
    Parse {
        /// Strip leading line timestamps.
        #[arg(short = 't', long = "remove-timestamps")]
        remove_timestamps: bool,

        /// Write to a file instead of stdout.
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,
    },

    /// Extract the current chat log and filter it by the configured criteria.
    Filter {
        /// Word-mode terms, one per line (overrides the configured list).
        #[arg(short = 'w', long = "words")]
        words: Option<String>,

        /// Read word-mode terms from a file, one per line.
        #[arg(long = "words-file", conflicts_with = "words")]
        words_file: Option<PathBuf>,

        /// Run word mode with the word list from the config file.
        #[arg(long = "config-words", conflicts_with_all = ["words", "words_file"])]
        config_words: bool,

        /// Write to a file instead of stdout.
        #[arg(short = 's', long = "save")]
        save: Option<PathBuf>,
    },

    /// Back up the current chat log once.
    Backup,

    /// Run the backup lanes until interrupted.
    Watch,
}

fn main() {
    let cli = Cli::parse();

    let paths = PlatformPaths::resolve();
    let config_path = cli.config.clone().unwrap_or_else(|| paths.config_file());

    let mut settings = match Settings::load(&config_path) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    logging::init(cli.debug, Some(settings.logging.level.as_str()));
    tracing::info!(
        version = constants::APP_VERSION,
        config = %config_path.display(),
        "ChatKeeper starting"
    );

    // CLI overrides are transient: they apply to this invocation and are
    // never written back to the config file.
    if let Some(dir) = &cli.directory {
        settings.paths.directory_path = dir.to_string_lossy().into_owned();
    }
    if let Some(dir) = &cli.backup_dir {
        settings.paths.backup_path = dir.to_string_lossy().into_owned();
    }

    let store = Arc::new(SettingsStore::new(config_path, settings));
    let state_path = paths.state_file();

    let exit_code = match cli.command {
        Command::Parse {
            remove_timestamps,
            output,
        } => cmd_parse(&store, remove_timestamps, output.as_deref()),
        Command::Filter {
            words,
            words_file,
            config_words,
            save,
        } => cmd_filter(&store, words, words_file.as_deref(), config_words, save.as_deref()),
        Command::Backup => cmd_backup(&store, state_path),
        Command::Watch => cmd_watch(store, state_path),
    };

    std::process::exit(exit_code);
}

/// Resolve the storage path from the configured client directory, failing
/// loudly when the directory was never configured.
fn configured_storage_path(store: &SettingsStore) -> Result<PathBuf, i32> {
    let settings = store.snapshot();
    if settings.paths.directory_path.trim().is_empty() {
        eprintln!(
            "Error: no client directory configured. Set [paths] directory_path or pass --directory."
        );
        return Err(2);
    }
    Ok(locate::resolve_storage_path(Path::new(
        &settings.paths.directory_path,
    )))
}

/// Write `text` to `path` with platform line endings, or print it.
fn emit(text: &str, path: Option<&Path>) -> i32 {
    match path {
        Some(path) => {
            let content = text.replace('\n', constants::PLATFORM_LINE_ENDING);
            if let Err(e) = std::fs::write(path, content) {
                eprintln!("Error: cannot write '{}': {e}", path.display());
                return 1;
            }
            println!("Saved to {}", path.display());
            0
        }
        None => {
            println!("{text}");
            0
        }
    }
}

fn cmd_parse(store: &SettingsStore, remove_timestamps: bool, output: Option<&Path>) -> i32 {
    let storage = match configured_storage_path(store) {
        Ok(path) => path,
        Err(code) => return code,
    };

    // An explicit parse is user-triggered: extraction failures surface.
    match extract(&storage, remove_timestamps) {
        Ok(parsed) => emit(&parsed.text, output),
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

fn cmd_filter(
    store: &SettingsStore,
    words: Option<String>,
    words_file: Option<&Path>,
    config_words: bool,
    save: Option<&Path>,
) -> i32 {
    let storage = match configured_storage_path(store) {
        Ok(path) => path,
        Err(code) => return code,
    };

    let settings = store.snapshot();

    let word_input: Option<String> = if let Some(words) = words {
        Some(words)
    } else if let Some(path) = words_file {
        match std::fs::read_to_string(path) {
            Ok(content) => Some(content),
            Err(e) => {
                eprintln!("Error: cannot read '{}': {e}", path.display());
                return 1;
            }
        }
    } else if config_words {
        Some(settings.filter.words.clone())
    } else {
        None
    };

    let parsed = match extract(&storage, false) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {e}");
            return 1;
        }
    };

    let criteria = CriteriaSet::from_flags(
        settings.filter.category_flags(),
        settings.filter.other_enabled,
    );
    let opts = FilterOptions {
        remove_timestamps: settings.filter.remove_timestamps,
        suppress_no_match_fallback: settings.filter.suppress_no_match_fallback,
    };

    match filter_log(&parsed.text, &criteria, word_input.as_deref(), &opts) {
        Ok(outcome) => {
            if !outcome.matched {
                eprintln!("Note: nothing matched the filter.");
            }
            emit(&outcome.text, save)
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

fn cmd_backup(store: &Arc<SettingsStore>, state_path: PathBuf) -> i32 {
    let runner = BackupRunner::new(Arc::clone(store), state_path);

    // A manual backup is equivalent to the game-close trigger: errors
    // surface and the duplicate-hash guard runs.
    match runner.run(true) {
        Ok(Some(report)) => {
            println!("Backup: {}", report.outcome.path().display());
            if !report.outcome.wrote() {
                println!("Existing backup was not smaller; kept as is.");
            }
            if report.hash_warning {
                eprintln!(
                    "Warning: the same chat log keeps being backed up. \
                     The storage file may no longer be updated by the game."
                );
            }
            0
        }
        Ok(None) => {
            println!("Nothing to back up.");
            0
        }
        Err(e) => {
            eprintln!("Error: {e}");
            1
        }
    }
}

fn cmd_watch(store: Arc<SettingsStore>, state_path: PathBuf) -> i32 {
    let runner = Arc::new(BackupRunner::new(Arc::clone(&store), state_path));
    let probe = Arc::new(SystemProcessProbe::new());
    let mut scheduler = BackupScheduler::new(store, runner, probe);

    scheduler.initialize();
    if !scheduler.exit_lane_alive() && !scheduler.interval_lane_alive() {
        eprintln!(
            "Error: no backup lane could start. Check [paths] directory_path and backup_path, \
             and that at least one of [backup] automatic_on_exit / interval_enabled is set."
        );
        return 2;
    }

    let state = scheduler.state();
    if let Err(e) = ctrlc::set_handler(move || {
        tracing::info!("Interrupt received; stopping lanes");
        state.request_quit();
    }) {
        eprintln!("Error: cannot install interrupt handler: {e}");
        return 1;
    }

    println!("Watching for the game process; press Ctrl-C to stop.");

    let state = scheduler.state();
    while !state.is_quitting() {
        std::thread::sleep(Duration::from_millis(200));
    }

    scheduler.join();
    println!("Stopped.");
    0
}
