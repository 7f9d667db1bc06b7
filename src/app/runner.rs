// ChatKeeper - app/runner.rs
//
// The locate → extract → backup → hash-guard pipeline behind every backup
// trigger. The runner carries no policy about who sees an error: callers
// decide surfacing per trigger (game-close and manual runs surface, interval
// runs stay silent).

use crate::core::backup::write_backup;
use crate::core::extract::extract;
use crate::core::hashguard::DuplicateHashGuard;
use crate::core::locate;
use crate::core::model::BackupOutcome;
use crate::platform::config::SettingsStore;
use crate::util::error::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What a completed pipeline run did.
#[derive(Debug, Clone)]
pub struct BackupReport {
    pub outcome: BackupOutcome,

    /// True when the duplicate-hash guard fired on this run.
    pub hash_warning: bool,
}

/// Executes backup runs against the current settings snapshot.
pub struct BackupRunner {
    settings: Arc<SettingsStore>,
    state_path: PathBuf,
}

impl BackupRunner {
    pub fn new(settings: Arc<SettingsStore>, state_path: PathBuf) -> Self {
        Self {
            settings,
            state_path,
        }
    }

    /// Parse the current chat log and back it up.
    ///
    /// Returns `Ok(None)` when there is nothing to do: extraction failed on
    /// a background run, or the extracted log is blank. `game_closed` marks
    /// runs triggered by the game process exiting; only those consult the
    /// duplicate-hash guard.
    pub fn run(&self, game_closed: bool) -> Result<Option<BackupReport>> {
        let settings = self.settings.snapshot();
        let root = Path::new(&settings.paths.directory_path);

        // Re-locate every run: the active resource directory changes when
        // the player reconnects through a different server address.
        let storage = locate::resolve_storage_path(root);

        let parsed = match extract(&storage, settings.backup.remove_timestamps) {
            Ok(parsed) => parsed,
            Err(e) => {
                if game_closed {
                    return Err(e.into());
                }
                tracing::debug!(error = %e, "Background extraction failed; skipping cycle");
                return Ok(None);
            }
        };

        if parsed.is_blank() {
            tracing::debug!("Extracted chat log is blank; nothing to back up");
            return Ok(None);
        }

        let backup_root = PathBuf::from(&settings.paths.backup_path);
        let outcome = write_backup(&parsed.text, &backup_root)?;

        let mut hash_warning = false;
        if game_closed && settings.backup.warn_on_same_hash {
            hash_warning = self.record_hash(&parsed.text, root, settings.backup.same_hash_warn_amount);
        }

        Ok(Some(BackupReport {
            outcome,
            hash_warning,
        }))
    }

    /// Feed the guard and persist its state. Persistence failures are
    /// non-fatal: the warning still fires this run, the counter just does
    /// not survive a restart.
    fn record_hash(&self, log_text: &str, root: &Path, threshold: u32) -> bool {
        use crate::app::session::SessionState;

        let guard = DuplicateHashGuard::new(threshold);
        let mut state = SessionState::load(&self.state_path);
        let warn = guard.record(log_text, &mut state.hash_state);

        if let Ok(candidate) = locate::locate(root) {
            state.resource_directory = Some(candidate.directory_name);
        }

        if let Err(e) = state.save(&self.state_path) {
            tracing::warn!(error = %e, "Could not persist duplicate-hash state");
        }
        warn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::config::Settings;
    use crate::util::constants;
    use std::fs;
    use tempfile::TempDir;

    const STORAGE: &str = concat!(
        r#"{"server_version":"GTA World (EU#1)","chat_log":"#,
        r#""[DATE: 14/NOV/2018 | TIME: 15:44:39]\n[15:44:40] John Doe says: hi\n"}"#
    );

    struct Fixture {
        _client: TempDir,
        _backups: TempDir,
        runner: BackupRunner,
        backup_root: PathBuf,
    }

    fn fixture() -> Fixture {
        let client = TempDir::new().unwrap();
        let backups = TempDir::new().unwrap();

        let resource = client
            .path()
            .join(constants::CLIENT_RESOURCES_DIR_NAME)
            .join("play.gta.world_22005");
        fs::create_dir_all(&resource).unwrap();
        fs::write(resource.join(constants::STORAGE_FILE_NAME), STORAGE).unwrap();

        let mut settings = Settings::default();
        settings.paths.directory_path = client.path().to_string_lossy().into_owned();
        settings.paths.backup_path = backups.path().to_string_lossy().into_owned();
        settings.backup.same_hash_warn_amount = 2;

        let store = Arc::new(SettingsStore::new(
            client.path().join("config.toml"),
            settings,
        ));
        let state_path = client.path().join("state.json");
        let backup_root = backups.path().to_path_buf();

        Fixture {
            runner: BackupRunner::new(store, state_path),
            _client: client,
            _backups: backups,
            backup_root,
        }
    }

    #[test]
    fn test_run_writes_backup() {
        let fx = fixture();
        let report = fx.runner.run(false).unwrap().unwrap();
        assert!(matches!(report.outcome, BackupOutcome::Written { .. }));
        assert!(!report.hash_warning);

        let target = fx
            .backup_root
            .join("2018")
            .join("NOV")
            .join("14.NOV.2018-15.44.39.txt");
        assert!(target.is_file());
    }

    #[test]
    fn test_repeat_game_closed_runs_trigger_hash_warning() {
        let fx = fixture();
        let first = fx.runner.run(true).unwrap().unwrap();
        assert!(!first.hash_warning);

        // Second identical game-closed run reaches the threshold of 2.
        let second = fx.runner.run(true).unwrap().unwrap();
        assert!(matches!(second.outcome, BackupOutcome::Skipped { .. }));
        assert!(second.hash_warning);

        // And keeps firing above the threshold.
        let third = fx.runner.run(true).unwrap().unwrap();
        assert!(third.hash_warning);
    }

    #[test]
    fn test_interval_runs_do_not_touch_hash_state() {
        let fx = fixture();
        fx.runner.run(false).unwrap().unwrap();
        fx.runner.run(false).unwrap().unwrap();
        let report = fx.runner.run(true).unwrap().unwrap();
        // First game-closed run: counter starts at 1, no warning yet.
        assert!(!report.hash_warning);
    }

    #[test]
    fn test_background_run_with_missing_storage_is_silent() {
        let client = TempDir::new().unwrap();
        let backups = TempDir::new().unwrap();
        fs::create_dir_all(client.path().join(constants::CLIENT_RESOURCES_DIR_NAME)).unwrap();

        let mut settings = Settings::default();
        settings.paths.directory_path = client.path().to_string_lossy().into_owned();
        settings.paths.backup_path = backups.path().to_string_lossy().into_owned();

        let store = Arc::new(SettingsStore::new(
            client.path().join("config.toml"),
            settings,
        ));
        let runner = BackupRunner::new(store, client.path().join("state.json"));

        assert!(runner.run(false).unwrap().is_none());
        assert!(runner.run(true).is_err());
    }
}
