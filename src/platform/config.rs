// ChatKeeper - platform/config.rs
//
// Settings store: config.toml loading with startup validation, plus
// platform config/data directory resolution.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

// =============================================================================
// Platform paths
// =============================================================================

/// Resolved platform paths for ChatKeeper data and configuration.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Configuration directory (e.g. ~/.config/chatkeeper/ or %APPDATA%\ChatKeeper\).
    pub config_dir: PathBuf,

    /// Data directory for persisted runtime state.
    pub data_dir: PathBuf,
}

impl PlatformPaths {
    /// Resolve platform-appropriate paths.
    ///
    /// Falls back to the current directory if platform dirs cannot be
    /// determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();

            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                "Platform paths resolved"
            );

            Self {
                config_dir,
                data_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            let fallback = PathBuf::from(".");
            Self {
                config_dir: fallback.clone(),
                data_dir: fallback,
            }
        }
    }

    /// Full path of the configuration file.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join(constants::CONFIG_FILE_NAME)
    }

    /// Full path of the runtime state file.
    pub fn state_file(&self) -> PathBuf {
        self.data_dir.join(constants::STATE_FILE_NAME)
    }
}

// =============================================================================
// Settings shape
// =============================================================================

/// Complete settings tree, as persisted in config.toml.
///
/// Unknown keys are silently ignored for forward compatibility -- a newer
/// config file can be used with an older binary without crashing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// `[paths]` section.
    pub paths: PathsSection,
    /// `[backup]` section.
    pub backup: BackupSection,
    /// `[filter]` section.
    pub filter: FilterSection,
    /// `[logging]` section.
    pub logging: LoggingSection,
}

/// `[paths]` -- where the game client and the backups live.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    /// Root of the RAGE:MP installation (the directory containing
    /// `client_resources`). Empty until the user configures it.
    pub directory_path: String,

    /// Root directory that receives the dated backup layout.
    pub backup_path: String,
}

/// `[backup]` -- scheduler cadences and backup behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupSection {
    /// Back up automatically when the game process exits.
    pub automatic_on_exit: bool,

    /// Also back up on a fixed interval while the game runs.
    pub interval_enabled: bool,

    /// Minutes between interval backups.
    pub interval_minutes: u32,

    /// Strip leading line timestamps from backed-up logs.
    pub remove_timestamps: bool,

    /// Warn when the same log content keeps being backed up.
    pub warn_on_same_hash: bool,

    /// Consecutive identical backups needed before the warning fires.
    pub same_hash_warn_amount: u32,

    /// Process name watched by the game-exit lane.
    pub game_process: String,
}

impl Default for BackupSection {
    fn default() -> Self {
        Self {
            automatic_on_exit: true,
            interval_enabled: false,
            interval_minutes: constants::DEFAULT_INTERVAL_MINUTES,
            remove_timestamps: false,
            warn_on_same_hash: true,
            same_hash_warn_amount: constants::DEFAULT_SAME_HASH_WARN_AMOUNT,
            game_process: constants::DEFAULT_GAME_PROCESS.to_string(),
        }
    }
}

/// `[filter]` -- per-category flags and the word-list input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSection {
    pub ooc_enabled: bool,
    pub ic_enabled: bool,
    pub emote_enabled: bool,
    pub action_enabled: bool,
    pub pm_enabled: bool,
    pub radio_enabled: bool,
    pub ads_enabled: bool,

    /// Keep lines matching no category at all.
    pub other_enabled: bool,

    /// Free-form word list, one term per line.
    pub words: String,

    /// Strip leading line timestamps from filter output.
    pub remove_timestamps: bool,

    /// Return empty output instead of the whole log when nothing matches.
    pub suppress_no_match_fallback: bool,
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            ooc_enabled: true,
            ic_enabled: true,
            emote_enabled: true,
            action_enabled: true,
            pm_enabled: true,
            radio_enabled: true,
            ads_enabled: true,
            other_enabled: true,
            words: String::new(),
            remove_timestamps: false,
            suppress_no_match_fallback: false,
        }
    }
}

impl FilterSection {
    /// Per-category flags in criteria evaluation order.
    pub fn category_flags(&self) -> [bool; 7] {
        [
            self.ooc_enabled,
            self.ic_enabled,
            self.emote_enabled,
            self.action_enabled,
            self.pm_enabled,
            self.radio_enabled,
            self.ads_enabled,
        ]
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level filter (trace, debug, info, warn, error).
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: constants::DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

// =============================================================================
// Loading, validation, saving
// =============================================================================

impl Settings {
    /// Load settings from `path`. A missing file yields the defaults; a
    /// malformed file is an error so a typo never silently reverts the
    /// user's configuration.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file; using defaults");
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut settings: Settings =
            toml::from_str(&raw).map_err(|e| ConfigError::TomlParse {
                path: path.to_path_buf(),
                source: e,
            })?;

        settings.clamp_to_bounds();
        Ok(settings)
    }

    /// Clamp out-of-range values to their bounds, warning about each
    /// adjustment instead of failing startup.
    fn clamp_to_bounds(&mut self) {
        let minutes = self.backup.interval_minutes;
        let clamped =
            minutes.clamp(constants::MIN_INTERVAL_MINUTES, constants::MAX_INTERVAL_MINUTES);
        if clamped != minutes {
            tracing::warn!(
                configured = minutes,
                clamped,
                "interval_minutes out of range; clamped"
            );
            self.backup.interval_minutes = clamped;
        }

        if self.backup.same_hash_warn_amount < constants::MIN_SAME_HASH_WARN_AMOUNT {
            tracing::warn!(
                configured = self.backup.same_hash_warn_amount,
                minimum = constants::MIN_SAME_HASH_WARN_AMOUNT,
                "same_hash_warn_amount below minimum; clamped"
            );
            self.backup.same_hash_warn_amount = constants::MIN_SAME_HASH_WARN_AMOUNT;
        }
    }

    /// Persist settings to `path`, creating parent directories as needed.
    /// Written via a temporary sibling and rename so a crash mid-save never
    /// corrupts the previous good file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let rendered = toml::to_string_pretty(self).map_err(|e| ConfigError::TomlSerialise {
            path: path.to_path_buf(),
            source: e,
        })?;

        let temp = path.with_extension("toml.tmp");
        std::fs::write(&temp, rendered).map_err(|e| ConfigError::Io {
            path: temp.clone(),
            source: e,
        })?;
        std::fs::rename(&temp, path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(())
    }
}

// =============================================================================
// Shared settings store
// =============================================================================

/// Settings shared between the foreground and the scheduler lanes.
///
/// Lanes take a fresh snapshot at the top of each cycle, so configuration
/// edits apply on the next cycle without any snapshot isolation.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    inner: RwLock<Settings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf, settings: Settings) -> Self {
        Self {
            path,
            inner: RwLock::new(settings),
        }
    }

    /// Clone the current settings. Lock poisoning is unrecoverable
    /// (a panicked writer), so it propagates as a panic.
    pub fn snapshot(&self) -> Settings {
        self.inner.read().expect("settings lock poisoned").clone()
    }

    /// Mutate the settings in place and persist the result.
    pub fn update<F: FnOnce(&mut Settings)>(&self, f: F) -> Result<(), ConfigError> {
        let mut guard = self.inner.write().expect("settings lock poisoned");
        f(&mut guard);
        guard.save(&self.path)
    }

    /// Path of the backing config file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(&dir.path().join("config.toml")).unwrap();
        assert!(settings.backup.automatic_on_exit);
        assert_eq!(
            settings.backup.interval_minutes,
            constants::DEFAULT_INTERVAL_MINUTES
        );
        assert!(settings.filter.other_enabled);
    }

    #[test]
    fn test_roundtrip_save_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.paths.directory_path = "/games/ragemp".to_string();
        settings.backup.interval_enabled = true;
        settings.filter.ic_enabled = false;
        settings.save(&path).unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.paths.directory_path, "/games/ragemp");
        assert!(loaded.backup.interval_enabled);
        assert!(!loaded.filter.ic_enabled);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is { not toml").unwrap();
        assert!(matches!(
            Settings::load(&path),
            Err(ConfigError::TomlParse { .. })
        ));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[backup]\nfuture_option = true\n").unwrap();
        let settings = Settings::load(&path).unwrap();
        assert!(settings.backup.automatic_on_exit);
    }

    #[test]
    fn test_out_of_range_interval_is_clamped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[backup]\ninterval_minutes = 0\n").unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(
            settings.backup.interval_minutes,
            constants::MIN_INTERVAL_MINUTES
        );
    }

    #[test]
    fn test_store_update_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let store = SettingsStore::new(path.clone(), Settings::default());

        store
            .update(|s| s.paths.backup_path = "/backups".to_string())
            .unwrap();

        assert_eq!(store.snapshot().paths.backup_path, "/backups");
        let reloaded = Settings::load(&path).unwrap();
        assert_eq!(reloaded.paths.backup_path, "/backups");
    }

    #[test]
    fn test_category_flags_order() {
        let mut filter = FilterSection::default();
        filter.ooc_enabled = false;
        filter.ads_enabled = false;
        let flags = filter.category_flags();
        assert!(!flags[0]);
        assert!(flags[1]);
        assert!(!flags[6]);
    }
}
