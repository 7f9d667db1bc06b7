// ChatKeeper - util/constants.rs
//
// Single source of truth for all named constants, patterns, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "ChatKeeper";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "ChatKeeper";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Storage file location
// =============================================================================

/// Subdirectory of the client root that houses per-server resource caches.
pub const CLIENT_RESOURCES_DIR_NAME: &str = "client_resources";

/// Name of the client storage blob inside each resource directory.
pub const STORAGE_FILE_NAME: &str = ".storage";

/// Resource directory assumed when no candidate matches the server signature.
pub const DEFAULT_RESOURCE_DIR: &str = "play.gta.world_22005";

/// Signature substring identifying a storage file written by the target
/// server. Matched against the raw storage text, not a parsed structure.
pub const SERVER_SIGNATURE_PATTERN: &str = r#""server_version":"GTA World[^"]*""#;

// =============================================================================
// Chat log extraction
// =============================================================================

/// Locates the embedded chat log inside the storage blob. The body is greedy
/// up to the last literal `\n` escape before the closing quote; a chat log
/// with no `\n` token at all does not match and extraction fails.
pub const CHAT_LOG_PATTERN: &str = r#""chat_log":".+\\n""#;

/// Field prefix stripped from the matched chat log fragment.
pub const CHAT_LOG_PREFIX: &str = r#""chat_log":""#;

/// A bracketed `[H:MM:SS] ` token at the start of a line, including the
/// trailing space. Hours, minutes, and seconds may each be 1 or 2 digits.
pub const LINE_TIMESTAMP_PATTERN: &str = r"(?m)^\[\d{1,2}:\d{1,2}:\d{1,2}\] ";

// =============================================================================
// Filter criteria patterns
//
// One pattern per message category, matched case-insensitively against each
// line with its leading timestamp stripped. Declared order is significant:
// the first matching criterion decides a line's fate.
// =============================================================================

/// Out-of-character chat: `(( (123) John Doe: hello ))`.
pub const OOC_PATTERN: &str = r"^\(\( \(\d*\) [\p{L}]+ {0,1}([\p{L}]+){0,1}:.*?\)\)$";

/// In-character speech: `John Doe says: hello`, also shouts/whispers and
/// the `(Car)` and `[low]` variants.
pub const IC_PATTERN: &str =
    r"^(\(Car\) ){0,1}[\p{L}]+ {0,1}([\p{L}]+){0,1} (says|shouts|whispers)( \[low\]){0,1}:.*$";

/// Emote: `* John Doe waves`.
pub const EMOTE_PATTERN: &str = r"^\* [\p{L}]+ {0,1}([\p{L}]+){0,1} .*$";

/// Action with attribution: `* does something ((John Doe))*`.
pub const ACTION_PATTERN: &str = r"^\* .* \(\([\p{L}]+ {0,1}([\p{L}]+){0,1}\)\)\*$";

/// Private message: `(( PM to (123) John Doe: hi ))`.
pub const PM_PATTERN: &str = r"^\(\( PM (to|from) \(\d*\) [\p{L}]+ {0,1}([\p{L}]+){0,1}:.*?\)\)$";

/// Radio traffic: `**[S: 1 CH: 2] John Doe ...`.
pub const RADIO_PATTERN: &str = r"^\*\*\[S: .* CH: .*\] [\p{L}]+ {0,1}([\p{L}]+){0,1}.*$";

/// Advertisements: `[Company Advertisement] ...`.
pub const ADS_PATTERN: &str = r"^\[.*Advertisement.*\] .*$";

// =============================================================================
// Backup naming
// =============================================================================

/// `DD/MON/YYYY` date token expected in the first line of a parsed log.
pub const HEADER_DATE_PATTERN: &str = r"\d{1,2}/[A-Za-z]{3}/\d{4}";

/// `H:MM:SS`-style time token expected in the first line of a parsed log.
pub const HEADER_TIME_PATTERN: &str = r"\d{1,2}:\d{1,2}:\d{1,2}";

/// Four-digit year extracted from the date token.
pub const HEADER_YEAR_PATTERN: &str = r"\d{4}";

/// Three-letter month extracted from the date token.
pub const HEADER_MONTH_PATTERN: &str = r"[A-Za-z]{3}";

/// Extension given to backup files.
pub const BACKUP_FILE_EXTENSION: &str = ".txt";

/// Name of the staging file written next to an existing backup during a
/// size comparison. Deleted before and after every comparison attempt.
pub const BACKUP_TEMP_FILE_NAME: &str = ".temp";

/// Line separator used when writing backup and filter output to disk.
#[cfg(windows)]
pub const PLATFORM_LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
pub const PLATFORM_LINE_ENDING: &str = "\n";

// =============================================================================
// Scheduler cadences
// =============================================================================

/// Seconds between polls of the game process list on the game-exit lane.
pub const GAME_CLOSED_CHECK_SECS: u64 = 10;

/// Length of one interval-lane sleep slice in seconds. The pause and quit
/// flags are checked between slices, so a pause takes effect within one
/// slice rather than after a full interval.
pub const INTERVAL_SLICE_SECS: u64 = 10;

/// Number of sleep slices per configured interval minute.
pub const SLICES_PER_MINUTE: u64 = 60 / INTERVAL_SLICE_SECS;

/// Default process name watched by the game-exit lane.
pub const DEFAULT_GAME_PROCESS: &str = "GTA5.exe";

// =============================================================================
// Backup settings bounds
// =============================================================================

/// Default minutes between interval-lane backup attempts.
pub const DEFAULT_INTERVAL_MINUTES: u32 = 10;

/// Minimum configurable interval in minutes.
pub const MIN_INTERVAL_MINUTES: u32 = 1;

/// Maximum configurable interval in minutes (one day).
pub const MAX_INTERVAL_MINUTES: u32 = 1_440;

/// Default number of identical consecutive backups before a warning fires.
pub const DEFAULT_SAME_HASH_WARN_AMOUNT: u32 = 2;

/// Minimum configurable duplicate-hash warning threshold.
pub const MIN_SAME_HASH_WARN_AMOUNT: u32 = 1;

// =============================================================================
// Configuration and state files
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Runtime state file name (stored in the platform data directory).
pub const STATE_FILE_NAME: &str = "state.json";

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
