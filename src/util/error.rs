// ChatKeeper - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// All errors preserve the causal chain for diagnostic logging.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all ChatKeeper operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum ChatKeeperError {
    /// Storage file location failed.
    Locate(LocateError),

    /// Chat log extraction failed.
    Extract(ExtractError),

    /// Filter operation failed.
    Classify(ClassifyError),

    /// Backup write failed.
    Backup(BackupError),

    /// Runtime state persistence failed.
    Session(SessionError),

    /// Configuration loading or validation failed.
    Config(ConfigError),

    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for ChatKeeperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locate(e) => write!(f, "Locate error: {e}"),
            Self::Extract(e) => write!(f, "Extraction error: {e}"),
            Self::Classify(e) => write!(f, "Filter error: {e}"),
            Self::Backup(e) => write!(f, "Backup error: {e}"),
            Self::Session(e) => write!(f, "State error: {e}"),
            Self::Config(e) => write!(f, "Configuration error: {e}"),
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for ChatKeeperError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Locate(e) => Some(e),
            Self::Extract(e) => Some(e),
            Self::Classify(e) => Some(e),
            Self::Backup(e) => Some(e),
            Self::Session(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Io { source, .. } => Some(source),
        }
    }
}

// ---------------------------------------------------------------------------
// Locate errors
// ---------------------------------------------------------------------------

/// Errors related to locating the active server's storage file.
#[derive(Debug)]
pub enum LocateError {
    /// The client root does not exist or lacks a `client_resources` directory.
    DirectoryNotFound { path: PathBuf },

    /// No resource directory contained a storage file with the expected
    /// server signature. Callers fall back to the default resource directory.
    NotFound,
}

impl fmt::Display for LocateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectoryNotFound { path } => {
                write!(
                    f,
                    "Client directory '{}' does not exist or has no client_resources",
                    path.display()
                )
            }
            Self::NotFound => {
                write!(f, "No resource directory matched the server signature")
            }
        }
    }
}

impl std::error::Error for LocateError {}

impl From<LocateError> for ChatKeeperError {
    fn from(e: LocateError) -> Self {
        Self::Locate(e)
    }
}

// ---------------------------------------------------------------------------
// Extraction errors
// ---------------------------------------------------------------------------

/// Errors related to extracting the chat log from a storage file.
#[derive(Debug)]
pub enum ExtractError {
    /// The storage text contains no `chat_log` field in the expected shape.
    /// Also raised for a chat log with zero lines, since the terminating
    /// `\n` escape is part of the match.
    NoChatLog { path: PathBuf },

    /// I/O error reading the storage file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoChatLog { path } => {
                write!(
                    f,
                    "'{}' does not contain a chat log in the expected format",
                    path.display()
                )
            }
            Self::Io { path, source } => {
                write!(f, "Cannot read '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ExtractError> for ChatKeeperError {
    fn from(e: ExtractError) -> Self {
        Self::Extract(e)
    }
}

// ---------------------------------------------------------------------------
// Classify errors
// ---------------------------------------------------------------------------

/// Errors related to the word-list filter mode.
#[derive(Debug)]
pub enum ClassifyError {
    /// The word-list input was blank.
    NoWordsProvided,

    /// The word-list input was nonblank but yielded no usable terms.
    NoUsableTerms,
}

impl fmt::Display for ClassifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoWordsProvided => write!(f, "No words were provided to filter by"),
            Self::NoUsableTerms => write!(
                f,
                "The word list produced no usable terms; check its formatting"
            ),
        }
    }
}

impl std::error::Error for ClassifyError {}

impl From<ClassifyError> for ChatKeeperError {
    fn from(e: ClassifyError) -> Self {
        Self::Classify(e)
    }
}

// ---------------------------------------------------------------------------
// Backup errors
// ---------------------------------------------------------------------------

/// Errors related to writing a backup file.
#[derive(Debug)]
pub enum BackupError {
    /// The parsed log text was blank; nothing to back up.
    EmptyLog,

    /// The configured backup root does not exist.
    RootMissing { path: PathBuf },

    /// The first line of the log lacked the date or time token needed to
    /// derive the backup file name.
    MalformedHeader { first_line: String },

    /// I/O error during staging, comparison, or replacement.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: io::Error,
    },
}

impl fmt::Display for BackupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLog => write!(f, "The parsed chat log is empty"),
            Self::RootMissing { path } => {
                write!(f, "Backup directory '{}' does not exist", path.display())
            }
            Self::MalformedHeader { first_line } => {
                write!(
                    f,
                    "Cannot derive a backup name from the log header '{first_line}'"
                )
            }
            Self::Io {
                path,
                operation,
                source,
            } => write!(
                f,
                "Backup I/O error during {operation} on '{}': {source}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for BackupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<BackupError> for ChatKeeperError {
    fn from(e: BackupError) -> Self {
        Self::Backup(e)
    }
}

// ---------------------------------------------------------------------------
// Session errors
// ---------------------------------------------------------------------------

/// Errors related to runtime state persistence.
#[derive(Debug)]
pub enum SessionError {
    /// I/O error reading or writing the state file.
    Io { path: PathBuf, source: io::Error },

    /// JSON serialisation error.
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "State I/O error '{}': {source}", path.display())
            }
            Self::Json { path, source } => {
                write!(f, "State serialisation error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json { source, .. } => Some(source),
        }
    }
}

impl From<SessionError> for ChatKeeperError {
    fn from(e: SessionError) -> Self {
        Self::Session(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// TOML serialisation failed while saving.
    TomlSerialise {
        path: PathBuf,
        source: toml::ser::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading or writing the config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::TomlSerialise { path, source } => {
                write!(f, "Config save error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::TomlSerialise { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for ChatKeeperError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Convenience type alias for ChatKeeper results.
pub type Result<T> = std::result::Result<T, ChatKeeperError>;
