// ChatKeeper - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no UI.
// These types are the shared vocabulary across all layers.

use crate::util::constants;
use chrono::{DateTime, Utc};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// =============================================================================
// Resource candidate (output of the storage locator)
// =============================================================================

/// A resource directory whose storage file carries the server signature.
///
/// Produced transiently during location; never persisted.
#[derive(Debug, Clone)]
pub struct ResourceCandidate {
    /// Name of the directory under `client_resources`.
    pub directory_name: String,

    /// Full path to the `.storage` file inside that directory.
    pub storage_path: PathBuf,

    /// Last-write time of the storage file, UTC.
    pub modified: DateTime<Utc>,
}

// =============================================================================
// Parsed log (output of extraction)
// =============================================================================

/// A decoded chat log: newline-delimited lines with the storage wrapper,
/// escape sequences, and HTML entities removed. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLog {
    /// Log text using `\n` as the internal line separator, with trailing
    /// line breaks trimmed.
    pub text: String,

    /// Whether leading line timestamps were removed during extraction.
    pub timestamps_removed: bool,
}

impl ParsedLog {
    /// True if the log contains no non-whitespace content.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// The first line of the log (empty string for an empty log).
    pub fn first_line(&self) -> &str {
        self.text.split('\n').next().unwrap_or("")
    }
}

// =============================================================================
// Message categories and filter criteria
// =============================================================================

/// The fixed set of message categories a chat line can be classified into.
///
/// Declared order is the evaluation order during filtering; the first
/// matching category decides a line's fate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Ooc,
    Ic,
    Emote,
    Action,
    Pm,
    Radio,
    Ads,
}

impl Category {
    /// All categories in evaluation order.
    pub const ALL: [Category; 7] = [
        Category::Ooc,
        Category::Ic,
        Category::Emote,
        Category::Action,
        Category::Pm,
        Category::Radio,
        Category::Ads,
    ];

    /// Display label.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Ooc => "OOC",
            Category::Ic => "IC",
            Category::Emote => "Emote",
            Category::Action => "Action",
            Category::Pm => "PM",
            Category::Radio => "Radio",
            Category::Ads => "Ads",
        }
    }

    /// The built-in regex source for this category.
    pub fn pattern_source(&self) -> &'static str {
        match self {
            Category::Ooc => constants::OOC_PATTERN,
            Category::Ic => constants::IC_PATTERN,
            Category::Emote => constants::EMOTE_PATTERN,
            Category::Action => constants::ACTION_PATTERN,
            Category::Pm => constants::PM_PATTERN,
            Category::Radio => constants::RADIO_PATTERN,
            Category::Ads => constants::ADS_PATTERN,
        }
    }
}

/// One named classification rule: a category, its compiled pattern, and
/// whether lines matching it are kept.
#[derive(Debug, Clone)]
pub struct Criterion {
    pub category: Category,
    pub pattern: Regex,
    pub enabled: bool,
}

/// The full rule set used by a filtering pass: the seven category criteria
/// in evaluation order plus the catch-all flag for unmatched lines.
///
/// Read-only during a filtering pass; mutated only via configuration.
#[derive(Debug, Clone)]
pub struct CriteriaSet {
    criteria: Vec<Criterion>,
    pub other_enabled: bool,
}

impl CriteriaSet {
    /// Build the rule set from per-category enabled flags, given in the
    /// same order as [`Category::ALL`].
    ///
    /// Pattern compilation cannot fail: the sources are built-in constants
    /// covered by tests, so a failure here is a programming error.
    pub fn from_flags(enabled: [bool; 7], other_enabled: bool) -> Self {
        let criteria = Category::ALL
            .iter()
            .zip(enabled)
            .map(|(category, enabled)| Criterion {
                category: *category,
                pattern: compile_criterion_pattern(category.pattern_source()),
                enabled,
            })
            .collect();
        Self {
            criteria,
            other_enabled,
        }
    }

    /// All criteria enabled, including the catch-all.
    pub fn all_enabled() -> Self {
        Self::from_flags([true; 7], true)
    }

    /// Criteria in evaluation order.
    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }
}

/// Criterion patterns match case-insensitively, mirroring how players
/// actually type.
fn compile_criterion_pattern(source: &str) -> Regex {
    RegexBuilder::new(source)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("built-in criterion pattern '{source}' failed to compile: {e}"))
}

// =============================================================================
// Backup outcome
// =============================================================================

/// What a backup write attempt did on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupOutcome {
    /// No file with the derived name existed; it was created.
    Written { path: PathBuf },

    /// An existing file was replaced because the new content is strictly
    /// larger.
    Overwritten {
        path: PathBuf,
        old_len: u64,
        new_len: u64,
    },

    /// An existing file was kept because the new content is not larger.
    Skipped {
        path: PathBuf,
        existing_len: u64,
        new_len: u64,
    },
}

impl BackupOutcome {
    /// Path of the backup file this outcome refers to.
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Written { path }
            | Self::Overwritten { path, .. }
            | Self::Skipped { path, .. } => path,
        }
    }

    /// True when the attempt left new content on disk.
    pub fn wrote(&self) -> bool {
        !matches!(self, Self::Skipped { .. })
    }
}

// =============================================================================
// Duplicate-hash state
// =============================================================================

/// Persisted duplicate-backup detection state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashState {
    /// Hex digest of the most recently backed-up log.
    #[serde(default)]
    pub last_hash: String,

    /// How many consecutive backups produced `last_hash`. Resets to 1
    /// whenever the hash changes.
    #[serde(default)]
    pub repeat_count: u32,
}
