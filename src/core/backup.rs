// ChatKeeper - core/backup.rs
//
// Size-compared, idempotent backup writes.
//
// Backup identity is derived from the log itself: the first line carries the
// session date and time, which become the file name and the year/month
// directory layout. Re-running a backup for the same session is therefore a
// safe no-op unless the log has grown, which also resolves races between the
// two scheduler lanes without any locking: whichever write attempt carries
// more content wins, and the comparison goes through a staging file so a
// partially written backup is never visible under the final name.

use crate::core::model::BackupOutcome;
use crate::util::constants;
use crate::util::error::BackupError;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn header_date_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(constants::HEADER_DATE_PATTERN).expect("header date pattern"))
}

fn header_time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(constants::HEADER_TIME_PATTERN).expect("header time pattern"))
}

fn header_year_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(constants::HEADER_YEAR_PATTERN).expect("header year pattern"))
}

fn header_month_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(constants::HEADER_MONTH_PATTERN).expect("header month pattern"))
}

/// File name and directory layout derived from a log's first line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupName {
    /// Four-digit year directory component.
    pub year: String,

    /// Three-letter month directory component.
    pub month: String,

    /// `DD.MON.YYYY-HH.MM.SS.txt`.
    pub file_name: String,
}

impl BackupName {
    /// Target directory under `root`: `{root}/{year}/{month}/`.
    pub fn directory(&self, root: &Path) -> PathBuf {
        root.join(&self.year).join(&self.month)
    }
}

/// Derive the backup name from the first line of a parsed log.
///
/// The line must contain a `DD/MON/YYYY` date token and an `H:MM:SS` time
/// token; slashes and colons become dots so the name is filesystem-safe.
pub fn derive_backup_name(first_line: &str) -> Result<BackupName, BackupError> {
    let malformed = || BackupError::MalformedHeader {
        first_line: first_line.to_string(),
    };

    let date = header_date_regex()
        .find(first_line)
        .ok_or_else(malformed)?
        .as_str()
        .replace('/', ".");
    let time = header_time_regex()
        .find(first_line)
        .ok_or_else(malformed)?
        .as_str()
        .replace(':', ".");

    let year = header_year_regex()
        .find(&date)
        .ok_or_else(malformed)?
        .as_str()
        .to_string();
    let month = header_month_regex()
        .find(&date)
        .ok_or_else(malformed)?
        .as_str()
        .to_string();

    Ok(BackupName {
        year,
        month,
        file_name: format!("{date}-{time}{}", constants::BACKUP_FILE_EXTENSION),
    })
}

/// Write `parsed` under `backup_root`, creating the dated directory layout
/// as needed.
///
/// - No file with the derived name: write it directly.
/// - Existing file: stage the new content in a `.temp` sibling, compare
///   byte lengths, and replace only if the new content is strictly larger.
///
/// The staging file never survives the attempt, success or failure.
pub fn write_backup(parsed: &str, backup_root: &Path) -> Result<BackupOutcome, BackupError> {
    if parsed.trim().is_empty() {
        return Err(BackupError::EmptyLog);
    }
    if !backup_root.is_dir() {
        return Err(BackupError::RootMissing {
            path: backup_root.to_path_buf(),
        });
    }

    let first_line = parsed.split('\n').next().unwrap_or("");
    let name = derive_backup_name(first_line)?;

    let dir = name.directory(backup_root);
    std::fs::create_dir_all(&dir).map_err(|e| BackupError::Io {
        path: dir.clone(),
        operation: "create directory",
        source: e,
    })?;

    let target = dir.join(&name.file_name);
    let content = parsed.replace('\n', constants::PLATFORM_LINE_ENDING);

    if !target.exists() {
        std::fs::write(&target, &content).map_err(|e| BackupError::Io {
            path: target.clone(),
            operation: "write",
            source: e,
        })?;
        tracing::info!(path = %target.display(), "Backup written");
        return Ok(BackupOutcome::Written { path: target });
    }

    compare_and_replace(&target, &dir, &content)
}

/// Stage `content` next to `target` and replace it only if the staged
/// content is strictly larger than the existing file.
fn compare_and_replace(
    target: &Path,
    dir: &Path,
    content: &str,
) -> Result<BackupOutcome, BackupError> {
    let temp = dir.join(constants::BACKUP_TEMP_FILE_NAME);

    // A stale staging file from an earlier failed attempt must not skew
    // the comparison.
    if temp.exists() {
        std::fs::remove_file(&temp).map_err(|e| BackupError::Io {
            path: temp.clone(),
            operation: "remove stale staging file",
            source: e,
        })?;
    }

    std::fs::write(&temp, content).map_err(|e| BackupError::Io {
        path: temp.clone(),
        operation: "write staging file",
        source: e,
    })?;

    let result = (|| {
        let old_len = file_len(target)?;
        let new_len = file_len(&temp)?;

        if old_len < new_len {
            std::fs::remove_file(target).map_err(|e| BackupError::Io {
                path: target.to_path_buf(),
                operation: "remove superseded backup",
                source: e,
            })?;
            std::fs::rename(&temp, target).map_err(|e| BackupError::Io {
                path: target.to_path_buf(),
                operation: "replace backup",
                source: e,
            })?;
            tracing::info!(
                path = %target.display(),
                old_len,
                new_len,
                "Backup overwritten with larger content"
            );
            Ok(BackupOutcome::Overwritten {
                path: target.to_path_buf(),
                old_len,
                new_len,
            })
        } else {
            std::fs::remove_file(&temp).map_err(|e| BackupError::Io {
                path: temp.clone(),
                operation: "discard staging file",
                source: e,
            })?;
            tracing::debug!(
                path = %target.display(),
                existing_len = old_len,
                new_len,
                "Backup skipped; existing file is not smaller"
            );
            Ok(BackupOutcome::Skipped {
                path: target.to_path_buf(),
                existing_len: old_len,
                new_len,
            })
        }
    })();

    if result.is_err() {
        // The staging file must not outlive the attempt.
        let _ = std::fs::remove_file(&temp);
    }

    result
}

fn file_len(path: &Path) -> Result<u64, BackupError> {
    std::fs::metadata(path)
        .map(|m| m.len())
        .map_err(|e| BackupError::Io {
            path: path.to_path_buf(),
            operation: "stat",
            source: e,
        })
}
