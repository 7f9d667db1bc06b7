// ChatKeeper - core/locate.rs
//
// Locates the resource directory holding the active game server's storage
// file. The client keeps one cache directory per server it has connected to;
// only the one whose storage file carries the target server's signature is
// interesting, and when several match (multiple connection addresses for the
// same server) the most recently written one wins.

use crate::core::model::ResourceCandidate;
use crate::util::constants;
use crate::util::error::LocateError;
use chrono::{DateTime, Utc};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Compiled server-signature pattern, shared across calls.
fn signature_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(constants::SERVER_SIGNATURE_PATTERN).expect("server signature pattern")
    })
}

/// Build the storage file path for a named resource directory under `root`.
pub fn storage_path(root: &Path, resource_dir: &str) -> PathBuf {
    root.join(constants::CLIENT_RESOURCES_DIR_NAME)
        .join(resource_dir)
        .join(constants::STORAGE_FILE_NAME)
}

/// Storage path assumed when location finds no signed candidate.
pub fn default_storage_path(root: &Path) -> PathBuf {
    storage_path(root, constants::DEFAULT_RESOURCE_DIR)
}

/// Locate with fallback: the signed candidate's storage path, or the
/// default resource directory's path when nothing matches.
pub fn resolve_storage_path(root: &Path) -> PathBuf {
    match locate(root) {
        Ok(candidate) => candidate.storage_path,
        Err(e) => {
            tracing::debug!(error = %e, "Falling back to default resource directory");
            default_storage_path(root)
        }
    }
}

/// Find the resource directory whose storage file matches the server
/// signature, selecting the most recently written one when several do.
///
/// # Errors
/// - `DirectoryNotFound` when `root` or its `client_resources` subdirectory
///   is missing.
/// - `NotFound` when no candidate matches. Per-candidate read errors are
///   swallowed (the candidate is skipped), so an unreadable storage file
///   never aborts the scan.
pub fn locate(root: &Path) -> Result<ResourceCandidate, LocateError> {
    let resources_root = root.join(constants::CLIENT_RESOURCES_DIR_NAME);
    if !resources_root.is_dir() {
        return Err(LocateError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }

    let mut candidates = collect_candidates(&resources_root);

    if candidates.is_empty() {
        return Err(LocateError::NotFound);
    }

    // Pairwise elimination rather than a sort: compare the first two
    // candidates and discard the older until one remains. Equal timestamps
    // discard the second operand, so the first-compared candidate survives
    // ties.
    while candidates.len() > 1 {
        if candidates[0].modified < candidates[1].modified {
            candidates.remove(0);
        } else {
            candidates.remove(1);
        }
    }

    let winner = candidates.remove(0);
    tracing::debug!(
        resource = %winner.directory_name,
        modified = %winner.modified,
        "Active resource directory located"
    );
    Ok(winner)
}

/// Scan the immediate subdirectories of `client_resources` for storage
/// files carrying the server signature. Enumeration and read errors are
/// non-fatal: the affected entry is skipped.
fn collect_candidates(resources_root: &Path) -> Vec<ResourceCandidate> {
    let mut candidates = Vec::new();

    let walker = walkdir::WalkDir::new(resources_root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false);

    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_dir() {
            continue;
        }

        let storage = entry.path().join(constants::STORAGE_FILE_NAME);
        let text = match std::fs::read_to_string(&storage) {
            Ok(t) => t,
            Err(e) => {
                // Missing or unreadable storage file: not a candidate.
                tracing::trace!(path = %storage.display(), error = %e, "Skipping entry");
                continue;
            }
        };

        if !signature_regex().is_match(&text) {
            continue;
        }

        let modified: DateTime<Utc> = match std::fs::metadata(&storage).and_then(|m| m.modified()) {
            Ok(t) => t.into(),
            Err(e) => {
                tracing::debug!(path = %storage.display(), error = %e, "Cannot read mtime");
                continue;
            }
        };

        let directory_name = entry.file_name().to_string_lossy().into_owned();
        candidates.push(ResourceCandidate {
            directory_name,
            storage_path: storage,
            modified,
        });
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const SIGNED: &str = r#"{"server_version":"GTA World (EU#1)","chat_log":"[01:02:03] Hello\n"}"#;
    const UNSIGNED: &str = r#"{"server_version":"Some Other Server","chat_log":"[01:02:03] Hello\n"}"#;

    fn make_resource(root: &Path, name: &str, storage_text: &str) -> std::path::PathBuf {
        let dir = root.join(constants::CLIENT_RESOURCES_DIR_NAME).join(name);
        fs::create_dir_all(&dir).expect("mkdir resource");
        let storage = dir.join(constants::STORAGE_FILE_NAME);
        fs::write(&storage, storage_text).expect("write storage");
        storage
    }

    fn set_mtime(path: &Path, secs_ago: u64) {
        let mtime = std::time::SystemTime::now() - std::time::Duration::from_secs(secs_ago);
        let file = fs::File::options().append(true).open(path).expect("open");
        file.set_times(fs::FileTimes::new().set_modified(mtime))
            .expect("set mtime");
    }

    #[test]
    fn test_missing_client_resources_is_directory_not_found() {
        let dir = TempDir::new().unwrap();
        let result = locate(dir.path());
        assert!(matches!(
            result,
            Err(LocateError::DirectoryNotFound { .. })
        ));
    }

    #[test]
    fn test_no_signed_candidate_is_not_found() {
        let dir = TempDir::new().unwrap();
        make_resource(dir.path(), "play.other.server_22005", UNSIGNED);
        assert!(matches!(locate(dir.path()), Err(LocateError::NotFound)));
    }

    #[test]
    fn test_single_signed_candidate_wins() {
        let dir = TempDir::new().unwrap();
        make_resource(dir.path(), "play.other.server_22005", UNSIGNED);
        make_resource(dir.path(), "play.gta.world_22005", SIGNED);

        let winner = locate(dir.path()).unwrap();
        assert_eq!(winner.directory_name, "play.gta.world_22005");
    }

    #[test]
    fn test_most_recent_candidate_wins() {
        let dir = TempDir::new().unwrap();
        let old = make_resource(dir.path(), "play.gta.world_22005", SIGNED);
        let new = make_resource(dir.path(), "play.gta.world_22006", SIGNED);
        set_mtime(&old, 3_600);
        set_mtime(&new, 10);

        let winner = locate(dir.path()).unwrap();
        assert_eq!(winner.directory_name, "play.gta.world_22006");
    }

    #[test]
    fn test_directory_without_storage_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        let empty = dir
            .path()
            .join(constants::CLIENT_RESOURCES_DIR_NAME)
            .join("empty_dir");
        fs::create_dir_all(&empty).unwrap();
        make_resource(dir.path(), "play.gta.world_22005", SIGNED);

        let winner = locate(dir.path()).unwrap();
        assert_eq!(winner.directory_name, "play.gta.world_22005");
    }

    #[test]
    fn test_resolve_falls_back_to_default_path() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join(constants::CLIENT_RESOURCES_DIR_NAME)).unwrap();

        let path = resolve_storage_path(dir.path());
        assert_eq!(path, default_storage_path(dir.path()));
        assert!(path.ends_with(
            Path::new(constants::DEFAULT_RESOURCE_DIR).join(constants::STORAGE_FILE_NAME)
        ));
    }
}
