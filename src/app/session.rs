// ChatKeeper - app/session.rs
//
// Runtime state persistence: the duplicate-hash counter survives restarts
// so a stuck storage file is still flagged when the user relaunches between
// sessions.
//
// Design principles:
// - State is saved atomically (write→temp, rename→final) so a crash during
//   save never corrupts the previous good state.
// - Load errors are silently discarded (corrupt or incompatible files just
//   reset the state rather than surfacing errors to the user).
// - The data directory is created on first save; no user action required.

use crate::core::model::HashState;
use crate::util::error::SessionError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Version stamp for forward-compatibility checks.
///
/// Increment whenever `SessionState` changes shape in a breaking way.
/// Version mismatches silently discard the state.
pub const SESSION_VERSION: u32 = 1;

/// Persistent runtime state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    /// Schema version -- must equal `SESSION_VERSION` to be accepted.
    pub version: u32,

    /// Duplicate-backup detection state.
    #[serde(default)]
    pub hash_state: HashState,

    /// Resource directory selected by the last successful location pass.
    /// Informational; re-derived on every backup run.
    #[serde(default)]
    pub resource_directory: Option<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            version: SESSION_VERSION,
            hash_state: HashState::default(),
            resource_directory: None,
        }
    }
}

impl SessionState {
    /// Load state from `path`.
    ///
    /// Any failure -- missing file, unreadable content, malformed JSON, or a
    /// version mismatch -- yields a fresh default state.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "No usable state file");
                return Self::default();
            }
        };

        match serde_json::from_str::<SessionState>(&raw) {
            Ok(state) if state.version == SESSION_VERSION => state,
            Ok(state) => {
                tracing::info!(
                    found = state.version,
                    expected = SESSION_VERSION,
                    "State version mismatch; starting fresh"
                );
                Self::default()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Corrupt state file; starting fresh");
                Self::default()
            }
        }
    }

    /// Save state to `path` atomically.
    pub fn save(&self, path: &Path) -> Result<(), SessionError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SessionError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let rendered = serde_json::to_string_pretty(self).map_err(|e| SessionError::Json {
            path: path.to_path_buf(),
            source: e,
        })?;

        let temp = path.with_extension("json.tmp");
        std::fs::write(&temp, rendered).map_err(|e| SessionError::Io {
            path: temp.clone(),
            source: e,
        })?;
        std::fs::rename(&temp, path).map_err(|e| SessionError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        tracing::debug!(path = %path.display(), "State saved");
        Ok(())
    }
}
