// ChatKeeper - core/hashguard.rs
//
// Duplicate-backup detection.
//
// A backup that hashes identically to the previous one means the client is
// re-serving the same chat log, usually because the game stopped writing the
// storage file. The hash is MD5: equality detection only, no security role.

use crate::core::model::HashState;
use md5::{Digest, Md5};

/// Tracks consecutive identical backups and decides when to warn.
#[derive(Debug, Clone)]
pub struct DuplicateHashGuard {
    threshold: u32,
}

impl DuplicateHashGuard {
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    /// Record a backed-up log in `state` and report whether a warning is
    /// due.
    ///
    /// The repeat counter resets to 1 on a differing hash and increments on
    /// a match. The warning fires on EVERY call where the counter is at or
    /// above the threshold, not only when it first crosses it.
    pub fn record(&self, log: &str, state: &mut HashState) -> bool {
        let hash = md5_hex(log);

        state.repeat_count = if state.last_hash == hash {
            state.repeat_count + 1
        } else {
            1
        };
        state.last_hash = hash;

        let warn = state.repeat_count >= self.threshold;
        if warn {
            tracing::warn!(
                repeats = state.repeat_count,
                threshold = self.threshold,
                "The same chat log has been backed up repeatedly; the storage file may be stuck"
            );
        }
        warn
    }
}

/// Lowercase hex MD5 digest of a string.
fn md5_hex(input: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(input.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
