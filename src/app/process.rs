// ChatKeeper - app/process.rs
//
// Game process detection for the game-exit backup lane.
//
// The probe is a trait so the scheduler can be driven by a scripted fake in
// tests; the real implementation refreshes the sysinfo process table on
// every call, which is exactly one poll per lane cycle.

use std::sync::Mutex;
use sysinfo::System;

/// Answers "is a process with this name currently running?".
pub trait ProcessProbe: Send + Sync {
    fn is_running(&self, process_name: &str) -> bool;
}

/// sysinfo-backed probe.
pub struct SystemProcessProbe {
    // refresh_processes needs &mut; the probe itself is shared immutably
    // across lanes.
    system: Mutex<System>,
}

impl SystemProcessProbe {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SystemProcessProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessProbe for SystemProcessProbe {
    fn is_running(&self, process_name: &str) -> bool {
        let mut system = self.system.lock().expect("process probe lock poisoned");
        system.refresh_processes();
        system
            .processes()
            .values()
            .any(|p| p.name().eq_ignore_ascii_case(process_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlikely_process_name_is_not_running() {
        let probe = SystemProcessProbe::new();
        assert!(!probe.is_running("chatkeeper-test-no-such-process.exe"));
    }
}
