// ChatKeeper - app/scheduler.rs
//
// Two background backup lanes on plain threads:
//   - the game-exit lane polls the process table and fires one backup when
//     the game transitions from running to gone;
//   - the interval lane fires a silent backup on a fixed cadence while the
//     game is believed to be running.
//
// Both lanes share a `SchedulerState` handle. Stopping is cooperative:
// pause and quit are flags checked between sleep slices, an in-flight
// backup write always completes, and `quitting` is terminal -- once set,
// lanes exit and will not be restarted.

use crate::app::process::ProcessProbe;
use crate::app::runner::BackupRunner;
use crate::core::locate;
use crate::platform::config::SettingsStore;
use crate::util::constants;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

// =============================================================================
// Shared state
// =============================================================================

/// Flags shared between the lanes and their controller.
///
/// All accessors are thread-safe; there is no lock to hold across a cycle.
#[derive(Debug, Default)]
pub struct SchedulerState {
    quitting: AtomicBool,
    run_exit_lane: AtomicBool,
    run_interval_lane: AtomicBool,
    game_running: AtomicBool,
}

impl SchedulerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request process-wide shutdown. Terminal: lanes exit their loops and
    /// are never resumed afterwards.
    pub fn request_quit(&self) {
        self.quitting.store(true, Ordering::SeqCst);
    }

    pub fn is_quitting(&self) -> bool {
        self.quitting.load(Ordering::SeqCst)
    }

    /// Whether the game process has been sighted and not yet seen to exit.
    pub fn game_running(&self) -> bool {
        self.game_running.load(Ordering::SeqCst)
    }

    fn set_game_running(&self, running: bool) {
        self.game_running.store(running, Ordering::SeqCst);
    }

    fn exit_lane_running(&self) -> bool {
        self.run_exit_lane.load(Ordering::SeqCst)
    }

    fn interval_lane_running(&self) -> bool {
        self.run_interval_lane.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Timing
// =============================================================================

/// Lane cadences. Tests shrink these to milliseconds.
#[derive(Debug, Clone)]
pub struct SchedulerTiming {
    /// Delay between process-table polls on the game-exit lane.
    pub poll: Duration,

    /// Length of one interval-lane sleep slice.
    pub slice: Duration,
}

impl Default for SchedulerTiming {
    fn default() -> Self {
        Self {
            poll: Duration::from_secs(constants::GAME_CLOSED_CHECK_SECS),
            slice: Duration::from_secs(constants::INTERVAL_SLICE_SECS),
        }
    }
}

// =============================================================================
// Scheduler
// =============================================================================

/// Owns the lane threads and the shared state handle.
pub struct BackupScheduler {
    state: Arc<SchedulerState>,
    settings: Arc<SettingsStore>,
    runner: Arc<BackupRunner>,
    probe: Arc<dyn ProcessProbe>,
    timing: SchedulerTiming,
    exit_handle: Option<JoinHandle<()>>,
    interval_handle: Option<JoinHandle<()>>,
}

impl BackupScheduler {
    pub fn new(
        settings: Arc<SettingsStore>,
        runner: Arc<BackupRunner>,
        probe: Arc<dyn ProcessProbe>,
    ) -> Self {
        Self::with_timing(settings, runner, probe, SchedulerTiming::default())
    }

    pub fn with_timing(
        settings: Arc<SettingsStore>,
        runner: Arc<BackupRunner>,
        probe: Arc<dyn ProcessProbe>,
        timing: SchedulerTiming,
    ) -> Self {
        Self {
            state: Arc::new(SchedulerState::new()),
            settings,
            runner,
            probe,
            timing,
            exit_handle: None,
            interval_handle: None,
        }
    }

    /// Shared state handle, e.g. for a Ctrl-C handler.
    pub fn state(&self) -> Arc<SchedulerState> {
        Arc::clone(&self.state)
    }

    /// Start enabled lanes, or resume paused ones.
    ///
    /// Returns without starting anything when the backup root or the client
    /// directory is missing -- there is nothing useful a lane could do, and
    /// the next `initialize` after the user fixes the paths will start them.
    pub fn initialize(&mut self) {
        let settings = self.settings.snapshot();

        let backup_path = Path::new(&settings.paths.backup_path);
        if settings.paths.backup_path.trim().is_empty() || !backup_path.is_dir() {
            tracing::debug!("Backup path not usable; lanes not started");
            return;
        }
        let client_resources = Path::new(&settings.paths.directory_path)
            .join(constants::CLIENT_RESOURCES_DIR_NAME);
        if settings.paths.directory_path.trim().is_empty() || !client_resources.is_dir() {
            tracing::debug!("Client directory not usable; lanes not started");
            return;
        }

        self.resume_if_paused();

        if settings.backup.automatic_on_exit && !lane_alive(&self.exit_handle) {
            self.state.run_exit_lane.store(true, Ordering::SeqCst);
            let state = Arc::clone(&self.state);
            let settings = Arc::clone(&self.settings);
            let runner = Arc::clone(&self.runner);
            let probe = Arc::clone(&self.probe);
            let timing = self.timing.clone();
            self.exit_handle = Some(std::thread::spawn(move || {
                exit_lane(state, settings, runner, probe, timing);
            }));
            tracing::info!("Game-exit backup lane started");
        }

        if settings.backup.interval_enabled && !lane_alive(&self.interval_handle) {
            self.state.run_interval_lane.store(true, Ordering::SeqCst);
            let state = Arc::clone(&self.state);
            let settings = Arc::clone(&self.settings);
            let runner = Arc::clone(&self.runner);
            let timing = self.timing.clone();
            self.interval_handle = Some(std::thread::spawn(move || {
                interval_lane(state, settings, runner, timing);
            }));
            tracing::info!("Interval backup lane started");
        }
    }

    /// Flip paused-but-alive lanes back to running, unless quitting.
    fn resume_if_paused(&self) {
        if self.state.is_quitting() {
            return;
        }
        if lane_alive(&self.exit_handle) && !self.state.exit_lane_running() {
            self.state.run_exit_lane.store(true, Ordering::SeqCst);
            tracing::debug!("Game-exit lane resumed");
        }
        if lane_alive(&self.interval_handle) && !self.state.interval_lane_running() {
            self.state.run_interval_lane.store(true, Ordering::SeqCst);
            tracing::debug!("Interval lane resumed");
        }
    }

    /// Request pause on both lanes without blocking for their exit.
    /// Each lane observes the flag within one sleep slice.
    pub fn abort_all(&self) {
        self.state.run_exit_lane.store(false, Ordering::SeqCst);
        self.state.run_interval_lane.store(false, Ordering::SeqCst);
    }

    /// Request terminal shutdown.
    pub fn request_quit(&self) {
        self.state.request_quit();
    }

    /// Block until both lane threads have exited. Call after
    /// `request_quit`; a paused lane still exits promptly because the
    /// quit flag is checked in the same places.
    pub fn join(&mut self) {
        if let Some(handle) = self.exit_handle.take() {
            let _ = handle.join();
        }
        if let Some(handle) = self.interval_handle.take() {
            let _ = handle.join();
        }
    }

    /// True while the game-exit lane thread is alive (running or paused).
    pub fn exit_lane_alive(&self) -> bool {
        lane_alive(&self.exit_handle)
    }

    /// True while the interval lane thread is alive (running or paused).
    pub fn interval_lane_alive(&self) -> bool {
        lane_alive(&self.interval_handle)
    }
}

fn lane_alive(handle: &Option<JoinHandle<()>>) -> bool {
    handle.as_ref().is_some_and(|h| !h.is_finished())
}

// =============================================================================
// Lanes
// =============================================================================

/// Poll for the game process; when it disappears after having been seen,
/// fire exactly one game-closed backup.
fn exit_lane(
    state: Arc<SchedulerState>,
    settings: Arc<SettingsStore>,
    runner: Arc<BackupRunner>,
    probe: Arc<dyn ProcessProbe>,
    timing: SchedulerTiming,
) {
    while !state.is_quitting() && state.exit_lane_running() {
        let snapshot = settings.snapshot();
        let seen = probe.is_running(&snapshot.backup.game_process);

        if !state.game_running() && seen {
            tracing::info!(process = %snapshot.backup.game_process, "Game process sighted");
            state.set_game_running(true);
        } else if state.game_running() && !seen {
            tracing::info!("Game process gone; backing up the final chat log");
            state.set_game_running(false);
            match runner.run(true) {
                Ok(Some(report)) => {
                    tracing::info!(path = %report.outcome.path().display(), "Game-close backup done");
                }
                Ok(None) => {}
                // Game-close failures are surfaced; this is the one backup
                // the user actually waits for.
                Err(e) => tracing::error!(error = %e, "Game-close backup failed"),
            }
        }

        std::thread::sleep(timing.poll);
    }
    tracing::debug!("Game-exit lane stopped");
}

/// Fire a silent backup every configured interval while the game runs.
fn interval_lane(
    state: Arc<SchedulerState>,
    settings: Arc<SettingsStore>,
    runner: Arc<BackupRunner>,
    timing: SchedulerTiming,
) {
    while !state.is_quitting() && state.interval_lane_running() {
        // Interval and paths are re-read every cycle so configuration
        // changes apply on the next cycle.
        let snapshot = settings.snapshot();

        if state.game_running() {
            let root = Path::new(&snapshot.paths.directory_path);
            let storage = locate::resolve_storage_path(root);
            if storage.exists() {
                if let Err(e) = runner.run(false) {
                    tracing::debug!(error = %e, "Interval backup failed; next cycle retries");
                }
            }
        }

        let slices = u64::from(snapshot.backup.interval_minutes) * constants::SLICES_PER_MINUTE;
        for _ in 0..slices {
            if state.is_quitting() || !state.interval_lane_running() {
                break;
            }
            std::thread::sleep(timing.slice);
        }
    }
    tracing::debug!("Interval lane stopped");
}
