//! Attempt runner - starts a session on a worker thread.
//!
//! The worker owns the attempt context and steps it until a terminal state,
//! publishing a status snapshot after every step. The UI/CLI only reads the
//! snapshot and flips the stop/pause signals.

use chrono::Local;
use image::DynamicImage;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::automation::config::AttemptConfig;
use crate::automation::state::{AttemptContext, AttemptState, ControlSignals};
use crate::automation::stats::{SessionSummary, StatusSnapshot};
use crate::capture::ScreenSampler;
use crate::error::{Error, Result};
use crate::input::InputInjector;

/// Global flag indicating if a session is currently active.
static SESSION_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Shared status, written by the worker, read by the UI.
pub type SharedStatus = Arc<Mutex<StatusSnapshot>>;

/// Checks if a session is currently active in this process.
pub fn is_session_active() -> bool {
    SESSION_ACTIVE.load(Ordering::SeqCst)
}

/// Final result of a session.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub state: AttemptState,
    pub attempts: u64,
    pub elapsed_seconds: f64,
    pub session_dir: Option<PathBuf>,
}

/// Handle to a running session.
pub struct SessionHandle {
    signals: ControlSignals,
    status: SharedStatus,
    handle: JoinHandle<SessionReport>,
}

impl SessionHandle {
    pub fn request_stop(&self) {
        self.signals.request_stop();
    }

    pub fn pause(&self) {
        self.signals.pause();
    }

    pub fn resume(&self) {
        self.signals.resume();
    }

    /// Clone of the control signals (e.g. for a Ctrl+C handler).
    pub fn signals(&self) -> ControlSignals {
        self.signals.clone()
    }

    pub fn status(&self) -> SharedStatus {
        Arc::clone(&self.status)
    }

    /// Copy of the latest status snapshot.
    pub fn snapshot(&self) -> StatusSnapshot {
        read_snapshot(&self.status)
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the worker thread and returns its report.
    pub fn join(self) -> SessionReport {
        match self.handle.join() {
            Ok(report) => report,
            Err(_) => {
                log::error!("Session worker thread panicked");
                SESSION_ACTIVE.store(false, Ordering::SeqCst);
                SessionReport {
                    state: AttemptState::Failed("worker thread panicked".into()),
                    attempts: 0,
                    elapsed_seconds: 0.0,
                    session_dir: None,
                }
            }
        }
    }
}

/// Reads the snapshot even if a writer panicked while holding the lock.
pub fn read_snapshot(status: &SharedStatus) -> StatusSnapshot {
    match status.lock() {
        Ok(s) => s.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Starts a session in a background thread.
///
/// Returns immediately after spawning the worker.
///
/// # Errors
/// Returns an error if:
/// - A session is already active
/// - The configuration is invalid
/// - The session folder cannot be created under `output_root`
pub fn start_session(
    config: AttemptConfig,
    injector: Box<dyn InputInjector>,
    sampler: Box<dyn ScreenSampler>,
    output_root: &Path,
) -> Result<SessionHandle> {
    if SESSION_ACTIVE.swap(true, Ordering::SeqCst) {
        return Err(Error::config("a session is already running"));
    }

    match prepare(config, injector, sampler, output_root) {
        Ok(handle) => Ok(handle),
        Err(e) => {
            SESSION_ACTIVE.store(false, Ordering::SeqCst);
            Err(e)
        }
    }
}

fn prepare(
    config: AttemptConfig,
    injector: Box<dyn InputInjector>,
    sampler: Box<dyn ScreenSampler>,
    output_root: &Path,
) -> Result<SessionHandle> {
    let signals = ControlSignals::new();
    let ctx = AttemptContext::new(config, injector, sampler, signals.clone())?;

    // Timestamped session folder: output/YYYYMMDD_HHMMSS/
    let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let session_dir = unique_dir(&output_root.join(timestamp));
    fs::create_dir_all(&session_dir)?;
    log::info!("Session folder: {}", session_dir.display());

    let status: SharedStatus = Arc::new(Mutex::new(StatusSnapshot {
        state: ctx.state.to_string(),
        is_running: true,
        max_attempts: ctx.config.max_attempts,
        session_dir: Some(session_dir.clone()),
        ..Default::default()
    }));

    let worker_status = Arc::clone(&status);
    let handle = thread::spawn(move || {
        let report = run_session(ctx, &worker_status, &session_dir);
        SESSION_ACTIVE.store(false, Ordering::SeqCst);
        log::info!("Session thread finished");
        report
    });

    Ok(SessionHandle {
        signals,
        status,
        handle,
    })
}

/// Appends `_1`, `_2`, ... when two sessions start within the same second.
fn unique_dir(base: &Path) -> PathBuf {
    if !base.exists() {
        return base.to_path_buf();
    }
    let mut n = 1;
    loop {
        let candidate = PathBuf::from(format!("{}_{}", base.display(), n));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Runs the session loop (called from the worker thread).
fn run_session(mut ctx: AttemptContext, status: &SharedStatus, session_dir: &Path) -> SessionReport {
    publish(&ctx, status, Some("Session starting"));
    if !ctx.config.demo_mode && !ctx.config.focus_lead_in().is_zero() {
        publish(
            &ctx,
            status,
            Some(&format!(
                "Typing starts in {:.1}s: focus the target input now",
                ctx.config.focus_delay
            )),
        );
    }

    let mut last_candidate: Option<String> = None;
    loop {
        let keep_going = ctx.step();
        log::debug!("{}", ctx.progress_string());

        let line = if ctx.stats.current_candidate != last_candidate {
            last_candidate = ctx.stats.current_candidate.clone();
            last_candidate.as_ref().map(|c| match ctx.stats.last_similarity {
                Some(similarity) => format!(
                    "Attempt {}: {} (similarity {:.3})",
                    ctx.stats.attempts, c, similarity
                ),
                None => format!("Attempt {}: {}", ctx.stats.attempts, c),
            })
        } else {
            None
        };
        publish(&ctx, status, line.as_deref());

        if !keep_going {
            break;
        }
    }

    match &ctx.state {
        AttemptState::Success(candidate) => {
            log::info!(
                "Session succeeded with {} after {} attempts",
                candidate,
                ctx.stats.attempts
            );
        }
        AttemptState::Exhausted => {
            log::info!(
                "Session exhausted after {} attempts",
                ctx.stats.attempts
            );
        }
        AttemptState::Stopped => {
            log::info!("Session stopped at attempt {}", ctx.stats.attempts);
        }
        AttemptState::Failed(msg) => {
            log::error!(
                "Session failed at attempt {} (candidate {}): {}",
                ctx.stats.attempts,
                ctx.stats.current_candidate.as_deref().unwrap_or("-"),
                msg
            );
        }
        _ => {}
    }

    if let Err(e) = write_artifacts(&ctx, session_dir) {
        log::warn!("Failed to write session artifacts: {}", e);
    }

    publish(&ctx, status, Some(&format!("Finished: {}", ctx.state)));

    SessionReport {
        state: ctx.state.clone(),
        attempts: ctx.stats.attempts,
        elapsed_seconds: ctx.stats.elapsed_seconds(),
        session_dir: Some(session_dir.to_path_buf()),
    }
}

/// Writes `summary.json` and, on success, `match.png`.
fn write_artifacts(ctx: &AttemptContext, session_dir: &Path) -> Result<()> {
    let summary = SessionSummary::new(&ctx.state, &ctx.stats, &ctx.config);
    let json = serde_json::to_string_pretty(&summary)?;
    fs::write(session_dir.join("summary.json"), json)?;

    if ctx.config.save_match_screenshot {
        if let Some(frame) = &ctx.matched_frame {
            let path = session_dir.join("match.png");
            save_frame(frame, &path)?;
            log::info!("Matching frame saved to {}", path.display());
        }
    }
    Ok(())
}

fn save_frame(frame: &DynamicImage, path: &Path) -> Result<()> {
    frame.save(path)?;
    Ok(())
}

/// Copies the context into the shared snapshot.
fn publish(ctx: &AttemptContext, status: &SharedStatus, line: Option<&str>) {
    let mut snapshot = match status.lock() {
        Ok(s) => s,
        Err(poisoned) => poisoned.into_inner(),
    };
    snapshot.state = ctx.state.to_string();
    snapshot.is_running = !ctx.state.is_terminal();
    snapshot.is_paused = ctx.signals().is_paused();
    snapshot.attempts = ctx.stats.attempts;
    snapshot.current_candidate = ctx.stats.current_candidate.clone();
    snapshot.last_similarity = ctx.stats.last_similarity;
    snapshot.elapsed_seconds = ctx.stats.elapsed_seconds();
    snapshot.rate_per_second = ctx.stats.rate_per_second();
    if let AttemptState::Success(candidate) = &ctx.state {
        snapshot.found_candidate = Some(candidate.clone());
    }
    if let Some(line) = line {
        snapshot.push_line(line);
    }
}
