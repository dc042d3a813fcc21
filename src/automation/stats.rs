//! Session statistics and the status snapshot published to the UI.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Instant;

use crate::automation::config::AttemptConfig;
use crate::automation::state::AttemptState;

/// Log lines kept for the GUI log panel.
const MAX_RECENT_LINES: usize = 200;

/// Mutable per-session counters. Owned by the attempt context.
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub attempts: u64,
    pub start_time: Instant,
    pub started_at: DateTime<Local>,
    pub current_candidate: Option<String>,
    pub last_similarity: Option<f32>,
}

impl Default for SessionStats {
    fn default() -> Self {
        Self {
            attempts: 0,
            start_time: Instant::now(),
            started_at: Local::now(),
            current_candidate: None,
            last_similarity: None,
        }
    }
}

impl SessionStats {
    pub fn elapsed_seconds(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Attempts per second since the session started.
    pub fn rate_per_second(&self) -> f64 {
        let elapsed = self.elapsed_seconds();
        if elapsed > 0.0 {
            self.attempts as f64 / elapsed
        } else {
            0.0
        }
    }
}

/// Read-only view of a session, refreshed by the worker after every step.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusSnapshot {
    pub state: String,
    pub is_running: bool,
    pub is_paused: bool,
    pub attempts: u64,
    pub max_attempts: u64,
    pub current_candidate: Option<String>,
    pub found_candidate: Option<String>,
    pub last_similarity: Option<f32>,
    pub elapsed_seconds: f64,
    pub rate_per_second: f64,
    pub session_dir: Option<PathBuf>,
    #[serde(skip)]
    pub recent_lines: VecDeque<String>,
}

impl StatusSnapshot {
    /// Appends a timestamped line for the log panel, dropping the oldest.
    pub fn push_line(&mut self, line: impl Into<String>) {
        let timestamp = Local::now().format("%H:%M:%S");
        self.recent_lines
            .push_back(format!("[{}] {}", timestamp, line.into()));
        while self.recent_lines.len() > MAX_RECENT_LINES {
            self.recent_lines.pop_front();
        }
    }

    /// Progress toward `max_attempts` (0.0 to 1.0).
    pub fn progress(&self) -> f32 {
        if self.max_attempts == 0 {
            return 0.0;
        }
        (self.attempts as f64 / self.max_attempts as f64).min(1.0) as f32
    }

    /// Elapsed time as `MM:SS`.
    pub fn elapsed_text(&self) -> String {
        let secs = self.elapsed_seconds as u64;
        format!("{:02}:{:02}", secs / 60, secs % 60)
    }
}

/// Final record written to `summary.json` in the session folder.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub outcome: String,
    pub found_candidate: Option<String>,
    pub error: Option<String>,
    pub attempts: u64,
    pub last_candidate: Option<String>,
    pub last_similarity: Option<f32>,
    pub elapsed_seconds: f64,
    pub rate_per_second: f64,
    pub started_at: String,
    pub finished_at: String,
    pub config: AttemptConfig,
}

impl SessionSummary {
    pub fn new(state: &AttemptState, stats: &SessionStats, config: &AttemptConfig) -> Self {
        let (found_candidate, error) = match state {
            AttemptState::Success(candidate) => (Some(candidate.clone()), None),
            AttemptState::Failed(msg) => (None, Some(msg.clone())),
            _ => (None, None),
        };
        Self {
            outcome: state.label().to_string(),
            found_candidate,
            error,
            attempts: stats.attempts,
            last_candidate: stats.current_candidate.clone(),
            last_similarity: stats.last_similarity,
            elapsed_seconds: round_to(stats.elapsed_seconds(), 3),
            rate_per_second: round_to(stats.rate_per_second(), 2),
            started_at: stats.started_at.to_rfc3339(),
            finished_at: Local::now().to_rfc3339(),
            config: config.clone(),
        }
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
