//! GUI application state management.
//!
//! Tracks user input values and session status for display.

use std::path::PathBuf;

use crate::automation::stats::StatusSnapshot;
use crate::automation::{AttemptConfig, AttemptState};

/// Session status for display in GUI.
#[derive(Clone, Debug, Default)]
pub enum SessionStatus {
    /// Not running, ready to start
    #[default]
    Idle,
    /// Session is running (latest snapshot)
    Running(StatusSnapshot),
    /// Session reached a terminal state
    Finished { state: AttemptState, attempts: u64 },
    /// Session could not be started
    Error(String),
}

impl SessionStatus {
    /// Get display text for current status.
    pub fn status_text(&self) -> String {
        match self {
            Self::Idle => "Idle".to_string(),
            Self::Running(snapshot) => {
                let paused = if snapshot.is_paused { " [paused]" } else { "" };
                format!(
                    "Running ({}/{}) - {}{}",
                    snapshot.attempts,
                    snapshot.max_attempts,
                    snapshot.current_candidate.as_deref().unwrap_or("-"),
                    paused
                )
            }
            Self::Finished {
                state: AttemptState::Success(candidate),
                attempts,
            } => format!("Success: {} (after {} attempts)", candidate, attempts),
            Self::Finished { state, attempts } => {
                format!("{} ({} attempts)", state, attempts)
            }
            Self::Error(msg) => format!("Error: {}", msg),
        }
    }

    /// Get progress as a fraction of max attempts (0.0 to 1.0).
    pub fn progress(&self) -> f32 {
        match self {
            Self::Running(snapshot) => snapshot.progress(),
            Self::Finished { .. } => 1.0,
            _ => 0.0,
        }
    }

    /// Check if a session is currently running.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running(_))
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Running(snapshot) if snapshot.is_paused)
    }
}

/// Editable form values. Converted into an `AttemptConfig` on Start.
#[derive(Debug, Clone)]
pub struct ConfigForm {
    pub reference_image_path: String,
    pub password_length: u32,
    pub start_from: u64,
    pub max_attempts: u64,
    pub attempt_delay: f64,
    pub focus_delay: f64,
    pub demo_mode: bool,
    pub press_enter: bool,
}

impl ConfigForm {
    pub fn from_config(config: &AttemptConfig) -> Self {
        Self {
            reference_image_path: config.reference_image_path.display().to_string(),
            password_length: config.password_length,
            start_from: config.start_from,
            max_attempts: config.max_attempts,
            attempt_delay: config.attempt_delay,
            focus_delay: config.focus_delay,
            demo_mode: config.demo_mode,
            press_enter: config.press_enter,
        }
    }

    /// Overlays the form onto `base` (which keeps the non-editable fields).
    pub fn to_config(&self, base: &AttemptConfig) -> AttemptConfig {
        AttemptConfig {
            reference_image_path: PathBuf::from(self.reference_image_path.trim()),
            password_length: self.password_length,
            start_from: self.start_from,
            max_attempts: self.max_attempts,
            attempt_delay: self.attempt_delay,
            focus_delay: self.focus_delay,
            demo_mode: self.demo_mode,
            press_enter: self.press_enter,
            ..base.clone()
        }
    }
}

/// GUI application state.
#[derive(Debug)]
pub struct GuiState {
    /// Loaded config; fields not shown in the form come from here.
    pub base_config: AttemptConfig,
    /// User input values.
    pub form: ConfigForm,
    /// Current session status.
    pub status: SessionStatus,
    /// Lines shown in the log panel.
    pub log_lines: Vec<String>,
    /// Path to the latest session folder (for "Open Folder" button).
    pub latest_session_path: Option<PathBuf>,
}

impl GuiState {
    pub fn new(config: AttemptConfig) -> Self {
        Self {
            form: ConfigForm::from_config(&config),
            base_config: config,
            status: SessionStatus::Idle,
            log_lines: Vec::new(),
            latest_session_path: None,
        }
    }
}
