//! Command-line interface.

use clap::Parser;
use std::path::PathBuf;

use crate::automation::AttemptConfig;

/// Types sequential numeric codes into the focused window and watches the
/// screen for a known "unlocked" image.
#[derive(Parser, Debug, Default)]
#[command(name = "passcode-autotyper")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Open the graphical interface (default)
    #[arg(long, conflicts_with_all = ["cli", "info", "check"])]
    pub gui: bool,

    /// Run a session in the terminal
    #[arg(long, conflicts_with_all = ["info", "check"])]
    pub cli: bool,

    /// Print the effective configuration and platform support
    #[arg(long, conflicts_with = "check")]
    pub info: bool,

    /// Verify the reference image, screen capture and input injection
    #[arg(long)]
    pub check: bool,

    /// Config file path (defaults to config.json next to the executable)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Reference "success" image
    #[arg(short, long)]
    pub reference: Option<PathBuf>,

    /// Digits per candidate (1-10)
    #[arg(short, long)]
    pub length: Option<u32>,

    /// First value to try
    #[arg(short, long)]
    pub start: Option<u64>,

    /// Give up after this many attempts
    #[arg(short, long)]
    pub max_attempts: Option<u64>,

    /// Seconds between typing and capturing
    #[arg(short, long)]
    pub delay: Option<f64>,

    /// Seconds to wait before the first keystroke
    #[arg(long)]
    pub focus_delay: Option<f64>,

    /// Similarity required to count as success (0-1]
    #[arg(short, long)]
    pub threshold: Option<f32>,

    /// Simulate the loop without sending input
    #[arg(long)]
    pub demo: bool,

    /// Do not press Enter after each candidate
    #[arg(long)]
    pub no_enter: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Which front end to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Gui,
    Cli,
    Info,
    Check,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn mode(&self) -> Mode {
        if self.cli {
            Mode::Cli
        } else if self.info {
            Mode::Info
        } else if self.check {
            Mode::Check
        } else {
            Mode::Gui
        }
    }

    /// Applies command-line overrides on top of the loaded config.
    pub fn apply_overrides(&self, config: &mut AttemptConfig) {
        if let Some(path) = &self.reference {
            config.reference_image_path = path.clone();
        }
        if let Some(length) = self.length {
            config.password_length = length;
        }
        if let Some(start) = self.start {
            config.start_from = start;
        }
        if let Some(max) = self.max_attempts {
            config.max_attempts = max;
        }
        if let Some(delay) = self.delay {
            config.attempt_delay = delay;
        }
        if let Some(focus_delay) = self.focus_delay {
            config.focus_delay = focus_delay;
        }
        if let Some(threshold) = self.threshold {
            config.similarity_threshold = threshold;
        }
        if self.demo {
            config.demo_mode = true;
        }
        if self.no_enter {
            config.press_enter = false;
        }
    }
}
