//! Sequential candidate entry with screenshot-based success detection.
//!
//! This module provides:
//! - Session configuration and validation
//! - The attempt state machine (generate → type → wait → capture → compare)
//! - Session statistics and the status snapshot shown by the GUI/CLI
//! - A runner that drives a session on a worker thread

pub mod config;
pub mod runner;
pub mod state;
pub mod stats;

pub use config::AttemptConfig;
pub use runner::{is_session_active, start_session};
pub use state::AttemptState;
