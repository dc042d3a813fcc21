//! Error types for attempt sessions.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while configuring or running an attempt session.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad length/start/delay/threshold. Reported before any run starts.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A captured frame could not be turned into a comparable image.
    #[error("Captured frame unusable: {0}")]
    ImageDecode(String),

    #[error("Screen capture failed: {0}")]
    Capture(String),

    #[error("Input injection failed: {0}")]
    Injection(String),

    /// The cursor was parked in the abort corner.
    #[error("Failsafe triggered (cursor in top-left corner)")]
    FailsafeTriggered,

    #[error("Failed to write image: {0}")]
    ImageWrite(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for attempt operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for configuration failures.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }
}
