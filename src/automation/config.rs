//! Configuration types for attempt sessions.
//!
//! Loaded from config.json (next to the executable by default), then
//! optionally overridden from the command line and validated once before a
//! session starts. The validated value is moved into the session and never
//! mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::candidate::{space_size, MAX_LENGTH};
use crate::detection::DEFAULT_THRESHOLD;
use crate::error::{Error, Result};

/// Demo mode "succeeds" when this candidate comes up.
pub const DEMO_SUCCESS_VALUE: &str = "1234";

/// Upper bound for any configured wait, in seconds (one day).
pub const MAX_DELAY_SECS: f64 = 86_400.0;

/// A rectangle in relative coordinates (0.0 to 1.0).
/// Used for restricting capture to part of the screen.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelativeRect {
    /// X position of top-left corner (0.0 = left edge, 1.0 = right edge)
    pub x: f32,
    /// Y position of top-left corner (0.0 = top edge, 1.0 = bottom edge)
    pub y: f32,
    /// Width as fraction of screen width
    pub width: f32,
    /// Height as fraction of screen height
    pub height: f32,
}

impl Default for RelativeRect {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
        }
    }
}

impl RelativeRect {
    /// Converts to absolute pixel coordinates `(x, y, width, height)`.
    /// Width and height are at least 1 pixel and clamped to the screen.
    pub fn to_pixels(&self, screen_width: u32, screen_height: u32) -> (u32, u32, u32, u32) {
        if screen_width == 0 || screen_height == 0 {
            return (0, 0, 0, 0);
        }
        let sw = screen_width as f32;
        let sh = screen_height as f32;
        let x = ((self.x * sw) as u32).min(screen_width.saturating_sub(1));
        let y = ((self.y * sh) as u32).min(screen_height.saturating_sub(1));
        let w = ((self.width * sw) as u32).clamp(1, screen_width - x);
        let h = ((self.height * sh) as u32).clamp(1, screen_height - y);
        (x, y, w, h)
    }

    fn validate(&self) -> Result<()> {
        let in_unit = |v: f32| (0.0..=1.0).contains(&v);
        if !(in_unit(self.x) && in_unit(self.y) && in_unit(self.width) && in_unit(self.height)) {
            return Err(Error::config("capture_region values must be within 0.0-1.0"));
        }
        if self.width == 0.0 || self.height == 0.0 {
            return Err(Error::config("capture_region must have non-zero size"));
        }
        if self.x + self.width > 1.0 + f32::EPSILON || self.y + self.height > 1.0 + f32::EPSILON {
            return Err(Error::config("capture_region extends past the screen edge"));
        }
        Ok(())
    }
}

/// Complete attempt configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttemptConfig {
    /// Image of the screen state that means the candidate was accepted
    pub reference_image_path: PathBuf,
    /// Digits per candidate (1-10)
    pub password_length: u32,
    /// First numeric value to try
    pub start_from: u64,
    /// Stop after this many attempts without a match
    pub max_attempts: u64,
    /// Seconds to wait between typing a candidate and capturing the screen
    pub attempt_delay: f64,
    /// Seconds to wait before the first keystroke, to focus the target input
    pub focus_delay: f64,
    /// Skip real input/capture and succeed on `demo_success_value`
    pub demo_mode: bool,
    /// Candidate that counts as correct in demo mode
    pub demo_success_value: String,
    /// Similarity required to declare success (0.0 exclusive to 1.0)
    pub similarity_threshold: f32,
    /// Press Enter after typing each candidate
    pub press_enter: bool,
    /// Part of the screen to compare; whole screen when absent
    pub capture_region: Option<RelativeRect>,
    /// Refuse to type while the cursor is parked in the top-left corner
    pub failsafe_enabled: bool,
    /// Save the matching frame into the session folder
    pub save_match_screenshot: bool,
}

impl Default for AttemptConfig {
    fn default() -> Self {
        Self {
            reference_image_path: PathBuf::from("success.png"),
            password_length: 4,
            start_from: 0,
            max_attempts: 10_000,
            attempt_delay: 0.5,
            focus_delay: 3.0,
            demo_mode: false,
            demo_success_value: DEMO_SUCCESS_VALUE.to_string(),
            similarity_threshold: DEFAULT_THRESHOLD,
            press_enter: true,
            capture_region: None,
            failsafe_enabled: true,
            save_match_screenshot: true,
        }
    }
}

impl AttemptConfig {
    /// Loads configuration from `path`.
    ///
    /// A missing file yields defaults; an unreadable or malformed one is an
    /// `InvalidConfiguration` error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("{} not found. Using default config.", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| Error::config(format!("failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| Error::config(format!("failed to parse {}: {}", path.display(), e)))?;

        log::info!("Config loaded from {}", path.display());
        Ok(config)
    }

    /// Writes the configuration as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::config(format!("failed to serialize config: {}", e)))?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Checks every field. A session may only start with a config that passes.
    pub fn validate(&self) -> Result<()> {
        if self.password_length == 0 || self.password_length > MAX_LENGTH {
            return Err(Error::config(format!(
                "password_length must be between 1 and {}, got {}",
                MAX_LENGTH, self.password_length
            )));
        }

        let space = space_size(self.password_length);
        if self.start_from >= space {
            return Err(Error::config(format!(
                "start_from must be below {} for length {}, got {}",
                space, self.password_length, self.start_from
            )));
        }

        if self.max_attempts == 0 {
            return Err(Error::config("max_attempts must be greater than 0"));
        }

        check_delay("attempt_delay", self.attempt_delay)?;
        check_delay("focus_delay", self.focus_delay)?;

        if !(self.similarity_threshold > 0.0 && self.similarity_threshold <= 1.0) {
            return Err(Error::config(format!(
                "similarity_threshold must be in (0.0, 1.0], got {}",
                self.similarity_threshold
            )));
        }

        if let Some(region) = &self.capture_region {
            region.validate()?;
        }

        if self.demo_mode {
            let value = &self.demo_success_value;
            if value.len() != self.password_length as usize
                || !value.chars().all(|c| c.is_ascii_digit())
            {
                return Err(Error::config(format!(
                    "demo_success_value must be {} digits, got {:?}",
                    self.password_length, value
                )));
            }
        } else if self.reference_image_path.as_os_str().is_empty() {
            return Err(Error::config("reference_image_path is required"));
        }

        Ok(())
    }

    pub fn delay(&self) -> Duration {
        seconds(self.attempt_delay)
    }

    pub fn focus_lead_in(&self) -> Duration {
        seconds(self.focus_delay)
    }
}

fn check_delay(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=MAX_DELAY_SECS).contains(&value) {
        return Err(Error::config(format!(
            "{} must be between 0 and {} seconds, got {}",
            name, MAX_DELAY_SECS, value
        )));
    }
    Ok(())
}

/// Out-of-range values (only possible on an unvalidated config) become zero.
fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        AttemptConfig::default().validate().unwrap();
    }

    #[test]
    fn test_rejects_length_zero_and_eleven() {
        for length in [0, 11] {
            let config = AttemptConfig {
                password_length: length,
                ..Default::default()
            };
            assert!(matches!(
                config.validate(),
                Err(Error::InvalidConfiguration(_))
            ));
        }
    }

    #[test]
    fn test_rejects_start_outside_space() {
        let config = AttemptConfig {
            password_length: 3,
            start_from: 1000,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AttemptConfig {
            password_length: 3,
            start_from: 999,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_delay_and_attempts() {
        let negative = AttemptConfig {
            attempt_delay: -0.1,
            ..Default::default()
        };
        assert!(negative.validate().is_err());

        let nan = AttemptConfig {
            attempt_delay: f64::NAN,
            ..Default::default()
        };
        assert!(nan.validate().is_err());

        let zero_attempts = AttemptConfig {
            max_attempts: 0,
            ..Default::default()
        };
        assert!(zero_attempts.validate().is_err());
    }

    #[test]
    fn test_rejects_delays_too_large_for_duration() {
        for delay in [1e20, MAX_DELAY_SECS + 1.0, f64::INFINITY] {
            let config = AttemptConfig {
                attempt_delay: delay,
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(Error::InvalidConfiguration(_))),
                "attempt_delay {}",
                delay
            );

            let config = AttemptConfig {
                focus_delay: delay,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "focus_delay {}", delay);
        }

        let config = AttemptConfig {
            attempt_delay: MAX_DELAY_SECS,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.delay(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_delay_never_panics_on_unvalidated_values() {
        let config = AttemptConfig {
            attempt_delay: 1e20,
            focus_delay: -1.0,
            ..Default::default()
        };
        assert_eq!(config.delay(), Duration::ZERO);
        assert_eq!(config.focus_lead_in(), Duration::ZERO);
    }

    #[test]
    fn test_rejects_bad_threshold() {
        for threshold in [0.0, -1.0, 1.5] {
            let config = AttemptConfig {
                similarity_threshold: threshold,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "threshold {}", threshold);
        }
    }

    #[test]
    fn test_demo_value_must_fit_length() {
        let config = AttemptConfig {
            demo_mode: true,
            password_length: 6,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AttemptConfig {
            demo_mode: true,
            password_length: 6,
            demo_success_value: "000042".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_region_validation() {
        let config = AttemptConfig {
            capture_region: Some(RelativeRect {
                x: 0.8,
                y: 0.0,
                width: 0.5,
                height: 0.5,
            }),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_region_to_pixels() {
        let region = RelativeRect {
            x: 0.5,
            y: 0.25,
            width: 0.5,
            height: 0.5,
        };
        assert_eq!(region.to_pixels(1920, 1080), (960, 270, 960, 540));
        assert_eq!(RelativeRect::default().to_pixels(800, 600), (0, 0, 800, 600));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AttemptConfig::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, AttemptConfig::default());
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{ "password_length": 6, "attempt_delay": 1.5, "reference_image_path": "ok.png" }"#,
        )
        .unwrap();

        let config = AttemptConfig::load(&path).unwrap();
        assert_eq!(config.password_length, 6);
        assert_eq!(config.attempt_delay, 1.5);
        assert_eq!(config.reference_image_path, PathBuf::from("ok.png"));
        assert_eq!(config.max_attempts, 10_000);
        assert!(config.press_enter);
    }

    #[test]
    fn test_load_malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ password_length: ").unwrap();
        assert!(matches!(
            AttemptConfig::load(&path),
            Err(Error::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = AttemptConfig {
            password_length: 5,
            capture_region: Some(RelativeRect::default()),
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(AttemptConfig::load(&path).unwrap(), config);
    }
}
