//! Screen capture functionality.
//!
//! This module provides:
//! - The `ScreenSampler` capability used by the attempt loop
//! - Full-screen / region capture through GDI (`capture_screen`, Windows only)
//! - A stub that always fails on other platforms

#[cfg(windows)]
mod gdi;

use image::DynamicImage;

use crate::automation::config::RelativeRect;
use crate::error::Result;

/// Captures the current screen contents as an image.
pub trait ScreenSampler: Send {
    fn capture(&mut self) -> Result<DynamicImage>;
}

/// Samples the primary screen, optionally cropped to a relative region.
pub struct DesktopSampler {
    region: Option<RelativeRect>,
}

impl DesktopSampler {
    pub fn new(region: Option<RelativeRect>) -> Self {
        Self { region }
    }
}

impl ScreenSampler for DesktopSampler {
    fn capture(&mut self) -> Result<DynamicImage> {
        capture_screen(self.region.as_ref())
    }
}

/// Whether screen capture is available on this platform.
pub fn is_supported() -> bool {
    cfg!(windows)
}

#[cfg(windows)]
pub use gdi::capture_screen;

/// Capture is not supported on non-Windows platforms
#[cfg(not(windows))]
pub fn capture_screen(_region: Option<&RelativeRect>) -> Result<DynamicImage> {
    Err(crate::error::Error::Capture(
        "screen capture is only supported on Windows".into(),
    ))
}

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_stub_capture_fails() {
        let mut sampler = DesktopSampler::new(None);
        assert!(!is_supported());
        assert!(matches!(sampler.capture(), Err(Error::Capture(_))));
    }
}
