//! Keyboard input injection.
//!
//! This module provides:
//! - The `InputInjector` capability used by the attempt loop
//! - A `SendInput` implementation that types into the foreground window (Windows)
//! - A stub that always fails on other platforms

#[cfg(windows)]
mod sendinput;

use crate::error::Result;

/// Types text into whatever application currently has keyboard focus.
pub trait InputInjector: Send {
    /// Types `text`, then presses Enter when `confirm` is set.
    fn inject(&mut self, text: &str, confirm: bool) -> Result<()>;
}

#[cfg(windows)]
pub use sendinput::SendInputInjector;

/// Whether real keyboard injection is available on this platform.
pub fn is_supported() -> bool {
    cfg!(windows)
}

/// Creates the injector for the current platform.
#[cfg(windows)]
pub fn platform_injector(failsafe: bool) -> Box<dyn InputInjector> {
    Box::new(SendInputInjector::new(failsafe))
}

/// Creates the injector for the current platform.
#[cfg(not(windows))]
pub fn platform_injector(_failsafe: bool) -> Box<dyn InputInjector> {
    Box::new(stub_impl::UnsupportedInjector)
}

#[cfg(not(windows))]
mod stub_impl {
    use super::InputInjector;
    use crate::error::{Error, Result};

    /// Keyboard injection is not supported on non-Windows platforms
    pub struct UnsupportedInjector;

    impl InputInjector for UnsupportedInjector {
        fn inject(&mut self, _text: &str, _confirm: bool) -> Result<()> {
            Err(Error::Injection(
                "keyboard injection is only supported on Windows".into(),
            ))
        }
    }
}
