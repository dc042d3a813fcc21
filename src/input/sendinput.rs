//! Keyboard simulation via `SendInput`.
//!
//! Characters are sent as Unicode key events so the active keyboard layout
//! does not matter. Input goes to the foreground window, so the target
//! application must have focus before a session starts.

use std::mem;

use windows::Win32::Foundation::POINT;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, KEYBDINPUT, KEYBD_EVENT_FLAGS, KEYEVENTF_KEYUP,
    KEYEVENTF_UNICODE, VIRTUAL_KEY, VK_RETURN,
};
use windows::Win32::UI::WindowsAndMessaging::GetCursorPos;

use super::InputInjector;
use crate::error::{Error, Result};

/// Cursor within this many pixels of (0, 0) trips the failsafe.
const FAILSAFE_MARGIN: i32 = 1;

/// Pause between individual keystrokes.
const KEY_INTERVAL_MS: u64 = 10;

pub struct SendInputInjector {
    failsafe: bool,
}

impl SendInputInjector {
    pub fn new(failsafe: bool) -> Self {
        Self { failsafe }
    }

    fn check_failsafe(&self) -> Result<()> {
        if !self.failsafe {
            return Ok(());
        }
        let mut point = POINT::default();
        unsafe { GetCursorPos(&mut point) }
            .map_err(|e| Error::Injection(format!("GetCursorPos failed: {}", e)))?;
        if point.x <= FAILSAFE_MARGIN && point.y <= FAILSAFE_MARGIN {
            return Err(Error::FailsafeTriggered);
        }
        Ok(())
    }
}

impl InputInjector for SendInputInjector {
    fn inject(&mut self, text: &str, confirm: bool) -> Result<()> {
        self.check_failsafe()?;

        for unit in text.encode_utf16() {
            send_inputs(&[
                key_input(VIRTUAL_KEY(0), unit, KEYEVENTF_UNICODE),
                key_input(VIRTUAL_KEY(0), unit, KEYEVENTF_UNICODE | KEYEVENTF_KEYUP),
            ])?;
            std::thread::sleep(std::time::Duration::from_millis(KEY_INTERVAL_MS));
        }

        if confirm {
            send_inputs(&[
                key_input(VK_RETURN, 0, KEYBD_EVENT_FLAGS(0)),
                key_input(VK_RETURN, 0, KEYEVENTF_KEYUP),
            ])?;
        }

        log::debug!("Typed {} chars (confirm = {})", text.len(), confirm);
        Ok(())
    }
}

fn key_input(vk: VIRTUAL_KEY, scan: u16, flags: KEYBD_EVENT_FLAGS) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: vk,
                wScan: scan,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

/// Sends the events and fails if Windows accepted fewer than requested
/// (typically UIPI blocking input into an elevated window).
fn send_inputs(inputs: &[INPUT]) -> Result<()> {
    let sent = unsafe { SendInput(inputs, mem::size_of::<INPUT>() as i32) };
    if sent as usize != inputs.len() {
        return Err(Error::Injection(format!(
            "SendInput sent {} of {} events",
            sent,
            inputs.len()
        )));
    }
    Ok(())
}
