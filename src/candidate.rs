//! Fixed-length numeric candidate enumeration.
//!
//! Candidates are zero-padded decimal strings counted upward from a start
//! offset until the `10^length` space runs out.

use crate::error::{Error, Result};

/// Longest supported candidate. `10^10` still fits comfortably in a `u64`.
pub const MAX_LENGTH: u32 = 10;

/// Lazy, finite sequence of zero-padded numeric strings.
#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    length: u32,
    start: u64,
    next: u64,
    end: u64,
}

impl CandidateGenerator {
    /// Creates a generator yielding `start..10^length` as `length`-digit strings.
    pub fn new(length: u32, start: u64) -> Result<Self> {
        if length == 0 || length > MAX_LENGTH {
            return Err(Error::config(format!(
                "password_length must be between 1 and {}, got {}",
                MAX_LENGTH, length
            )));
        }
        let end = space_size(length);
        if start >= end {
            return Err(Error::config(format!(
                "start_from {} is outside the {}-digit space (max {})",
                start,
                length,
                end - 1
            )));
        }
        Ok(Self {
            length,
            start,
            next: start,
            end,
        })
    }

    /// Rewinds to the configured start offset.
    pub fn restart(&mut self) {
        self.next = self.start;
    }

    /// Number of candidates not yet yielded.
    pub fn remaining(&self) -> u64 {
        self.end - self.next
    }

    /// Total candidates from the start offset to the end of the space.
    pub fn total(&self) -> u64 {
        self.end - self.start
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    fn format(&self, value: u64) -> String {
        format!("{:0width$}", value, width = self.length as usize)
    }
}

impl Iterator for CandidateGenerator {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.next >= self.end {
            return None;
        }
        let value = self.next;
        self.next += 1;
        Some(self.format(value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.remaining()).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

/// `10^length`
pub fn space_size(length: u32) -> u64 {
    10u64.pow(length)
}
