//! Bounded volume control
//!
//! The audio module takes a raw level (0-30). The player keeps the level
//! inside the `[min, max]` window configured in the settings; stepping
//! beyond either bound is refused rather than clamped so callers can tell
//! that nothing changed.

use serde::{Deserialize, Serialize};

/// Volume level kept inside a configured window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    level: u8,
    min: u8,
    max: u8,
}

impl Volume {
    /// Create a volume at `level`, clamped into `[min, max]`
    pub fn new(level: u8, min: u8, max: u8) -> Self {
        let max = max.max(min);
        Self {
            level: level.clamp(min, max),
            min,
            max,
        }
    }

    /// Current level
    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn bounds(&self) -> (u8, u8) {
        (self.min, self.max)
    }

    /// Replace the window, pulling the level back inside it
    pub fn set_bounds(&mut self, min: u8, max: u8) {
        self.min = min;
        self.max = max.max(min);
        self.level = self.level.clamp(self.min, self.max);
    }

    /// Set level (clamped into the window)
    pub fn set_level(&mut self, level: u8) {
        self.level = level.clamp(self.min, self.max);
    }

    /// Level one step up, if still inside the window
    pub fn peek_up(&self) -> Option<u8> {
        (self.level < self.max).then(|| self.level + 1)
    }

    /// Level one step down, if still inside the window
    pub fn peek_down(&self) -> Option<u8> {
        (self.level > self.min).then(|| self.level - 1)
    }

    /// Step up; returns the new level or `None` at the ceiling
    pub fn increase(&mut self) -> Option<u8> {
        let next = self.peek_up()?;
        self.level = next;
        Some(next)
    }

    /// Step down; returns the new level or `None` at the floor
    pub fn decrease(&mut self) -> Option<u8> {
        let next = self.peek_down()?;
        self.level = next;
        Some(next)
    }
}
