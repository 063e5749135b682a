//! Standby deadline
//!
//! Armed whenever playback is not expected to resume soon. The control
//! loop compares the deadline against the clock on every tick and powers
//! the device down once it has passed.

use serde::{Deserialize, Serialize};
use tracing::debug;

const MS_PER_MINUTE: u64 = 60_000;

/// Wall-clock power-down deadline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandbyTimer {
    deadline: Option<u64>,
}

impl StandbyTimer {
    /// Set the deadline `minutes` from `now_ms`; 0 minutes leaves it disarmed
    pub fn arm(&mut self, now_ms: u64, minutes: u32) {
        if minutes == 0 {
            self.deadline = None;
            return;
        }
        let deadline = now_ms.saturating_add(u64::from(minutes) * MS_PER_MINUTE);
        debug!(deadline, "Standby armed");
        self.deadline = Some(deadline);
    }

    pub fn disarm(&mut self) {
        if self.deadline.take().is_some() {
            debug!("Standby disarmed");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<u64> {
        self.deadline
    }

    /// Whether the deadline has passed
    pub fn is_due(&self, now_ms: u64) -> bool {
        self.deadline.is_some_and(|deadline| now_ms >= deadline)
    }
}
