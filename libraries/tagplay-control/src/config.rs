//! Control loop timing

use serde::{Deserialize, Serialize};

/// Timing parameters of the control loop and its blocking waits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlConfig {
    /// Hold time after which a press counts as long
    pub long_press_ms: u64,
    /// Interval between repeat events while a long press is held
    pub repeat_interval_ms: u64,
    /// Sleep between two polling steps of a blocking wait
    pub poll_interval_ms: u64,
    /// Upper bound for any blocking wait (`None` waits forever)
    pub max_wait_ms: Option<u64>,
    /// Delay between announcing a folder number and previewing it
    pub announcement_gap_ms: u64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            long_press_ms: 1000,
            repeat_interval_ms: 300,
            poll_interval_ms: 10,
            max_wait_ms: Some(120_000),
            announcement_gap_ms: 500,
        }
    }
}
