//! Tagplay Simulator
//!
//! Runs the player's control loop on the host against simulated
//! peripherals: a virtual clock, scripted buttons and cards, an audio
//! module whose tracks end after a fixed time, and an EEPROM image file.
//! Also hosts the tag payload and settings inspection helpers used by the
//! `tagplay-sim` binary.

pub mod config;
pub mod eeprom;
pub mod error;
pub mod payload;
pub mod script;
pub mod sim;

// Re-export commonly used types for convenience
pub use config::{FolderSpec, SimConfig};
pub use error::{Result, SimError};
pub use script::{Action, CardSpec, Event, Script};
pub use sim::{AudioCommand, LogEntry, Report, Simulation};
