//! Error types for the control loop

use tagplay_core::{ErrorClass, TagplayError};
use tagplay_playback::PlaybackError;
use thiserror::Error;

/// Control errors
///
/// Never fatal: the controller logs them, plays the matching announcement
/// and returns to the idle loop.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error(transparent)]
    Core(#[from] TagplayError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),
}

impl ControlError {
    /// Classify the error
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Core(e) | Self::Playback(PlaybackError::Core(e)) => e.class(),
            Self::Playback(_) => ErrorClass::InvalidChoice,
        }
    }
}

/// Result type for control operations
pub type Result<T> = std::result::Result<T, ControlError>;
