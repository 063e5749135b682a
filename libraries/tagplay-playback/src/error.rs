//! Error types for the playback engine

use tagplay_core::TagplayError;
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    /// No folder has been selected yet
    #[error("No folder selected")]
    NoSelection,

    /// The audio module reports no tracks in the folder
    #[error("Folder {0} is empty")]
    EmptyFolder(u8),

    /// Queue or range does not fit the selected folder
    #[error("Invalid queue: {0}")]
    InvalidQueue(String),

    /// Peripheral or storage error
    #[error(transparent)]
    Core(#[from] TagplayError),
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
