//! Core error types for Tagplay

use thiserror::Error;

/// Result type alias using `TagplayError`
pub type Result<T> = std::result::Result<T, TagplayError>;

/// Core error type for Tagplay
///
/// None of these errors halt the device. Callers report them through an
/// announcement or a log line and return to the idle loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TagplayError {
    /// The reader could not authenticate against the presented card
    #[error("Tag authentication failed")]
    Authentication,

    /// Reader block read/write failure
    #[error("Tag reader error: {0}")]
    Reader(String),

    /// Persistent storage access failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Persistent storage cannot hold the requested record
    #[error("Storage too small: need {required} bytes, have {available}")]
    StorageTooSmall { required: usize, available: usize },

    /// A stored record carries a format version this build does not understand
    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(u8),

    /// Long press on the primary button during a prompt or wait
    #[error("Aborted by user")]
    UserAbort,

    /// A bounded wait ran out of time
    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    /// Lock mismatch, wrong calc answer or an otherwise unusable choice
    #[error("Invalid choice: {0}")]
    InvalidChoice(String),
}

/// Coarse error classes used to decide how an error is reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Reader or storage hardware misbehaved
    PeripheralFailure,
    /// Data did not carry the expected cookie/version
    ProtocolMismatch,
    /// The operator cancelled (or walked away from) the current operation
    UserAbort,
    /// The operator answered a gate or prompt wrongly
    InvalidChoice,
}

impl TagplayError {
    /// Create a reader error
    pub fn reader(msg: impl Into<String>) -> Self {
        Self::Reader(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an invalid choice error
    pub fn invalid_choice(msg: impl Into<String>) -> Self {
        Self::InvalidChoice(msg.into())
    }

    /// Classify the error
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Authentication
            | Self::Reader(_)
            | Self::Storage(_)
            | Self::StorageTooSmall { .. } => ErrorClass::PeripheralFailure,
            Self::UnsupportedVersion(_) => ErrorClass::ProtocolMismatch,
            Self::UserAbort | Self::Timeout(_) => ErrorClass::UserAbort,
            Self::InvalidChoice(_) => ErrorClass::InvalidChoice,
        }
    }
}
