//! Folder settings and play modes
//!
//! On the wire a folder setting is four bytes: folder, mode, param-a and
//! param-b. The meaning of the two parameter bytes depends on the mode, so
//! the typed model carries them as payload of the matching `PlayMode`
//! variant instead of as loose fields.

use serde::{Deserialize, Serialize};

/// Highest folder number addressable on the storage medium
pub const MAX_FOLDER: u8 = 99;

/// Mode code of an admin tag created through the folder-setup flow
pub const ADMIN_MODE_CODE: u8 = 6;

/// Four raw bytes as stored on a tag or in a shortcut slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSetting {
    pub folder: u8,
    pub mode: u8,
    pub param_a: u8,
    pub param_b: u8,
}

impl RawSetting {
    pub const fn new(folder: u8, mode: u8, param_a: u8, param_b: u8) -> Self {
        Self {
            folder,
            mode,
            param_a,
            param_b,
        }
    }

    /// Serialize into the 4-byte layout
    pub fn to_bytes(self) -> [u8; 4] {
        [self.folder, self.mode, self.param_a, self.param_b]
    }

    /// Parse the 4-byte layout
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self::new(bytes[0], bytes[1], bytes[2], bytes[3])
    }
}

/// Inclusive track range used by the from/to modes
///
/// Always satisfies `1 <= from <= to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackRange {
    from: u8,
    to: u8,
}

impl TrackRange {
    /// Build a range, rejecting `from == 0` and `to < from`
    pub fn new(from: u8, to: u8) -> Option<Self> {
        (from >= 1 && to >= from).then_some(Self { from, to })
    }

    /// First track of the range
    pub fn first(&self) -> u8 {
        self.from
    }

    /// Last track of the range
    pub fn last(&self) -> u8 {
        self.to
    }

    /// Number of tracks covered by the range
    pub fn len(&self) -> usize {
        (self.to - self.from) as usize + 1
    }

    /// A valid range is never empty
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Track selection strategy for a folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayMode {
    /// Play one random track of the folder, then stop
    RandomTrackInFolder,
    /// Play the whole folder in order
    TracksInFolder,
    /// Play the whole folder in shuffled order, looping
    RandomsInFolder,
    /// Play a single configured track
    TrackInFolder { track: u8 },
    /// Play in order and remember the position across power cycles
    AudioBook,
    /// Play one random track from the range, then stop
    FromToRandomTrack(TrackRange),
    /// Play the range in order
    FromToAllTracks(TrackRange),
    /// Play the range in shuffled order, looping
    FromToRandomTracks(TrackRange),
}

impl PlayMode {
    /// Numeric mode code written to tags
    pub fn code(&self) -> u8 {
        match self {
            Self::RandomTrackInFolder => 1,
            Self::TracksInFolder => 2,
            Self::RandomsInFolder => 3,
            Self::TrackInFolder { .. } => 4,
            Self::AudioBook => 5,
            Self::FromToRandomTrack(_) => 7,
            Self::FromToAllTracks(_) => 8,
            Self::FromToRandomTracks(_) => 9,
        }
    }

    /// Parameter bytes (param-a, param-b) written to tags
    pub fn params(&self) -> (u8, u8) {
        match self {
            Self::TrackInFolder { track } => (*track, 0),
            Self::FromToRandomTrack(range)
            | Self::FromToAllTracks(range)
            | Self::FromToRandomTracks(range) => (range.first(), range.last()),
            _ => (0, 0),
        }
    }

    /// Interpret a mode code and its parameter bytes
    ///
    /// Returns `None` for unassigned (0), admin (6), unknown codes and
    /// unusable parameters.
    pub fn from_raw(code: u8, param_a: u8, param_b: u8) -> Option<Self> {
        let mode = match code {
            1 => Self::RandomTrackInFolder,
            2 => Self::TracksInFolder,
            3 => Self::RandomsInFolder,
            4 if param_a >= 1 => Self::TrackInFolder { track: param_a },
            5 => Self::AudioBook,
            7 => Self::FromToRandomTrack(TrackRange::new(param_a, param_b)?),
            8 => Self::FromToAllTracks(TrackRange::new(param_a, param_b)?),
            9 => Self::FromToRandomTracks(TrackRange::new(param_a, param_b)?),
            _ => return None,
        };
        Some(mode)
    }

    /// Whether the mode plays from a shuffle queue
    pub fn uses_queue(&self) -> bool {
        matches!(self, Self::RandomsInFolder | Self::FromToRandomTracks(_))
    }

    /// The range of a from/to mode
    pub fn range(&self) -> Option<TrackRange> {
        match self {
            Self::FromToRandomTrack(range)
            | Self::FromToAllTracks(range)
            | Self::FromToRandomTracks(range) => Some(*range),
            _ => None,
        }
    }
}

/// A folder together with the mode it should be played in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderSetting {
    pub folder: u8,
    pub mode: PlayMode,
}

impl FolderSetting {
    pub fn new(folder: u8, mode: PlayMode) -> Self {
        Self { folder, mode }
    }

    /// Interpret raw bytes as a playable folder setting
    ///
    /// Folder 0 belongs to admin/modifier tags and never yields a folder
    /// setting.
    pub fn from_raw(raw: RawSetting) -> Option<Self> {
        if raw.folder == 0 || raw.folder > MAX_FOLDER {
            return None;
        }
        let mode = PlayMode::from_raw(raw.mode, raw.param_a, raw.param_b)?;
        Some(Self::new(raw.folder, mode))
    }

    pub fn to_raw(&self) -> RawSetting {
        let (param_a, param_b) = self.mode.params();
        RawSetting::new(self.folder, self.mode.code(), param_a, param_b)
    }
}
