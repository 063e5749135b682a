//! Domain types shared by every layer of the player

mod folder;
mod modifier;

pub use folder::{FolderSetting, PlayMode, RawSetting, TrackRange, ADMIN_MODE_CODE, MAX_FOLDER};
pub use modifier::{ModifierCard, ModifierKind, TIMER_CHOICES_MINUTES};

use serde::{Deserialize, Serialize};

/// Physical buttons on the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    /// Primary button: play/pause, confirm, abort on long press
    Pause,
    Up,
    Down,
}

impl Button {
    pub const ALL: [Button; 3] = [Button::Pause, Button::Up, Button::Down];
}

/// Serial number of a card presented to the reader
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CardId(pub Vec<u8>);

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Notifications raised asynchronously by the audio module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioEvent {
    /// A folder track played to its end
    TrackFinished { folder: u8, track: u16 },
}
